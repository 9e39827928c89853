pub mod extractor;
pub mod gate;
pub mod jwt;
pub mod password;
pub mod state;
pub mod test_utils;
pub mod validation;

pub use gate::SessionGate;
pub use state::AppState;
