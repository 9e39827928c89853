pub mod media;
pub mod memory;
pub mod postgrest;
pub mod store;
pub mod supabase;

pub use media::{InMemoryMediaStorage, MediaError, MediaFile, MediaStorage, StoredMedia, SupabaseMediaStorage};
pub use memory::InMemoryStore;
pub use postgrest::SupabaseStore;
pub use store::{AppointmentFilter, ClinicStore, PaymentTransition, StoreError, StoreResult};
