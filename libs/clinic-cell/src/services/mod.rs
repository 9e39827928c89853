pub mod dashboard;
pub mod gallery;
pub mod holiday;
pub mod settings;

pub use dashboard::DashboardService;
pub use gallery::GalleryService;
pub use holiday::HolidayService;
pub use settings::SettingsService;
