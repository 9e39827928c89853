pub mod access;
pub mod booking;
pub mod lifecycle;
pub mod workflow;

pub use access::AppointmentAccess;
pub use booking::AppointmentBookingService;
pub use lifecycle::AppointmentLifecycleService;
pub use workflow::AppointmentWorkflowService;
