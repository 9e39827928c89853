use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schedule::TimeOfDay;

pub const DEFAULT_SLOT_DURATION: u16 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specialization: String,
    pub qualification: String,
    pub experience_years: i32,
    pub consultation_fee: f64,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Weekly working window for one day. At most one per (doctor, day).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorAvailability {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: u8,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub slot_duration: u16,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holiday {
    pub id: Uuid,
    pub date: NaiveDate,
    pub reason: Option<String>,
}
