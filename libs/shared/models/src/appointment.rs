use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schedule::TimeOfDay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    PendingPayment,
    PaymentSubmitted,
    Confirmed,
    Arrived,
    Completed,
    NoShow,
    Cancelled,
    Expired,
}

impl AppointmentStatus {
    /// Whether an appointment in this status still occupies its slot.
    pub fn holds_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Expired)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::PendingPayment => "PENDING_PAYMENT",
            AppointmentStatus::PaymentSubmitted => "PAYMENT_SUBMITTED",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Arrived => "ARRIVED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::NoShow => "NO_SHOW",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenStatus {
    Assigned,
    InProgress,
    Completed,
    Skipped,
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenStatus::Assigned => "ASSIGNED",
            TokenStatus::InProgress => "IN_PROGRESS",
            TokenStatus::Completed => "COMPLETED",
            TokenStatus::Skipped => "SKIPPED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub status: AppointmentStatus,
    pub token_number: Option<i32>,
    pub token_status: Option<TokenStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn occupies(&self, doctor_id: Uuid, date: NaiveDate, start: TimeOfDay) -> bool {
        self.status.holds_slot()
            && self.doctor_id == doctor_id
            && self.date == date
            && self.start_time == start
    }
}
