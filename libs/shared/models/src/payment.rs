use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Submitted,
    Verified,
    Rejected,
    Expired,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Submitted => "SUBMITTED",
            PaymentStatus::Verified => "VERIFIED",
            PaymentStatus::Rejected => "REJECTED",
            PaymentStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub status: PaymentStatus,
    pub utr_number: Option<String>,
    pub screenshot_url: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// A pending payment whose window has closed. It must be materialized as
    /// EXPIRED before any other mutation is accepted.
    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.status == PaymentStatus::Pending && now > self.expires_at
    }
}
