use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use shared_database::{AppointmentFilter, ClinicStore};
use shared_models::auth::Role;
use shared_models::payment::PaymentStatus;
use shared_utils::AppState;

use crate::models::{ClinicError, DashboardStats};

pub struct DashboardService {
    store: Arc<dyn ClinicStore>,
}

impl DashboardService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    /// Headline numbers for the admin overview. Revenue counts verified payments only.
    pub async fn stats(&self, now: DateTime<Utc>) -> Result<DashboardStats, ClinicError> {
        let today = now.date_naive();

        let patients = self.store.list_users(Some(Role::Patient)).await?.len();
        let doctors = self.store.list_doctors().await?.len();
        let appointments = self.store.list_appointments(AppointmentFilter::default()).await?;
        let today_appointments = appointments.iter().filter(|a| a.date == today).count();
        let pending_payments = self.store.list_payments(Some(PaymentStatus::Submitted)).await?.len();

        let verified = self.store.list_payments(Some(PaymentStatus::Verified)).await?;
        let total_revenue: f64 = verified.iter().map(|p| p.amount).sum();
        let today_revenue: f64 = verified
            .iter()
            .filter(|p| p.verified_at.is_some_and(|at| at.date_naive() == today))
            .map(|p| p.amount)
            .sum();

        let stats = DashboardStats {
            patients,
            doctors,
            appointments: appointments.len(),
            today_appointments,
            pending_payments,
            today_revenue,
            total_revenue,
        };
        debug!("Dashboard stats: {:?}", stats);
        Ok(stats)
    }
}
