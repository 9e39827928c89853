use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use shared_database::{ClinicStore, StoreError};
use shared_models::doctor::Holiday;
use shared_utils::validation::{non_empty, parse_date};
use shared_utils::AppState;

use crate::models::{ClinicError, CreateHolidayRequest};

pub struct HolidayService {
    store: Arc<dyn ClinicStore>,
}

impl HolidayService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn add_holiday(&self, request: CreateHolidayRequest) -> Result<Holiday, ClinicError> {
        let date = non_empty(request.date)
            .ok_or_else(|| ClinicError::Validation("Date is required".to_string()))?;
        let date = parse_date(&date)?;

        // The store keeps dates unique, so concurrent requests cannot both land.
        let holiday = self.store
            .insert_holiday(Holiday {
                id: Uuid::new_v4(),
                date,
                reason: non_empty(request.reason),
            })
            .await
            .map_err(|err| match err {
                StoreError::Conflict(_) => ClinicError::HolidayExists(date.to_string()),
                other => other.into(),
            })?;
        info!("Clinic closed on {} ({:?})", holiday.date, holiday.reason);
        Ok(holiday)
    }

    pub async fn remove_holiday(&self, id: Uuid) -> Result<(), ClinicError> {
        self.store.delete_holiday(id).await?;
        info!("Holiday {} removed", id);
        Ok(())
    }

    pub async fn list_holidays(&self) -> Result<Vec<Holiday>, ClinicError> {
        Ok(self.store.list_holidays().await?)
    }
}
