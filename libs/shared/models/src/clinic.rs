use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_CLINIC_NAME: &str = "Dental Clinic";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicSettings {
    pub id: Uuid,
    pub clinic_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub upi_id: Option<String>,
    pub about: Option<String>,
    pub logo: Option<String>,
    pub qr_code_url: Option<String>,
    pub hero_image: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ClinicSettings {
    pub fn named(clinic_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            clinic_name: clinic_name.into(),
            address: None,
            phone: None,
            email: None,
            upi_id: None,
            about: None,
            logo: None,
            qr_code_url: None,
            hero_image: None,
            updated_at: Utc::now(),
        }
    }
}

impl Default for ClinicSettings {
    fn default() -> Self {
        Self::named(DEFAULT_CLINIC_NAME)
    }
}

/// Branding images kept on the settings singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicImageKind {
    Logo,
    QrCode,
    Hero,
}

impl ClinicImageKind {
    pub fn folder(&self) -> &'static str {
        match self {
            ClinicImageKind::Logo => "clinic/logo",
            ClinicImageKind::QrCode => "clinic/qrCode",
            ClinicImageKind::Hero => "clinic/hero",
        }
    }

    pub fn apply(&self, settings: &mut ClinicSettings, url: String) {
        match self {
            ClinicImageKind::Logo => settings.logo = Some(url),
            ClinicImageKind::QrCode => settings.qr_code_url = Some(url),
            ClinicImageKind::Hero => settings.hero_image = Some(url),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: Uuid,
    pub url: String,
    pub public_id: String,
    pub caption: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}
