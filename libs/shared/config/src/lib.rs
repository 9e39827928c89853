use std::env;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

const DEV_JWT_SECRET: &str = "development-only-secret-change-me";

/// Which relational store backs the running service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Supabase,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "supabase" => Ok(StoreBackend::Supabase),
            other => Err(format!("Unknown store backend: {}", other)),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Supabase => write!(f, "supabase"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub storage_bucket: String,
    pub jwt_secret: String,
    pub session_ttl_days: i64,
    pub payment_window_minutes: i64,
    pub store_backend: StoreBackend,
    pub port: u16,
    pub seed_admin_email: String,
    pub seed_admin_password: String,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let supabase_url = env::var("SUPABASE_URL")
            .unwrap_or_else(|_| {
                warn!("SUPABASE_URL not set, using empty value");
                String::new()
            });
        let supabase_service_key = env::var("SUPABASE_SERVICE_ROLE_KEY")
            .unwrap_or_else(|_| {
                warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                String::new()
            });

        let store_backend = match env::var("CLINIC_STORE") {
            Ok(value) => value.parse().unwrap_or_else(|e: String| {
                warn!("{}, falling back to in-memory store", e);
                StoreBackend::Memory
            }),
            Err(_) if !supabase_url.is_empty() && !supabase_service_key.is_empty() => {
                StoreBackend::Supabase
            }
            Err(_) => {
                warn!("CLINIC_STORE not set and Supabase not configured, using in-memory store");
                StoreBackend::Memory
            }
        };

        let config = Self {
            supabase_url,
            supabase_service_key,
            storage_bucket: env::var("SUPABASE_STORAGE_BUCKET")
                .unwrap_or_else(|_| "clinic".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using development secret");
                    DEV_JWT_SECRET.to_string()
                }),
            session_ttl_days: parsed_var("SESSION_TTL_DAYS", 7),
            payment_window_minutes: parsed_var("PAYMENT_WINDOW_MINUTES", 15),
            store_backend,
            port: parsed_var("PORT", 3000),
            seed_admin_email: env::var("SEED_ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@clinic.com".to_string()),
            seed_admin_password: env::var("SEED_ADMIN_PASSWORD")
                .unwrap_or_else(|_| {
                    warn!("SEED_ADMIN_PASSWORD not set, using default seed password");
                    "admin123".to_string()
                }),
            cookie_secure: parsed_var("COOKIE_SECURE", false),
        };

        if config.store_backend == StoreBackend::Supabase && !config.is_configured() {
            warn!("Supabase store selected but SUPABASE_URL or SUPABASE_SERVICE_ROLE_KEY is missing");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parsed_var<T>(name: &str, default: T) -> T
where
    T: FromStr + fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_parses_case_insensitively() {
        assert_eq!("Memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!(" supabase ".parse::<StoreBackend>(), Ok(StoreBackend::Supabase));
        assert!("redis".parse::<StoreBackend>().is_err());
    }
}
