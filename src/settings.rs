use config::{Config, Environment, Source};
use serde::Deserialize;
use tracing::info;

use crate::errors::StartupError;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub redis_url: String,
    pub bind_address: String,
    pub pg_workers: usize,
    pub jwt_secret: String,
    pub session_ttl_secs: u64,
    pub menu_cache_ttl_secs: u64,
    pub cors_origin: String,
    pub public_base_url: String,
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

impl Settings {
    /// Reads settings from the process environment (`.env` is loaded by the caller).
    pub fn load() -> Result<Self, StartupError> {
        let settings = Self::from_source(Environment::default().try_parsing(true))?;
        info!(
            bind_address = %settings.bind_address,
            pg_workers = settings.pg_workers,
            "configuration loaded"
        );
        Ok(settings)
    }

    fn from_source<S>(source: S) -> Result<Self, StartupError>
    where
        S: Source + Send + Sync + 'static,
    {
        let settings: Settings = Config::builder()
            .set_default("redis_url", "redis://127.0.0.1:6379")?
            .set_default("bind_address", "127.0.0.1:8080")?
            .set_default("pg_workers", 5_i64)?
            .set_default("session_ttl_secs", 43_200_i64)?
            .set_default("menu_cache_ttl_secs", 300_i64)?
            .set_default("cors_origin", "*")?
            .set_default("public_base_url", "http://localhost:3000")?
            .add_source(source)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), StartupError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(StartupError::Config("JWT_SECRET must not be empty".into()));
        }
        if self.pg_workers == 0 {
            return Err(StartupError::Config("PG_WORKERS must be at least 1".into()));
        }
        if self.session_ttl_secs == 0 {
            return Err(StartupError::Config("SESSION_TTL_SECS must be positive".into()));
        }
        if self.bootstrap_admin_email.is_some() != self.bootstrap_admin_password.is_some() {
            return Err(StartupError::Config(
                "BOOTSTRAP_ADMIN_EMAIL and BOOTSTRAP_ADMIN_PASSWORD must be set together".into(),
            ));
        }
        Ok(())
    }

    pub fn public_base_url(&self) -> &str {
        self.public_base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn from_json(json: &str) -> Result<Settings, StartupError> {
        Settings::from_source(File::from_str(json, FileFormat::Json))
    }

    #[test]
    fn defaults_fill_optional_keys() {
        let settings =
            from_json(r#"{"database_url": "postgres://localhost/qr", "jwt_secret": "s3cret"}"#)
                .unwrap();

        assert_eq!(settings.bind_address, "127.0.0.1:8080");
        assert_eq!(settings.pg_workers, 5);
        assert_eq!(settings.menu_cache_ttl_secs, 300);
        assert_eq!(settings.cors_origin, "*");
        assert!(settings.bootstrap_admin_email.is_none());
    }

    #[test]
    fn missing_database_url_is_rejected() {
        assert!(from_json(r#"{"jwt_secret": "s3cret"}"#).is_err());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let err = from_json(r#"{"database_url": "postgres://localhost/qr", "jwt_secret": " "}"#)
            .unwrap_err();
        assert!(matches!(err, StartupError::Config(_)));
    }

    #[test]
    fn bootstrap_credentials_come_in_pairs() {
        let err = from_json(
            r#"{"database_url": "postgres://localhost/qr", "jwt_secret": "s3cret",
                "bootstrap_admin_email": "root@example.com"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, StartupError::Config(_)));
    }

    #[test]
    fn trailing_slash_is_dropped_from_public_url() {
        let settings = from_json(
            r#"{"database_url": "postgres://localhost/qr", "jwt_secret": "s3cret",
                "public_base_url": "https://order.example.com/"}"#,
        )
        .unwrap();
        assert_eq!(settings.public_base_url(), "https://order.example.com");
    }
}
