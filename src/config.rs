use chrono_tz::Tz;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    /// Only consumed by offline admin tooling, never by the server paths.
    pub supabase_service_role_key: Option<String>,
    pub site_url: Option<String>,
    pub timezone: Option<String>,
    pub run_mode: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Resolved once at startup, before the auth gate sees any request.
///
/// `Degraded` means the backend credentials are absent: the gate lets every
/// route through and data endpoints answer with their not-configured state.
/// There is no implicit third case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMode {
    Ready {
        rest_url: String,
        auth_url: String,
        storage_url: String,
        anon_key: String,
    },
    Degraded,
}

impl BackendMode {
    pub fn is_ready(&self) -> bool {
        matches!(self, BackendMode::Ready { .. })
    }
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;

        let mut config: Config = cfg.try_deserialize()?;

        if config.timezone.is_none() {
            config.timezone = Some("UTC".to_string());
        }

        config.validate()?;

        Ok(config)
    }

    /// Server-local timezone, used as fallback when a tenant has none.
    pub fn get_timezone(&self) -> Result<Tz, chrono_tz::ParseError> {
        let tz_str = self.timezone.as_deref().unwrap_or("UTC");
        tz_str.parse::<Tz>()
    }

    /// Decide Ready vs Degraded from the credential pair. Partial
    /// configuration (URL without key or vice versa) counts as Degraded.
    pub fn backend_mode(&self) -> BackendMode {
        let (url, key) = match (&self.supabase_url, &self.supabase_anon_key) {
            (Some(url), Some(key)) if !url.trim().is_empty() && !key.trim().is_empty() => {
                (url.trim().trim_end_matches('/'), key.trim())
            }
            _ => return BackendMode::Degraded,
        };

        BackendMode::Ready {
            rest_url: format!("{}/rest/v1", url),
            auth_url: format!("{}/auth/v1", url),
            storage_url: format!("{}/storage/v1", url),
            anon_key: key.to_string(),
        }
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if !self
            .host
            .chars()
            .all(|c| c.is_alphanumeric() || ".:-_".contains(c))
        {
            return Err(config::ConfigError::Message(
                "Invalid host format".to_string(),
            ));
        }

        if self.port < 1024 {
            return Err(config::ConfigError::Message(
                "Port must be 1024 or higher for security reasons".to_string(),
            ));
        }

        if let Some(tz_str) = &self.timezone {
            if tz_str.parse::<Tz>().is_err() {
                return Err(config::ConfigError::Message(format!(
                    "Invalid timezone: {}",
                    tz_str
                )));
            }
        }

        // A malformed backend URL is a configuration error, not a silent
        // downgrade to Degraded.
        if let Some(raw) = self.supabase_url.as_deref() {
            if !raw.trim().is_empty() {
                let parsed = Url::parse(raw.trim())
                    .map_err(|e| config::ConfigError::Message(format!("Invalid SUPABASE_URL: {}", e)))?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(config::ConfigError::Message(
                        "SUPABASE_URL must be http(s)".to_string(),
                    ));
                }
            }
        }

        if let Some(raw) = self.site_url.as_deref() {
            if !raw.trim().is_empty() && Url::parse(raw.trim()).is_err() {
                return Err(config::ConfigError::Message(
                    "Invalid SITE_URL".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            host: default_host(),
            port: default_port(),
            supabase_url: None,
            supabase_anon_key: None,
            supabase_service_role_key: None,
            site_url: None,
            timezone: Some("UTC".to_string()),
            run_mode: None,
        }
    }

    #[test]
    fn missing_credentials_resolve_degraded() {
        assert_eq!(base_config().backend_mode(), BackendMode::Degraded);
    }

    #[test]
    fn partial_credentials_resolve_degraded() {
        let mut cfg = base_config();
        cfg.supabase_url = Some("https://acme.supabase.co".to_string());
        assert_eq!(cfg.backend_mode(), BackendMode::Degraded);

        let mut cfg = base_config();
        cfg.supabase_anon_key = Some("anon".to_string());
        assert_eq!(cfg.backend_mode(), BackendMode::Degraded);
    }

    #[test]
    fn full_credentials_resolve_ready_with_derived_urls() {
        let mut cfg = base_config();
        cfg.supabase_url = Some("https://acme.supabase.co/".to_string());
        cfg.supabase_anon_key = Some("anon".to_string());

        match cfg.backend_mode() {
            BackendMode::Ready {
                rest_url,
                auth_url,
                storage_url,
                anon_key,
            } => {
                assert_eq!(rest_url, "https://acme.supabase.co/rest/v1");
                assert_eq!(auth_url, "https://acme.supabase.co/auth/v1");
                assert_eq!(storage_url, "https://acme.supabase.co/storage/v1");
                assert_eq!(anon_key, "anon");
            }
            BackendMode::Degraded => panic!("expected Ready"),
        }
    }

    #[test]
    fn validation_rejects_low_ports_and_bad_timezones() {
        let mut cfg = base_config();
        cfg.port = 80;
        assert!(cfg.validate().is_err());

        let mut cfg = base_config();
        cfg.timezone = Some("Mars/Olympus".to_string());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validation_rejects_malformed_backend_url() {
        let mut cfg = base_config();
        cfg.supabase_url = Some("not a url".to_string());
        assert!(cfg.validate().is_err());
    }
}
