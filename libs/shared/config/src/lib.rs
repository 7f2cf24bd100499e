use std::env;
use tracing::warn;

/// Default clinic opening hour (09:00) used when the environment is silent.
pub const DEFAULT_OPEN_HOUR: u32 = 9;
/// Default clinic closing hour (17:00) used when the environment is silent.
pub const DEFAULT_CLOSE_HOUR: u32 = 17;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub clinic_open_hour: u32,
    pub clinic_close_hour: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            clinic_open_hour: parse_hour("CLINIC_OPEN_HOUR", DEFAULT_OPEN_HOUR),
            clinic_close_hour: parse_hour("CLINIC_CLOSE_HOUR", DEFAULT_CLOSE_HOUR),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }
        if config.clinic_open_hour >= config.clinic_close_hour {
            warn!(
                "Clinic hours {}..{} are inverted, falling back to defaults",
                config.clinic_open_hour, config.clinic_close_hour
            );
            return Self {
                clinic_open_hour: DEFAULT_OPEN_HOUR,
                clinic_close_hour: DEFAULT_CLOSE_HOUR,
                ..config
            };
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }
}

fn parse_hour(var: &str, default: u32) -> u32 {
    match env::var(var) {
        Ok(raw) => match raw.parse::<u32>() {
            Ok(hour) if hour <= 24 => hour,
            _ => {
                warn!("{} has invalid value {:?}, using {}", var, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_standard_clinic_day() {
        assert_eq!(DEFAULT_OPEN_HOUR, 9);
        assert_eq!(DEFAULT_CLOSE_HOUR, 17);
    }

    #[test]
    fn unconfigured_when_supabase_vars_missing() {
        let config = AppConfig {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_jwt_secret: String::new(),
            clinic_open_hour: DEFAULT_OPEN_HOUR,
            clinic_close_hour: DEFAULT_CLOSE_HOUR,
        };
        assert!(!config.is_configured());
    }
}
