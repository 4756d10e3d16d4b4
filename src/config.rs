use std::{env, str::FromStr};

use chrono::{Duration, Weekday};

use crate::schedule::{BusinessHours, WallTime};

const DEFAULT_DATABASE_URL: &str = "sqlite://./data/barbershop.db";
const DEFAULT_ADMIN_PASSWORD: &str = "change-me";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub admin_password: String,
    pub session_ttl: Duration,
    pub hours: BusinessHours,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a HH:MM time, got `{value}`")]
    Time { name: &'static str, value: String },
    #[error("{name} must be a positive number, got `{value}`")]
    Number { name: &'static str, value: String },
    #[error("CLOSED_DAYS contains an unknown weekday `{0}`")]
    Weekday(String),
    #[error("BUSINESS_OPEN must be earlier than BUSINESS_CLOSE")]
    EmptyDay,
}

impl AppConfig {
    /// Reads configuration from the process environment, after loading a
    /// `.env` file when one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let port = lookup("PORT")
            .and_then(|value| value.parse().ok())
            .unwrap_or(8080);

        let admin_password = match lookup("ADMIN_PASSWORD").filter(|value| !value.trim().is_empty()) {
            Some(password) => password,
            None => {
                log::warn!(
                    "ADMIN_PASSWORD not set. Using default password '{DEFAULT_ADMIN_PASSWORD}'. Set ADMIN_PASSWORD in production."
                );
                DEFAULT_ADMIN_PASSWORD.to_string()
            }
        };

        let session_hours = number(&lookup, "SESSION_TTL_HOURS", 12)?;
        let open = time(&lookup, "BUSINESS_OPEN", "09:00")?;
        let close = time(&lookup, "BUSINESS_CLOSE", "21:00")?;
        if open >= close {
            return Err(ConfigError::EmptyDay);
        }
        let slot_interval = number(&lookup, "SLOT_INTERVAL_MINUTES", 30)?;
        let closed_days = lookup("CLOSED_DAYS")
            .unwrap_or_else(|| "sun".to_string())
            .split(',')
            .map(str::trim)
            .filter(|day| !day.is_empty())
            .map(|day| Weekday::from_str(day).map_err(|_| ConfigError::Weekday(day.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            database_url,
            port,
            admin_password,
            session_ttl: Duration::hours(i64::from(session_hours)),
            hours: BusinessHours {
                open,
                close,
                slot_interval,
                closed_days,
            },
        })
    }
}

fn time(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: &str,
) -> Result<WallTime, ConfigError> {
    let value = lookup(name).unwrap_or_else(|| default.to_string());
    WallTime::parse_24h(&value).ok_or(ConfigError::Time { name, value })
}

fn number(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u32,
) -> Result<u32, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<u32>() {
            Ok(parsed) if parsed > 0 => Ok(parsed),
            _ => Err(ConfigError::Number { name, value }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_match_the_shop() {
        let config = config_from(&[]).expect("defaults are valid");
        assert_eq!(config.port, 8080);
        assert_eq!(config.hours, BusinessHours::default());
        assert_eq!(config.session_ttl, Duration::hours(12));
        assert_eq!(config.admin_password, DEFAULT_ADMIN_PASSWORD);
    }

    #[test]
    fn reads_custom_hours_and_closed_days() {
        let config = config_from(&[
            ("BUSINESS_OPEN", "10:00"),
            ("BUSINESS_CLOSE", "18:30"),
            ("SLOT_INTERVAL_MINUTES", "15"),
            ("CLOSED_DAYS", "sun, mon"),
        ])
        .expect("valid config");
        assert_eq!(config.hours.open, WallTime::at(10, 0));
        assert_eq!(config.hours.close, WallTime::at(18, 30));
        assert_eq!(config.hours.slot_interval, 15);
        assert_eq!(config.hours.closed_days, vec![Weekday::Sun, Weekday::Mon]);
    }

    #[test]
    fn rejects_inverted_hours() {
        let result = config_from(&[("BUSINESS_OPEN", "20:00"), ("BUSINESS_CLOSE", "09:00")]);
        assert!(matches!(result, Err(ConfigError::EmptyDay)));
    }

    #[test]
    fn rejects_zero_interval() {
        let result = config_from(&[("SLOT_INTERVAL_MINUTES", "0")]);
        assert!(matches!(result, Err(ConfigError::Number { .. })));
    }
}
