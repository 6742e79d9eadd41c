use anyhow::{Context, Result};
use std::env;

use slot_resolver::{validate_duration, DEFAULT_HORIZON_DAYS, DEFAULT_SLOT_MINUTES};

/// Settings read from the environment (and `.env`); command-line flags win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub default_duration: i64,
    pub horizon_days: u32,
    pub allow_same_day: bool,
    pub timezone: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_duration: DEFAULT_SLOT_MINUTES,
            horizon_days: DEFAULT_HORIZON_DAYS,
            allow_same_day: true,
            timezone: "UTC".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let default_duration = match lookup("SLOTS_DEFAULT_DURATION") {
            Some(val) => val
                .trim()
                .parse::<i64>()
                .context("Failed to parse SLOTS_DEFAULT_DURATION")?,
            None => defaults.default_duration,
        };
        validate_duration(default_duration).context("SLOTS_DEFAULT_DURATION")?;

        let horizon_days = match lookup("SLOTS_HORIZON_DAYS") {
            Some(val) => val
                .trim()
                .parse::<u32>()
                .context("Failed to parse SLOTS_HORIZON_DAYS")?,
            None => defaults.horizon_days,
        };

        let allow_same_day = match lookup("SLOTS_ALLOW_SAME_DAY") {
            Some(val) => parse_flag(&val).context("Failed to parse SLOTS_ALLOW_SAME_DAY")?,
            None => defaults.allow_same_day,
        };

        let timezone = lookup("SLOTS_TIMEZONE")
            .map(|tz| tz.trim().to_string())
            .filter(|tz| !tz.is_empty())
            .unwrap_or(defaults.timezone);

        Ok(Config {
            default_duration,
            horizon_days,
            allow_same_day,
            timezone,
        })
    }
}

fn parse_flag(val: &str) -> Result<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(config_from(&[]).unwrap(), Config::default());
    }

    #[test]
    fn test_reads_all_variables() {
        let config = config_from(&[
            ("SLOTS_DEFAULT_DURATION", "30"),
            ("SLOTS_HORIZON_DAYS", "14"),
            ("SLOTS_ALLOW_SAME_DAY", "no"),
            ("SLOTS_TIMEZONE", "Europe/Berlin"),
        ])
        .unwrap();
        assert_eq!(config.default_duration, 30);
        assert_eq!(config.horizon_days, 14);
        assert!(!config.allow_same_day);
        assert_eq!(config.timezone, "Europe/Berlin");
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = config_from(&[("SLOTS_DEFAULT_DURATION", "0")]).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid duration"), "got: {err:#}");

        let err = config_from(&[("SLOTS_HORIZON_DAYS", "-1")]).unwrap_err();
        assert!(err.to_string().contains("SLOTS_HORIZON_DAYS"), "got: {err}");

        let err = config_from(&[("SLOTS_ALLOW_SAME_DAY", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("SLOTS_ALLOW_SAME_DAY"), "got: {err}");
    }
}
