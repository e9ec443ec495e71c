use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use ans_core::store::ReminderStore;
use ans_core::BundleOption;
use tracing::{info, warn};

pub const DEFAULT_BUNDLE: &str = "com.example.app";
pub const DEFAULT_TICK_MS: u64 = 1000;
pub const MIN_TICK_MS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub bundle: String,
    pub uid: Option<i32>,
    pub store_path: Option<PathBuf>,
    pub tick: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            bundle: DEFAULT_BUNDLE.to_string(),
            uid: None,
            store_path: None,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(bundle) = lookup("ANS_BUNDLE") {
            let bundle = bundle.trim();
            if !bundle.is_empty() {
                config.bundle = bundle.to_string();
            }
        }
        if let Some(uid) = lookup("ANS_UID") {
            match uid.trim().parse::<i32>() {
                Ok(value) => config.uid = Some(value),
                Err(err) => warn!(%uid, %err, "ignoring invalid ANS_UID"),
            }
        }
        if let Some(path) = lookup("ANS_STORE_PATH") {
            if !path.trim().is_empty() {
                config.store_path = Some(PathBuf::from(path));
            }
        }
        if let Some(tick) = lookup("ANS_TICK_MS") {
            match tick.trim().parse::<u64>() {
                Ok(value) => config.tick = Duration::from_millis(value.max(MIN_TICK_MS)),
                Err(err) => warn!(%tick, %err, "ignoring invalid ANS_TICK_MS"),
            }
        }
        config.bundle_option().validate().context("invalid ANS_BUNDLE")?;
        info!(bundle = %config.bundle, store = ?config.store_path, "agent configuration loaded");
        Ok(config)
    }

    pub fn bundle_option(&self) -> BundleOption {
        let bundle = BundleOption::new(self.bundle.clone());
        match self.uid {
            Some(uid) => bundle.with_uid(uid),
            None => bundle,
        }
    }

    pub fn store(&self) -> Option<ReminderStore> {
        self.store_path.as_ref().map(ReminderStore::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = AgentConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AgentConfig::default());
        assert!(config.store().is_none());
    }

    #[test]
    fn parses_values_and_ignores_invalid_numbers() {
        let config = AgentConfig::from_lookup(lookup(&[
            ("ANS_BUNDLE", "com.example.clock"),
            ("ANS_UID", "abc"),
            ("ANS_STORE_PATH", "/tmp/reminders.json"),
            ("ANS_TICK_MS", "1"),
        ]))
        .unwrap();
        assert_eq!(config.bundle, "com.example.clock");
        assert_eq!(config.uid, None);
        assert_eq!(config.tick, Duration::from_millis(MIN_TICK_MS));
        assert_eq!(config.bundle_option().to_string(), "com.example.clock");

        let config =
            AgentConfig::from_lookup(lookup(&[("ANS_UID", "1001"), ("ANS_TICK_MS", "x")]))
                .unwrap();
        assert_eq!(config.uid, Some(1001));
        assert_eq!(config.tick, Duration::from_millis(DEFAULT_TICK_MS));
    }
}
