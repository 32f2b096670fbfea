use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_RATE_URL: &str = "https://cbr.ru";
pub const DEFAULT_RATE_LABEL: &str = "Ключевая ставка";
pub const FALLBACK_PERCENT: f64 = 10.0;
pub const MIN_FEE: i64 = 1;
pub const MIN_TRANSFER: i64 = 2;
pub const PROTECTION_PRICE: i64 = 10;
pub const DOUBLE_ODDS_PRICE: i64 = 8;
pub const PROTECTION_COOLDOWN_DAYS: i64 = 7;
pub const COINS_PER_WIN: i64 = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub rate_url: String,
    pub rate_label: String,
    pub fetch_timeout: Duration,
    pub cache_ttl: Duration,
    pub fallback_percent: f64,
    /// Skips the HTTP provider entirely when set
    pub fixed_rate: Option<f64>,
    pub min_fee: i64,
    pub min_transfer: i64,
    pub protection_price: i64,
    pub double_odds_price: i64,
    /// Days after a protection purchase before the next one is allowed
    pub protection_cooldown_days: i64,
    /// Paid to the round winner and to a protected player who was redrawn
    pub coins_per_win: i64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rate_url: DEFAULT_RATE_URL.to_string(),
            rate_label: DEFAULT_RATE_LABEL.to_string(),
            fetch_timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(3600), // 1 hour
            fallback_percent: FALLBACK_PERCENT,
            fixed_rate: None,
            min_fee: MIN_FEE,
            min_transfer: MIN_TRANSFER,
            protection_price: PROTECTION_PRICE,
            double_odds_price: DOUBLE_ODDS_PRICE,
            protection_cooldown_days: PROTECTION_COOLDOWN_DAYS,
            coins_per_win: COINS_PER_WIN,
        }
    }
}

impl GameConfig {
    /// Read a JSON config file, or fall back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: GameConfig = serde_json::from_str(&content)?;
            tracing::debug!("Loaded game config from {}", path.display());
            config
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.rate_url.is_empty() {
            return Err(CoreError::config("Rate URL cannot be empty"));
        }

        if self.rate_label.is_empty() {
            return Err(CoreError::config("Rate label cannot be empty"));
        }

        if !(self.fallback_percent > 0.0) {
            return Err(CoreError::config("Fallback percent must be greater than 0"));
        }

        if let Some(rate) = self.fixed_rate {
            if !(rate > 0.0) {
                return Err(CoreError::config("Fixed rate must be greater than 0"));
            }
        }

        if self.min_fee < 1 {
            return Err(CoreError::config("Minimum fee must be at least 1"));
        }

        if self.min_transfer < 1 {
            return Err(CoreError::config("Minimum transfer must be at least 1"));
        }

        if self.protection_price < 1 || self.double_odds_price < 1 {
            return Err(CoreError::config("Shop prices must be at least 1"));
        }

        if self.protection_cooldown_days < 0 {
            return Err(CoreError::config("Protection cooldown cannot be negative"));
        }

        if self.coins_per_win < 0 {
            return Err(CoreError::config("Win reward cannot be negative"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.min_transfer, 2);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GameConfig::default();
        config.fallback_percent = 0.0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.fixed_rate = Some(-1.0);
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.min_fee = 0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.double_odds_price = 0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.protection_cooldown_days = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");

        let config = GameConfig::load_or_default(&path).unwrap();
        assert_eq!(config.rate_url, DEFAULT_RATE_URL);

        std::fs::write(&path, r#"{ "fixed_rate": 21.0, "min_transfer": 5 }"#).unwrap();
        let config = GameConfig::load_or_default(&path).unwrap();
        assert_eq!(config.fixed_rate, Some(21.0));
        assert_eq!(config.min_transfer, 5);
        assert_eq!(config.min_fee, MIN_FEE);
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let mut config = GameConfig::default();
        config.fallback_percent = 16.5;
        config.save(&path).unwrap();

        let loaded = GameConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded.fallback_percent, 16.5);
    }
}
