use crate::error::{LotteryError, Result};
use crate::types::Amount;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryConfig {
    pub draw_duration: Duration,
    pub tick_interval: Duration,
    pub min_stake: Amount,
    pub min_withdrawal: Amount,
    pub history_display: usize,
    pub currency: String,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            draw_duration: Duration::from_secs(10 * 60), // 10 minutes
            tick_interval: Duration::from_secs(1),
            min_stake: Amount::from_major(50),
            min_withdrawal: Amount::from_major(20_000),
            history_display: 5,
            currency: "NGN".to_string(),
        }
    }
}

impl LotteryConfig {
    pub fn with_draw_duration(mut self, duration: Duration) -> Self {
        self.draw_duration = duration;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.draw_duration.is_zero() {
            return Err(LotteryError::config("Draw duration must be greater than 0"));
        }

        if self.tick_interval.is_zero() {
            return Err(LotteryError::config("Tick interval must be greater than 0"));
        }

        if self.tick_interval > self.draw_duration {
            return Err(LotteryError::config(
                "Tick interval cannot exceed the draw duration",
            ));
        }

        if self.min_stake.is_zero() {
            return Err(LotteryError::config("Minimum stake must be greater than 0"));
        }

        if self.history_display == 0 {
            return Err(LotteryError::config(
                "History display window must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = LotteryConfig::default();
        config.validate().unwrap();
        assert_eq!(config.draw_duration, Duration::from_secs(600));
        assert_eq!(config.min_stake, Amount::from_major(50));
    }

    #[test]
    fn test_rejects_bad_intervals() {
        let config = LotteryConfig::default().with_draw_duration(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = LotteryConfig {
            tick_interval: Duration::from_secs(5),
            draw_duration: Duration::from_secs(2),
            ..LotteryConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LotteryConfig = serde_json::from_str(r#"{"history_display": 10}"#).unwrap();
        assert_eq!(config.history_display, 10);
        assert_eq!(config.min_withdrawal, Amount::from_major(20_000));
    }
}
