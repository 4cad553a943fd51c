//! Table configuration
//!
//! A `TableConfig` is an immutable value. A session reads a fresh copy at the
//! start of every round, so changes made mid-round take effect from the next
//! round.

use crate::{Result, TableError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long an interactive seat may deliberate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum DelayProfile {
    /// Wait for explicit input indefinitely
    #[default]
    Disabled,
    /// Five seconds
    Short,
    /// Twenty seconds
    Long,
}

impl DelayProfile {
    pub fn delay(self) -> Option<Duration> {
        match self {
            DelayProfile::Disabled => None,
            DelayProfile::Short => Some(Duration::from_secs(5)),
            DelayProfile::Long => Some(Duration::from_secs(20)),
        }
    }
}

/// Display pacing before each AI action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum AiSpeed {
    /// No pause (simulations)
    #[default]
    Instant,
    Fast,
    Normal,
    Slow,
}

impl AiSpeed {
    pub fn pause(self) -> Duration {
        match self {
            AiSpeed::Instant => Duration::ZERO,
            AiSpeed::Fast => Duration::from_millis(150),
            AiSpeed::Normal => Duration::from_millis(400),
            AiSpeed::Slow => Duration::from_millis(800),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub decision_delay: DelayProfile,
    pub ai_speed: AiSpeed,
    /// Declare every winning hand without asking
    ///
    /// Applies to every seat, AI and interactive alike. An AI win taken
    /// this way also skips the `ai_speed` pause.
    pub auto_win: bool,
    /// Stop after this many rounds (`None` plays until closed)
    pub max_rounds: Option<u32>,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            decision_delay: DelayProfile::Disabled,
            ai_speed: AiSpeed::Instant,
            auto_win: false,
            max_rounds: Some(1),
        }
    }
}

impl TableConfig {
    pub fn with_decision_delay(mut self, delay: DelayProfile) -> Self {
        self.decision_delay = delay;
        self
    }

    pub fn with_ai_speed(mut self, speed: AiSpeed) -> Self {
        self.ai_speed = speed;
        self
    }

    pub fn with_auto_win(mut self, auto_win: bool) -> Self {
        self.auto_win = auto_win;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: Option<u32>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == Some(0) {
            return Err(TableError::InvalidConfig(
                "max_rounds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_profiles() {
        assert_eq!(DelayProfile::Disabled.delay(), None);
        assert_eq!(DelayProfile::Short.delay(), Some(Duration::from_secs(5)));
        assert_eq!(DelayProfile::Long.delay(), Some(Duration::from_secs(20)));
    }

    #[test]
    fn test_builder() {
        let config = TableConfig::default()
            .with_decision_delay(DelayProfile::Short)
            .with_ai_speed(AiSpeed::Slow)
            .with_auto_win(true)
            .with_max_rounds(Some(4));
        assert_eq!(config.decision_delay, DelayProfile::Short);
        assert_eq!(config.ai_speed.pause(), Duration::from_millis(800));
        assert!(config.auto_win);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let config = TableConfig::default().with_max_rounds(Some(0));
        assert!(matches!(config.validate(), Err(TableError::InvalidConfig(_))));
    }
}
