//! Gauntlet configuration (JSON, every field optional).

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::error::{GauntletError, Result};

pub const DEFAULT_TOTAL_LEVELS: u32 = 50;

/// Top-level settings handed to `Orchestrator::new` / `start_gauntlet`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GauntletConfig {
    pub total_levels: u32,
    /// When set, `next_level` refuses to leave a level that is neither
    /// completed nor externally verified. Off by default: the shell greys out
    /// its "next" button instead.
    pub gate_next_on_completion: bool,
    /// Fixed seed for every cosmetic random choice; `None` seeds from the
    /// browser's entropy source.
    pub seed: Option<u64>,
    pub log_level: String,
    pub engagement: EngagementConfig,
    pub verification: VerificationConfig,
}

impl Default for GauntletConfig {
    fn default() -> Self {
        Self {
            total_levels: DEFAULT_TOTAL_LEVELS,
            gate_next_on_completion: false,
            seed: None,
            log_level: "info".to_string(),
            engagement: EngagementConfig::default(),
            verification: VerificationConfig::default(),
        }
    }
}

/// Patience meter and elapsed clock tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    pub tick_ms: u32,
    pub click_delta_min: i32,
    pub click_delta_max: i32,
    /// A taunt pops up on every n-th raw click inside the challenge.
    pub taunt_every: u32,
    pub taunts: Vec<String>,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            tick_ms: 500,
            click_delta_min: 1,
            click_delta_max: 3,
            taunt_every: 7,
            taunts: vec![
                "You're not worthy yet.".to_string(),
                "Snail is watching.".to_string(),
                "Try again, human.".to_string(),
            ],
        }
    }
}

/// Fake verification pacing and flavor text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub step_delay_min_ms: u32,
    pub step_delay_max_ms: u32,
    pub settle_ms: u32,
    /// Progress bar targets in percent; values above 100 are drawn as 100.
    pub progress_steps: Vec<u32>,
    pub messages: Vec<String>,
    pub default_success: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            step_delay_min_ms: 400,
            step_delay_max_ms: 1000,
            settle_ms: 400,
            progress_steps: vec![3, 13, 37, 69, 88, 97, 420, 100],
            messages: vec![
                "Measuring patience cache…".to_string(),
                "Consulting cabbage oracle…".to_string(),
                "Analyzing funky vibes…".to_string(),
                "Estimating snail energy…".to_string(),
            ],
            default_success: "Snails approve.".to_string(),
        }
    }
}

impl GauntletConfig {
    /// Parse from JSON and validate. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GauntletConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_levels == 0 {
            return Err(GauntletError::Config(
                "total_levels must be at least 1".to_string(),
            ));
        }
        let e = &self.engagement;
        if e.tick_ms == 0 {
            return Err(GauntletError::Config("engagement.tick_ms must be > 0".to_string()));
        }
        if e.taunt_every == 0 {
            return Err(GauntletError::Config(
                "engagement.taunt_every must be at least 1".to_string(),
            ));
        }
        if e.click_delta_min > e.click_delta_max {
            return Err(GauntletError::Config(format!(
                "engagement click delta range is empty ({} > {})",
                e.click_delta_min, e.click_delta_max
            )));
        }
        if e.taunts.is_empty() {
            return Err(GauntletError::Config("engagement.taunts is empty".to_string()));
        }
        let v = &self.verification;
        if v.step_delay_min_ms > v.step_delay_max_ms {
            return Err(GauntletError::Config(format!(
                "verification step delay range is empty ({} > {})",
                v.step_delay_min_ms, v.step_delay_max_ms
            )));
        }
        if v.progress_steps.is_empty() || v.messages.is_empty() {
            return Err(GauntletError::Config(
                "verification needs at least one progress step and one message".to_string(),
            ));
        }
        Ok(())
    }

    /// Unknown level names fall back to `Info`.
    pub fn log_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}
