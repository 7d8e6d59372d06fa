// Model tier selection
//
// Maps a recording's probed duration to a whisper model tier. Larger, slower
// models are reserved for recordings long enough that accuracy gains amortize
// the extra latency; short recordings favor turnaround speed.

use std::fmt;

use serde::Serialize;

use crate::config::ModelThresholds;

/// Named size/quality levels of the speech-to-text engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelTier {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
    LargeV3,
}

impl ModelTier {
    /// Model name as passed to the whisper command
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Tiny => "tiny",
            ModelTier::Base => "base",
            ModelTier::Small => "small",
            ModelTier::Medium => "medium",
            ModelTier::Large => "large",
            ModelTier::LargeV3 => "large-v3",
        }
    }

    /// Parse a configured tier name, falling back to `Base` on anything unknown
    pub fn from_name(name: &str) -> ModelTier {
        match name {
            "tiny" => ModelTier::Tiny,
            "base" => ModelTier::Base,
            "small" => ModelTier::Small,
            "medium" => ModelTier::Medium,
            "large" => ModelTier::Large,
            "large-v3" => ModelTier::LargeV3,
            _ => ModelTier::Base,
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Select a model tier from a probed duration.
///
/// Total over its whole input space: an unknown duration yields the
/// configured default tier rather than an error.
pub fn select_model(
    duration: Option<f64>,
    thresholds: &ModelThresholds,
    default_tier: ModelTier,
) -> ModelTier {
    let secs = match duration {
        Some(secs) => secs,
        None => return default_tier,
    };

    if secs < thresholds.small_secs {
        ModelTier::Tiny
    } else if secs < thresholds.medium_secs {
        ModelTier::Small
    } else if secs < thresholds.large_secs {
        ModelTier::Medium
    } else if secs < thresholds.largest_secs {
        ModelTier::Large
    } else {
        ModelTier::LargeV3
    }
}
