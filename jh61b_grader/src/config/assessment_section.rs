use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::grader::score::Mode;

pub const DEFAULT_LAUNCHER: &str = "java";
pub const DEFAULT_SIGNAL_EXIT_THRESHOLD: i32 = 128;

/// Per-piece overrides for the assessment step.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct PieceAssessmentConfig {
    /// JVM options appended after the global defaults.
    pub java_options: Vec<String>,
    /// Arguments appended after the harness flags.
    pub args: Vec<String>,
    /// Seconds; overrides the step-wide timeout.
    pub command_timeout: Option<u64>,
    pub require_full_score: bool,
    /// Number given to the summary entry under the full-score policy.
    pub aggregated_number: Option<String>,
}

impl PieceAssessmentConfig {
    pub fn mode(&self) -> Mode {
        if self.require_full_score {
            Mode::Absolute
        } else {
            Mode::Weighted
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct AssessmentSection {
    /// Program that loads the harness. Either a name resolved through `PATH` or a path.
    pub launcher: String,
    pub default_java_options: Vec<String>,
    /// Seconds; applies to pieces without their own timeout. `None` waits forever.
    pub command_timeout: Option<u64>,
    /// Exit codes above this value (or negative) are treated as a kill by the OS.
    pub signal_exit_threshold: i32,
    pub piece_configs: IndexMap<String, PieceAssessmentConfig>,
}

impl Default for AssessmentSection {
    fn default() -> Self {
        Self {
            launcher: DEFAULT_LAUNCHER.to_string(),
            default_java_options: vec![],
            command_timeout: None,
            signal_exit_threshold: DEFAULT_SIGNAL_EXIT_THRESHOLD,
            piece_configs: IndexMap::new(),
        }
    }
}

impl AssessmentSection {
    /// Overrides for `piece_name`, or the defaults when none were configured.
    pub fn piece_config(&self, piece_name: &str) -> PieceAssessmentConfig {
        self.piece_configs
            .get(piece_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Piece timeout, else step timeout, else unbounded.
    pub fn timeout_for(&self, piece_config: &PieceAssessmentConfig) -> Option<Duration> {
        piece_config
            .command_timeout
            .or(self.command_timeout)
            .map(Duration::from_secs)
    }
}
