//! Grading step for jh61b-style Java assessments.
//!
//! Pieces of a submission are resolved against candidate submission directories, each live
//! piece is exercised by running the jh61b harness once per assessment file, and the
//! resulting test entries are aggregated into per-piece scores.

pub mod config;
pub mod context;
pub mod error;
pub mod grader;
pub mod messages;

#[cfg(test)]
mod utils;

pub use config::Config;
pub use context::{GradingContext, SubmissionMetadata, SubmissionUser};
pub use error::{ConfigError, RunnerError};
pub use grader::{Grader, GradingOutcome, Step, StepOutcome};
pub use grader::check_files::{AssessmentPieces, FailedPiece};
pub use grader::results::{Jh61bResults, TestResult, TestResultStore, TestStatus};
pub use grader::score::Mode;
pub use messages::{Audience, Message, Messages};

use serde::Deserialize;
use serde::Serialize;

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum LoggingMode {
    Silent,
    #[default]
    Normal,
    Verbose,
}

impl LoggingMode {
    pub fn level_filter(self) -> log::LevelFilter {
        match self {
            LoggingMode::Silent => log::LevelFilter::Off,
            LoggingMode::Normal => log::LevelFilter::Info,
            LoggingMode::Verbose => log::LevelFilter::Debug,
        }
    }
}
