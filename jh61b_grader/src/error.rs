use std::{io, path::PathBuf};
use thiserror::Error;

/// Errors detected before any assessment runs. Every variant aborts the whole grading run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("at least one submission root must be configured")]
    NoSubmissionRoots,
    #[error("command timeout for {scope} must be a positive number of seconds")]
    InvalidTimeout { scope: String },
    #[error("harness launcher {0} is not executable")]
    LauncherNotExecutable(PathBuf),
    #[error("files marked for student submission found in grader:\n{}", .0.join("\n"))]
    StudentFilesInGrader(Vec<String>),
}

/// Failures of the process runner itself. A nonzero exit status is never one of these.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("empty command")]
    EmptyCommand,
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to capture process output: {0}")]
    Capture(#[source] io::Error),
    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}
