use crate::{
    error::ConfigError,
    grader::{check_files::AssessmentPieces, results::TestResultStore},
    messages::Messages,
};
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub struct SubmissionUser {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// The part of the platform's submission metadata the grader needs: who submitted.
#[derive(Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub struct SubmissionMetadata {
    #[serde(default)]
    pub users: Vec<SubmissionUser>,
}

impl SubmissionMetadata {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn emails(&self) -> String {
        self.users
            .iter()
            .map(|u| u.email.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn names(&self) -> String {
        self.users
            .iter()
            .map(|u| u.name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// State shared by the steps of one grading run.
///
/// File checking fills `pieces`; the assessment step reads them and is the only writer of
/// `test_results`, which stays `None` until the first piece is published.
#[derive(Debug, Default)]
pub struct GradingContext {
    pub metadata: SubmissionMetadata,
    pub pieces: Option<AssessmentPieces>,
    pub test_results: Option<TestResultStore>,
    pub messages: Messages,
}

impl GradingContext {
    pub fn new(metadata: SubmissionMetadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_read_platform_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submission_metadata.json");
        fs::write(
            &path,
            r#"{
              "id": 123,
              "created_at": "2025-01-01T00:00:00Z",
              "users": [
                {"email": "a@berkeley.edu", "name": "Ada", "id": 1},
                {"email": "b@berkeley.edu", "name": "Bo"}
              ]
            }"#,
        )
        .unwrap();
        let metadata = SubmissionMetadata::from_path(&path).unwrap();
        assert_eq!(metadata.emails(), "a@berkeley.edu,b@berkeley.edu");
        assert_eq!(metadata.names(), "Ada,Bo");
    }

    #[test]
    fn should_report_unreadable_metadata() {
        let err = SubmissionMetadata::from_path(Path::new("/nonexistent/meta.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
