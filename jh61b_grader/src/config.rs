use crate::{LoggingMode, error::ConfigError};
use indexmap::IndexMap;
use is_executable::is_executable;
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub(crate) mod assessment_section;
pub(crate) mod pieces_section;

pub use assessment_section::{AssessmentSection, PieceAssessmentConfig};
pub use pieces_section::Piece;

/// Directory listed for staff when none of the submission roots exist.
pub const DEFAULT_SUBMISSION_PARENT: &str = "/autograder/submission";

fn default_submission_parent() -> PathBuf {
    PathBuf::from(DEFAULT_SUBMISSION_PARENT)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<PathBuf>, D::Error> {
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(root) => vec![root],
        OneOrMany::Many(roots) => roots,
    })
}

/// Configuration of a grading run.
///
/// Deserializing only checks the shape of the document. Cross-field rules (timeouts,
/// launcher, files that must not ship with the grader) are checked by [`Config::validate`],
/// which must run once the configuration is fully assembled and before anything executes.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub grader_root: PathBuf,
    /// Candidate directories holding the student's work, tried in order. Accepts a single
    /// path as well.
    #[serde(alias = "submission_root", deserialize_with = "one_or_many")]
    pub submission_roots: Vec<PathBuf>,
    #[serde(default = "default_submission_parent")]
    pub submission_parent: PathBuf,
    #[serde(default)]
    pub logging_mode: LoggingMode,
    /// Pieces in declaration order.
    pub pieces: IndexMap<String, Piece>,
    #[serde(default)]
    pub assessment: AssessmentSection,
}

impl Config {
    pub fn new(
        grader_root: PathBuf,
        submission_roots: Vec<PathBuf>,
        pieces: IndexMap<String, Piece>,
    ) -> Self {
        Self {
            grader_root,
            submission_roots,
            submission_parent: default_submission_parent(),
            logging_mode: LoggingMode::default(),
            pieces,
            assessment: AssessmentSection::default(),
        }
    }

    pub fn from_json_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.submission_roots.is_empty() {
            return Err(ConfigError::NoSubmissionRoots);
        }

        if self.assessment.command_timeout == Some(0) {
            return Err(ConfigError::InvalidTimeout {
                scope: "assessment".to_string(),
            });
        }
        for (name, piece_config) in &self.assessment.piece_configs {
            if piece_config.command_timeout == Some(0) {
                return Err(ConfigError::InvalidTimeout {
                    scope: format!("piece {name}"),
                });
            }
            if !self.pieces.contains_key(name) {
                log::warn!("assessment settings given for undeclared piece {name}");
            }
        }

        // A bare program name is looked up in PATH at spawn time; only check explicit paths.
        let launcher = Path::new(&self.assessment.launcher);
        if launcher.components().count() > 1 {
            let launcher = self.grader_root.join(launcher);
            if !is_executable(&launcher) {
                return Err(ConfigError::LauncherNotExecutable(launcher));
            }
        }

        let mut bad_files = vec![];
        for piece in self.pieces.values() {
            for file in &piece.student_files {
                let grader_file = self.grader_root.join(file);
                if grader_file.is_file() {
                    bad_files.push(grader_file.display().to_string());
                }
            }
        }
        if !bad_files.is_empty() {
            bad_files.sort();
            bad_files.dedup();
            return Err(ConfigError::StudentFilesInGrader(bad_files));
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_macros::{test_invalid_deserialization, test_valid_deserialization};
    use std::time::Duration;

    test_valid_deserialization!(
        should_accept_minimal_config,
        r#"{"grader_root": "/g", "submission_roots": ["/s"], "pieces": {}}"#,
        Config
    );
    test_valid_deserialization!(
        should_accept_single_submission_root,
        r#"{"grader_root": "/g", "submission_root": "/s", "pieces": {}}"#,
        Config
    );
    test_invalid_deserialization!(should_panic_with_empty_json, r#"{}"#, Config);
    test_invalid_deserialization!(
        should_panic_with_unknown_field,
        r#"{"grader_root": "/g", "submission_roots": ["/s"], "pieces": {}, "magic": 1}"#,
        Config
    );
    test_invalid_deserialization!(
        should_panic_with_unknown_piece_field,
        r#"{"grader_root": "/g", "submission_roots": ["/s"],
            "pieces": {"hw1": {"student_files": [], "tests": []}}}"#,
        Config
    );
    test_invalid_deserialization!(
        should_panic_with_invalid_logging_mode,
        r#"{"grader_root": "/g", "submission_roots": ["/s"], "pieces": {}, "logging_mode": "loud"}"#,
        Config
    );

    mod deserialization {
        use super::*;

        #[test]
        fn should_preserve_piece_declaration_order() {
            let config: Config = serde_json::from_str(
                r#"{
                  "grader_root": "/g",
                  "submission_roots": ["/s"],
                  "pieces": {
                    "zeta": {"student_files": ["Z.java"], "assessment_files": []},
                    "alpha": {"student_files": ["A.java"], "assessment_files": []},
                    "mid": {}
                  }
                }"#,
            )
            .unwrap();
            assert_eq!(
                config.pieces.keys().collect::<Vec<_>>(),
                vec!["zeta", "alpha", "mid"]
            );
        }

        #[test]
        fn should_read_assessment_section() {
            let config: Config = serde_json::from_str(
                r#"{
                  "grader_root": "/g",
                  "submission_roots": ["/s1", "/s2"],
                  "logging_mode": "verbose",
                  "pieces": {"hw1": {"student_files": ["Hw1.java"], "assessment_files": ["TestHw1.java"]}},
                  "assessment": {
                    "default_java_options": ["-Xmx256m"],
                    "command_timeout": 30,
                    "piece_configs": {
                      "hw1": {"args": ["--verbose"], "require_full_score": true, "aggregated_number": "1"}
                    }
                  }
                }"#,
            )
            .unwrap();
            assert_eq!(config.logging_mode, LoggingMode::Verbose);
            assert_eq!(config.submission_parent, PathBuf::from(DEFAULT_SUBMISSION_PARENT));
            assert_eq!(config.assessment.launcher, "java");
            assert_eq!(config.assessment.signal_exit_threshold, 128);
            let piece_config = config.assessment.piece_config("hw1");
            assert!(piece_config.require_full_score);
            assert_eq!(piece_config.aggregated_number.as_deref(), Some("1"));
            assert_eq!(
                config.assessment.timeout_for(&piece_config),
                Some(Duration::from_secs(30))
            );
        }
    }

    mod validation {
        use super::*;
        use std::fs;

        fn config_for(grader_root: &Path, pieces: IndexMap<String, Piece>) -> Config {
            Config::new(
                grader_root.to_path_buf(),
                vec![PathBuf::from("/nonexistent/submission")],
                pieces,
            )
        }

        #[test]
        fn should_accept_clean_grader_tree() {
            let grader = tempfile::tempdir().unwrap();
            let pieces = IndexMap::from([(
                "hw1".to_string(),
                Piece::new(["Hw1.java"], ["TestHw1.java"]),
            )]);
            config_for(grader.path(), pieces).validate().unwrap();
        }

        #[test]
        fn should_reject_student_files_in_grader() {
            let grader = tempfile::tempdir().unwrap();
            fs::write(grader.path().join("Hw1.java"), "class Hw1 {}").unwrap();
            let pieces = IndexMap::from([(
                "hw1".to_string(),
                Piece::new(["Hw1.java"], ["TestHw1.java"]),
            )]);
            match config_for(grader.path(), pieces).validate() {
                Err(ConfigError::StudentFilesInGrader(files)) => {
                    assert_eq!(files.len(), 1);
                    assert!(files[0].ends_with("Hw1.java"));
                }
                other => panic!("unexpected validation result: {other:?}"),
            }
        }

        #[test]
        fn should_ignore_directories_named_like_student_files() {
            let grader = tempfile::tempdir().unwrap();
            fs::create_dir(grader.path().join("Hw1.java")).unwrap();
            let pieces = IndexMap::from([("hw1".to_string(), Piece::new(["Hw1.java"], ["T.java"]))]);
            config_for(grader.path(), pieces).validate().unwrap();
        }

        #[test]
        fn should_reject_empty_submission_roots() {
            let mut config = config_for(Path::new("/g"), IndexMap::new());
            config.submission_roots.clear();
            assert!(matches!(
                config.validate(),
                Err(ConfigError::NoSubmissionRoots)
            ));
        }

        #[test]
        fn should_reject_zero_timeouts() {
            let mut config = config_for(Path::new("/g"), IndexMap::new());
            config.assessment.command_timeout = Some(0);
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidTimeout { .. })
            ));

            config.assessment.command_timeout = Some(10);
            config.assessment.piece_configs.insert(
                "hw1".to_string(),
                PieceAssessmentConfig {
                    command_timeout: Some(0),
                    ..Default::default()
                },
            );
            match config.validate() {
                Err(ConfigError::InvalidTimeout { scope }) => assert_eq!(scope, "piece hw1"),
                other => panic!("unexpected validation result: {other:?}"),
            }
        }

        #[test]
        fn should_reject_missing_launcher_path() {
            let grader = tempfile::tempdir().unwrap();
            let mut config = config_for(grader.path(), IndexMap::new());
            config.assessment.launcher = "bin/harness".to_string();
            assert!(matches!(
                config.validate(),
                Err(ConfigError::LauncherNotExecutable(_))
            ));
        }
    }
}
