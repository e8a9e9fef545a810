use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, path::PathBuf};

/// A gradeable unit as declared in the configuration. Paths are relative: student files to a
/// submission root, assessment files to the grader root.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Piece {
    #[serde(default)]
    pub student_files: BTreeSet<PathBuf>,
    #[serde(default)]
    pub assessment_files: BTreeSet<PathBuf>,
    /// Submission root the piece was resolved against. Only set on live pieces.
    #[serde(skip)]
    pub submission_root: Option<PathBuf>,
}

impl Piece {
    pub fn new<S, A>(student_files: S, assessment_files: A) -> Self
    where
        S: IntoIterator,
        S::Item: Into<PathBuf>,
        A: IntoIterator,
        A::Item: Into<PathBuf>,
    {
        Self {
            student_files: student_files.into_iter().map(Into::into).collect(),
            assessment_files: assessment_files.into_iter().map(Into::into).collect(),
            submission_root: None,
        }
    }
}
