//! Resolution of configured pieces against the candidate submission directories.

use crate::{Config, config::Piece, context::GradingContext, messages::Messages};
use indexmap::IndexMap;
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

pub const NO_SUBMISSION_DIRECTORY: &str = "no submission directory found";
pub const MISSING_REQUIRED_FILES: &str = "missing required files";

#[derive(Serialize, Debug, PartialEq, Eq, Clone)]
pub struct FailedPiece {
    pub reason: String,
}

impl FailedPiece {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Partition of the configured pieces. Every name in `piece_names` is in exactly one of the
/// two maps; `piece_names` keeps declaration order for reporting.
#[derive(Serialize, Debug, Default, PartialEq, Eq, Clone)]
pub struct AssessmentPieces {
    pub piece_names: Vec<String>,
    pub live_pieces: BTreeMap<String, Piece>,
    pub failed_pieces: BTreeMap<String, FailedPiece>,
}

impl AssessmentPieces {
    fn add_live(&mut self, name: &str, piece: Piece) {
        self.piece_names.push(name.to_string());
        self.live_pieces.insert(name.to_string(), piece);
    }

    fn add_failed(&mut self, name: &str, reason: &str) {
        self.piece_names.push(name.to_string());
        self.failed_pieces
            .insert(name.to_string(), FailedPiece::new(reason));
    }

    pub fn all_live(&self) -> bool {
        self.live_pieces.len() == self.piece_names.len()
    }
}

/// `path` made absolute against the current directory, without touching the filesystem.
pub(crate) fn absolute_root(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

pub struct PieceRegistry<'a> {
    grader_root: &'a Path,
    submission_roots: &'a [PathBuf],
    submission_parent: &'a Path,
}

impl<'a> PieceRegistry<'a> {
    pub fn new(
        grader_root: &'a Path,
        submission_roots: &'a [PathBuf],
        submission_parent: &'a Path,
    ) -> Self {
        Self {
            grader_root,
            submission_roots,
            submission_parent,
        }
    }

    /// Resolves every template. The templates themselves are left untouched, so resolving
    /// twice against the same filesystem yields the same partition.
    pub fn resolve(
        &self,
        templates: &IndexMap<String, Piece>,
        messages: &mut Messages,
    ) -> (AssessmentPieces, bool) {
        let mut pieces = AssessmentPieces::default();

        let existing_roots: Vec<&PathBuf> = self
            .submission_roots
            .iter()
            .filter(|root| root.is_dir())
            .collect();

        if existing_roots.is_empty() {
            self.report_missing_submission(messages);
            for name in templates.keys() {
                pieces.add_failed(name, NO_SUBMISSION_DIRECTORY);
            }
            return (pieces, false);
        }

        let grader_root = absolute_root(self.grader_root);
        for (name, template) in templates {
            let matched = existing_roots.iter().find(|root| {
                template
                    .student_files
                    .iter()
                    .all(|file| root.join(file).is_file())
            });

            match matched {
                Some(root) => {
                    let root = absolute_root(root);
                    log::debug!("Piece {name} resolved against {}", root.display());
                    let piece = Piece {
                        student_files: template
                            .student_files
                            .iter()
                            .map(|f| root.join(f))
                            .collect(),
                        assessment_files: template
                            .assessment_files
                            .iter()
                            .map(|f| grader_root.join(f))
                            .collect(),
                        submission_root: Some(root),
                    };
                    pieces.add_live(name, piece);
                }
                None => {
                    messages
                        .both()
                        .error(format!("Missing required files for assessment {name}:"));
                    for root in &existing_roots {
                        for file in &template.student_files {
                            let path = root.join(file);
                            if path.is_file() {
                                messages
                                    .private()
                                    .info(format!("[present] {}", path.display()));
                            } else {
                                messages
                                    .private()
                                    .info(format!("[absent] {}", path.display()));
                                messages.student().error(format!("- {}", path.display()));
                            }
                        }
                    }
                    pieces.add_failed(name, MISSING_REQUIRED_FILES);
                }
            }
        }

        let all_live = pieces.all_live();
        (pieces, all_live)
    }

    fn report_missing_submission(&self, messages: &mut Messages) {
        let candidates = self
            .submission_roots
            .iter()
            .map(|r| r.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        messages
            .both()
            .error(format!("Submission directory not found. Looked in: {candidates}"));

        if !self.submission_parent.is_dir() {
            return;
        }
        match fs::read_dir(self.submission_parent) {
            Ok(entries) => {
                let mut names: Vec<String> = entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect();
                names.sort();
                messages.both().info(format!(
                    "Contents of {}: [{}]",
                    self.submission_parent.display(),
                    names.join(", ")
                ));
            }
            Err(err) => messages.private().warn(format!(
                "Unable to list {}: {err}",
                self.submission_parent.display()
            )),
        }
    }
}

/// The file checking step: resolves the configured pieces and stores the partition in the
/// context for the assessment step.
pub struct CheckFiles<'a> {
    config: &'a Config,
}

impl<'a> CheckFiles<'a> {
    pub const NAME: &'static str = "jh61b.check_files";
    pub const DISPLAY_NAME: &'static str = "File Checking";

    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn run(&self, ctx: &mut GradingContext) -> bool {
        let registry = PieceRegistry::new(
            &self.config.grader_root,
            &self.config.submission_roots,
            &self.config.submission_parent,
        );
        let (pieces, all_live) = registry.resolve(&self.config.pieces, &mut ctx.messages);
        log::info!(
            "{} of {} pieces resolved",
            pieces.live_pieces.len(),
            pieces.piece_names.len()
        );
        ctx.pieces = Some(pieces);
        all_live
    }
}
