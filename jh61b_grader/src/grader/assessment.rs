//! The assessment step: runs the jh61b harness for every assessment file of every live piece
//! and publishes the aggregated results.
//!
//! Work is strictly sequential. Pieces run in declaration order and the files of a piece in
//! lexicographic order, so student-visible messages come out the same way on every run. A
//! failing invocation marks its piece (and the step) failed but never stops the remaining
//! invocations.

use crate::{
    Config,
    config::{Piece, PieceAssessmentConfig},
    context::{GradingContext, SubmissionMetadata},
    grader::{
        check_files::absolute_root,
        os_interface::run_subprocess,
        results::{HarnessResults, TestResult, TestResultStore},
        score::aggregate,
    },
    messages::Messages,
};
use std::{
    env, fs,
    path::{Component, Path},
};

pub const UNKNOWN_PIECE: &str = "unknown piece name";

const INTERNAL_ERROR: &str = "Unexpected error while running assessment; details in staff logs.";

/// How a finished harness process is read from its exit code.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ExitKind {
    Success,
    /// The OS killed the process, most likely for running out of memory.
    KilledBySignal,
    /// The harness (or code under test) exited on its own with an error.
    Error,
}

/// Exit codes above `signal_threshold`, or negative ones, mean termination by a fatal signal.
/// Shells report a signal as `128 + signal`; the runner reports it as `-signal`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ExitClassifier {
    pub signal_threshold: i32,
}

impl ExitClassifier {
    pub fn new(signal_threshold: i32) -> Self {
        Self { signal_threshold }
    }

    pub fn classify(&self, return_code: i32) -> ExitKind {
        if return_code == 0 {
            ExitKind::Success
        } else if return_code > self.signal_threshold || return_code < 0 {
            ExitKind::KilledBySignal
        } else {
            ExitKind::Error
        }
    }
}

/// `tests/hw1/TestHw1.java` becomes `tests.hw1.TestHw1`.
pub fn path_to_classname(relative: &Path) -> String {
    relative
        .with_extension("")
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn classpath(grader_root: &Path, submission_root: &Path) -> String {
    let mut entries = vec![
        grader_root.display().to_string(),
        submission_root.display().to_string(),
    ];
    if let Some(inherited) = env::var_os("CLASSPATH")
        && !inherited.is_empty()
    {
        entries.push(inherited.to_string_lossy().into_owned());
    }
    entries.join(":")
}

fn echo(command: &[String]) -> String {
    shlex::try_join(command.iter().map(String::as_str)).unwrap_or_else(|_| command.join(" "))
}

/// Where one invocation runs from and what it runs.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub grader_root: &'a Path,
    pub submission_root: &'a Path,
    pub target: &'a str,
    pub outfile: &'a Path,
}

pub struct Assessment<'a> {
    config: &'a Config,
    classifier: ExitClassifier,
}

impl<'a> Assessment<'a> {
    pub const NAME: &'static str = "jh61b.assessment";
    pub const DISPLAY_NAME: &'static str = "Assessment";

    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            classifier: ExitClassifier::new(config.assessment.signal_exit_threshold),
        }
    }

    /// Full command line of one harness run: launcher, identity properties, global then
    /// piece JVM options, classpath and target, harness flags, piece arguments.
    pub fn build_command(
        &self,
        invocation: &Invocation<'_>,
        piece_config: &PieceAssessmentConfig,
        metadata: &SubmissionMetadata,
    ) -> Vec<String> {
        let section = &self.config.assessment;
        let properties = [
            ("bsag.grader.classroot", invocation.grader_root.display().to_string()),
            (
                "bsag.submission.classroot",
                invocation.submission_root.display().to_string(),
            ),
            ("bsag.student.email", metadata.emails()),
            ("bsag.student.name", metadata.names()),
        ];

        let mut command = vec![section.launcher.clone()];
        command.extend(properties.iter().map(|(k, v)| format!("-D{k}={v}")));
        command.extend(section.default_java_options.iter().cloned());
        command.extend(piece_config.java_options.iter().cloned());
        command.push("-classpath".to_string());
        command.push(classpath(invocation.grader_root, invocation.submission_root));
        command.push(invocation.target.to_string());
        command.extend([
            "--secure".to_string(),
            "--json".to_string(),
            "--outfile".to_string(),
            invocation.outfile.display().to_string(),
        ]);
        command.extend(piece_config.args.iter().cloned());
        command
    }

    pub fn run(&self, ctx: &mut GradingContext) -> bool {
        let GradingContext {
            metadata,
            pieces,
            test_results,
            messages,
        } = ctx;

        let Some(pieces) = pieces.as_ref() else {
            messages
                .both()
                .error("Unable to run assessment: no pieces were checked.");
            return false;
        };

        let grader_root = absolute_root(&self.config.grader_root);
        let mut all_success = true;

        for piece_name in &pieces.piece_names {
            let piece_config = self.config.assessment.piece_config(piece_name);

            let Some(piece) = pieces.live_pieces.get(piece_name) else {
                let reason = pieces
                    .failed_pieces
                    .get(piece_name)
                    .map(|failed| failed.reason.as_str())
                    .unwrap_or(UNKNOWN_PIECE);
                messages
                    .both()
                    .error(format!("Unable to run assessment for {piece_name}: {reason}"));
                all_success = false;
                continue;
            };

            messages.private().info(format!("Testing {piece_name}..."));
            let (tests, ran_cleanly) =
                self.run_piece(piece_name, piece, &piece_config, &grader_root, metadata, messages);
            if !ran_cleanly {
                all_success = false;
            }

            let aggregation = aggregate(piece_name, tests, &piece_config, messages);
            test_results
                .get_or_insert_with(TestResultStore::default)
                .publish(piece_name, aggregation.result);
            if !aggregation.passed {
                all_success = false;
            }
        }

        all_success
    }

    /// Runs every assessment file of a piece. Returns the collected tests and whether every
    /// invocation completed and produced a readable document.
    fn run_piece(
        &self,
        piece_name: &str,
        piece: &Piece,
        piece_config: &PieceAssessmentConfig,
        grader_root: &Path,
        metadata: &SubmissionMetadata,
        messages: &mut Messages,
    ) -> (Vec<TestResult>, bool) {
        let submission_root = match &piece.submission_root {
            Some(root) => root.clone(),
            None => absolute_root(
                &self
                    .config
                    .submission_roots
                    .first()
                    .cloned()
                    .unwrap_or_default(),
            ),
        };
        let timeout = self.config.assessment.timeout_for(piece_config);

        let mut tests = vec![];
        let mut ran_cleanly = true;

        // A BTreeSet iterates in lexicographic path order.
        for assessment_file in &piece.assessment_files {
            let relative = assessment_file
                .strip_prefix(grader_root)
                .unwrap_or(assessment_file);
            let target = path_to_classname(relative);

            // A fresh file per run, so a harness that dies early never leaves us reading the
            // previous run's results.
            let outfile = match tempfile::Builder::new()
                .prefix("assess")
                .suffix(".json")
                .tempfile()
            {
                Ok(file) => file,
                Err(err) => {
                    messages
                        .private()
                        .error(format!("Unable to create output file for {target}: {err}"));
                    messages.student().error(INTERNAL_ERROR);
                    ran_cleanly = false;
                    continue;
                }
            };

            let invocation = Invocation {
                grader_root,
                submission_root: &submission_root,
                target: &target,
                outfile: outfile.path(),
            };
            let command = self.build_command(&invocation, piece_config, metadata);
            messages.private().debug(format!("\n{}", echo(&command)));

            // The harness may use paths relative to the grader root.
            let result = match run_subprocess(&command, grader_root, timeout) {
                Ok(result) => result,
                Err(err) => {
                    messages
                        .private()
                        .error(format!("Unable to run {target}: {err}"));
                    messages.student().error(INTERNAL_ERROR);
                    ran_cleanly = false;
                    continue;
                }
            };

            if result.timed_out {
                messages
                    .private()
                    .error(format!("timed out while running {target}"));
                messages.student().error(format!(
                    "Your submission timed out on the test suite {target}.\n\
                     Please make sure your code terminates on all inputs, and doesn't take too long to do so."
                ));
                ran_cleanly = false;
                continue;
            }

            // Failing tests do not end up here: the harness reports them in its document and
            // exits 0. A nonzero code means the JVM died (usually memory), the harness broke,
            // or the code under test called `System.exit`.
            match self.classifier.classify(result.return_code) {
                ExitKind::Success => {}
                kind => {
                    messages.private().error(format!(
                        "process died with code {} running {target}",
                        result.return_code
                    ));
                    if kind == ExitKind::KilledBySignal {
                        messages.student().error(format!(
                            "Your submission failed to complete on the test suite {target}.\n\
                             You're most likely using too much memory."
                        ));
                    } else {
                        messages.student().error(format!(
                            "In piece {piece_name}, test {target} exited with an error:"
                        ));
                        messages.student().error(result.output);
                    }
                    ran_cleanly = false;
                    continue;
                }
            }

            match read_results(outfile.path()) {
                Ok(document) => {
                    log::debug!("{target} reported {} tests", document.tests.len());
                    tests.extend(document.tests);
                }
                Err(reason) => {
                    messages
                        .private()
                        .error(format!("Error decoding output for {target}: {reason}"));
                    messages.private().error(format!("\n{}", result.output));
                    messages.student().error(INTERNAL_ERROR);
                    ran_cleanly = false;
                }
            }
        }

        (tests, ran_cleanly)
    }
}

fn read_results(outfile: &Path) -> Result<HarnessResults, String> {
    let content = fs::read_to_string(outfile).map_err(|err| err.to_string())?;
    HarnessResults::from_json(&content).map_err(|err| err.to_string())
}
