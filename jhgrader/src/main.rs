use clap::Parser;
use jh61b_grader::{
    AssessmentPieces, Config, Grader, GradingContext, StepOutcome, SubmissionMetadata,
    TestResultStore,
};
use serde::Serialize;
use std::{fs, path::PathBuf, process::ExitCode};

#[derive(Parser, Debug)]
#[command(
    name = "jhgrader",
    version,
    about,
    long_about = "Grade a Java submission with the jh61b harness using the pieces declared in CONFIGURATION_FILE."
)]
struct Cli {
    configuration_file: PathBuf,

    /// Submission metadata written by the grading platform (submitting users).
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Where to write the grading report. Defaults to stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Serialize, Debug)]
struct Report<'a> {
    passed: bool,
    steps: &'a [StepOutcome],
    pieces: Option<&'a AssessmentPieces>,
    test_results: Option<&'a TestResultStore>,
    student_output: Vec<&'a str>,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let config = Config::from_path(&args.configuration_file)?;

    // RUST_LOG still wins over the configured mode.
    env_logger::Builder::new()
        .filter_level(config.logging_mode.level_filter())
        .parse_default_env()
        .init();

    let metadata = match &args.metadata {
        Some(path) => SubmissionMetadata::from_path(path)?,
        None => SubmissionMetadata::default(),
    };
    log::debug!("Grading submission of [{}]", metadata.emails());

    let mut ctx = GradingContext::new(metadata);
    let outcome = Grader::new(&config).run(&mut ctx)?;

    let report = Report {
        passed: outcome.passed,
        steps: &outcome.steps,
        pieces: ctx.pieces.as_ref(),
        test_results: ctx.test_results.as_ref(),
        student_output: ctx.messages.student_lines().collect(),
    };
    let serialized = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => fs::write(path, serialized)?,
        None => println!("{serialized}"),
    }

    if outcome.passed {
        log::info!("All steps passed");
        Ok(ExitCode::SUCCESS)
    } else {
        log::info!("Grading finished with failed steps");
        Ok(ExitCode::FAILURE)
    }
}
