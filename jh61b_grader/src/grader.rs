pub mod assessment;
pub mod check_files;
pub mod os_interface;
pub mod results;
pub mod score;

use crate::{Config, context::GradingContext, error::ConfigError};
use assessment::Assessment;
use check_files::CheckFiles;
use log::{debug, info, warn};
use serde::Serialize;

// Grader ------------------------------------------------------------------------

/// One step of the pipeline. Steps share a [`GradingContext`] and report only whether they
/// passed; everything else they produce lives in the context.
pub enum Step<'a> {
    CheckFiles(CheckFiles<'a>),
    Assessment(Assessment<'a>),
}

impl Step<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Step::CheckFiles(_) => CheckFiles::NAME,
            Step::Assessment(_) => Assessment::NAME,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Step::CheckFiles(_) => CheckFiles::DISPLAY_NAME,
            Step::Assessment(_) => Assessment::DISPLAY_NAME,
        }
    }

    pub fn run(&self, ctx: &mut GradingContext) -> bool {
        match self {
            Step::CheckFiles(step) => step.run(ctx),
            Step::Assessment(step) => step.run(ctx),
        }
    }
}

#[derive(Serialize, Debug, PartialEq, Eq, Clone)]
pub struct StepOutcome {
    pub name: String,
    pub display_name: String,
    pub passed: bool,
}

#[derive(Serialize, Debug, PartialEq, Eq, Clone)]
pub struct GradingOutcome {
    pub steps: Vec<StepOutcome>,
    pub passed: bool,
}

pub struct Grader<'a> {
    config: &'a Config,
    steps: Vec<Step<'a>>,
}

impl<'a> Grader<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            steps: vec![
                Step::CheckFiles(CheckFiles::new(config)),
                Step::Assessment(Assessment::new(config)),
            ],
        }
    }

    pub fn steps(&self) -> &[Step<'a>] {
        &self.steps
    }

    /// Validates the configuration, then runs every step in order. A failed step does not
    /// stop the next one: the assessment step reports pieces that file checking rejected.
    pub fn run(&self, ctx: &mut GradingContext) -> Result<GradingOutcome, ConfigError> {
        self.config.validate()?;

        let mut steps = vec![];
        for step in &self.steps {
            info!("Running {}", step.display_name());
            let passed = step.run(ctx);
            if passed {
                debug!("{} passed", step.name());
            } else {
                warn!("{} failed", step.name());
            }
            steps.push(StepOutcome {
                name: step.name().to_string(),
                display_name: step.display_name().to_string(),
                passed,
            });
        }

        let passed = steps.iter().all(|step| step.passed);
        Ok(GradingOutcome { steps, passed })
    }
}
