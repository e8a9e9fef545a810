use crate::{
    config::PieceAssessmentConfig,
    grader::results::{Jh61bResults, TestResult, TestStatus},
    messages::Messages,
};
use std::ops::{Add, AddAssign};

/// The way partial credit on a piece is treated.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum Mode {
    /// All or nothing: anything short of the maximum scores zero. The maximum is still
    /// reported, so the student sees "0 of N".
    Absolute,
    /// The piece scores the sum of its tests.
    #[default]
    Weighted,
}

/// Points earned against points available.
#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub struct Score {
    pub current: f64,
    pub max: f64,
}

impl Score {
    /// Missing values count as zero.
    pub fn of(test: &TestResult) -> Self {
        Self {
            current: test.score.unwrap_or(0.0),
            max: test.max_score.unwrap_or(0.0),
        }
    }

    pub fn total<'a>(tests: impl IntoIterator<Item = &'a TestResult>) -> Self {
        tests
            .into_iter()
            .fold(Self::default(), |acc, test| acc + Self::of(test))
    }

    pub fn is_full(&self) -> bool {
        self.current == self.max
    }
}

impl AddAssign for Score {
    fn add_assign(&mut self, rhs: Self) {
        self.current += rhs.current;
        self.max += rhs.max;
    }
}

impl Add for Score {
    type Output = Score;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

/// An aggregated piece ready to publish, plus whether the piece counts as passed.
#[derive(Debug, PartialEq, Clone)]
pub struct Aggregation {
    pub result: Jh61bResults,
    pub passed: bool,
}

/// Sums the collected tests of `piece_name` and applies the piece's credit mode.
pub fn aggregate(
    piece_name: &str,
    mut tests: Vec<TestResult>,
    piece_config: &PieceAssessmentConfig,
    messages: &mut Messages,
) -> Aggregation {
    let mut score = Score::total(&tests);
    messages.private().info(format!(
        "Scored {:.3} / {:.3} points on {piece_name}",
        score.current, score.max
    ));

    let passed = match piece_config.mode() {
        Mode::Weighted => score.is_full(),
        Mode::Absolute => {
            let zeroed = score.current < score.max;
            if zeroed {
                messages.private().info(format!(
                    "{piece_name} requires full score to receive credit."
                ));
                score.current = 0.0;
            }

            let mut failing_tests = vec![];
            for test in tests.iter_mut() {
                if test.score != test.max_score {
                    test.status = Some(TestStatus::Failed);
                    failing_tests.push(format!("- {}", test.label()));
                }
                test.score = None;
                test.max_score = None;
            }

            let mut output = vec![format!(
                "{piece_name} requires full score to receive credit."
            )];
            if !failing_tests.is_empty() {
                output.push("Failing the following tests:".to_string());
                output.extend(failing_tests);
            }

            tests.insert(
                0,
                TestResult {
                    number: piece_config.aggregated_number.clone(),
                    name: Some(piece_name.to_string()),
                    score: Some(score.current),
                    max_score: Some(score.max),
                    status: Some(if zeroed {
                        TestStatus::Failed
                    } else {
                        TestStatus::Passed
                    }),
                    output: Some(output.join("\n")),
                    ..Default::default()
                },
            );
            !zeroed
        }
    };

    Aggregation {
        result: Jh61bResults {
            score: score.current,
            max_score: score.max,
            tests,
        },
        passed,
    }
}
