//! Test result documents produced by the jh61b harness and the per-piece records published
//! from them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
}

/// One test entry. Every field is optional because harnesses are not consistent about what
/// they emit; fields this crate does not know about are carried through untouched.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone)]
pub struct TestResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TestStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TestResult {
    /// Label used when listing failing tests: `<number> <name>`.
    pub fn label(&self) -> String {
        let name = self.name.as_deref().unwrap_or("Unnamed test");
        match self.number.as_deref() {
            Some(number) if !number.is_empty() => format!("{number} {name}"),
            _ => name.to_string(),
        }
    }
}

/// The document the harness writes to its `--outfile`. Only the test list is consumed; any
/// top-level totals it reports are recomputed during aggregation.
#[derive(Deserialize, Debug, Default, PartialEq, Clone)]
pub struct HarnessResults {
    #[serde(default)]
    pub tests: Vec<TestResult>,
}

impl HarnessResults {
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}

/// Aggregated result of one piece.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Jh61bResults {
    pub score: f64,
    pub max_score: f64,
    pub tests: Vec<TestResult>,
}

/// Piece name to aggregated result. Records are only ever replaced whole.
#[derive(Serialize, Debug, Default, PartialEq, Clone)]
#[serde(transparent)]
pub struct TestResultStore {
    results: BTreeMap<String, Jh61bResults>,
}

impl TestResultStore {
    pub fn publish(&mut self, piece_name: &str, result: Jh61bResults) -> Option<Jh61bResults> {
        self.results.insert(piece_name.to_string(), result)
    }

    pub fn get(&self, piece_name: &str) -> Option<&Jh61bResults> {
        self.results.get(piece_name)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
