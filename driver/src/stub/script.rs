use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Distance under which the stub reports a verified match.
pub const STUB_MATCH_DISTANCE: f64 = 0.4;

/// Canned answer the stub backend replays for every well-formed request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StubReply {
    Match { distance: f64 },
    Fail { status: u16, message: String },
}

impl Default for StubReply {
    fn default() -> Self {
        StubReply::Match { distance: 0.23 }
    }
}

impl StubReply {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading stub script {}", path_ref.display()))?;
        let reply: StubReply = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing stub script {}", path_ref.display()))?;
        Ok(reply)
    }
}

/// `(1 - distance)` as a percentage, rounded to two decimals.
pub fn similarity_for(distance: f64) -> f64 {
    ((1.0 - distance) * 100.0 * 100.0).round() / 100.0
}
