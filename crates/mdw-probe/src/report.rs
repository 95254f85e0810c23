use std::fmt;

use serde::Serialize;

/// Overall judgement of one connectivity check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Good,
    /// Reachable, but average latency is above the configured threshold.
    Slow,
    Down,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Good => "good",
            Self::Slow => "slow",
            Self::Down => "down",
        })
    }
}

/// Outcome of one connectivity check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub ok: bool,
    pub verdict: Verdict,
    pub details: String,
}

impl ProbeReport {
    /// Reachable with acceptable latency.
    pub fn good(details: impl Into<String>) -> Self {
        Self {
            ok: true,
            verdict: Verdict::Good,
            details: details.into(),
        }
    }

    /// Slow still passes.
    pub fn slow(details: impl Into<String>) -> Self {
        Self {
            ok: true,
            verdict: Verdict::Slow,
            details: details.into(),
        }
    }

    /// Unreachable; `details` explains why.
    pub fn down(details: impl Into<String>) -> Self {
        Self {
            ok: false,
            verdict: Verdict::Down,
            details: details.into(),
        }
    }
}

/// Both checks, as run before a save.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NetworkReport {
    pub generic: ProbeReport,
    pub ledger: ProbeReport,
}

impl NetworkReport {
    /// Both checks passed.
    pub fn ok(&self) -> bool {
        self.generic.ok && self.ledger.ok
    }

    /// Details of the first failing check, generic connectivity first.
    pub fn failure(&self) -> Option<&str> {
        [&self.generic, &self.ledger]
            .into_iter()
            .find(|r| !r.ok)
            .map(|r| r.details.as_str())
    }
}
