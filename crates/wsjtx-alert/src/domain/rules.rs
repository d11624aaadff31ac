//! Prefix-matching alert rules applied to decoded free text.
//!
//! WSJT-X decodes are short space-separated exchanges.  The last two fields
//! of a standard exchange are the caller's callsign and their gridsquare (or
//! a signal report / sign-off in its place):
//!
//! ```text
//! CQ KR0OT DN40          -> caller KR0OT, grid DN40
//! CQ DX K4PI EM73        -> caller K4PI,  grid EM73
//! KW0G KR0OT -02         -> caller KR0OT, report (not a grid)
//! W4EJY WW5SS RR73       -> caller WW5SS, sign-off (not a grid)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sign-off token that sits in the grid position but is never a grid.
const SIGN_OFF: &str = "RR73";

/// Callsign and gridsquare prefixes that should raise an alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRules {
    pub callsign: Vec<String>,
    pub gridsquare: Vec<String>,
}

impl PrefixRules {
    /// Builds a rule set, dropping empty prefixes (they would match anything).
    pub fn new<I, J, S, T>(callsign: I, gridsquare: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            callsign: compact(callsign),
            gridsquare: compact(gridsquare),
        }
    }

    /// Returns `true` when there is nothing to match against.
    pub fn is_empty(&self) -> bool {
        self.callsign.is_empty() && self.gridsquare.is_empty()
    }
}

fn compact<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items
        .into_iter()
        .map(Into::into)
        .filter(|s| !s.is_empty())
        .collect()
}

/// A single rule hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertMatch {
    /// The caller's callsign starts with a configured prefix.
    Callsign(String),
    /// The caller's gridsquare starts with a configured prefix.
    Gridsquare(String),
}

impl AlertMatch {
    pub fn is_callsign(&self) -> bool {
        matches!(self, AlertMatch::Callsign(_))
    }

    /// The token from the decode that matched.
    pub fn token(&self) -> &str {
        match self {
            AlertMatch::Callsign(s) | AlertMatch::Gridsquare(s) => s,
        }
    }
}

impl fmt::Display for AlertMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertMatch::Callsign(s) => write!(f, "{s} matches callsign prefix alert"),
            AlertMatch::Gridsquare(s) => write!(f, "{s} matches gridsquare prefix alert"),
        }
    }
}

/// Splits on single spaces and drops the empty fields runs of spaces leave.
pub fn compact_fields(text: &str) -> Vec<&str> {
    text.split(' ').filter(|f| !f.is_empty()).collect()
}

/// Returns `true` if `s` starts with any of `prefixes`.
pub fn has_any_prefix<S: AsRef<str>>(s: &str, prefixes: &[S]) -> bool {
    prefixes.iter().any(|p| s.starts_with(p.as_ref()))
}

/// Returns `false` for tokens in the grid position that cannot be a grid:
/// signal reports (`-02`, `+05`, `R-12`, `73`) and the `RR73` sign-off.
pub fn is_plausible_gridsquare(token: &str) -> bool {
    if token == SIGN_OFF {
        return false;
    }
    let rest = token.char_indices().nth(1).map_or("", |(i, _)| &token[i..]);
    rest.parse::<i64>().is_err()
}

/// Evaluates `message` against `rules`, returning every hit in order
/// (callsign first, then gridsquare).
pub fn evaluate(message: &str, rules: &PrefixRules) -> Vec<AlertMatch> {
    let fields = compact_fields(message);
    let n = fields.len();
    if n <= 2 {
        return Vec::new();
    }

    let caller_callsign = fields[n - 2];
    let caller_gridsquare = fields[n - 1];
    let mut matches = Vec::new();

    if has_any_prefix(caller_callsign, &rules.callsign) {
        matches.push(AlertMatch::Callsign(caller_callsign.to_string()));
    }
    if is_plausible_gridsquare(caller_gridsquare)
        && has_any_prefix(caller_gridsquare, &rules.gridsquare)
    {
        matches.push(AlertMatch::Gridsquare(caller_gridsquare.to_string()));
    }
    matches
}

// ── Tests ─────────────────────────────────────────────────────────────────────
