//! Line classifier: turns one line of process output into category matches.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::category::SourceLocation;
use crate::registry::PatternRegistry;

/// The result of recognizing a line as belonging to a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Name of the category that matched.
    pub category: String,
    /// The full matched substring.
    pub text: String,
    /// Captured groups keyed by group name (or index for unnamed groups).
    pub captures: BTreeMap<String, String>,
    /// Source position, when the category knows how to find one.
    pub location: Option<SourceLocation>,
    /// The line the match was found in, after escape stripping.
    pub line: String,
}

impl Match {
    /// Get a captured group by name.
    pub fn capture(&self, name: &str) -> Option<&str> {
        self.captures.get(name).map(String::as_str)
    }

    /// File from the location, if any.
    pub fn file(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.file.as_str())
    }

    /// Line number from the location, falling back to a `line` capture.
    pub fn line_number(&self) -> Option<u32> {
        self.location
            .as_ref()
            .and_then(|l| l.line)
            .or_else(|| self.capture("line").and_then(|l| l.parse().ok()))
    }
}

/// Classifies lines against every category of a registry.
///
/// Classification never fails: a probe that panics on odd input counts as
/// "no match" for its category and the remaining categories still run.
#[derive(Debug, Clone)]
pub struct LogClassifier {
    registry: Arc<PatternRegistry>,
}

impl LogClassifier {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<PatternRegistry> {
        &self.registry
    }

    /// Classify a single line, returning matches in registration order.
    pub fn classify(&self, line: &str) -> Vec<Match> {
        let clean = strip_ansi(line.trim_end_matches(['\r', '\n']));
        if clean.trim().is_empty() {
            return Vec::new();
        }

        let mut matches = Vec::new();
        for category in self.registry.iter() {
            match panic::catch_unwind(AssertUnwindSafe(|| category.probe(&clean))) {
                Ok(found) => matches.extend(found),
                Err(_) => {
                    warn!("Pattern probe for {} failed, treating as no match", category.name());
                }
            }
        }

        if !matches.is_empty() {
            debug!("Classified line into {} match(es)", matches.len());
        }
        matches
    }

    /// Classify a block of text line by line.
    pub fn classify_text(&self, text: &str) -> Vec<Match> {
        text.lines().flat_map(|line| self.classify(line)).collect()
    }
}

/// Remove terminal escape sequences and stray control characters.
pub fn strip_ansi(line: &str) -> String {
    static ESCAPES: OnceLock<Option<Regex>> = OnceLock::new();
    let stripped = match ESCAPES.get_or_init(|| {
        Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)?|\x1b[@-_]?").ok()
    }) {
        Some(re) => re.replace_all(line, "").into_owned(),
        None => line.to_string(),
    };
    stripped
        .chars()
        .filter(|c| !c.is_control() || *c == '\t')
        .collect()
}
