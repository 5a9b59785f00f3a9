//! Error categories: a named recognition rule plus optional locator and planner.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::classifier::Match;
use crate::error::{PatternError, PatternResult};
use crate::planner::PlanRule;

/// A source position pulled out of a diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(mut self, line: u32, column: Option<u32>) -> Self {
        self.line = Some(line);
        self.column = column;
        self
    }

    /// Build a location from `file`, `line` and `column` named groups.
    fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        let file = caps.name("file")?.as_str().trim();
        if file.is_empty() {
            return None;
        }
        Some(Self {
            file: file.to_string(),
            line: caps.name("line").and_then(|m| m.as_str().parse().ok()),
            column: caps.name("column").and_then(|m| m.as_str().parse().ok()),
        })
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file)?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
            if let Some(column) = self.column {
                write!(f, ":{}", column)?;
            }
        }
        Ok(())
    }
}

/// A named class of build, lint or runtime error text.
///
/// The recognition pattern decides whether a line belongs to the category.
/// When a locator is set it is evaluated against the same original line to
/// find the source position; without one, `file`/`line`/`column` named
/// groups in the recognition pattern are used instead.
#[derive(Clone)]
pub struct ErrorCategory {
    name: String,
    description: String,
    pattern: Regex,
    locator: Option<Regex>,
    planner: Option<Arc<dyn PlanRule>>,
}

impl ErrorCategory {
    /// Create a category from a recognition pattern.
    pub fn new(name: impl Into<String>, pattern: &str) -> PatternResult<Self> {
        let name = name.into();
        let pattern = compile(&name, pattern)?;
        Ok(Self {
            name,
            description: String::new(),
            pattern,
            locator: None,
            planner: None,
        })
    }

    /// Attach a locator evaluated against the whole line.
    pub fn with_locator(mut self, locator: &str) -> PatternResult<Self> {
        self.locator = Some(compile(&self.name, locator)?);
        Ok(self)
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Attach the rule that turns this category's matches into fix plans.
    pub fn with_planner(mut self, planner: Arc<dyn PlanRule>) -> Self {
        self.planner = Some(planner);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn planner(&self) -> Option<&Arc<dyn PlanRule>> {
        self.planner.as_ref()
    }

    /// Apply the recognition rule to one line, returning every match.
    pub fn probe(&self, line: &str) -> Vec<Match> {
        let located = self
            .locator
            .as_ref()
            .and_then(|locator| locator.captures(line))
            .and_then(|caps| SourceLocation::from_captures(&caps));

        self.pattern
            .captures_iter(line)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let mut groups = BTreeMap::new();
                for (index, name) in self.pattern.capture_names().enumerate().skip(1) {
                    let Some(value) = caps.get(index) else {
                        continue;
                    };
                    let key = name.map(str::to_string).unwrap_or_else(|| index.to_string());
                    groups.insert(key, value.as_str().to_string());
                }
                let location = located
                    .clone()
                    .or_else(|| SourceLocation::from_captures(&caps));
                Some(Match {
                    category: self.name.clone(),
                    text: whole.as_str().to_string(),
                    captures: groups,
                    location,
                    line: line.to_string(),
                })
            })
            .collect()
    }
}

impl fmt::Debug for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorCategory")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .field("locator", &self.locator.as_ref().map(Regex::as_str))
            .field("has_planner", &self.planner.is_some())
            .finish()
    }
}

fn compile(category: &str, pattern: &str) -> PatternResult<Regex> {
    Regex::new(pattern).map_err(|e| PatternError::InvalidPattern {
        category: category.to_string(),
        message: e.to_string(),
    })
}
