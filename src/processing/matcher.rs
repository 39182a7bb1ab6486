//! # Match Engine
//!
//! Decides whether any extracted label is on the operator's allow-list.
//! Comparison is exact and case-sensitive.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Operator-configured labels that qualify an image for forwarding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AllowList(Vec<String>);

impl AllowList {
    /// Build from individual labels, dropping empty entries.
    pub fn new(labels: Vec<String>) -> Self {
        Self(labels.into_iter().filter(|label| !label.is_empty()).collect())
    }

    /// Parse a comma-separated list such as `"marmot,groundhog"`.
    ///
    /// Entries are taken verbatim; only empty entries are dropped.
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(',').map(str::to_string).collect())
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Outcome of comparing one image's labels against the allow-list.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    is_match: bool,
    /// First label (in reply order) found on the allow-list
    matched: Option<String>,
    report: String,
    descriptors: Vec<String>,
    allow_list: AllowList,
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        self.is_match
    }

    pub fn matched(&self) -> Option<&str> {
        self.matched.as_deref()
    }

    pub fn report(&self) -> &str {
        &self.report
    }

    pub fn descriptors(&self) -> &[String] {
        &self.descriptors
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }
}

/// Compare `descriptors` against `allow_list`.
///
/// The first descriptor present on the list decides a match; later ones are
/// not examined. An empty allow-list never matches.
pub fn check_match(descriptors: Vec<String>, allow_list: &AllowList) -> MatchResult {
    let allowed: HashSet<&str> = allow_list.labels().iter().map(String::as_str).collect();

    let matched = descriptors
        .iter()
        .find(|label| allowed.contains(label.as_str()))
        .cloned();

    let labels = format!("[{}]", descriptors.join(", "));
    let report = match &matched {
        Some(label) => format!(
            "The image supplied is a {} which matches '{}' from {}",
            labels, label, allow_list
        ),
        None => format!(
            "The image supplied is a {} which does not match any of {}",
            labels, allow_list
        ),
    };

    MatchResult {
        is_match: matched.is_some(),
        matched,
        report,
        descriptors,
        allow_list: allow_list.clone(),
    }
}
