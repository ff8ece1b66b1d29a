//! Pass/fail ledger for the UI checklist

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a single UI check. Declaration order is summary order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    Navigation,
    VisualDesign,
    RecipeSuggester,
    MacroPlanner,
    ResponsiveDesign,
    MediaSection,
}

impl CheckName {
    pub const ALL: [CheckName; 6] = [
        CheckName::Navigation,
        CheckName::VisualDesign,
        CheckName::RecipeSuggester,
        CheckName::MacroPlanner,
        CheckName::ResponsiveDesign,
        CheckName::MediaSection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckName::Navigation => "navigation",
            CheckName::VisualDesign => "visual_design",
            CheckName::RecipeSuggester => "recipe_suggester",
            CheckName::MacroPlanner => "macro_planner",
            CheckName::ResponsiveDesign => "responsive_design",
            CheckName::MediaSection => "media_section",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub passed: bool,
    pub details: String,
}

/// All six checks, each starting as failed with empty details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<CheckName, CheckResult>",
    into = "BTreeMap<CheckName, CheckResult>"
)]
pub struct CheckResults {
    entries: BTreeMap<CheckName, CheckResult>,
}

impl TryFrom<BTreeMap<CheckName, CheckResult>> for CheckResults {
    type Error = String;

    fn try_from(entries: BTreeMap<CheckName, CheckResult>) -> Result<Self, Self::Error> {
        let missing: Vec<&str> = CheckName::ALL
            .iter()
            .filter(|name| !entries.contains_key(name))
            .map(|name| name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(format!("missing checks: {}", missing.join(", ")));
        }
        Ok(Self { entries })
    }
}

impl From<CheckResults> for BTreeMap<CheckName, CheckResult> {
    fn from(results: CheckResults) -> Self {
        results.entries
    }
}

impl Default for CheckResults {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckResults {
    pub fn new() -> Self {
        let entries = CheckName::ALL
            .iter()
            .map(|name| (*name, CheckResult::default()))
            .collect();
        Self { entries }
    }

    pub fn pass(&mut self, name: CheckName, details: impl Into<String>) {
        self.set(name, true, details);
    }

    pub fn fail(&mut self, name: CheckName, details: impl Into<String>) {
        self.set(name, false, details);
    }

    fn set(&mut self, name: CheckName, passed: bool, details: impl Into<String>) {
        let entry = self.entries.entry(name).or_default();
        entry.passed = passed;
        entry.details = details.into();
    }

    /// Append to a check's details without touching its verdict
    pub fn append_details(&mut self, name: CheckName, extra: &str) {
        self.entries.entry(name).or_default().details.push_str(extra);
    }

    pub fn get(&self, name: CheckName) -> &CheckResult {
        // `new` and `try_from` guarantee every name is present; nothing removes entries.
        &self.entries[&name]
    }

    pub fn iter(&self) -> impl Iterator<Item = (CheckName, &CheckResult)> {
        self.entries.iter().map(|(name, result)| (*name, result))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Logical AND over every check
    pub fn all_passed(&self) -> bool {
        self.entries.values().all(|r| r.passed)
    }

    /// Human-readable summary block printed at the end of a run
    pub fn render_summary(&self) -> String {
        let mut out = String::from("=== TEST SUMMARY ===\n");
        for (name, result) in self.iter() {
            let status = if result.passed { "✅ PASSED" } else { "❌ FAILED" };
            out.push_str(&format!("{}: {}\n", name, status));
            out.push_str(&format!("  Details: {}\n", result.details));
        }
        out
    }
}
