//! The sheet step catalog.
//!
//! Steps are listed in chronological order: each step relies on the
//! results produced by the steps before it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::StepError;

/// Catalog entry shared by all steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDescriptor {
    /// Upper-case identifier, used as the lookup key.
    pub id: &'static str,
    /// Position in the chronological order.
    pub ordinal: usize,
    /// User-friendly description.
    pub description: &'static str,
}

static DESCRIPTORS: [StepDescriptor; Step::COUNT] = [
    StepDescriptor { id: "LOAD", ordinal: 0, description: "Load the sheet picture" },
    StepDescriptor {
        id: "SCALE",
        ordinal: 1,
        description: "Compute the global Skew, and rotate if needed",
    },
    StepDescriptor { id: "SKEW", ordinal: 2, description: "Detect & remove all Staff Lines" },
    StepDescriptor { id: "LINES", ordinal: 3, description: "Retrieve horizontal Dashes" },
    StepDescriptor { id: "HORIZONTALS", ordinal: 4, description: "Detect horizontal dashes" },
    StepDescriptor { id: "BARS", ordinal: 5, description: "Detect vertical Bar lines" },
    StepDescriptor { id: "SYMBOLS", ordinal: 6, description: "Recognize Symbols & Compounds" },
    StepDescriptor { id: "VERTICALS", ordinal: 7, description: "Extract verticals" },
    StepDescriptor { id: "LEAVES", ordinal: 8, description: "Recognize Leaves & Compounds" },
    StepDescriptor { id: "CLEANUP", ordinal: 9, description: "Cleanup stems and slurs" },
    StepDescriptor { id: "SCORE", ordinal: 10, description: "Translate glyphs to score items" },
];

/// A sheet processing step.
///
/// Variant order is the processing order, so `Ord` follows the ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Step {
    /// Load the image for the sheet, from a provided image file.
    Load,
    /// Determine the general scale of the sheet.
    Scale,
    /// Determine the average skew of the picture, and deskew it if needed.
    Skew,
    /// Retrieve the staff lines and erase their pixels.
    Lines,
    /// Retrieve the horizontal dashes (ledgers, endings).
    Horizontals,
    /// Retrieve the vertical bar lines, and so the systems and measures.
    Bars,
    /// Recognize isolated symbol glyphs and aggregate unknown ones.
    Symbols,
    /// Retrieve the vertical items such as stems.
    Verticals,
    /// Process glyphs attached to stems.
    Leaves,
    /// Cleanup stems and slurs.
    Cleanup,
    /// Translate glyphs into score entities.
    Score,
}

impl Step {
    /// Number of steps in the catalog.
    pub const COUNT: usize = 11;

    /// All steps, in chronological order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Load,
        Self::Scale,
        Self::Skew,
        Self::Lines,
        Self::Horizontals,
        Self::Bars,
        Self::Symbols,
        Self::Verticals,
        Self::Leaves,
        Self::Cleanup,
        Self::Score,
    ];

    /// Returns the catalog entry for this step.
    #[must_use]
    pub fn descriptor(self) -> &'static StepDescriptor {
        &DESCRIPTORS[self as usize]
    }

    /// Returns the upper-case identifier.
    #[must_use]
    pub fn id(self) -> &'static str {
        self.descriptor().id
    }

    /// Returns the position of this step in the chronological order.
    #[must_use]
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// Reports the user-friendly description of this step.
    #[must_use]
    pub fn description(self) -> &'static str {
        self.descriptor().description
    }

    /// Returns true for the step that creates the sheet.
    #[must_use]
    pub const fn is_load(self) -> bool {
        matches!(self, Self::Load)
    }

    /// Returns the first step of the catalog.
    #[must_use]
    pub const fn first() -> Self {
        Self::ALL[0]
    }

    /// Returns the last step of the catalog.
    #[must_use]
    pub const fn last() -> Self {
        Self::ALL[Self::COUNT - 1]
    }

    /// Returns the following step, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.ordinal() + 1).copied()
    }

    /// Returns the preceding step, if any.
    #[must_use]
    pub fn previous(self) -> Option<Self> {
        self.ordinal().checked_sub(1).map(|i| Self::ALL[i])
    }

    /// Returns the steps from the first one up to and including `target`.
    #[must_use]
    pub fn steps_through(target: Self) -> &'static [Self] {
        &Self::ALL[..=target.ordinal()]
    }

    /// Retrieves a step knowing its identifier, case is not relevant.
    ///
    /// An unknown identifier is logged as an error and yields `None`.
    #[must_use]
    pub fn lookup(id: &str) -> Option<Self> {
        match id.parse() {
            Ok(step) => Some(step),
            Err(_) => {
                tracing::error!(id, "Cannot find Step for id {}", id);
                None
            }
        }
    }
}

impl FromStr for Step {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|step| step.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| StepError::not_found(s))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::LogCapture;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_catalog_order_matches_declaration() {
        for (i, step) in Step::ALL.iter().enumerate() {
            assert_eq!(step.ordinal(), i);
            assert_eq!(step.descriptor().ordinal, i);
        }
        assert_eq!(Step::first(), Step::Load);
        assert_eq!(Step::last(), Step::Score);
    }

    #[test]
    fn test_catalog_enumeration_is_stable() {
        let first: Vec<_> = Step::ALL.iter().map(|s| s.id()).collect();
        let second: Vec<_> = Step::ALL.iter().map(|s| s.id()).collect();
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                "LOAD", "SCALE", "SKEW", "LINES", "HORIZONTALS", "BARS", "SYMBOLS",
                "VERTICALS", "LEAVES", "CLEANUP", "SCORE"
            ]
        );
    }

    #[test]
    fn test_identifiers_are_unique() {
        let mut ids: Vec<_> = Step::ALL.iter().map(|s| s.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), Step::COUNT);
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(Step::Load.description(), "Load the sheet picture");
        assert_eq!(Step::Skew.description(), "Detect & remove all Staff Lines");
        assert_eq!(Step::Score.description(), "Translate glyphs to score items");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let capture = LogCapture::new();
        capture.in_scope(|| {
            assert_eq!(Step::lookup("load"), Some(Step::Load));
            assert_eq!(Step::lookup("LOAD"), Some(Step::Load));
            assert_eq!(Step::lookup("Horizontals"), Some(Step::Horizontals));
        });
        assert_eq!(Step::lookup("load").map(Step::ordinal), Some(0));
        assert_eq!(capture.count_at(tracing::Level::ERROR), 0);
    }

    #[test]
    fn test_lookup_unknown_logs_one_error() {
        let capture = LogCapture::new();
        let found = capture.in_scope(|| Step::lookup("bogus"));

        assert_eq!(found, None);
        assert_eq!(capture.count_at(tracing::Level::ERROR), 1);
        assert!(capture.messages().iter().any(|m| m.contains("bogus")));
    }

    #[test]
    fn test_lookup_does_not_trim() {
        let capture = LogCapture::new();
        let found = capture.in_scope(|| (Step::lookup(" load"), Step::lookup("load\n")));

        assert_eq!(found, (None, None));
        assert_eq!(capture.count_at(tracing::Level::ERROR), 2);
    }

    #[test]
    fn test_from_str_is_silent() {
        let capture = LogCapture::new();
        let parsed = capture.in_scope(|| "nope".parse::<Step>());

        assert!(matches!(parsed, Err(StepError::NotFound { .. })));
        assert!(capture.is_empty());
    }

    #[test]
    fn test_neighbours() {
        assert_eq!(Step::Load.previous(), None);
        assert_eq!(Step::Load.next(), Some(Step::Scale));
        assert_eq!(Step::Score.next(), None);
        assert_eq!(Step::Score.previous(), Some(Step::Cleanup));
        assert_eq!(Step::steps_through(Step::Skew), &[Step::Load, Step::Scale, Step::Skew]);
        assert_eq!(Step::steps_through(Step::Score).len(), Step::COUNT);
    }

    #[test]
    fn test_display_and_serialize() {
        assert_eq!(Step::Symbols.to_string(), "SYMBOLS");

        let json = serde_json::to_string(&Step::Cleanup).unwrap();
        assert_eq!(json, r#""CLEANUP""#);

        let back: Step = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Step::Cleanup);
    }
}
