//! Active-category set and its selection rules.
//!
//! [`CategorySelector`] owns the set of categories the next bulletin will
//! cover. Two rules hold after every operation:
//!
//! * the set is never empty — deactivating the last category is rejected;
//! * `geral` (broad coverage) and specific topics do not mix *in one
//!   direction*: activating a specific topic while `geral` is active drops
//!   `geral` in the same update. Activating `geral` leaves specific topics
//!   in place. The asymmetry is deliberate and pinned by tests below; do
//!   not make it symmetric without revisiting those.

use std::collections::BTreeSet;

use thiserror::Error;

/// All category ids the service understands. Closed at configuration time;
/// ids are the wire spelling used by the generation endpoint.
pub const CATALOG: &[&str] = &["geral", "politica", "economia", "tecnologia", "esportes"];

/// The broad-coverage default category.
pub const GENERAL_CATEGORY: &str = "geral";

// ---------------------------------------------------------------------------
// SelectionError
// ---------------------------------------------------------------------------

/// Errors from category toggling. Both are local — no I/O happens here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// Deactivating this category would leave the selection empty.
    #[error("at least one category must stay active")]
    MinimumSelection,

    /// The id is not in [`CATALOG`].
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

// ---------------------------------------------------------------------------
// CategorySelector
// ---------------------------------------------------------------------------

/// The set of active topic categories.
///
/// Starts with only [`GENERAL_CATEGORY`] active. `BTreeSet` keeps the
/// request payload ordering stable.
#[derive(Debug, Clone)]
pub struct CategorySelector {
    active: BTreeSet<String>,
}

impl CategorySelector {
    /// A selector with only `geral` active.
    pub fn new() -> Self {
        let mut active = BTreeSet::new();
        active.insert(GENERAL_CATEGORY.to_string());
        Self { active }
    }

    /// Flip membership of `id`.
    ///
    /// # Errors
    ///
    /// * [`SelectionError::UnknownCategory`] — `id` is not in [`CATALOG`].
    /// * [`SelectionError::MinimumSelection`] — `id` is the last active
    ///   category. The selection is unchanged.
    pub fn toggle(&mut self, id: &str) -> Result<(), SelectionError> {
        if !CATALOG.contains(&id) {
            return Err(SelectionError::UnknownCategory(id.to_string()));
        }

        if self.active.contains(id) {
            if self.active.len() == 1 {
                log::warn!("categories: refusing to deactivate the last category ({id})");
                return Err(SelectionError::MinimumSelection);
            }
            self.active.remove(id);
        } else {
            // Exclusivity fires before the new category lands: picking a
            // specific topic drops `geral` in the same atomic update.
            if id != GENERAL_CATEGORY && self.active.contains(GENERAL_CATEGORY) {
                self.active.remove(GENERAL_CATEGORY);
                log::debug!("categories: dropped {GENERAL_CATEGORY} in favour of {id}");
            }
            self.active.insert(id.to_string());
        }

        log::debug!("categories: selection now {:?}", self.active);
        Ok(())
    }

    /// Current active ids. Never empty.
    pub fn selection(&self) -> &BTreeSet<String> {
        &self.active
    }

    /// Whether `id` is currently active.
    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains(id)
    }
}

impl Default for CategorySelector {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a selector with exactly `ids` active. Specific topics go first
    /// (which drops the seed `geral`); `geral` is re-activated last when
    /// requested, since that direction of the rule leaves specifics alone.
    fn selector_with(ids: &[&str]) -> CategorySelector {
        let mut s = CategorySelector::new();
        for id in ids {
            if *id != GENERAL_CATEGORY {
                s.toggle(id).unwrap();
            }
        }
        if ids.contains(&GENERAL_CATEGORY) != s.is_active(GENERAL_CATEGORY) {
            s.toggle(GENERAL_CATEGORY).unwrap();
        }
        assert_eq!(
            s.selection().len(),
            ids.len(),
            "fixture mismatch for {ids:?}"
        );
        s
    }

    // ---- defaults ----

    #[test]
    fn starts_with_general_only() {
        let s = CategorySelector::new();
        assert_eq!(s.selection().len(), 1);
        assert!(s.is_active(GENERAL_CATEGORY));
    }

    // ---- minimum-one rule ----

    #[test]
    fn deactivating_last_category_is_rejected() {
        let mut s = CategorySelector::new();
        let err = s.toggle(GENERAL_CATEGORY).unwrap_err();
        assert_eq!(err, SelectionError::MinimumSelection);
        // No state change.
        assert!(s.is_active(GENERAL_CATEGORY));
        assert_eq!(s.selection().len(), 1);
    }

    #[test]
    fn deactivating_one_of_two_keeps_selection_non_empty() {
        let mut s = selector_with(&["esportes", "tecnologia"]);
        s.toggle("esportes").unwrap();
        assert_eq!(s.selection().len(), 1);
        assert!(s.is_active("tecnologia"));
    }

    // ---- exclusivity rule ----

    #[test]
    fn activating_specific_drops_general() {
        let mut s = CategorySelector::new();
        s.toggle("esportes").unwrap();
        assert!(!s.is_active(GENERAL_CATEGORY));
        assert!(s.is_active("esportes"));
        assert_eq!(s.selection().len(), 1);
    }

    #[test]
    fn activating_second_specific_keeps_first() {
        let mut s = CategorySelector::new();
        s.toggle("esportes").unwrap();
        s.toggle("tecnologia").unwrap();
        assert!(s.is_active("esportes"));
        assert!(s.is_active("tecnologia"));
        assert!(!s.is_active(GENERAL_CATEGORY));
    }

    /// The reverse direction is intentionally NOT applied: activating
    /// `geral` adds it alongside existing specifics.
    #[test]
    fn activating_general_does_not_drop_specifics() {
        let mut s = selector_with(&["esportes", "tecnologia"]);
        s.toggle(GENERAL_CATEGORY).unwrap();
        assert!(s.is_active(GENERAL_CATEGORY));
        assert!(s.is_active("esportes"));
        assert!(s.is_active("tecnologia"));
        assert_eq!(s.selection().len(), 3);
    }

    // ---- plain toggling ----

    #[test]
    fn toggle_twice_round_trips() {
        let mut s = selector_with(&[GENERAL_CATEGORY, "economia"]);
        // geral + economia coexist here because geral was (re)activated last.
        s.toggle("economia").unwrap();
        assert!(!s.is_active("economia"));
        s.toggle("economia").unwrap();
        assert!(s.is_active("economia"));
        // Re-activating economia drops geral again.
        assert!(!s.is_active(GENERAL_CATEGORY));
    }

    // ---- catalog ----

    #[test]
    fn unknown_category_is_rejected() {
        let mut s = CategorySelector::new();
        let err = s.toggle("horoscopo").unwrap_err();
        assert_eq!(err, SelectionError::UnknownCategory("horoscopo".into()));
        assert_eq!(s.selection().len(), 1);
    }

    #[test]
    fn catalog_contains_general() {
        assert!(CATALOG.contains(&GENERAL_CATEGORY));
    }
}
