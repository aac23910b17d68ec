//! Topic category selection.
//!
//! Provides [`CategorySelector`] (the active-category set with its
//! minimum-one and general-vs-specific rules), the fixed [`CATALOG`] of
//! known category ids, and [`SelectionError`].

pub mod selector;

pub use selector::{CategorySelector, SelectionError, CATALOG, GENERAL_CATEGORY};
