//! Equality joins over in-memory Arrow tables.
//!
//! This crate exposes the join configuration types (`JoinKey`, `JoinType`, `JoinOptions`) and
//! the [`hash_join`] entry point used by the pipeline to attach product and customer attributes
//! to orders. Joins are single-key equality joins; the right table is the build side and the
//! left table is probed in order, so output rows follow left-table order.
#![forbid(unsafe_code)]

mod hash_join;

use std::fmt;

pub use hash_join::hash_join;

/// Type of join to perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum JoinType {
    /// Emit only matching row pairs.
    Inner,
    /// Emit all left rows; unmatched left rows have NULL right columns.
    #[default]
    Left,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
            JoinType::Left => write!(f, "LEFT"),
        }
    }
}

/// What to do when the build-side key is not unique.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DuplicateKeyPolicy {
    /// Fail with [`tabmerge_result::Error::JoinKey`] on the first repeated key.
    #[default]
    Reject,
    /// Emit one output row per matching pair, inflating the left row count.
    Accept,
}

/// Join key pair describing which columns to equate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinKey {
    /// Column name in the left (probe) table.
    pub left: String,
    /// Column name in the right (build) table.
    pub right: String,
}

impl JoinKey {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Key with the same column name on both sides.
    pub fn on(column: impl Into<String>) -> Self {
        let column = column.into();
        Self {
            left: column.clone(),
            right: column,
        }
    }
}

/// Options controlling join execution.
#[derive(Clone, Debug)]
pub struct JoinOptions {
    pub join_type: JoinType,
    pub duplicate_keys: DuplicateKeyPolicy,
    /// Appended to a right column name that collides with a left column name.
    pub right_suffix: String,
    /// When set, append a non-null boolean column of this name that is true for matched rows.
    pub match_indicator: Option<String>,
    /// Name of the build-side table, used in error messages.
    pub right_name: String,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            join_type: JoinType::Left,
            duplicate_keys: DuplicateKeyPolicy::Reject,
            right_suffix: "_right".to_string(),
            match_indicator: None,
            right_name: "right".to_string(),
        }
    }
}

impl JoinOptions {
    pub fn left() -> Self {
        Self::default()
    }

    pub fn inner() -> Self {
        Self {
            join_type: JoinType::Inner,
            ..Self::default()
        }
    }

    pub fn with_match_indicator(mut self, column: impl Into<String>) -> Self {
        self.match_indicator = Some(column.into());
        self
    }

    pub fn with_duplicate_keys(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.duplicate_keys = policy;
        self
    }

    pub fn with_right_name(mut self, name: impl Into<String>) -> Self {
        self.right_name = name.into();
        self
    }
}
