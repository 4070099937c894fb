// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use thiserror::Error;

/// A record field that breaks one of the record's shape rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} is malformed: {reason}")]
    Malformed { field: &'static str, reason: String },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: i64 },

    #[error("v_count is {declared} but vulnerabilities decodes to {decoded} entries")]
    CountMismatch { declared: i64, decoded: usize },
}

/// Reject empty or whitespace-only text fields.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

/// Reject text longer than `max` characters (the `VARCHAR(max)` bound of its
/// column).
pub(crate) fn require_max_chars(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let chars = value.chars().count();
    if chars > max {
        return Err(ValidationError::Malformed {
            field,
            reason: format!("{} characters exceeds the limit of {}", chars, max),
        });
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}
