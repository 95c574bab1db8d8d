//! Request input validation
//!
//! Rules run per field and stop at the first failure for that field, so
//! each invalid field reports exactly one message. Failures are collected
//! into [`ValidationErrors`] and returned together as a 422.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// A single rule failure; the display text is the client-facing message
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("The {} field is required.", label(.field))]
    Required { field: String },

    #[error("The {} field must be a string.", label(.field))]
    NotAString { field: String },

    #[error("The {} field must be an integer.", label(.field))]
    NotAnInteger { field: String },

    #[error("The {} field must not be greater than {max} characters.", label(.field))]
    TooLong { field: String, max: usize },

    #[error("The {} field must be at least {min}.", label(.field))]
    TooSmall { field: String, min: i64 },

    #[error("The {} field must be a valid UUID.", label(.field))]
    InvalidUuid { field: String },

    #[error("The {} field must match the format Y-m-d.", label(.field))]
    InvalidDate { field: String },

    /// Value outside the allowed set, or a reference to a missing record
    #[error("The selected {} is invalid.", label(.field))]
    Invalid { field: String },

    #[error("The {} has already been taken.", label(.field))]
    Taken { field: String },
}

/// `location_id` -> `location id`
fn label(field: &str) -> String {
    field.replace('_', " ")
}

pub type RuleResult<T> = Result<T, ValidationError>;

/// Per-field messages, keyed and ordered by field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F: Into<String>>(&mut self, field: F, error: ValidationError) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(error.to_string());
    }

    /// Record a failed rule chain; passes a successful value through
    pub fn check<T>(&mut self, field: &str, result: RuleResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.add(field, error);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fields(&self) -> Vec<&str> {
        self.errors.keys().map(String::as_str).collect()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.errors).unwrap_or(Value::Null)
    }

    /// `Ok(())` when no rule failed
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Request body as an object; anything else validates as an empty body
pub fn object(body: &Value) -> Map<String, Value> {
    body.as_object().cloned().unwrap_or_default()
}

/// Present, not null and not a blank string
pub fn required<'a>(input: &'a Map<String, Value>, field: &str) -> RuleResult<&'a Value> {
    match input.get(field) {
        None | Some(Value::Null) => Err(ValidationError::Required {
            field: field.to_string(),
        }),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ValidationError::Required {
            field: field.to_string(),
        }),
        Some(value) => Ok(value),
    }
}

pub fn string<'a>(value: &'a Value, field: &str) -> RuleResult<&'a str> {
    value.as_str().ok_or_else(|| ValidationError::NotAString {
        field: field.to_string(),
    })
}

/// JSON integers and integer strings (`"5"`) are both accepted
pub fn integer(value: &Value, field: &str) -> RuleResult<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ValidationError::NotAnInteger {
        field: field.to_string(),
    })
}

pub fn integer_str(value: &str, field: &str) -> RuleResult<i64> {
    value.trim().parse().map_err(|_| ValidationError::NotAnInteger {
        field: field.to_string(),
    })
}

/// Length limit counted in characters, not bytes
pub fn max_chars<'a>(value: &'a str, max: usize, field: &str) -> RuleResult<&'a str> {
    if value.chars().count() > max {
        Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        })
    } else {
        Ok(value)
    }
}

pub fn min(value: i64, min: i64, field: &str) -> RuleResult<i64> {
    if value < min {
        Err(ValidationError::TooSmall {
            field: field.to_string(),
            min,
        })
    } else {
        Ok(value)
    }
}

pub fn uuid<'a>(value: &'a str, field: &str) -> RuleResult<&'a str> {
    Uuid::parse_str(value)
        .map(|_| value)
        .map_err(|_| ValidationError::InvalidUuid {
            field: field.to_string(),
        })
}

/// Strict `YYYY-MM-DD`
pub fn date_ymd(value: &str, field: &str) -> RuleResult<NaiveDate> {
    let well_formed = value.len() == 10
        && value
            .char_indices()
            .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
    if !well_formed {
        return Err(ValidationError::InvalidDate {
            field: field.to_string(),
        });
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        field: field.to_string(),
    })
}

pub fn one_of<T>(value: Result<T, impl std::fmt::Debug>, field: &str) -> RuleResult<T> {
    value.map_err(|_| ValidationError::Invalid {
        field: field.to_string(),
    })
}
