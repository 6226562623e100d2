//! Field rules checked against request bodies before they are deserialized.

use crate::error::AppError;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Constraints on one body field. Built with the const builders so rule tables can be `const`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ValidationRule {
    pub required: bool,
    pub format: Option<Format>,
    pub max_length: Option<usize>,
    pub min_length: Option<usize>,
    pub pattern: Option<&'static str>,
    pub allowed: Option<&'static [&'static str]>,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Email,
    Uuid,
}

impl ValidationRule {
    pub const fn new() -> Self {
        ValidationRule {
            required: false,
            format: None,
            max_length: None,
            min_length: None,
            pattern: None,
            allowed: None,
            minimum: None,
            maximum: None,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn email(mut self) -> Self {
        self.format = Some(Format::Email);
        self
    }

    pub const fn uuid(mut self) -> Self {
        self.format = Some(Format::Uuid);
        self
    }

    pub const fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub const fn pattern(mut self, pattern: &'static str) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub const fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    pub const fn range(mut self, min: i64, max: i64) -> Self {
        self.minimum = Some(min);
        self.maximum = Some(max);
        self
    }
}

/// Rule table for one body: `(field, rule)`, keyed by snake_case field name.
pub type Rules = [(&'static str, ValidationRule)];

pub struct RequestValidator;

impl RequestValidator {
    /// Validate body against per-field rules. All required fields must be present.
    pub fn validate(body: &Map<String, Value>, rules: &Rules) -> Result<(), AppError> {
        for (field, rule) in rules {
            let val = body.get(*field);
            if rule.required && (val.is_none() || val == Some(&Value::Null)) {
                return Err(AppError::Validation(format!("{} is required", field)));
            }
            if let Some(v) = val {
                validate_field(field, v, rule)?;
            }
        }
        Ok(())
    }

    /// Validate only the fields present in body (for updates). Required is not enforced.
    pub fn validate_partial(body: &Map<String, Value>, rules: &Rules) -> Result<(), AppError> {
        for (field, v) in body {
            if let Some((_, rule)) = rules.iter().find(|(f, _)| f == field) {
                validate_field(field, v, rule)?;
            }
        }
        Ok(())
    }
}

fn validate_field(field: &str, v: &Value, rule: &ValidationRule) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    if let Some(format) = rule.format {
        validate_format(field, v, format)?;
    }
    if let Some(s) = v.as_str() {
        let len = s.chars().count();
        if let Some(max) = rule.max_length {
            if len > max {
                return Err(AppError::Validation(format!(
                    "{} must be at most {} characters",
                    field, max
                )));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min {
                return Err(AppError::Validation(format!(
                    "{} must be at least {} characters",
                    field, min
                )));
            }
        }
        if let Some(pattern) = rule.pattern {
            let re = Regex::new(pattern)
                .map_err(|_| AppError::Internal(format!("invalid pattern for {}", field)))?;
            if !re.is_match(s) {
                return Err(AppError::Validation(format!("{} does not match required pattern", field)));
            }
        }
        if let Some(allowed) = rule.allowed {
            if !allowed.iter().any(|a| *a == s) {
                return Err(AppError::Validation(format!("{} must be one of: {:?}", field, allowed)));
            }
        }
    }
    if let Some(n) = v.as_i64() {
        if let Some(min) = rule.minimum {
            if n < min {
                return Err(AppError::Validation(format!("{} must be at least {}", field, min)));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                return Err(AppError::Validation(format!("{} must be at most {}", field, max)));
            }
        }
    }
    Ok(())
}

fn email_regex() -> Result<&'static Regex, AppError> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
        .as_ref()
        .ok_or_else(|| AppError::Internal("email pattern failed to compile".into()))
}

fn validate_format(field: &str, v: &Value, format: Format) -> Result<(), AppError> {
    let Some(s) = v.as_str() else {
        return Err(AppError::Validation(format!("{} must be a string", field)));
    };
    match format {
        Format::Email => {
            if !email_regex()?.is_match(s) {
                return Err(AppError::Validation(format!("{} must be a valid email", field)));
            }
        }
        Format::Uuid => {
            if uuid::Uuid::parse_str(s).is_err() {
                return Err(AppError::Validation(format!("{} must be a valid UUID", field)));
            }
        }
    }
    Ok(())
}
