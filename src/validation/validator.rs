use serde::Serialize;
use serde_json::Value;

use super::rules::{Rule, RuleTable, ValueKind};
use super::schema::{DbField, DbFieldKind};
use crate::params::{array_values, scalar_string, Params};
use crate::types::MAX_OBJECT_ID;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    /// Some fields failed; the cleaned input still holds every field that passed
    Error,
    /// The request shape is unusable
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub fatal: bool,
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    pub input: Params,
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.status == ValidationStatus::Ok
    }

    pub fn is_fatal(&self) -> bool {
        self.status == ValidationStatus::Fatal
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }
}

/// Why a single value failed. `structural` failures make the whole result fatal.
struct Failure {
    reason: String,
    structural: bool,
}

impl Failure {
    fn value(reason: impl Into<String>) -> Self {
        Self { reason: reason.into(), structural: false }
    }

    fn shape(reason: impl Into<String>) -> Self {
        Self { reason: reason.into(), structural: true }
    }
}

pub struct Validator;

impl Validator {
    /// Check `raw` against `rules`. Only declared fields that pass are copied to the
    /// cleaned input.
    pub fn validate(raw: &Params, rules: &RuleTable) -> ValidationResult {
        let mut input = Params::new();
        let mut errors = Vec::new();

        for (field, rule) in rules.iter() {
            let Some(value) = raw.get(field) else {
                if rule.required {
                    errors.push(FieldError {
                        field: field.to_string(),
                        message: format!("Field \"{}\" is mandatory.", field),
                        fatal: true,
                    });
                }
                continue;
            };

            match check_value(value, rule) {
                Ok(()) => {
                    input.insert(field.to_string(), value.clone());
                }
                Err(failure) => {
                    errors.push(FieldError {
                        field: field.to_string(),
                        message: format!("Incorrect value for field \"{}\": {}.", field, failure.reason),
                        fatal: failure.structural || rule.fatal,
                    });
                }
            }
        }

        let status = if errors.iter().any(|e| e.fatal) {
            ValidationStatus::Fatal
        } else if !errors.is_empty() {
            ValidationStatus::Error
        } else {
            ValidationStatus::Ok
        };

        if status != ValidationStatus::Ok {
            tracing::debug!("Validation finished with {:?}: {} error(s)", status, errors.len());
        }

        ValidationResult { status, input, errors }
    }
}

fn check_value(value: &Value, rule: &Rule) -> Result<(), Failure> {
    if rule.kind.is_array() {
        let items = array_values(value).ok_or_else(|| Failure::shape("an array is expected"))?;

        if rule.not_empty && items.is_empty() {
            return Err(Failure::value("cannot be empty"));
        }

        for item in items {
            let item = scalar_string(item).ok_or_else(|| Failure::value("an array of scalar values is expected"))?;
            match &rule.kind {
                ValueKind::ArrayId => check_id(&item)?,
                ValueKind::ArrayDb(field) => check_db(&item, field)?,
                _ => {}
            }
        }

        return Ok(());
    }

    if matches!(value, Value::Array(_) | Value::Object(_)) {
        return Err(Failure::shape("a character string is expected"));
    }

    let text = scalar_string(value).ok_or_else(|| Failure::value("a character string is expected"))?;

    if rule.not_empty && text.is_empty() {
        return Err(Failure::value("cannot be empty"));
    }

    match &rule.kind {
        ValueKind::Int32 => check_int32(&text)?,
        ValueKind::Id => check_id(&text)?,
        ValueKind::Db(field) => check_db(&text, field)?,
        ValueKind::String | ValueKind::Scalar => {}
        ValueKind::Array | ValueKind::ArrayId | ValueKind::ArrayDb(_) => unreachable!("array kinds handled above"),
    }

    if let Some(allowed) = &rule.in_values {
        if !allowed.iter().any(|v| v == &text) {
            return Err(Failure::value(format!("value must be one of {}", allowed.join(", "))));
        }
    }

    if rule.ge.is_some() || rule.le.is_some() {
        let number: i64 = text.parse().map_err(|_| Failure::value("a number is expected"))?;
        if let Some(min) = rule.ge {
            if number < min {
                return Err(Failure::value(format!("value must be no less than \"{}\"", min)));
            }
        }
        if let Some(max) = rule.le {
            if number > max {
                return Err(Failure::value(format!("value must be no greater than \"{}\"", max)));
            }
        }
    }

    Ok(())
}

fn is_integer_literal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn check_int32(text: &str) -> Result<(), Failure> {
    if !is_integer_literal(text) {
        return Err(Failure::value("an integer is expected"));
    }
    match text.parse::<i64>() {
        Ok(n) if n >= i32::MIN as i64 && n <= i32::MAX as i64 => Ok(()),
        _ => Err(Failure::value("a number is too large")),
    }
}

fn check_id(text: &str) -> Result<(), Failure> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Failure::value("a number is expected"));
    }
    match text.parse::<u64>() {
        Ok(n) if n <= MAX_OBJECT_ID => Ok(()),
        _ => Err(Failure::value("a number is too large")),
    }
}

fn check_db(text: &str, field: &DbField) -> Result<(), Failure> {
    match field.kind {
        DbFieldKind::Id => check_id(text),
        DbFieldKind::Int32 => check_int32(text),
        DbFieldKind::Str(max) if text.chars().count() > max => Err(Failure::value("value is too long")),
        DbFieldKind::Str(_) => Ok(()),
    }
}
