pub mod error;
pub mod rules;
pub mod schema;
pub mod validator;

pub use error::RuleError;
pub use rules::{Rule, RuleTable, ValueKind};
pub use validator::{FieldError, ValidationResult, ValidationStatus, Validator};
