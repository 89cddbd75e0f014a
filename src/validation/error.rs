use thiserror::Error;

/// Errors raised while building a rule table. These are programming errors in a
/// controller's declared rules, never caused by request input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("Unknown validation rule: {0}")]
    UnknownRule(String),

    #[error("Validation rule '{0}' requires an argument")]
    MissingArgument(String),

    #[error("Invalid argument '{arg}' for validation rule '{rule}'")]
    InvalidArgument { rule: String, arg: String },

    #[error("Unknown database field reference: {0}")]
    UnknownDbField(String),

    #[error("Conflicting type rules for field '{0}'")]
    ConflictingTypes(String),
}
