use std::str::FromStr;

use super::error::RuleError;
use super::schema::{self, DbField};

/// Shape and type a parameter must have.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    /// Any scalar
    Scalar,
    String,
    Int32,
    Id,
    Db(DbField),
    /// Array of anything
    Array,
    ArrayId,
    ArrayDb(DbField),
}

impl ValueKind {
    pub fn is_array(&self) -> bool {
        matches!(self, ValueKind::Array | ValueKind::ArrayId | ValueKind::ArrayDb(_))
    }
}

/// One parsed rule expression, e.g. `required|array_db module.moduleid`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub required: bool,
    pub not_empty: bool,
    pub fatal: bool,
    pub kind: ValueKind,
    pub in_values: Option<Vec<String>>,
    pub ge: Option<i64>,
    pub le: Option<i64>,
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            required: false,
            not_empty: false,
            fatal: false,
            kind: ValueKind::Scalar,
            in_values: None,
            ge: None,
            le: None,
        }
    }
}

impl FromStr for Rule {
    type Err = RuleError;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        let mut rule = Rule::default();
        let mut kind: Option<ValueKind> = None;

        for token in expression.split('|').map(str::trim).filter(|t| !t.is_empty()) {
            let (name, arg) = match token.split_once(' ') {
                Some((name, arg)) => (name, Some(arg.trim())),
                None => (token, None),
            };

            let token_kind = match name {
                "required" => {
                    rule.required = true;
                    None
                }
                "not_empty" => {
                    rule.not_empty = true;
                    None
                }
                "fatal" => {
                    rule.fatal = true;
                    None
                }
                "in" => {
                    let arg = arg.ok_or_else(|| RuleError::MissingArgument(name.to_string()))?;
                    rule.in_values = Some(arg.split(',').map(|v| v.trim().to_string()).collect());
                    None
                }
                "ge" => {
                    rule.ge = Some(int_arg(name, arg)?);
                    None
                }
                "le" => {
                    rule.le = Some(int_arg(name, arg)?);
                    None
                }
                "string" => Some(ValueKind::String),
                "int32" => Some(ValueKind::Int32),
                "id" => Some(ValueKind::Id),
                "array" => Some(ValueKind::Array),
                "array_id" => Some(ValueKind::ArrayId),
                "db" => Some(ValueKind::Db(db_field(name, arg)?)),
                "array_db" => Some(ValueKind::ArrayDb(db_field(name, arg)?)),
                other => return Err(RuleError::UnknownRule(other.to_string())),
            };

            if let Some(token_kind) = token_kind {
                if kind.is_some() {
                    return Err(RuleError::ConflictingTypes(expression.to_string()));
                }
                kind = Some(token_kind);
            }
        }

        if let Some(kind) = kind {
            rule.kind = kind;
        }

        Ok(rule)
    }
}

fn db_field(rule: &str, arg: Option<&str>) -> Result<DbField, RuleError> {
    let reference = arg.ok_or_else(|| RuleError::MissingArgument(rule.to_string()))?;
    schema::lookup(reference).ok_or_else(|| RuleError::UnknownDbField(reference.to_string()))
}

fn int_arg(rule: &str, arg: Option<&str>) -> Result<i64, RuleError> {
    let arg = arg.ok_or_else(|| RuleError::MissingArgument(rule.to_string()))?;
    arg.parse().map_err(|_| RuleError::InvalidArgument {
        rule: rule.to_string(),
        arg: arg.to_string(),
    })
}

/// Declared parameters of one action, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<(String, Rule)>,
}

impl RuleTable {
    pub fn parse<I, K, V>(fields: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let rules = fields
            .into_iter()
            .map(|(field, expression)| {
                let rule: Rule = expression.as_ref().parse()?;
                Ok((field.into(), rule))
            })
            .collect::<Result<Vec<(String, Rule)>, RuleError>>()?;
        Ok(Self { rules })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(field, rule)| (field.as_str(), rule))
    }

    pub fn get(&self, field: &str) -> Option<&Rule> {
        self.rules.iter().find(|(f, _)| f == field).map(|(_, rule)| rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::schema::DbFieldKind;

    #[test]
    fn test_parse_module_update_rules() {
        let rule: Rule = "required|array_db module.moduleid".parse().unwrap();
        assert!(rule.required);
        match rule.kind {
            ValueKind::ArrayDb(field) => assert_eq!(field.kind, DbFieldKind::Id),
            other => panic!("unexpected kind {:?}", other),
        }

        let rule: Rule = "in 1".parse().unwrap();
        assert_eq!(rule.in_values, Some(vec!["1".to_string()]));
        assert_eq!(rule.kind, ValueKind::Scalar);
    }

    #[test]
    fn test_parse_rejects_unknown_tokens() {
        assert_eq!(
            "required|uuid".parse::<Rule>(),
            Err(RuleError::UnknownRule("uuid".to_string()))
        );
        assert_eq!(
            "db module.nope".parse::<Rule>(),
            Err(RuleError::UnknownDbField("module.nope".to_string()))
        );
        assert!(matches!("int32|string".parse::<Rule>(), Err(RuleError::ConflictingTypes(_))));
        assert!(matches!("ge abc".parse::<Rule>(), Err(RuleError::InvalidArgument { .. })));
        assert!(matches!("in".parse::<Rule>(), Err(RuleError::MissingArgument(_))));
    }

    #[test]
    fn test_table_keeps_declaration_order() {
        let table = RuleTable::parse([("b", "int32"), ("a", "string"), ("c", "id")]).unwrap();
        let fields: Vec<&str> = table.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["b", "a", "c"]);
        assert_eq!(table.len(), 3);
    }
}
