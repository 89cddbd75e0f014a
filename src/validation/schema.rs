/// Column types of the tables that request parameters may reference through
/// `db table.field` and `array_db table.field` rules.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbFieldKind {
    Id,
    Int32,
    Str(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbField {
    pub table: &'static str,
    pub field: &'static str,
    pub kind: DbFieldKind,
}

const FIELDS: &[DbField] = &[
    DbField { table: "module", field: "moduleid", kind: DbFieldKind::Id },
    DbField { table: "module", field: "id", kind: DbFieldKind::Str(255) },
    DbField { table: "module", field: "relative_path", kind: DbFieldKind::Str(255) },
    DbField { table: "module", field: "status", kind: DbFieldKind::Int32 },
    DbField { table: "profiles", field: "idx", kind: DbFieldKind::Str(96) },
    DbField { table: "profiles", field: "idx2", kind: DbFieldKind::Id },
    DbField { table: "profiles", field: "value_int", kind: DbFieldKind::Int32 },
    DbField { table: "profiles", field: "value_str", kind: DbFieldKind::Str(255) },
    DbField { table: "hosts", field: "hostid", kind: DbFieldKind::Id },
    DbField { table: "hosts", field: "name", kind: DbFieldKind::Str(128) },
    DbField { table: "hstgrp", field: "groupid", kind: DbFieldKind::Id },
    DbField { table: "triggers", field: "triggerid", kind: DbFieldKind::Id },
    DbField { table: "triggers", field: "description", kind: DbFieldKind::Str(255) },
    DbField { table: "triggers", field: "priority", kind: DbFieldKind::Int32 },
    DbField { table: "users", field: "userid", kind: DbFieldKind::Id },
    DbField { table: "users", field: "username", kind: DbFieldKind::Str(100) },
];

/// Look up `table.field`.
pub fn lookup(reference: &str) -> Option<DbField> {
    let (table, field) = reference.split_once('.')?;
    FIELDS
        .iter()
        .copied()
        .find(|f| f.table == table && f.field == field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_and_unknown() {
        assert_eq!(lookup("module.moduleid").map(|f| f.kind), Some(DbFieldKind::Id));
        assert_eq!(lookup("profiles.idx").map(|f| f.kind), Some(DbFieldKind::Str(96)));
        assert!(lookup("module.nope").is_none());
        assert!(lookup("module").is_none());
    }
}
