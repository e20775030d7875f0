//! Schema metadata types.
//!
//! Snapshots of the catalog views, materialized per request and never
//! cached; the database is the sole source of truth.

use std::fmt;

use serde::Serialize;

use crate::error::SchemaError;

/// Identifies a base table by schema and name. The unit of all operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// One column of a table as described by the catalog views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMetadata {
    pub name: String,
    /// Declared SQL type name, lowercase.
    pub data_type: String,
    pub nullable: bool,
    /// Server-generated on insert; never supplied by the client.
    pub is_identity: bool,
}

/// Collapse the catalog's primary-key column list into a usable key.
///
/// Zero columns means updates and deletes are unsupported for the table;
/// more than one is rejected outright, composite keys are not handled.
pub fn resolve_primary_key(
    table: &TableRef,
    mut columns: Vec<String>,
) -> Result<Option<String>, SchemaError> {
    match columns.len() {
        0 => Ok(None),
        1 => Ok(Some(columns.remove(0))),
        _ => Err(SchemaError::CompositeKey {
            table: table.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> TableRef {
        TableRef::new("dbo", "Orders")
    }

    #[test]
    fn test_no_key_columns_is_not_an_error() {
        assert_eq!(resolve_primary_key(&orders(), vec![]), Ok(None));
    }

    #[test]
    fn test_single_key_column() {
        let pk = resolve_primary_key(&orders(), vec!["OrderId".to_string()]).unwrap();
        assert_eq!(pk, Some("OrderId".to_string()));
    }

    #[test]
    fn test_composite_key_rejected() {
        let err = resolve_primary_key(
            &orders(),
            vec!["OrderId".to_string(), "LineNo".to_string()],
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::CompositeKey {
                table: "dbo.Orders".to_string()
            }
        );
    }

    #[test]
    fn test_table_ref_display() {
        assert_eq!(orders().to_string(), "dbo.Orders");
    }
}
