//! Dynamic SQL text assembly.
//!
//! Identifiers are bracket-quoted with embedded closing brackets doubled,
//! closing the injection route through identifier position. Values always
//! travel as positional `@Pn` parameters and are never interpolated into
//! the statement text.

use crate::error::ValidationError;
use crate::schema::TableRef;

/// Row listing cap. Natural table order, no further ordering guarantee.
pub const DEFAULT_ROW_LIMIT: u32 = 200;

/// Bracket-quote an identifier, doubling any embedded `]`.
pub fn quote_ident(name: &str) -> Result<String, ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::InvalidIdentifier);
    }
    Ok(format!("[{}]", name.replace(']', "]]")))
}

/// `[schema].[table]` form of a table reference.
pub fn qualified_table(table: &TableRef) -> Result<String, ValidationError> {
    Ok(format!(
        "{}.{}",
        quote_ident(&table.schema)?,
        quote_ident(&table.name)?
    ))
}

/// `SELECT TOP (limit) * FROM [schema].[table]`
pub fn select_top(table: &TableRef, limit: u32) -> Result<String, ValidationError> {
    Ok(format!(
        "SELECT TOP ({}) * FROM {}",
        limit,
        qualified_table(table)?
    ))
}

/// `SELECT COUNT(1) FROM [schema].[table]`
pub fn count_rows(table: &TableRef) -> Result<String, ValidationError> {
    Ok(format!("SELECT COUNT(1) FROM {}", qualified_table(table)?))
}

/// INSERT over the given columns, one placeholder per column.
///
/// The caller has already dropped identity columns and blank-valued fields.
pub fn insert(table: &TableRef, columns: &[String]) -> Result<String, ValidationError> {
    let cols = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Result<Vec<_>, _>>()?
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("@P{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        qualified_table(table)?,
        cols,
        placeholders
    ))
}

/// UPDATE with a SET clause over the submitted columns, pinned to the
/// single primary-key column. The key value binds as the last parameter.
pub fn update(
    table: &TableRef,
    set_columns: &[String],
    pk_column: &str,
) -> Result<String, ValidationError> {
    let assignments = set_columns
        .iter()
        .enumerate()
        .map(|(i, c)| Ok(format!("{} = @P{}", quote_ident(c)?, i + 1)))
        .collect::<Result<Vec<_>, ValidationError>>()?
        .join(", ");
    Ok(format!(
        "UPDATE {} SET {} WHERE {} = @P{}",
        qualified_table(table)?,
        assignments,
        quote_ident(pk_column)?,
        set_columns.len() + 1
    ))
}

/// DELETE by the single primary-key column.
pub fn delete(table: &TableRef, pk_column: &str) -> Result<String, ValidationError> {
    Ok(format!(
        "DELETE FROM {} WHERE {} = @P1",
        qualified_table(table)?,
        quote_ident(pk_column)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn orders() -> TableRef {
        TableRef::new("dbo", "Orders")
    }

    #[test]
    fn test_quote_ident_plain() {
        assert_eq!(quote_ident("Name").unwrap(), "[Name]");
    }

    #[test]
    fn test_quote_ident_doubles_closing_bracket() {
        assert_eq!(quote_ident("we]ird").unwrap(), "[we]]ird]");
        assert_eq!(quote_ident("]").unwrap(), "[]]]");
    }

    #[test]
    fn test_quote_ident_empty_rejected() {
        assert_eq!(quote_ident(""), Err(ValidationError::InvalidIdentifier));
    }

    #[test]
    fn test_select_top() {
        assert_eq!(
            select_top(&orders(), 200).unwrap(),
            "SELECT TOP (200) * FROM [dbo].[Orders]"
        );
    }

    #[test]
    fn test_count_rows() {
        assert_eq!(
            count_rows(&orders()).unwrap(),
            "SELECT COUNT(1) FROM [dbo].[Orders]"
        );
    }

    #[test]
    fn test_insert_statement() {
        let sql = insert(
            &orders(),
            &["Customer".to_string(), "Total".to_string()],
        )
        .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO [dbo].[Orders] ([Customer], [Total]) VALUES (@P1, @P2)"
        );
    }

    #[test]
    fn test_update_statement() {
        let sql = update(
            &orders(),
            &["Customer".to_string(), "Total".to_string()],
            "OrderId",
        )
        .unwrap();
        assert_eq!(
            sql,
            "UPDATE [dbo].[Orders] SET [Customer] = @P1, [Total] = @P2 WHERE [OrderId] = @P3"
        );
    }

    #[test]
    fn test_delete_statement() {
        assert_eq!(
            delete(&orders(), "OrderId").unwrap(),
            "DELETE FROM [dbo].[Orders] WHERE [OrderId] = @P1"
        );
    }

    proptest! {
        /// Un-doubling the quoted body always recovers the original
        /// identifier, for any mix of brackets and ordinary characters.
        #[test]
        fn test_quoting_roundtrip(name in "[A-Za-z0-9_\\]\\[ ]{1,40}") {
            let quoted = quote_ident(&name).unwrap();
            prop_assert!(quoted.starts_with('['));
            prop_assert!(quoted.ends_with(']'));
            let body = &quoted[1..quoted.len() - 1];
            prop_assert_eq!(body.replace("]]", "]"), name);
        }

        /// Every embedded closing bracket appears doubled in the output.
        #[test]
        fn test_closing_brackets_doubled(name in "[a-z\\]]{1,20}") {
            let quoted = quote_ident(&name).unwrap();
            let body = &quoted[1..quoted.len() - 1];
            let singles = name.matches(']').count();
            prop_assert_eq!(body.matches(']').count(), singles * 2);
        }
    }
}
