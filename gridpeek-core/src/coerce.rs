//! Text-to-typed-value coercion driven by declared column types.
//!
//! Form input arrives as text; the declared SQL type of the target column
//! decides how it is parsed before being bound as a query parameter.
//! Blank handling (insert: omit the column, update: set to null) belongs
//! to the request handlers, not here.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use thiserror::Error;

/// A typed scalar ready to be bound as a query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Decimal(Decimal),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
    Null,
}

/// Why a piece of text could not be coerced to its column's type.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CoerceError {
    #[error("integer field must be a whole number")]
    Integer,

    #[error("numeric field must be a number")]
    Numeric,

    #[error("float field must be a number")]
    Float,

    #[error("bit field must be true/false or 1/0")]
    Bit,

    #[error("date format must be YYYY-MM-DD")]
    Date,

    #[error("datetime format must be YYYY-MM-DD HH:MM[:SS]")]
    DateTime,
}

/// Accepted datetime layouts, tried in order; first match wins.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Coerce raw text to a typed value according to the declared SQL type.
///
/// Type names are matched case-insensitively. Unrecognized types pass
/// through as trimmed text and never fail.
pub fn coerce_value(raw: &str, data_type: &str) -> Result<SqlValue, CoerceError> {
    let text = raw.trim();

    match data_type.trim().to_ascii_lowercase().as_str() {
        "int" | "bigint" | "smallint" | "tinyint" => text
            .parse::<i64>()
            .map(SqlValue::Int)
            .map_err(|_| CoerceError::Integer),
        "decimal" | "numeric" | "money" | "smallmoney" => {
            // Tolerate thousands separators pasted from spreadsheets.
            let normalized = text.replace(',', "");
            normalized
                .parse::<Decimal>()
                .map(SqlValue::Decimal)
                .map_err(|_| CoerceError::Numeric)
        }
        "float" | "real" => text
            .parse::<f64>()
            .map(SqlValue::Float)
            .map_err(|_| CoerceError::Float),
        "bit" => match text.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "y" => Ok(SqlValue::Bool(true)),
            "0" | "false" | "no" | "n" => Ok(SqlValue::Bool(false)),
            _ => Err(CoerceError::Bit),
        },
        "date" => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(SqlValue::Date)
            .map_err(|_| CoerceError::Date),
        "datetime" | "datetime2" | "smalldatetime" => DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .map(SqlValue::DateTime)
            .ok_or(CoerceError::DateTime),
        _ => Ok(SqlValue::Text(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_integer_family() {
        assert_eq!(coerce_value("42", "int"), Ok(SqlValue::Int(42)));
        assert_eq!(coerce_value(" -7 ", "bigint"), Ok(SqlValue::Int(-7)));
        assert_eq!(coerce_value("3", "SMALLINT"), Ok(SqlValue::Int(3)));
        assert_eq!(coerce_value("abc", "int"), Err(CoerceError::Integer));
        assert_eq!(coerce_value("3.5", "tinyint"), Err(CoerceError::Integer));
    }

    #[test]
    fn test_exact_numeric_family() {
        assert_eq!(
            coerce_value("1,234.50", "decimal"),
            Ok(SqlValue::Decimal(decimal("1234.50")))
        );
        assert_eq!(
            coerce_value("19.99", "money"),
            Ok(SqlValue::Decimal(decimal("19.99")))
        );
        assert_eq!(coerce_value("12x", "numeric"), Err(CoerceError::Numeric));
    }

    #[test]
    fn test_approximate_numeric_family() {
        assert_eq!(coerce_value("3.14", "float"), Ok(SqlValue::Float(3.14)));
        assert_eq!(coerce_value("-0.5", "real"), Ok(SqlValue::Float(-0.5)));
        assert_eq!(coerce_value("pi", "float"), Err(CoerceError::Float));
    }

    #[test]
    fn test_bit_family() {
        for truthy in ["1", "true", "YES", "y"] {
            assert_eq!(coerce_value(truthy, "bit"), Ok(SqlValue::Bool(true)));
        }
        for falsy in ["0", "False", "no", "N"] {
            assert_eq!(coerce_value(falsy, "bit"), Ok(SqlValue::Bool(false)));
        }
        assert_eq!(coerce_value("maybe", "bit"), Err(CoerceError::Bit));
    }

    #[test]
    fn test_date() {
        assert_eq!(
            coerce_value("2024-01-05", "date"),
            Ok(SqlValue::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()))
        );
        assert_eq!(coerce_value("05/01/2024", "date"), Err(CoerceError::Date));
    }

    #[test]
    fn test_datetime_candidate_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();

        assert_eq!(
            coerce_value("2024-01-05 10:30:00", "datetime"),
            Ok(SqlValue::DateTime(expected))
        );
        assert_eq!(
            coerce_value("2024-01-05 10:30", "datetime2"),
            Ok(SqlValue::DateTime(expected))
        );
        assert_eq!(
            coerce_value("2024-01-05T10:30", "smalldatetime"),
            Ok(SqlValue::DateTime(expected))
        );
        assert_eq!(
            coerce_value("2024-01-05T10:30:00", "datetime"),
            Ok(SqlValue::DateTime(expected))
        );
        assert_eq!(
            coerce_value("Jan 5 2024", "datetime"),
            Err(CoerceError::DateTime)
        );
    }

    #[test]
    fn test_passthrough_trims() {
        assert_eq!(
            coerce_value("  hello  ", "nvarchar"),
            Ok(SqlValue::Text("hello".to_string()))
        );
        assert_eq!(
            coerce_value("anything", "uniqueidentifier"),
            Ok(SqlValue::Text("anything".to_string()))
        );
    }
}
