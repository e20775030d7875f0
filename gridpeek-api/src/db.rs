//! SQL Server access layer.
//!
//! Every operation opens a fresh connection, runs one statement (or a short
//! fixed sequence), and drops the connection on all exit paths. No pooling,
//! no retries: the database server is the sole arbiter of concurrent
//! mutation and every failure surfaces immediately.

use serde::Serialize;
use tiberius::{Client, ColumnData, Config, FromSql, SqlBrowser, ToSql};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use gridpeek_core::{resolve_primary_key, sql, ColumnMetadata, DbSettings, SqlValue, TableRef};

use crate::error::{ApiError, ApiResult};

type Connection = Client<Compat<TcpStream>>;

// ============================================================================
// CATALOG QUERIES
// ============================================================================

const LIST_TABLES: &str = "\
SELECT TABLE_SCHEMA, TABLE_NAME
FROM INFORMATION_SCHEMA.TABLES
WHERE TABLE_TYPE = 'BASE TABLE'
ORDER BY TABLE_SCHEMA, TABLE_NAME";

const TABLE_COLUMNS: &str = "\
SELECT
  c.COLUMN_NAME,
  c.DATA_TYPE,
  c.IS_NULLABLE,
  COLUMNPROPERTY(
    OBJECT_ID(c.TABLE_SCHEMA + '.' + c.TABLE_NAME),
    c.COLUMN_NAME,
    'IsIdentity'
  ) AS IS_IDENTITY
FROM INFORMATION_SCHEMA.COLUMNS AS c
WHERE c.TABLE_SCHEMA = @P1 AND c.TABLE_NAME = @P2
ORDER BY c.ORDINAL_POSITION";

const PRIMARY_KEY_COLUMNS: &str = "\
SELECT KU.COLUMN_NAME
FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS AS TC
JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE AS KU
  ON TC.CONSTRAINT_NAME = KU.CONSTRAINT_NAME
 AND TC.TABLE_SCHEMA = KU.TABLE_SCHEMA
WHERE TC.CONSTRAINT_TYPE = 'PRIMARY KEY'
  AND TC.TABLE_SCHEMA = @P1
  AND TC.TABLE_NAME = @P2
ORDER BY KU.ORDINAL_POSITION";

const CONNECTION_INFO: &str = "\
SELECT
  CAST(@@SERVERNAME AS nvarchar(255)) AS server_name,
  CAST(DB_NAME() AS nvarchar(255)) AS database_name,
  CAST(COALESCE(
    CAST(SERVERPROPERTY('InstanceName') AS nvarchar(255)),
    'MSSQLSERVER'
  ) AS nvarchar(255)) AS instance_name";

// ============================================================================
// CLIENT
// ============================================================================

/// What the viewer is actually connected to, as reported by the server.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionInfo {
    pub server_name: String,
    pub database_name: String,
    pub instance_name: String,
    /// The configured target, for comparison against the server's own name.
    pub target_server: String,
}

/// Thin client over the TDS driver. Cheap to clone; holds no connection,
/// only the validated settings used to open one per operation.
#[derive(Clone)]
pub struct MssqlClient {
    settings: DbSettings,
}

impl MssqlClient {
    pub fn new(settings: DbSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &DbSettings {
        &self.settings
    }

    fn driver_config(&self) -> ApiResult<Config> {
        let conn_str = self.settings.connection_string()?;
        Config::from_ado_string(&conn_str)
            .map_err(|e| ApiError::config(format!("Invalid connection string: {}", e)))
    }

    async fn connect(&self) -> ApiResult<Connection> {
        let config = self.driver_config()?;
        let attempt = async move {
            let tcp = TcpStream::connect_named(&config).await?;
            tcp.set_nodelay(true)?;
            Client::connect(config, tcp.compat_write()).await
        };
        match timeout(self.settings.connect_timeout, attempt).await {
            Ok(client) => Ok(client?),
            Err(_) => Err(ApiError::database(format!(
                "Connection to {} timed out after {}s",
                self.settings.server,
                self.settings.connect_timeout.as_secs()
            ))),
        }
    }

    // ========================================================================
    // SCHEMA INTROSPECTION
    // ========================================================================

    /// List all base tables, ordered by schema then name.
    pub async fn list_tables(&self) -> ApiResult<Vec<TableRef>> {
        let mut client = self.connect().await?;
        let rows = client
            .simple_query(LIST_TABLES)
            .await?
            .into_first_result()
            .await?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let schema: &str = row.try_get(0)?.unwrap_or_default();
            let name: &str = row.try_get(1)?.unwrap_or_default();
            tables.push(TableRef::new(schema, name));
        }
        Ok(tables)
    }

    /// Column metadata for a table, in physical column order. An unknown
    /// table yields an empty list, not an error.
    pub async fn table_columns(&self, table: &TableRef) -> ApiResult<Vec<ColumnMetadata>> {
        let mut client = self.connect().await?;
        let rows = client
            .query(TABLE_COLUMNS, &[&table.schema.as_str(), &table.name.as_str()])
            .await?
            .into_first_result()
            .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: &str = row.try_get(0)?.unwrap_or_default();
            let data_type: &str = row.try_get(1)?.unwrap_or_default();
            let nullable: &str = row.try_get(2)?.unwrap_or_default();
            let identity: Option<i32> = row.try_get(3)?;
            columns.push(ColumnMetadata {
                name: name.to_string(),
                data_type: data_type.to_lowercase(),
                nullable: nullable == "YES",
                is_identity: identity == Some(1),
            });
        }
        Ok(columns)
    }

    /// Resolve the single primary-key column for a table. `None` means the
    /// table has no key; a composite key is rejected.
    pub async fn table_primary_key(&self, table: &TableRef) -> ApiResult<Option<String>> {
        let mut client = self.connect().await?;
        let rows = client
            .query(
                PRIMARY_KEY_COLUMNS,
                &[&table.schema.as_str(), &table.name.as_str()],
            )
            .await?
            .into_first_result()
            .await?;

        let mut key_columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: &str = row.try_get(0)?.unwrap_or_default();
            key_columns.push(name.to_string());
        }
        Ok(resolve_primary_key(table, key_columns)?)
    }

    /// Identity of the server and database on the other end.
    pub async fn connection_info(&self) -> ApiResult<ConnectionInfo> {
        let mut client = self.connect().await?;
        let rows = client
            .simple_query(CONNECTION_INFO)
            .await?
            .into_first_result()
            .await?;

        let row = rows
            .first()
            .ok_or_else(|| ApiError::database("Connection info query returned no rows"))?;
        Ok(ConnectionInfo {
            server_name: row.try_get::<&str, _>(0)?.unwrap_or_default().to_string(),
            database_name: row.try_get::<&str, _>(1)?.unwrap_or_default().to_string(),
            instance_name: row.try_get::<&str, _>(2)?.unwrap_or_default().to_string(),
            target_server: self.settings.server.clone(),
        })
    }

    // ========================================================================
    // ROW OPERATIONS
    // ========================================================================

    /// Up to `limit` rows in natural table order, rendered for display.
    /// `None` cells are SQL NULLs.
    pub async fn table_rows(
        &self,
        table: &TableRef,
        limit: u32,
    ) -> ApiResult<Vec<Vec<Option<String>>>> {
        let statement = sql::select_top(table, limit)?;
        let mut client = self.connect().await?;
        let rows = client
            .simple_query(statement)
            .await?
            .into_first_result()
            .await?;

        Ok(rows
            .iter()
            .map(|row| row.cells().map(|(_, data)| render_cell(data)).collect())
            .collect())
    }

    /// Total row count for the table.
    pub async fn table_count(&self, table: &TableRef) -> ApiResult<i64> {
        let statement = sql::count_rows(table)?;
        let mut client = self.connect().await?;
        let rows = client
            .simple_query(statement)
            .await?
            .into_first_result()
            .await?;

        // Only a missing row or a SQL NULL counts as zero; a cell that
        // fails to decode is a real error and propagates.
        let count: i32 = match rows.first() {
            Some(row) => row.try_get(0)?.unwrap_or(0),
            None => 0,
        };
        Ok(count as i64)
    }

    /// Insert one row. Columns and values arrive pre-filtered: no identity
    /// columns, no blank fields.
    pub async fn insert_row(
        &self,
        table: &TableRef,
        values: &[(String, SqlValue)],
    ) -> ApiResult<u64> {
        let columns: Vec<String> = values.iter().map(|(name, _)| name.clone()).collect();
        let statement = sql::insert(table, &columns)?;
        let wrapped: Vec<SqlParam<'_>> = values.iter().map(|(_, v)| SqlParam(v)).collect();
        let params: Vec<&dyn ToSql> = wrapped.iter().map(|p| p as &dyn ToSql).collect();

        let mut client = self.connect().await?;
        let result = client.execute(statement, &params).await?;
        Ok(result.total())
    }

    /// Update the row matched by the primary key. The key value binds as
    /// raw text; the server converts it against the key column's declared
    /// type.
    pub async fn update_row(
        &self,
        table: &TableRef,
        set_values: &[(String, SqlValue)],
        pk_column: &str,
        pk_value: &str,
    ) -> ApiResult<u64> {
        let columns: Vec<String> = set_values.iter().map(|(name, _)| name.clone()).collect();
        let statement = sql::update(table, &columns, pk_column)?;
        let wrapped: Vec<SqlParam<'_>> = set_values.iter().map(|(_, v)| SqlParam(v)).collect();
        let mut params: Vec<&dyn ToSql> = wrapped.iter().map(|p| p as &dyn ToSql).collect();
        params.push(&pk_value);

        let mut client = self.connect().await?;
        let result = client.execute(statement, &params).await?;
        Ok(result.total())
    }

    /// Delete the row matched by the primary key.
    pub async fn delete_row(
        &self,
        table: &TableRef,
        pk_column: &str,
        pk_value: &str,
    ) -> ApiResult<u64> {
        let statement = sql::delete(table, pk_column)?;
        let mut client = self.connect().await?;
        let result = client.execute(statement, &[&pk_value]).await?;
        Ok(result.total())
    }

    /// Trivial round-trip query for the health check.
    pub async fn ping(&self) -> ApiResult<()> {
        let mut client = self.connect().await?;
        client
            .simple_query("SELECT 1")
            .await?
            .into_first_result()
            .await?;
        Ok(())
    }
}

// ============================================================================
// PARAMETER BINDING
// ============================================================================

/// Adapter binding a coerced value as a driver parameter.
#[derive(Debug)]
struct SqlParam<'a>(&'a SqlValue);

impl ToSql for SqlParam<'_> {
    fn to_sql(&self) -> ColumnData<'_> {
        match self.0 {
            SqlValue::Int(v) => v.to_sql(),
            SqlValue::Decimal(v) => v.to_sql(),
            SqlValue::Float(v) => v.to_sql(),
            SqlValue::Bool(v) => v.to_sql(),
            SqlValue::Date(v) => v.to_sql(),
            SqlValue::DateTime(v) => v.to_sql(),
            SqlValue::Text(v) => ColumnData::String(Some(v.as_str().into())),
            SqlValue::Null => ColumnData::String(None),
        }
    }
}

// ============================================================================
// CELL RENDERING
// ============================================================================

/// Render one result cell for display. `None` means SQL NULL.
fn render_cell(data: &ColumnData<'static>) -> Option<String> {
    match data {
        ColumnData::U8(v) => v.map(|x| x.to_string()),
        ColumnData::I16(v) => v.map(|x| x.to_string()),
        ColumnData::I32(v) => v.map(|x| x.to_string()),
        ColumnData::I64(v) => v.map(|x| x.to_string()),
        ColumnData::F32(v) => v.map(|x| x.to_string()),
        ColumnData::F64(v) => v.map(|x| x.to_string()),
        ColumnData::Bit(v) => v.map(|b| if b { "true" } else { "false" }.to_string()),
        ColumnData::String(v) => v.as_ref().map(|s| s.to_string()),
        ColumnData::Guid(v) => v.map(|g| g.to_string()),
        ColumnData::Numeric(v) => v.map(|n| n.to_string()),
        ColumnData::Binary(v) => v.as_ref().map(|bytes| {
            let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
            format!("0x{}", hex)
        }),
        ColumnData::Xml(v) => v.as_ref().map(|x| x.to_string()),
        ColumnData::Date(_) => NaiveDate::from_sql(data)
            .ok()
            .flatten()
            .map(|d| d.to_string()),
        ColumnData::Time(_) => NaiveTime::from_sql(data)
            .ok()
            .flatten()
            .map(|t| t.to_string()),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(data)
                .ok()
                .flatten()
                .map(format_datetime)
        }
        ColumnData::DateTimeOffset(_) => DateTime::<Utc>::from_sql(data)
            .ok()
            .flatten()
            .map(|dt| dt.to_rfc3339()),
    }
}

/// Seconds precision only. Edit-form inputs are pre-filled with the
/// rendered cell and submitted back through the datetime coercer, which
/// accepts no fractional part.
fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn test_render_cell_scalars() {
        assert_eq!(render_cell(&ColumnData::I32(Some(42))), Some("42".into()));
        assert_eq!(render_cell(&ColumnData::I64(None)), None);
        assert_eq!(
            render_cell(&ColumnData::Bit(Some(true))),
            Some("true".into())
        );
        assert_eq!(
            render_cell(&ColumnData::String(Some(Cow::Borrowed("abc")))),
            Some("abc".into())
        );
        assert_eq!(render_cell(&ColumnData::String(None)), None);
    }

    #[test]
    fn test_render_cell_binary_as_hex() {
        let data = ColumnData::Binary(Some(Cow::Owned(vec![0xde, 0xad, 0x01])));
        assert_eq!(render_cell(&data), Some("0xdead01".to_string()));
    }

    #[test]
    fn test_datetime_cells_roundtrip_through_coercion() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_nano_opt(10, 30, 0, 123_456_700)
            .unwrap();
        let rendered = format_datetime(dt);
        assert_eq!(rendered, "2024-01-05 10:30:00");
        assert_eq!(
            gridpeek_core::coerce_value(&rendered, "datetime2"),
            Ok(SqlValue::DateTime(
                NaiveDate::from_ymd_opt(2024, 1, 5)
                    .unwrap()
                    .and_hms_opt(10, 30, 0)
                    .unwrap()
            ))
        );
    }

    #[test]
    fn test_sql_param_binding() {
        let int = SqlValue::Int(7);
        assert_eq!(SqlParam(&int).to_sql(), ColumnData::I64(Some(7)));

        let flag = SqlValue::Bool(false);
        assert_eq!(SqlParam(&flag).to_sql(), ColumnData::Bit(Some(false)));

        let null = SqlValue::Null;
        assert_eq!(SqlParam(&null).to_sql(), ColumnData::String(None));

        let text = SqlValue::Text("hi".to_string());
        assert_eq!(
            SqlParam(&text).to_sql(),
            ColumnData::String(Some(Cow::Borrowed("hi")))
        );
    }
}
