//! Table-browsing page.
//!
//! `GET /?schema=&table=&error=` lists all tables; with a selection it also
//! loads columns, primary key, up to 200 rows and the total count. Failures
//! while loading the selection are shown inline on the page rather than
//! propagated; failures listing tables or identifying the connection are
//! genuine server errors and do propagate.

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;

use gridpeek_core::{ColumnMetadata, TableRef, DEFAULT_ROW_LIMIT};

use crate::db::{ConnectionInfo, MssqlClient};
use crate::error::{ApiError, ApiResult};
use crate::render;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct BrowseParams {
    pub schema: Option<String>,
    pub table: Option<String>,
    pub error: Option<String>,
}

/// Everything the page renderer needs for one request.
pub struct BrowsePage {
    pub tables: Vec<TableRef>,
    pub connection: ConnectionInfo,
    pub selected: Option<TableRef>,
    pub detail: Option<TableDetail>,
    pub error: Option<String>,
}

/// Loaded state of the selected table.
pub struct TableDetail {
    pub columns: Vec<ColumnMetadata>,
    pub pk_column: Option<String>,
    pub rows: Vec<Vec<Option<String>>>,
    pub total_rows: i64,
}

// ============================================================================
// HANDLER
// ============================================================================

/// GET / - the single browsing page.
pub async fn browse(
    State(db): State<MssqlClient>,
    Query(params): Query<BrowseParams>,
) -> ApiResult<Html<String>> {
    let tables = db.list_tables().await?;
    let connection = db.connection_info().await?;

    let mut page = BrowsePage {
        tables,
        connection,
        selected: None,
        detail: None,
        error: params.error.filter(|e| !e.is_empty()),
    };

    let schema = params.schema.filter(|s| !s.is_empty());
    let table = params.table.filter(|t| !t.is_empty());
    if let (Some(schema), Some(table)) = (schema, table) {
        let table = TableRef::new(schema, table);
        match load_table_detail(&db, &table).await {
            Ok(detail) => page.detail = Some(detail),
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "failed to load selected table");
                page.error = Some(e.message);
            }
        }
        page.selected = Some(table);
    }

    Ok(Html(render::page(&page)))
}

/// An unknown (schema, table) pair shows up as an empty column list in
/// the catalog views; that is the not-found signal, there is no separate
/// existence probe.
fn ensure_table_known(table: &TableRef, columns: &[ColumnMetadata]) -> ApiResult<()> {
    if columns.is_empty() {
        return Err(ApiError::table_not_found(table));
    }
    Ok(())
}

async fn load_table_detail(db: &MssqlClient, table: &TableRef) -> ApiResult<TableDetail> {
    let columns = db.table_columns(table).await?;
    ensure_table_known(table, &columns)?;
    let pk_column = db.table_primary_key(table).await?;
    let rows = db.table_rows(table, DEFAULT_ROW_LIMIT).await?;
    let total_rows = db.table_count(table).await?;
    Ok(TableDetail {
        columns,
        pk_column,
        rows,
        total_rows,
    })
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(db: MssqlClient) -> Router {
    Router::new().route("/", get(browse)).with_state(db)
}
