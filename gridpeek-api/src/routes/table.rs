//! Mutation endpoints: insert, update and delete against a selected table.
//!
//! All three are form posts that finish with a 303 redirect back to the
//! browsing page. Coercion and database failures travel in the `error`
//! query parameter of the redirect; structural problems (unknown table,
//! missing key, nothing to write) are client errors in the usual sense.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::post,
    Form, Router,
};

use gridpeek_core::{coerce_value, ColumnMetadata, SqlValue, TableRef};

use crate::db::MssqlClient;
use crate::error::{ApiError, ApiResult, ErrorCode};

// ============================================================================
// REDIRECT HELPERS
// ============================================================================

pub(crate) fn browse_url(table: &TableRef) -> String {
    format!(
        "/?schema={}&table={}",
        urlencoding::encode(&table.schema),
        urlencoding::encode(&table.name)
    )
}

pub(crate) fn browse_url_with_error(table: &TableRef, message: &str) -> String {
    format!("{}&error={}", browse_url(table), urlencoding::encode(message))
}

fn redirect_ok(table: &TableRef) -> Redirect {
    Redirect::to(&browse_url(table))
}

fn redirect_error(table: &TableRef, message: &str) -> Redirect {
    tracing::warn!(table = %table, error = message, "mutation rejected");
    Redirect::to(&browse_url_with_error(table, message))
}

// ============================================================================
// FORM RESOLUTION
// ============================================================================

/// Resolve an insert form against the table's columns.
///
/// Identity columns are skipped, blank fields are omitted, and a form
/// that resolves to zero values is rejected here, before any statement is
/// built or any connection opened.
pub(crate) fn resolve_insert_values(
    table: &TableRef,
    columns: &[ColumnMetadata],
    form: &HashMap<String, String>,
) -> ApiResult<Vec<(String, SqlValue)>> {
    if columns.is_empty() {
        return Err(ApiError::table_not_found(table));
    }

    let mut values: Vec<(String, SqlValue)> = Vec::new();
    for col in columns {
        if col.is_identity {
            continue;
        }
        let Some(raw) = form.get(&col.name) else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let value =
            coerce_value(raw, &col.data_type).map_err(|e| ApiError::validation(&col.name, e))?;
        values.push((col.name.clone(), value));
    }

    if values.is_empty() {
        return Err(ApiError::invalid_input("No values to insert"));
    }
    Ok(values)
}

/// Resolve an update form. Blank fields become NULL; the key column and
/// fields that name no column are ignored.
pub(crate) fn resolve_update_values(
    columns: &[ColumnMetadata],
    pk_column: &str,
    form: &HashMap<String, String>,
) -> ApiResult<Vec<(String, SqlValue)>> {
    let col_map: HashMap<&str, &ColumnMetadata> =
        columns.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut set_values: Vec<(String, SqlValue)> = Vec::new();
    for (name, raw) in form {
        let Some(col) = col_map.get(name.as_str()) else {
            continue;
        };
        if col.name == pk_column {
            continue;
        }
        let raw = raw.trim();
        if raw.is_empty() {
            // Blank on update means "set to null".
            set_values.push((col.name.clone(), SqlValue::Null));
            continue;
        }
        let value =
            coerce_value(raw, &col.data_type).map_err(|e| ApiError::validation(&col.name, e))?;
        set_values.push((col.name.clone(), value));
    }

    if set_values.is_empty() {
        return Err(ApiError::invalid_input("No values to update"));
    }
    Ok(set_values)
}

// ============================================================================
// HANDLERS
// ============================================================================

/// POST /table/:schema/:table/insert
///
/// A field that fails coercion redirects with an error naming the column;
/// structural problems surface as plain client errors.
pub async fn insert_row(
    State(db): State<MssqlClient>,
    Path((schema, table)): Path<(String, String)>,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Redirect> {
    let table = TableRef::new(schema, table);
    let columns = db.table_columns(&table).await?;

    let values = match resolve_insert_values(&table, &columns, &form) {
        Ok(values) => values,
        Err(e) if e.code == ErrorCode::ValidationFailed => {
            return Ok(redirect_error(&table, &e.message))
        }
        Err(e) => return Err(e),
    };

    match db.insert_row(&table, &values).await {
        Ok(_) => Ok(redirect_ok(&table)),
        Err(e) => Ok(redirect_error(&table, &e.message)),
    }
}

/// POST /table/:schema/:table/update/:pk_value
///
/// Requires a resolvable single-column primary key.
pub async fn update_row(
    State(db): State<MssqlClient>,
    Path((schema, table, pk_value)): Path<(String, String, String)>,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Redirect> {
    let table = TableRef::new(schema, table);
    let columns = db.table_columns(&table).await?;
    if columns.is_empty() {
        return Err(ApiError::table_not_found(&table));
    }
    let Some(pk_column) = db.table_primary_key(&table).await? else {
        return Err(ApiError::primary_key_not_found(&table));
    };

    let set_values = match resolve_update_values(&columns, &pk_column, &form) {
        Ok(values) => values,
        Err(e) if e.code == ErrorCode::ValidationFailed => {
            return Ok(redirect_error(&table, &e.message))
        }
        Err(e) => return Err(e),
    };

    match db.update_row(&table, &set_values, &pk_column, &pk_value).await {
        Ok(_) => Ok(redirect_ok(&table)),
        Err(e) => Ok(redirect_error(&table, &e.message)),
    }
}

/// POST /table/:schema/:table/delete/:pk_value
pub async fn delete_row(
    State(db): State<MssqlClient>,
    Path((schema, table, pk_value)): Path<(String, String, String)>,
) -> ApiResult<Redirect> {
    let table = TableRef::new(schema, table);
    let Some(pk_column) = db.table_primary_key(&table).await? else {
        return Err(ApiError::primary_key_not_found(&table));
    };

    match db.delete_row(&table, &pk_column, &pk_value).await {
        Ok(_) => Ok(redirect_ok(&table)),
        Err(e) => Ok(redirect_error(&table, &e.message)),
    }
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(db: MssqlClient) -> Router {
    Router::new()
        .route("/table/:schema/:table/insert", post(insert_row))
        .route("/table/:schema/:table/update/:pk_value", post(update_row))
        .route("/table/:schema/:table/delete/:pk_value", post(delete_row))
        .with_state(db)
}
