//! Single-page HTML presentation for the table browser.
//!
//! Plain string assembly, no template engine. Every piece of dynamic text
//! goes through `escape_html`; link targets go through the URL encoder.

use gridpeek_core::TableRef;

use crate::routes::browse::{BrowsePage, TableDetail};

const STYLE: &str = "\
body{font-family:sans-serif;margin:0;display:flex;min-height:100vh}\
nav{width:220px;background:#f4f4f4;padding:1rem;border-right:1px solid #ddd}\
nav a{display:block;padding:2px 0;text-decoration:none;color:#06c}\
nav a.current{font-weight:bold;color:#000}\
main{flex:1;padding:1rem;overflow-x:auto}\
table{border-collapse:collapse;margin:0.5rem 0}\
th,td{border:1px solid #ccc;padding:2px 6px;font-size:14px}\
th{background:#eee}\
.error{background:#fdd;border:1px solid #c00;padding:0.5rem;margin:0.5rem 0}\
.null{color:#999;font-style:italic}\
.meta{color:#666;font-size:13px}\
input[type=text]{width:110px}";

/// Escape text for HTML element and attribute positions.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn table_link(table: &TableRef) -> String {
    format!(
        "/?schema={}&table={}",
        urlencoding::encode(&table.schema),
        urlencoding::encode(&table.name)
    )
}

fn action_url(table: &TableRef, action: &str) -> String {
    format!(
        "/table/{}/{}/{}",
        urlencoding::encode(&table.schema),
        urlencoding::encode(&table.name),
        action
    )
}

/// Render the full browsing page.
pub fn page(page: &BrowsePage) -> String {
    let mut html = String::with_capacity(16 * 1024);
    html.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    html.push_str("<title>gridpeek</title>");
    html.push_str(&format!("<style>{}</style>", STYLE));
    html.push_str("</head><body>");

    render_sidebar(&mut html, page);

    html.push_str("<main>");
    render_connection(&mut html, page);
    if let Some(error) = &page.error {
        html.push_str(&format!(
            "<div class=\"error\">{}</div>",
            escape_html(error)
        ));
    }
    match (&page.selected, &page.detail) {
        (Some(table), Some(detail)) => render_detail(&mut html, table, detail),
        (Some(table), None) => {
            html.push_str(&format!(
                "<p class=\"meta\">Could not load {}.</p>",
                escape_html(&table.to_string())
            ));
        }
        _ => html.push_str("<p class=\"meta\">Select a table to browse its rows.</p>"),
    }
    html.push_str("</main></body></html>");
    html
}

fn render_sidebar(html: &mut String, page: &BrowsePage) {
    html.push_str("<nav><h2>Tables</h2>");
    for table in &page.tables {
        let current = page.selected.as_ref() == Some(table);
        html.push_str(&format!(
            "<a href=\"{}\"{}>{}</a>",
            table_link(table),
            if current { " class=\"current\"" } else { "" },
            escape_html(&table.to_string())
        ));
    }
    html.push_str("</nav>");
}

fn render_connection(html: &mut String, page: &BrowsePage) {
    let c = &page.connection;
    html.push_str(&format!(
        "<p class=\"meta\">Connected to <strong>{}</strong> \
         (instance {}), database <strong>{}</strong>, target {}</p>",
        escape_html(&c.server_name),
        escape_html(&c.instance_name),
        escape_html(&c.database_name),
        escape_html(&c.target_server),
    ));
}

fn render_detail(html: &mut String, table: &TableRef, detail: &TableDetail) {
    html.push_str(&format!("<h1>{}</h1>", escape_html(&table.to_string())));
    html.push_str(&format!(
        "<p class=\"meta\">{} rows total, showing {}.</p>",
        detail.total_rows,
        detail.rows.len()
    ));

    render_schema(html, detail);
    render_rows(html, table, detail);
    render_insert_form(html, table, detail);
}

fn render_schema(html: &mut String, detail: &TableDetail) {
    html.push_str("<h2>Columns</h2><table><tr><th>Name</th><th>Type</th><th>Nullable</th><th>Identity</th><th>Key</th></tr>");
    for col in &detail.columns {
        let is_pk = detail.pk_column.as_deref() == Some(col.name.as_str());
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&col.name),
            escape_html(&col.data_type),
            if col.nullable { "yes" } else { "no" },
            if col.is_identity { "yes" } else { "" },
            if is_pk { "PK" } else { "" },
        ));
    }
    html.push_str("</table>");
}

fn render_rows(html: &mut String, table: &TableRef, detail: &TableDetail) {
    html.push_str("<h2>Rows</h2><table><tr>");
    for col in &detail.columns {
        html.push_str(&format!("<th>{}</th>", escape_html(&col.name)));
    }
    if detail.pk_column.is_some() {
        html.push_str("<th></th>");
    }
    html.push_str("</tr>");

    let pk_index = detail
        .pk_column
        .as_deref()
        .and_then(|pk| detail.columns.iter().position(|c| c.name == pk));

    let mut row_forms = String::new();
    for (i, row) in detail.rows.iter().enumerate() {
        let pk_cell = pk_index.and_then(|idx| row.get(idx).cloned().flatten());
        match (&detail.pk_column, pk_cell) {
            (Some(_), Some(pk_value)) => {
                render_editable_row(html, &mut row_forms, table, detail, row, i, &pk_value)
            }
            _ => render_plain_row(html, row, detail.pk_column.is_some()),
        }
    }
    html.push_str("</table>");
    // Per-row <form> elements live outside the table; inputs reference
    // them through the form attribute so a form never spans cells.
    html.push_str(&row_forms);
}

fn render_plain_row(html: &mut String, row: &[Option<String>], trailing_cell: bool) {
    html.push_str("<tr>");
    for cell in row {
        html.push_str(&format!("<td>{}</td>", cell_text(cell)));
    }
    if trailing_cell {
        html.push_str("<td></td>");
    }
    html.push_str("</tr>");
}

fn render_editable_row(
    html: &mut String,
    row_forms: &mut String,
    table: &TableRef,
    detail: &TableDetail,
    row: &[Option<String>],
    index: usize,
    pk_value: &str,
) {
    let form_id = format!("row-{}", index);
    html.push_str("<tr>");
    for (col, cell) in detail.columns.iter().zip(row) {
        if detail.pk_column.as_deref() == Some(col.name.as_str()) || col.is_identity {
            html.push_str(&format!("<td>{}</td>", cell_text(cell)));
        } else {
            html.push_str(&format!(
                "<td><input type=\"text\" name=\"{}\" value=\"{}\" form=\"{}\"></td>",
                escape_html(&col.name),
                escape_html(cell.as_deref().unwrap_or("")),
                form_id,
            ));
        }
    }
    html.push_str(&format!(
        "<td><button form=\"{}\">Save</button> \
         <button form=\"del-{}\">Delete</button></td></tr>",
        form_id, index,
    ));

    let encoded_pk = urlencoding::encode(pk_value).into_owned();
    row_forms.push_str(&format!(
        "<form id=\"{}\" method=\"post\" action=\"{}\"></form>",
        form_id,
        action_url(table, &format!("update/{}", encoded_pk)),
    ));
    row_forms.push_str(&format!(
        "<form id=\"del-{}\" method=\"post\" action=\"{}\"></form>",
        index,
        action_url(table, &format!("delete/{}", encoded_pk)),
    ));
}

fn render_insert_form(html: &mut String, table: &TableRef, detail: &TableDetail) {
    html.push_str("<h2>Insert row</h2>");
    html.push_str(&format!(
        "<form method=\"post\" action=\"{}\"><table><tr>",
        action_url(table, "insert"),
    ));
    for col in detail.columns.iter().filter(|c| !c.is_identity) {
        html.push_str(&format!("<th>{}</th>", escape_html(&col.name)));
    }
    html.push_str("</tr><tr>");
    for col in detail.columns.iter().filter(|c| !c.is_identity) {
        html.push_str(&format!(
            "<td><input type=\"text\" name=\"{}\" placeholder=\"{}\"></td>",
            escape_html(&col.name),
            escape_html(&col.data_type),
        ));
    }
    html.push_str("</tr></table><button>Insert</button></form>");
}

fn cell_text(cell: &Option<String>) -> String {
    match cell {
        Some(value) => escape_html(value),
        None => "<span class=\"null\">NULL</span>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ConnectionInfo;
    use crate::routes::browse::{BrowsePage, TableDetail};
    use gridpeek_core::ColumnMetadata;

    fn connection() -> ConnectionInfo {
        ConnectionInfo {
            server_name: "DB01".to_string(),
            database_name: "inventory".to_string(),
            instance_name: "MSSQLSERVER".to_string(),
            target_server: "db01".to_string(),
        }
    }

    fn sample_page() -> BrowsePage {
        BrowsePage {
            tables: vec![
                TableRef::new("dbo", "Orders"),
                TableRef::new("sales", "Customers"),
            ],
            connection: connection(),
            selected: Some(TableRef::new("dbo", "Orders")),
            detail: Some(TableDetail {
                columns: vec![
                    ColumnMetadata {
                        name: "OrderId".to_string(),
                        data_type: "int".to_string(),
                        nullable: false,
                        is_identity: true,
                    },
                    ColumnMetadata {
                        name: "Customer".to_string(),
                        data_type: "nvarchar".to_string(),
                        nullable: true,
                        is_identity: false,
                    },
                ],
                pk_column: Some("OrderId".to_string()),
                rows: vec![
                    vec![Some("1".to_string()), Some("Acme".to_string())],
                    vec![Some("2".to_string()), None],
                ],
                total_rows: 2,
            }),
            error: None,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"x\" & 'y'</b>"),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_page_lists_tables_and_rows() {
        let html = page(&sample_page());
        assert!(html.contains("dbo.Orders"));
        assert!(html.contains("sales.Customers"));
        assert!(html.contains("Acme"));
        assert!(html.contains("NULL"));
        assert!(html.contains("/table/dbo/Orders/insert"));
        assert!(html.contains("/table/dbo/Orders/update/1"));
        assert!(html.contains("/table/dbo/Orders/delete/2"));
    }

    #[test]
    fn test_error_banner_is_escaped() {
        let mut p = sample_page();
        p.error = Some("bad <script>".to_string());
        let html = page(&p);
        assert!(html.contains("bad &lt;script&gt;"));
        assert!(!html.contains("bad <script>"));
    }

    #[test]
    fn test_identity_column_not_editable() {
        let html = page(&sample_page());
        assert!(!html.contains("name=\"OrderId\""));
        assert!(html.contains("name=\"Customer\""));
    }
}
