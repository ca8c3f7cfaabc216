//! Data table component types.
//!
//! Every back-office list renders the same way: a search box over the rows'
//! normalized text fields, a "showing N of M" summary, the rows themselves
//! and an empty state. Row cells differ per list and live in each list's
//! template.

use safeuse_core::table::{ManagedTable, TableRow};

/// Column definition for a data table.
#[derive(Debug, Clone)]
pub struct TableColumn {
    /// Display label for the column header.
    pub label: &'static str,
    /// Right-align numeric columns.
    pub numeric: bool,
}

impl TableColumn {
    #[must_use]
    pub const fn new(label: &'static str) -> Self {
        Self {
            label,
            numeric: false,
        }
    }

    #[must_use]
    pub const fn numeric(label: &'static str) -> Self {
        Self {
            label,
            numeric: true,
        }
    }
}

/// Static configuration for one list page.
#[derive(Debug, Clone)]
pub struct DataTableConfig {
    /// Unique table identifier, also the list's URL path segment.
    pub table_id: &'static str,
    /// Column definitions, including the actions column if the list has one.
    pub columns: Vec<TableColumn>,
    /// Search label, naming the fields the filter looks at.
    pub search_label: &'static str,
    /// Title for empty state.
    pub empty_title: &'static str,
}

impl DataTableConfig {
    /// Path of the list page.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/{}", self.table_id)
    }

    /// Column count, for full-width cells.
    #[must_use]
    pub fn span(&self) -> usize {
        self.columns.len()
    }
}

/// The rows a list page shows and what they were filtered by.
#[derive(Debug, Clone)]
pub struct DataTable<R> {
    pub query: String,
    pub rows: Vec<R>,
    /// Rows before filtering.
    pub total: usize,
}

impl<R> DataTable<R> {
    /// Filter `table` by `query` and turn the matching rows into views.
    pub fn new<T: TableRow>(table: &ManagedTable<T>, query: &str, view: impl Fn(&T) -> R) -> Self {
        Self {
            query: query.trim().to_string(),
            rows: table.filter(query).into_iter().map(view).collect(),
            total: table.len(),
        }
    }

    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        !self.query.is_empty()
    }

    /// Summary line above the table.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_filtered() {
            format!("Showing {} of {}", self.rows.len(), self.total)
        } else {
            format!("{} total", self.total)
        }
    }
}

/// The list page URL, keeping the active filter so a mutation lands back on
/// the same view.
#[must_use]
pub fn list_url(table_id: &str, query: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        format!("/{table_id}")
    } else {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        format!("/{table_id}?q={encoded}")
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        name: &'static str,
    }

    impl TableRow for Row {
        type Id = i64;

        fn row_id(&self) -> i64 {
            self.id
        }

        fn search_fields(&self) -> Vec<Cow<'_, str>> {
            vec![Cow::Borrowed(self.name)]
        }
    }

    fn table() -> ManagedTable<Row> {
        ManagedTable::new(vec![
            Row { id: 1, name: "Ana" },
            Row { id: 2, name: "Luis" },
            Row { id: 3, name: "Mariana" },
        ])
    }

    #[test]
    fn test_filtered_summary() {
        let table = DataTable::new(&table(), " ANA ", |row| row.id);
        assert_eq!(table.rows, vec![1, 3]);
        assert_eq!(table.summary(), "Showing 2 of 3");
        assert_eq!(table.query, "ANA");
    }

    #[test]
    fn test_blank_query_keeps_everything() {
        let table = DataTable::new(&table(), "   ", |row| row.id);
        assert!(!table.is_filtered());
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.summary(), "3 total");
    }

    #[test]
    fn test_list_url_keeps_filter() {
        assert_eq!(list_url("contacts", ""), "/contacts");
        assert_eq!(list_url("contacts", "ana ruiz"), "/contacts?q=ana+ruiz");
        assert_eq!(list_url("orders", "a&b"), "/orders?q=a%26b");
    }

    #[test]
    fn test_config_span() {
        let config = DataTableConfig {
            table_id: "rows",
            columns: vec![TableColumn::new("Name"), TableColumn::new("Actions")],
            search_label: "Search by name",
            empty_title: "No rows yet.",
        };
        assert_eq!(config.span(), 2);
        assert_eq!(config.path(), "/rows");
    }
}
