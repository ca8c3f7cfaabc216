//! Reusable page components.

pub mod data_table;

pub use data_table::{DataTable, DataTableConfig, TableColumn, list_url};
