//! Filterable, patchable local copies of admin lists.
//!
//! Every back-office list works the same way: fetch the rows, filter them by a
//! free-text query, and after a mutation succeeds on the backend, patch the
//! local copy instead of fetching everything again. A failed mutation never
//! touches the copy.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// A record that can be shown as a row in a managed table.
pub trait TableRow {
    /// Identifier used to address the row in mutations.
    type Id: Copy + Eq;

    /// The row's identifier.
    fn row_id(&self) -> Self::Id;

    /// The text fields the free-text filter looks at.
    fn search_fields(&self) -> Vec<Cow<'_, str>>;

    /// Whether the row matches an already lower-cased, trimmed needle.
    fn matches(&self, needle: &str) -> bool {
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// A local copy of one admin list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedTable<T> {
    rows: Vec<T>,
}

impl<T> Default for ManagedTable<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T: TableRow> ManagedTable<T> {
    /// Wrap freshly fetched rows.
    #[must_use]
    pub const fn new(rows: Vec<T>) -> Self {
        Self { rows }
    }

    /// All rows in backend order.
    #[must_use]
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows whose search fields contain `query`, case-insensitively.
    ///
    /// A blank query returns every row.
    #[must_use]
    pub fn filter(&self, query: &str) -> Vec<&T> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.rows.iter().collect();
        }
        self.rows.iter().filter(|row| row.matches(&needle)).collect()
    }

    /// Find a row by id.
    #[must_use]
    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.rows.iter().find(|row| row.row_id() == id)
    }

    /// Apply `patch` to the row with `id`. Returns whether a row was patched.
    pub fn patch(&mut self, id: T::Id, patch: impl FnOnce(&mut T)) -> bool {
        match self.rows.iter_mut().find(|row| row.row_id() == id) {
            Some(row) => {
                patch(row);
                true
            }
            None => false,
        }
    }

    /// Remove the row with `id`, returning it.
    pub fn remove(&mut self, id: T::Id) -> Option<T> {
        let index = self.rows.iter().position(|row| row.row_id() == id)?;
        Some(self.rows.remove(index))
    }

    /// Replace the row with the same id, or append it if it is new.
    pub fn upsert(&mut self, row: T) {
        let id = row.row_id();
        match self.rows.iter_mut().find(|existing| existing.row_id() == id) {
            Some(existing) => *existing = row,
            None => self.rows.push(row),
        }
    }

    /// Consume the table, returning the rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }
}

impl<T: TableRow> From<Vec<T>> for ManagedTable<T> {
    fn from(rows: Vec<T>) -> Self {
        Self::new(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        name: &'static str,
        email: &'static str,
        flag: bool,
    }

    impl TableRow for Row {
        type Id = u32;

        fn row_id(&self) -> u32 {
            self.id
        }

        fn search_fields(&self) -> Vec<Cow<'_, str>> {
            vec![Cow::Borrowed(self.name), Cow::Borrowed(self.email)]
        }
    }

    fn table() -> ManagedTable<Row> {
        ManagedTable::new(vec![
            Row { id: 1, name: "Ana García", email: "ana@example.com", flag: false },
            Row { id: 2, name: "Luis Pérez", email: "luis@example.com", flag: true },
            Row { id: 3, name: "Marta Ruiz", email: "marta@safeuse.es", flag: false },
        ])
    }

    #[test]
    fn test_filter_is_case_insensitive_over_both_fields() {
        let t = table();
        let ids: Vec<u32> = t.filter("GARC").iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1]);
        let ids: Vec<u32> = t.filter("SafeUse").iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3]);
        let ids: Vec<u32> = t.filter("example").iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_blank_filter_restores_all_rows() {
        let t = table();
        assert_eq!(t.filter("zzz").len(), 0);
        assert_eq!(t.filter("").len(), 3);
        assert_eq!(t.filter("   ").len(), 3);
    }

    #[test]
    fn test_patch_touches_only_target_row() {
        let mut t = table();
        assert!(t.patch(1, |row| row.flag = !row.flag));
        assert!(t.get(1).is_some_and(|r| r.flag));
        assert!(t.get(2).is_some_and(|r| r.flag));
        assert!(t.get(3).is_some_and(|r| !r.flag));
        assert!(!t.patch(99, |row| row.flag = true));
    }

    #[test]
    fn test_remove_exactly_one_row() {
        let mut t = table();
        let removed = t.remove(2);
        assert_eq!(removed.map(|r| r.id), Some(2));
        assert_eq!(t.len(), 2);
        assert!(t.get(2).is_none());
        assert!(t.remove(2).is_none());
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_upsert() {
        let mut t = table();
        t.upsert(Row { id: 2, name: "Luis P.", email: "luis@example.com", flag: true });
        assert_eq!(t.len(), 3);
        assert_eq!(t.get(2).map(|r| r.name), Some("Luis P."));
        t.upsert(Row { id: 4, name: "New", email: "new@example.com", flag: false });
        assert_eq!(t.len(), 4);
    }
}
