//! In-memory tabular lead source.
//!
//! The CLI parses the input file into a [`LeadTable`], wraps it in a
//! [`TableLeadSource`], runs the graph against it, and serializes the
//! mutated table back out. Rows are addressed by a synthesized `id`
//! column holding the row index.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use leadflow_common::LeadRow;

use crate::traits::LeadSource;

/// Columns every run guarantees on the output table, with the default
/// value used when the input lacks them.
pub const REQUIRED_COLUMNS: &[(&str, &str)] = &[
    ("STATUS", "NEW"),
    ("LEAD_SCORE", "0"),
    ("QUALIFIED", "NO"),
];

/// A header row plus data rows, all strings.
#[derive(Debug, Clone, Default)]
pub struct LeadTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl LeadTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Uppercase/trim headers and add any missing required columns with
    /// their defaults. Returns the names of columns that were added.
    pub fn normalize(&mut self) -> Vec<String> {
        for header in &mut self.headers {
            *header = header.trim().to_uppercase();
        }

        let mut added = Vec::new();
        for (column, default) in REQUIRED_COLUMNS {
            if !self.headers.iter().any(|h| h == column) {
                self.headers.push(column.to_string());
                for row in &mut self.rows {
                    row.push(default.to_string());
                }
                added.push(column.to_string());
            }
        }

        // Pad ragged rows so column indexes stay aligned.
        for row in &mut self.rows {
            row.resize(self.headers.len(), String::new());
        }
        added
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }
}

/// [`LeadSource`] over an in-memory table, mutated in place by CRM
/// updates and serialized back out by the caller after the run.
pub struct TableLeadSource {
    table: Mutex<LeadTable>,
}

impl TableLeadSource {
    pub fn new(table: LeadTable) -> Self {
        Self {
            table: Mutex::new(table),
        }
    }

    /// A copy of the table in its current state.
    pub fn snapshot(&self) -> LeadTable {
        self.table.lock().expect("lead table lock poisoned").clone()
    }
}

#[async_trait]
impl LeadSource for TableLeadSource {
    async fn fetch(&self, status_filter: &str) -> Result<Vec<LeadRow>> {
        let table = self.table.lock().expect("lead table lock poisoned");

        let status_idx = table.column_index("STATUS");
        let mut out = Vec::new();
        for (index, row) in table.rows.iter().enumerate() {
            let eligible = match status_idx {
                Some(idx) => row.get(idx).map(|s| s.as_str()).unwrap_or("") == status_filter,
                // A table without a STATUS column treats every row as new.
                None => status_filter == "NEW",
            };
            if !eligible {
                continue;
            }

            let mut record: LeadRow = HashMap::new();
            for (header, value) in table.headers.iter().zip(row.iter()) {
                record.insert(header.clone(), value.clone());
            }
            record.insert("id".to_string(), index.to_string());
            out.push(record);
        }
        Ok(out)
    }

    async fn update(&self, lead_id: &str, fields: &[(String, String)]) -> Result<()> {
        let mut table = self.table.lock().expect("lead table lock poisoned");

        let row_index: usize = lead_id
            .parse()
            .map_err(|_| anyhow::anyhow!("lead id '{lead_id}' is not a row index"))?;
        if row_index >= table.rows.len() {
            anyhow::bail!("lead id '{lead_id}' is out of range");
        }

        for (column, value) in fields {
            let idx = match table.column_index(column) {
                Some(idx) => idx,
                None => {
                    table.headers.push(column.to_uppercase());
                    let width = table.headers.len();
                    for row in &mut table.rows {
                        row.resize(width, String::new());
                    }
                    width - 1
                }
            };
            table.rows[row_index][idx] = value.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LeadTable {
        LeadTable::new(
            vec!["Name".into(), "Email".into()],
            vec![
                vec!["Jane Doe".into(), "jane@acme.com".into()],
                vec!["Ken Ito".into(), "ken@initech.com".into()],
            ],
        )
    }

    #[test]
    fn normalize_uppercases_and_adds_required_columns() {
        let mut t = table();
        let added = t.normalize();
        assert_eq!(t.headers[0], "NAME");
        assert!(t.headers.contains(&"STATUS".to_string()));
        assert_eq!(added, vec!["STATUS", "LEAD_SCORE", "QUALIFIED"]);
        assert_eq!(t.rows[0].len(), t.headers.len());
        let status_idx = t.column_index("STATUS").unwrap();
        assert_eq!(t.rows[1][status_idx], "NEW");
    }

    #[tokio::test]
    async fn fetch_without_status_column_treats_all_rows_as_new() {
        let source = TableLeadSource::new(table());
        let rows = source.fetch("NEW").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], "0");
        assert!(source.fetch("CONTACTED").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_filters_on_status_when_present() {
        let mut t = table();
        t.normalize();
        let source = TableLeadSource::new(t);
        let rows = source.fetch("NEW").await.unwrap();
        assert_eq!(rows.len(), 2);

        source
            .update("0", &[("STATUS".into(), "CONTACTED".into())])
            .await
            .unwrap();
        let rows = source.fetch("NEW").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "1");
    }

    #[tokio::test]
    async fn update_adds_missing_columns_and_writes_fields() {
        let source = TableLeadSource::new(table());
        source
            .update(
                "1",
                &[
                    ("LEAD_SCORE".into(), "7.5".into()),
                    ("QUALIFIED".into(), "YES".into()),
                ],
            )
            .await
            .unwrap();

        let snapshot = source.snapshot();
        let score_idx = snapshot.column_index("LEAD_SCORE").unwrap();
        assert_eq!(snapshot.rows[1][score_idx], "7.5");
        assert_eq!(snapshot.rows[0][score_idx], "");
    }
}
