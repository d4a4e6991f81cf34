//! Catalog loading and validation.
//!
//! A catalog is a table of API rows with the columns `api_name` and
//! `description`, plus optional `endpoint` and `id`. Files are either a JSON
//! array of objects or JSON Lines (one object per line).

use crate::error::{CatalogError, SchemaError};
use apirec_core::ApiRecord;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use tracing::debug;

/// Column holding the API name.
pub const NAME_COLUMN: &str = "api_name";

/// Column holding the API description.
pub const DESCRIPTION_COLUMN: &str = "description";

/// Optional endpoint column.
pub const ENDPOINT_COLUMN: &str = "endpoint";

/// Optional stable id column. Catalogs without it use zero-based row positions.
pub const ID_COLUMN: &str = "id";

/// Columns every catalog must have.
pub const REQUIRED_COLUMNS: [&str; 2] = [NAME_COLUMN, DESCRIPTION_COLUMN];

/// One raw catalog row.
pub type Row = Map<String, Value>;

/// A row that could not become a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    /// Record id (explicit or positional).
    pub id: String,

    /// Human-readable reason.
    pub reason: String,
}

/// Validated catalog ready for ingestion.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    rows: usize,
    records: Vec<ApiRecord>,
    skipped: Vec<SkippedRecord>,
    ids: HashSet<String>,
}

impl Catalog {
    /// Build a catalog from raw rows.
    ///
    /// Columns are the union of keys across rows. Missing mandatory columns
    /// fail the whole catalog; rows with a blank mandatory cell are skipped.
    /// Once any row carries an `id`, every row must: positional ids are only
    /// used for catalogs without the column. Repeated ids keep the first row.
    pub fn from_rows(rows: Vec<Row>) -> Result<Self, SchemaError> {
        let columns: BTreeSet<&str> = rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();

        if !rows.is_empty() {
            let missing: Vec<String> = REQUIRED_COLUMNS
                .iter()
                .filter(|c| !columns.contains(*c))
                .map(|c| c.to_string())
                .collect();
            if !missing.is_empty() {
                return Err(SchemaError { missing });
            }
        }

        let explicit_ids = columns.contains(ID_COLUMN);
        let mut catalog = Self {
            rows: rows.len(),
            ..Default::default()
        };

        for (position, row) in rows.iter().enumerate() {
            let id = if explicit_ids {
                cell(row, ID_COLUMN)
            } else {
                Some(position.to_string())
            };

            let mut blank: Vec<&str> = Vec::new();
            if id.is_none() {
                blank.push(ID_COLUMN);
            }
            blank.extend(
                REQUIRED_COLUMNS
                    .iter()
                    .copied()
                    .filter(|c| cell(row, c).is_none()),
            );
            let id = id.unwrap_or_else(|| position.to_string());
            if !blank.is_empty() {
                debug!(id = %id, columns = ?blank, "Skipping catalog row with blank cells");
                catalog.skipped.push(SkippedRecord {
                    id,
                    reason: format!("blank {}", blank.join(", ")),
                });
                continue;
            }

            let mut record = ApiRecord::new(
                id,
                cell(row, NAME_COLUMN).unwrap_or_default(),
                cell(row, DESCRIPTION_COLUMN).unwrap_or_default(),
            );
            if let Some(endpoint) = cell(row, ENDPOINT_COLUMN) {
                record = record.with_endpoint(endpoint);
            }
            catalog.push(record);
        }

        Ok(catalog)
    }

    fn push(&mut self, record: ApiRecord) {
        if !self.ids.insert(record.id.clone()) {
            debug!(id = %record.id, "Skipping catalog row with repeated id");
            self.skipped.push(SkippedRecord {
                id: record.id,
                reason: "duplicate id".to_string(),
            });
            return;
        }
        self.records.push(record);
    }

    /// Parse a JSON array of row objects.
    pub fn parse_json(content: &str) -> Result<Self, CatalogError> {
        let value: Value = serde_json::from_str(content).map_err(|e| CatalogError::Parse {
            line: Some(e.line()),
            message: e.to_string(),
        })?;

        let items = match value {
            Value::Array(items) => items,
            _ => {
                return Err(CatalogError::Parse {
                    line: None,
                    message: "expected an array of objects".to_string(),
                })
            }
        };

        let rows = items
            .into_iter()
            .enumerate()
            .map(|(row, item)| match item {
                Value::Object(map) => Ok(map),
                _ => Err(CatalogError::NotAnObject { row }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_rows(rows)?)
    }

    /// Parse JSON Lines; blank lines are ignored.
    pub fn parse_jsonl(content: &str) -> Result<Self, CatalogError> {
        let mut rows = Vec::new();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line).map_err(|e| CatalogError::Parse {
                line: Some(number + 1),
                message: e.to_string(),
            })?;
            match value {
                Value::Object(map) => rows.push(map),
                _ => return Err(CatalogError::NotAnObject { row: rows.len() }),
            }
        }
        Ok(Self::from_rows(rows)?)
    }

    /// Load a catalog file. `.jsonl` / `.ndjson` files are read as JSON Lines.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let lines = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("jsonl") | Some("ndjson")
        );
        if lines {
            Self::parse_jsonl(&content)
        } else {
            Self::parse_json(&content)
        }
    }

    /// Number of rows read.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Records that passed validation, in row order.
    pub fn records(&self) -> &[ApiRecord] {
        &self.records
    }

    /// Rows skipped for blank mandatory cells or repeated ids.
    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    /// Number of valid records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when there is nothing to ingest.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<ApiRecord> for Catalog {
    fn from_iter<I: IntoIterator<Item = ApiRecord>>(iter: I) -> Self {
        let mut catalog = Self::default();
        for record in iter {
            catalog.rows += 1;
            catalog.push(record);
        }
        catalog
    }
}

/// Non-blank cell value as a string, kept verbatim. Numbers and booleans are
/// stringified.
fn cell(row: &Row, column: &str) -> Option<String> {
    let text = match row.get(column)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.trim().is_empty()).then_some(text)
}
