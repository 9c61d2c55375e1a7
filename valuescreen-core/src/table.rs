//! Long-form and wide tables.
//!
//! Long form holds one row per `(identifier, attribute, value)` triple as
//! scraped. Wide form holds one row per identifier and one column per
//! attribute. `pivot` goes long → wide, `melt` goes back.
//!
//! Wide tables keep identifiers unique and sorted ascending; columns are
//! sorted by name after a pivot. Missing `(identifier, attribute)`
//! combinations are absent cells, never errors.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use thiserror::Error;

/// Short code naming one index constituent (an exchange ticker).
pub type Identifier = String;

/// Name of the identifier column in every exported table.
pub const INDEX_COLUMN: &str = "Ticker";

/// Name of the attribute column in long-form tables.
pub const ATTRIBUTE_COLUMN: &str = "Attribute";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("duplicate attribute '{attribute}' for identifier '{identifier}'")]
    Duplicate {
        identifier: Identifier,
        attribute: String,
    },

    #[error("duplicate identifier '{0}' in wide table")]
    DuplicateIdentifier(Identifier),

    #[error("column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("column '{name}' has {actual} cells but the table has {expected} rows")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

// ─── Long form ──────────────────────────────────────────────────────

/// One scraped `(identifier, attribute, value)` triple. The value is raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub identifier: Identifier,
    pub attribute: String,
    pub value: String,
}

/// Long-form table for one dataset.
///
/// `value_label` is the header of the value column in exports
/// (`Recent` for valuation measures, `Value` for extended statistics).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongTable {
    value_label: String,
    records: Vec<Record>,
}

impl LongTable {
    pub fn new(value_label: impl Into<String>) -> Self {
        Self {
            value_label: value_label.into(),
            records: Vec::new(),
        }
    }

    pub fn value_label(&self) -> &str {
        &self.value_label
    }

    pub fn push(
        &mut self,
        identifier: impl Into<Identifier>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.records.push(Record {
            identifier: identifier.into(),
            attribute: attribute.into(),
            value: value.into(),
        });
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct identifiers in first-seen order.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.identifier.as_str())
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Keep only the records matching the predicate.
    pub fn retain(&mut self, f: impl FnMut(&Record) -> bool) {
        self.records.retain(f);
    }
}

// ─── Wide form ──────────────────────────────────────────────────────

/// Cells of one wide-table column. Absent cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Text(Vec<Option<String>>),
    Float(Vec<Option<f64>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Text(v) => v.len(),
            ColumnValues::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ColumnValues::Float(_))
    }

    /// Whether the cell holds a usable value. NaN counts as absent.
    pub fn is_present(&self, row: usize) -> bool {
        match self {
            ColumnValues::Text(v) => v.get(row).map_or(false, |c| c.is_some()),
            ColumnValues::Float(v) => v
                .get(row)
                .copied()
                .flatten()
                .map_or(false, |x| !x.is_nan()),
        }
    }

    /// Text rendering of a cell, as written to CSV exports.
    pub fn display(&self, row: usize) -> Option<String> {
        match self {
            ColumnValues::Text(v) => v.get(row).cloned().flatten(),
            ColumnValues::Float(v) => v.get(row).copied().flatten().map(|x| x.to_string()),
        }
    }

    /// Gather the given rows into a new column, in the given order.
    /// Out-of-range rows come back absent.
    pub fn take(&self, rows: &[usize]) -> ColumnValues {
        match self {
            ColumnValues::Text(v) => {
                ColumnValues::Text(rows.iter().map(|&r| v.get(r).cloned().flatten()).collect())
            }
            ColumnValues::Float(v) => {
                ColumnValues::Float(rows.iter().map(|&r| v.get(r).copied().flatten()).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Text(values),
        }
    }

    pub fn float(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Float(values),
        }
    }
}

/// One row per identifier, one column per attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    index_name: String,
    identifiers: Vec<Identifier>,
    columns: Vec<Column>,
}

impl WideTable {
    /// Create a table with the given row keys and no columns.
    pub fn new(identifiers: Vec<Identifier>) -> Result<Self, TableError> {
        Self::with_index_name(INDEX_COLUMN, identifiers)
    }

    pub fn with_index_name(
        index_name: impl Into<String>,
        identifiers: Vec<Identifier>,
    ) -> Result<Self, TableError> {
        let mut seen = HashSet::with_capacity(identifiers.len());
        for id in &identifiers {
            if !seen.insert(id.as_str()) {
                return Err(TableError::DuplicateIdentifier(id.clone()));
            }
        }
        Ok(Self {
            index_name: index_name.into(),
            identifiers,
            columns: Vec::new(),
        })
    }

    /// Append a column. Names must be unique and lengths must match the row count.
    pub fn push_column(&mut self, column: Column) -> Result<(), TableError> {
        if self.column(&column.name).is_some() {
            return Err(TableError::DuplicateColumn(column.name));
        }
        if column.values.len() != self.identifiers.len() {
            return Err(TableError::LengthMismatch {
                expected: self.identifiers.len(),
                actual: column.values.len(),
                name: column.name,
            });
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub(crate) fn remove_column(&mut self, name: &str) -> Option<Column> {
        let pos = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(pos))
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.identifiers.len()
    }

    /// Number of columns, excluding the identifier index.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    pub fn row_of(&self, identifier: &str) -> Option<usize> {
        self.identifiers.iter().position(|id| id == identifier)
    }

    /// Float cell lookup. Text columns yield `None`.
    pub fn float(&self, identifier: &str, column: &str) -> Option<f64> {
        let row = self.row_of(identifier)?;
        match &self.column(column)?.values {
            ColumnValues::Float(v) => v[row],
            ColumnValues::Text(_) => None,
        }
    }

    /// Text cell lookup. Float columns yield `None`.
    pub fn text(&self, identifier: &str, column: &str) -> Option<&str> {
        let row = self.row_of(identifier)?;
        match &self.column(column)?.values {
            ColumnValues::Text(v) => v[row].as_deref(),
            ColumnValues::Float(_) => None,
        }
    }

    /// New table holding the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> WideTable {
        WideTable {
            index_name: self.index_name.clone(),
            identifiers: rows.iter().map(|&r| self.identifiers[r].clone()).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: c.values.take(rows),
                })
                .collect(),
        }
    }

    /// New table holding the rows for which `keep(row)` is true.
    pub fn filter_rows(&self, mut keep: impl FnMut(usize) -> bool) -> WideTable {
        let rows: Vec<usize> = (0..self.height()).filter(|&r| keep(r)).collect();
        self.select_rows(&rows)
    }

    /// Fill absent cells of `target` from `source`, then drop `source`.
    ///
    /// Used when a decorated label and its canonical name both exist.
    /// Both columns must have the same kind; otherwise the source is dropped.
    pub(crate) fn merge_column_into(&mut self, source: &str, target: &str) {
        let Some(src) = self.remove_column(source) else {
            return;
        };
        let Some(dst) = self.column_mut(target) else {
            return;
        };
        match (&mut dst.values, src.values) {
            (ColumnValues::Text(d), ColumnValues::Text(s)) => {
                for (cell, fill) in d.iter_mut().zip(s) {
                    if cell.is_none() {
                        *cell = fill;
                    }
                }
            }
            (ColumnValues::Float(d), ColumnValues::Float(s)) => {
                for (cell, fill) in d.iter_mut().zip(s) {
                    if cell.is_none() {
                        *cell = fill;
                    }
                }
            }
            _ => {}
        }
    }

    /// Append the columns of `other` gathered at `rows`, one entry per row
    /// of `self`. Names already taken in `self` go through `rename`, again
    /// and again, until they are free.
    pub(crate) fn append_gathered(
        &mut self,
        other: &WideTable,
        rows: &[usize],
        rename: impl Fn(&str) -> String,
    ) -> Result<(), TableError> {
        for col in &other.columns {
            let mut name = col.name.clone();
            while self.column(&name).is_some() {
                name = rename(&name);
            }
            self.push_column(Column {
                name,
                values: col.values.take(rows),
            })?;
        }
        Ok(())
    }
}

// ─── Reshaping ──────────────────────────────────────────────────────

/// Pivot a long-form table to one row per identifier, one column per attribute.
///
/// Identifiers and attribute columns come out sorted. A repeated
/// `(identifier, attribute)` pair is rejected.
pub fn pivot(long: &LongTable) -> Result<WideTable, TableError> {
    let mut identifiers: BTreeSet<&str> = BTreeSet::new();
    let mut by_attribute: BTreeMap<&str, BTreeMap<&str, &str>> = BTreeMap::new();

    for record in long.records() {
        identifiers.insert(record.identifier.as_str());
        let cells = by_attribute.entry(record.attribute.as_str()).or_default();
        if cells
            .insert(record.identifier.as_str(), record.value.as_str())
            .is_some()
        {
            return Err(TableError::Duplicate {
                identifier: record.identifier.clone(),
                attribute: record.attribute.clone(),
            });
        }
    }

    let mut table = WideTable::new(identifiers.iter().map(|id| id.to_string()).collect())?;
    for (attribute, cells) in by_attribute {
        let values: Vec<Option<String>> = table
            .identifiers
            .iter()
            .map(|id| cells.get(id.as_str()).map(|v| v.to_string()))
            .collect();
        table.columns.push(Column::text(attribute, values));
    }
    Ok(table)
}

/// Melt a wide table back to long form, skipping absent cells.
///
/// Rows are emitted identifier by identifier, columns in table order.
pub fn melt(wide: &WideTable, value_label: &str) -> LongTable {
    let mut long = LongTable::new(value_label);
    for (row, id) in wide.identifiers.iter().enumerate() {
        for col in &wide.columns {
            if let Some(value) = col.values.display(row) {
                long.push(id.clone(), col.name.clone(), value);
            }
        }
    }
    long
}
