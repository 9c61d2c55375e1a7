//! Conversion between wide tables and polars DataFrames, plus Parquet I/O.

use crate::table::{Column as TableColumn, ColumnValues, TableError, WideTable};
use polars::prelude::*;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("parquet I/O error: {0}")]
    Parquet(String),

    #[error("column '{column}' has unsupported type {dtype}")]
    UnsupportedType { column: String, dtype: String },

    #[error("index column '{0}' is missing or has nulls")]
    BadIndex(String),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Index column first (as a string column), then one column per table column.
pub fn to_dataframe(table: &WideTable) -> Result<DataFrame, FrameError> {
    let mut columns = Vec::with_capacity(table.width() + 1);
    columns.push(Column::new(
        table.index_name().into(),
        table.identifiers().to_vec(),
    ));
    for col in table.columns() {
        let name: PlSmallStr = col.name.as_str().into();
        let column = match &col.values {
            ColumnValues::Text(v) => Column::new(name, v.clone()),
            ColumnValues::Float(v) => Column::new(name, v.clone()),
        };
        columns.push(column);
    }
    DataFrame::new(columns).map_err(|e| FrameError::Parquet(format!("dataframe creation: {e}")))
}

/// Inverse of [`to_dataframe`]. String columns become text, numeric
/// columns become float.
pub fn from_dataframe(df: &DataFrame, index_name: &str) -> Result<WideTable, FrameError> {
    let map_err = |e: PolarsError| FrameError::Parquet(format!("column read: {e}"));

    let index = df
        .column(index_name)
        .map_err(|_| FrameError::BadIndex(index_name.to_string()))?;
    let identifiers = index
        .str()
        .map_err(|_| FrameError::BadIndex(index_name.to_string()))?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect::<Option<Vec<String>>>()
        .ok_or_else(|| FrameError::BadIndex(index_name.to_string()))?;

    let mut table = WideTable::with_index_name(index_name, identifiers)?;
    for col in df.get_columns() {
        if col.name().as_str() == index_name {
            continue;
        }
        let name = col.name().to_string();
        let values = match col.dtype() {
            DataType::String => {
                let ca = col.str().map_err(map_err)?;
                ColumnValues::Text(ca.into_iter().map(|v| v.map(str::to_string)).collect())
            }
            DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::UInt64
            | DataType::UInt32 => {
                let cast = col.cast(&DataType::Float64).map_err(map_err)?;
                let ca = cast.f64().map_err(map_err)?;
                ColumnValues::Float(ca.into_iter().collect())
            }
            other => {
                return Err(FrameError::UnsupportedType {
                    column: name,
                    dtype: other.to_string(),
                })
            }
        };
        table.push_column(TableColumn { name, values })?;
    }
    Ok(table)
}

/// Write a table to a Parquet file.
pub fn write_parquet(table: &WideTable, path: &Path) -> Result<(), FrameError> {
    let mut df = to_dataframe(table)?;
    let file =
        fs::File::create(path).map_err(|e| FrameError::Parquet(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| FrameError::Parquet(format!("write parquet: {e}")))?;
    Ok(())
}

/// Read a table previously written by [`write_parquet`].
pub fn read_parquet(path: &Path, index_name: &str) -> Result<WideTable, FrameError> {
    let file = fs::File::open(path).map_err(|e| FrameError::Parquet(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| FrameError::Parquet(format!("read: {e}")))?;
    from_dataframe(&df, index_name)
}
