//! Inner join of the two normalized tables on identifier.

use crate::table::{TableError, WideTable};

/// Suffix appended to a right-hand column whose name is already taken.
pub const RIGHT_SUFFIX: &str = " (right)";

/// Inner join on identifier, then drop rows lacking `required`.
///
/// Rows keep `left`'s order. Columns of `left` come first. A `required`
/// column missing from the joined table yields an empty table.
pub fn join(left: &WideTable, right: &WideTable, required: &str) -> Result<WideTable, TableError> {
    let joined = inner_join(left, right)?;
    Ok(filter_required(joined, required))
}

/// Rows whose identifier appears in both tables.
pub fn inner_join(left: &WideTable, right: &WideTable) -> Result<WideTable, TableError> {
    let mut left_rows = Vec::new();
    let mut right_rows = Vec::new();
    for (row, id) in left.identifiers().iter().enumerate() {
        if let Some(other) = right.row_of(id) {
            left_rows.push(row);
            right_rows.push(other);
        }
    }

    let mut joined = left.select_rows(&left_rows);
    joined.append_gathered(right, &right_rows, |name| format!("{name}{RIGHT_SUFFIX}"))?;
    Ok(joined)
}

/// Keep rows whose `required` cell is present and not NaN.
pub fn filter_required(table: WideTable, required: &str) -> WideTable {
    let Some(col) = table.column(required) else {
        tracing::warn!(column = required, "required column not present, result is empty");
        return table.filter_rows(|_| false);
    };
    let result = table.filter_rows(|row| col.values.is_present(row));
    if result.is_empty() {
        tracing::warn!(column = required, "no rows have a value for the required column");
    }
    result
}
