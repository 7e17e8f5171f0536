use crate::error::LengthMismatch;

/// Placeholder for cells a column has no value for.
pub const NA: &str = "NA";

/// A named column of already formatted cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub values: Vec<String>,
}

impl Column {
    pub fn new(name: &'static str, values: Vec<String>) -> Self {
        Self { name, values }
    }
}

/// Right-pad every column with "NA" up to the longest column's length.
///
/// Padding goes by length alone: a column missing a value for an early frame
/// has its later values shifted up, so a row can mix values from different
/// frame windows. The returned mismatch lets callers audit when that happened.
pub fn reconcile(mut columns: Vec<Column>) -> (Vec<Column>, Option<LengthMismatch>) {
    let max_len = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);

    let mismatch = if columns.iter().any(|c| c.values.len() != max_len) {
        Some(LengthMismatch {
            lengths: columns.iter().map(|c| (c.name, c.values.len())).collect(),
            max_len,
        })
    } else {
        None
    };

    for column in &mut columns {
        column.values.resize(max_len, NA.to_string());
    }

    (columns, mismatch)
}
