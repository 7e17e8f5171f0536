use anyhow::{Context, Result};
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

use crate::align::table::Table;

/// Write `table` as delimited text with a header row. The file is written
/// next to `path` under a temporary name and renamed into place at the end,
/// so a failed write never leaves a partial table behind.
pub fn write_table(table: &Table, path: &Path, delimiter: char) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create output file in {}", dir.display()))?;

    {
        let mut w = std::io::BufWriter::new(tmp.as_file_mut());
        write_record(&mut w, table.headers(), delimiter)?;
        for row in table.rows() {
            write_record(&mut w, row.into_iter(), delimiter)?;
        }
        w.flush().context("Failed to flush table")?;
    }

    tmp.persist(path)
        .with_context(|| format!("Failed to write table to {}", path.display()))?;

    log::info!("Wrote {} rows to {}", table.row_count(), path.display());
    Ok(())
}

fn write_record<'a, W: Write>(
    w: &mut W,
    fields: impl Iterator<Item = &'a str>,
    delimiter: char,
) -> Result<()> {
    let mut buf = [0u8; 4];
    let sep: &str = delimiter.encode_utf8(&mut buf);
    let line = fields
        .map(|f| quote(f, delimiter))
        .collect::<Vec<_>>()
        .join(sep);
    writeln!(w, "{}", line).context("Failed to write table row")?;
    Ok(())
}

/// Quote a field when it contains the delimiter, a quote or a line break.
fn quote(field: &str, delimiter: char) -> Cow<'_, str> {
    if field.contains(delimiter) || field.contains(&['"', '\n', '\r'][..]) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::reconcile::Column;

    fn table() -> Table {
        let col = |name, values: &[&str]| Column::new(name, values.iter().map(|s| s.to_string()).collect());
        Table {
            columns: vec![
                col("Frame", &["1", "2"]),
                col("Pitches", &["100.0000,101.5000", "NA"]),
                col("Formant 1", &["say \"a\"", "512.0000"]),
            ],
        }
    }

    #[test]
    fn quotes_fields_with_delimiters() {
        assert_eq!(quote("100.0000", ','), "100.0000");
        assert_eq!(quote("1.0000,2.0000", ','), "\"1.0000,2.0000\"");
        assert_eq!(quote("1.0000,2.0000", ';'), "1.0000,2.0000");
        assert_eq!(quote("a\"b", ';'), "\"a\"\"b\"");
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_table(&table(), &path, ',').unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Frame,Pitches,Formant 1\n1,\"100.0000,101.5000\",\"say \"\"a\"\"\"\n2,NA,512.0000\n"
        );
    }

    #[test]
    fn empty_table_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let table = Table {
            columns: vec![Column::new("Frame", vec![]), Column::new("Start", vec![])],
        };
        write_table(&table, &path, ',').unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Frame,Start\n");
    }

    #[test]
    fn unwritable_destination_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        assert!(write_table(&table(), &path, ',').is_err());
        assert!(!path.exists());
    }
}
