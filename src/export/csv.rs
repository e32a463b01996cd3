use std::io;

use thiserror::Error;

use super::projector::ExportRow;

/// CSV rendering failures.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Writer-level failure.
    #[error("csv error: {0}")]
    Csv(#[from] ::csv::Error),
    /// Flushing the underlying writer failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// Output was not UTF-8.
    #[error("csv output is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Writes a header line plus one line per row.
pub fn write_csv<W: io::Write>(rows: &[ExportRow], writer: W) -> Result<(), ExportError> {
    let mut out = ::csv::Writer::from_writer(writer);
    out.write_record(ExportRow::headers())?;
    for row in rows {
        out.write_record(row.cells())?;
    }
    out.flush()?;
    Ok(())
}

/// Renders rows to an in-memory CSV document.
pub fn to_csv_string(rows: &[ExportRow]) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(rows, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
