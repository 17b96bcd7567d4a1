use std::fmt;

/// Errors produced while reading order or inventory exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// The file could not be opened or read.
    Io(String),
    /// The bytes are not in a supported text encoding.
    Encoding(String),
    /// The header row is missing a required column.
    MissingHeader(String),
    /// The CSV structure itself is broken.
    Csv { row: usize, msg: String },
    /// The spreadsheet could not be opened or has no readable sheet.
    Workbook(String),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Io(msg) => write!(f, "ingest io error: {msg}"),
            IngestError::Encoding(msg) => {
                write!(f, "unsupported text encoding: {msg}; save the file as UTF-8")
            }
            IngestError::MissingHeader(col) => {
                write!(f, "missing required header column: '{col}'")
            }
            IngestError::Csv { row, msg } => write!(f, "csv row {row}: {msg}"),
            IngestError::Workbook(msg) => write!(f, "workbook error: {msg}"),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<csv::Error> for IngestError {
    fn from(e: csv::Error) -> Self {
        let row = e
            .position()
            .map(|p| usize::try_from(p.line()).unwrap_or(usize::MAX))
            .unwrap_or(0);
        IngestError::Csv {
            row,
            msg: e.to_string(),
        }
    }
}
