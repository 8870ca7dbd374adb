use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;
use rust_decimal::Decimal;

use super::LoadError;
use crate::table::{Cell, Table};

/// Markers read as missing values, on top of the empty field.
const NULL_MARKERS: [&str; 7] = ["NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

pub struct CsvLoader {
    path: PathBuf,
    separator: u8,
}

impl CsvLoader {
    pub fn new(path: impl AsRef<Path>) -> CsvLoader {
        CsvLoader {
            path: path.as_ref().to_path_buf(),
            separator: b',',
        }
    }

    pub fn with_separator(mut self, separator: u8) -> CsvLoader {
        self.separator = separator;
        self
    }

    pub fn load(&self) -> Result<Table, LoadError> {
        let file = File::open(&self.path).map_err(|source| LoadError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        let table = self.read_from(file)?;
        debug!("loaded {} rows from {}", table.len(), self.path.display());

        Ok(table)
    }

    /// Reads a whole CSV document. A column becomes numeric only when every
    /// non-missing field of it parses as a number.
    pub fn read_from<R: Read>(&self, reader: R) -> Result<Table, LoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.separator)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        if columns.is_empty() || columns.iter().all(String::is_empty) {
            return Err(LoadError::Empty);
        }

        let mut raw_rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            raw_rows.push(record.iter().map(parse_field).collect::<Vec<_>>());
        }

        let numeric: Vec<bool> = (0..columns.len())
            .map(|index| {
                raw_rows
                    .iter()
                    .all(|row: &Vec<RawField>| !matches!(row[index], RawField::Text(_)))
            })
            .collect();

        let rows = raw_rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&numeric)
                    .map(|(field, &numeric)| field.into_cell(numeric))
                    .collect()
            })
            .collect();

        Ok(Table::new(columns, rows)?)
    }
}

enum RawField {
    Missing,
    Number(Decimal, String),
    Text(String),
}

impl RawField {
    fn into_cell(self, numeric_column: bool) -> Cell {
        match self {
            RawField::Missing => Cell::Null,
            RawField::Number(value, _) if numeric_column => Cell::Number(value),
            RawField::Number(_, text) | RawField::Text(text) => Cell::Text(text),
        }
    }
}

fn parse_field(field: &str) -> RawField {
    if field.is_empty() || NULL_MARKERS.contains(&field) {
        return RawField::Missing;
    }

    match parse_decimal(field) {
        Some(value) => RawField::Number(value, field.to_string()),
        None => RawField::Text(field.to_string()),
    }
}

pub(crate) fn parse_decimal(field: &str) -> Option<Decimal> {
    Decimal::from_str(field)
        .or_else(|_| Decimal::from_scientific(field))
        .ok()
}
