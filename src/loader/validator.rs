use std::collections::HashMap;

use log::debug;

use super::csv_loader::parse_decimal;
use crate::table::{Cell, ColumnType, Table, TableError};

pub struct DataValidator {
    table: Table,
}

impl DataValidator {
    pub fn new(table: &Table) -> DataValidator {
        DataValidator { table: table.clone() }
    }

    /// Drops exact duplicate rows, forward-fills missing values, then coerces
    /// the columns listed in `expected_types` that exist in the table.
    pub fn validate(self, expected_types: Option<&HashMap<String, ColumnType>>) -> Result<Table, TableError> {
        let before = self.table.len();
        let mut table = self.table.drop_duplicates().forward_fill();
        debug!("validation dropped {} duplicate rows", before - table.len());

        if let Some(expected_types) = expected_types {
            for (column, column_type) in expected_types {
                if table.has_column(column) {
                    table = coerce(&table, column, *column_type)?;
                }
            }
        }

        Ok(table)
    }
}

fn coerce(table: &Table, column: &str, column_type: ColumnType) -> Result<Table, TableError> {
    let mut failure = None;
    let coerced = table.map_column(column, |cell| match (column_type, cell) {
        (ColumnType::Number, Cell::Text(text)) => match parse_decimal(text) {
            Some(value) => Cell::Number(value),
            None => {
                failure.get_or_insert_with(|| text.clone());
                cell.clone()
            },
        },
        (ColumnType::Text, Cell::Number(value)) => Cell::Text(value.to_string()),
        _ => cell.clone(),
    })?;

    match failure {
        Some(value) => Err(TableError::TypeCoercion {
            column: column.to_string(),
            value,
        }),
        None => Ok(coerced),
    }
}
