use std::collections::HashMap;

use log::debug;

use super::{columns, ProcessingError};
use crate::table::{Cell, Table};

/// Chainable cleaning steps over a copy of the input table.
pub struct DataCleaner {
    table: Table,
}

impl DataCleaner {
    pub fn new(table: &Table) -> DataCleaner {
        DataCleaner { table: table.clone() }
    }

    pub fn select_columns<S: AsRef<str>>(mut self, columns: &[S]) -> Result<DataCleaner, ProcessingError> {
        self.table = self.table.select(columns)?;
        Ok(self)
    }

    pub fn rename_columns(mut self, mapping: &HashMap<String, String>) -> Result<DataCleaner, ProcessingError> {
        self.table = self.table.rename(mapping)?;
        Ok(self)
    }

    pub fn apply_transform<F>(mut self, column: &str, f: F) -> Result<DataCleaner, ProcessingError>
    where
        F: FnMut(&Cell) -> Cell,
    {
        self.table = self.table.map_column(column, f)?;
        Ok(self)
    }

    /// Keeps the sales columns present in the table, in schema order.
    pub fn clean(self) -> Result<Table, ProcessingError> {
        let keep: Vec<&str> = columns::SALES
            .iter()
            .copied()
            .filter(|column| self.table.has_column(column))
            .collect();

        let dropped = self.table.columns().len() - keep.len();
        if dropped > 0 {
            debug!("cleaning dropped {} columns outside the sales schema", dropped);
        }

        Ok(self.select_columns(&keep)?.get())
    }

    pub fn get(self) -> Table {
        self.table
    }
}
