use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;

use getset::Getters;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, PartialEq, Error)]
pub enum TableError {
    #[error("column not found: {0}")]
    MissingColumn(String),
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow { row: usize, expected: usize, found: usize },
    #[error("cannot convert {value:?} in column {column} to a number")]
    TypeCoercion { column: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Number,
    Text,
}

/// A single value of a table. Numbers are kept as decimals so prices and
/// quantities never pick up binary rounding noise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cell {
    Null,
    Number(Decimal),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_decimal().and_then(|value| value.to_f64())
    }

    pub fn to_json(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Number(value) if value.scale() == 0 => match value.to_i64() {
                Some(int) => Value::from(int),
                None => float_json(value.to_f64()),
            },
            Cell::Number(value) => float_json(value.to_f64()),
            Cell::Text(text) => Value::String(text.clone()),
        }
    }
}

fn float_json(value: Option<f64>) -> Value {
    value
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

impl From<Decimal> for Cell {
    fn from(value: Decimal) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<Option<Decimal>> for Cell {
    fn from(value: Option<Decimal>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Null)
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Cell::Null, Cell::Null) => Ordering::Equal,
            (Cell::Null, _) => Ordering::Less,
            (_, Cell::Null) => Ordering::Greater,
            (Cell::Number(a), Cell::Number(b)) => a.cmp(b),
            (Cell::Number(_), Cell::Text(_)) => Ordering::Less,
            (Cell::Text(_), Cell::Number(_)) => Ordering::Greater,
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Number(value) => write!(f, "{}", value),
            Cell::Text(text) => f.write_str(text),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Column-named, row-major table. Every row holds exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Getters)]
pub struct Table {
    #[getset(get = "pub")]
    columns: Vec<String>,
    #[getset(get = "pub")]
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Table, TableError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(TableError::DuplicateColumn(column.clone()));
            }
        }

        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RaggedRow {
                    row: index,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }

        Ok(Table { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Cell> + '_, TableError> {
        let index = self.column_index(name)?;
        Ok(self.rows.iter().map(move |row| &row[index]))
    }

    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    pub fn column_type(&self, name: &str) -> Result<ColumnType, TableError> {
        let mut any_value = false;
        for cell in self.column(name)? {
            match cell {
                Cell::Null => {},
                Cell::Number(_) => any_value = true,
                Cell::Text(_) => return Ok(ColumnType::Text),
            }
        }

        Ok(if any_value { ColumnType::Number } else { ColumnType::Text })
    }

    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|name| matches!(self.column_type(name), Ok(ColumnType::Number)))
            .cloned()
            .collect()
    }

    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<Table, TableError> {
        let indices = columns
            .iter()
            .map(|name| self.column_index(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&index| row[index].clone()).collect())
            .collect();

        Table::new(columns.iter().map(|name| name.as_ref().to_string()).collect(), rows)
    }

    pub fn rename(&self, mapping: &HashMap<String, String>) -> Result<Table, TableError> {
        let columns = self
            .columns
            .iter()
            .map(|name| mapping.get(name).cloned().unwrap_or_else(|| name.clone()))
            .collect();

        Table::new(columns, self.rows.clone())
    }

    pub fn map_column<F>(&self, name: &str, mut f: F) -> Result<Table, TableError>
    where
        F: FnMut(&Cell) -> Cell,
    {
        let index = self.column_index(name)?;
        let mut table = self.clone();
        for row in table.rows.iter_mut() {
            row[index] = f(&row[index]);
        }

        Ok(table)
    }

    /// Appends `name`, or overwrites it when the column already exists.
    pub fn with_column(&self, name: &str, cells: Vec<Cell>) -> Result<Table, TableError> {
        if cells.len() != self.rows.len() {
            return Err(TableError::RaggedRow {
                row: cells.len().min(self.rows.len()),
                expected: self.rows.len(),
                found: cells.len(),
            });
        }

        let mut table = self.clone();
        match self.column_index(name) {
            Ok(index) => {
                for (row, cell) in table.rows.iter_mut().zip(cells) {
                    row[index] = cell;
                }
            },
            Err(_) => {
                table.columns.push(name.to_string());
                for (row, cell) in table.rows.iter_mut().zip(cells) {
                    row.push(cell);
                }
            },
        }

        Ok(table)
    }

    pub fn drop_duplicates(&self) -> Table {
        let mut seen = HashSet::new();
        let rows = self.rows.iter().filter(|row| seen.insert(*row)).cloned().collect();

        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    pub fn duplicated_rows(&self) -> Table {
        let mut seen = HashSet::new();
        let rows = self.rows.iter().filter(|row| !seen.insert(*row)).cloned().collect();

        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Replaces each null by the closest non-null value above it in the same column.
    pub fn forward_fill(&self) -> Table {
        let mut last: Vec<Option<Cell>> = vec![None; self.columns.len()];
        let mut table = self.clone();

        for row in table.rows.iter_mut() {
            for (cell, previous) in row.iter_mut().zip(last.iter_mut()) {
                if cell.is_null() {
                    if let Some(value) = previous {
                        *cell = value.clone();
                    }
                } else {
                    *previous = Some(cell.clone());
                }
            }
        }

        table
    }

    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(name, cell)| (name.clone(), cell.to_json()))
                    .collect()
            })
            .collect()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.columns.join(" | "))?;
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
            writeln!(f, "{}", line.join(" | "))?;
        }

        Ok(())
    }
}
