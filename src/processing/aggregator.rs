use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;

use super::columns::{CATEGORY, CITY, PRICE, PRODUCT, QUANTITY, REVENUE, SOURCE};
use super::ProcessingError;
use crate::table::{Cell, Table};

const PRECISION: u32 = 4;

pub const MISSING_RATE: &str = "taux_manquant (%)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Sum,
    Mean,
    Min,
    Max,
    Count,
}

impl AggFunc {
    pub fn name(&self) -> &'static str {
        match self {
            AggFunc::Sum => "sum",
            AggFunc::Mean => "mean",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
            AggFunc::Count => "count",
        }
    }

    /// `values` holds the non-null numbers of one group. Sums that leave the
    /// `Decimal` range are reported instead of wrapping or panicking.
    pub fn apply(&self, values: &[Decimal]) -> Result<Cell, ProcessingError> {
        let sum = || {
            values
                .iter()
                .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(*value))
                .ok_or_else(|| ProcessingError::Overflow(self.name().to_string()))
        };

        Ok(match self {
            AggFunc::Sum => Cell::Number(sum()?.round_dp(PRECISION)),
            AggFunc::Mean if values.is_empty() => Cell::Null,
            AggFunc::Mean => Cell::Number((sum()? / Decimal::from(values.len())).round_dp(PRECISION)),
            AggFunc::Min => values.iter().min().copied().into(),
            AggFunc::Max => values.iter().max().copied().into(),
            AggFunc::Count => Cell::Number(Decimal::from(values.len())),
        })
    }
}

/// Group-by and pivot views over a sales table. Revenue is `prix * quantite`
/// and is missing whenever one of its factors is.
pub struct DataAggregator {
    table: Table,
}

impl DataAggregator {
    pub fn new(table: &Table) -> DataAggregator {
        DataAggregator { table: table.clone() }
    }

    pub fn revenue(&self) -> Result<Vec<Cell>, ProcessingError> {
        revenue_cells(&self.table)
    }

    fn with_revenue(&self) -> Result<Table, ProcessingError> {
        Ok(self.table.with_column(REVENUE, self.revenue()?)?)
    }

    pub fn groupby_multiple<S, T>(&self, group_cols: &[S], aggs: &[(T, AggFunc)]) -> Result<Table, ProcessingError>
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        groupby(&self.table, group_cols, aggs)
    }

    pub fn pivot_quantity(&self, index: &str, columns: &str, func: AggFunc) -> Result<Table, ProcessingError> {
        pivot(&self.table, index, columns, QUANTITY, func)
    }

    pub fn pivot_revenue(&self, index: &str, columns: &str, func: AggFunc) -> Result<Table, ProcessingError> {
        pivot(&self.with_revenue()?, index, columns, REVENUE, func)
    }

    pub fn total_quantity_by_product(&self) -> Result<Table, ProcessingError> {
        let grouped = summed(&self.table, &[PRODUCT], &[QUANTITY])?;
        sort_descending(&grouped, QUANTITY)
    }

    pub fn revenue_by_city(&self) -> Result<Table, ProcessingError> {
        summed(&self.with_revenue()?, &[CITY], &[REVENUE])
    }

    pub fn sales_by_category_and_source(&self) -> Result<Table, ProcessingError> {
        summed(&self.with_revenue()?, &[CATEGORY, SOURCE], &[QUANTITY, REVENUE])
    }

    pub fn top_products_by_revenue(&self, n: usize) -> Result<Table, ProcessingError> {
        let grouped = summed(&self.with_revenue()?, &[PRODUCT], &[REVENUE])?;
        Ok(sort_descending(&grouped, REVENUE)?.head(n))
    }

    pub fn duplicated_rows(&self) -> Table {
        self.table.duplicated_rows()
    }

    pub fn missing_value_rate(&self) -> Result<Table, ProcessingError> {
        let total = self.table.len();
        let mut rows = Vec::with_capacity(self.table.columns().len());

        for column in self.table.columns() {
            let missing = self.table.column(column)?.filter(|cell| cell.is_null()).count();
            let rate = if total == 0 {
                Cell::Null
            } else {
                let rate = Decimal::from(missing * 100) / Decimal::from(total);
                Cell::Number(rate.round_dp(PRECISION))
            };
            rows.push(vec![Cell::Text(column.clone()), rate]);
        }

        Ok(Table::new(vec!["colonne".to_string(), MISSING_RATE.to_string()], rows)?)
    }
}

pub(crate) fn revenue_cells(table: &Table) -> Result<Vec<Cell>, ProcessingError> {
    let price = table.column_index(PRICE)?;
    let quantity = table.column_index(QUANTITY)?;

    Ok(table
        .rows()
        .iter()
        .map(|row| match (row[price].as_decimal(), row[quantity].as_decimal()) {
            (Some(price), Some(quantity)) => price.checked_mul(quantity).into(),
            _ => Cell::Null,
        })
        .collect())
}

fn groupby<S, T>(table: &Table, group_cols: &[S], aggs: &[(T, AggFunc)]) -> Result<Table, ProcessingError>
where
    S: AsRef<str>,
    T: AsRef<str>,
{
    let keys = group_cols
        .iter()
        .map(|column| table.column_index(column.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    let values = aggs
        .iter()
        .map(|(column, _)| table.column_index(column.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut groups: BTreeMap<Vec<Cell>, Vec<Vec<Decimal>>> = BTreeMap::new();
    for row in table.rows() {
        let key: Vec<Cell> = keys.iter().map(|&index| row[index].clone()).collect();
        if key.iter().any(Cell::is_null) {
            continue;
        }

        let group = groups.entry(key).or_insert_with(|| vec![Vec::new(); values.len()]);
        for (collected, &index) in group.iter_mut().zip(&values) {
            if let Some(value) = row[index].as_decimal() {
                collected.push(value);
            }
        }
    }

    let mut columns: Vec<String> = group_cols.iter().map(|column| column.as_ref().to_string()).collect();
    columns.extend(aggs.iter().map(|(column, func)| format!("{}_{}", column.as_ref(), func.name())));

    let mut rows = Vec::with_capacity(groups.len());
    for (mut row, collected) in groups {
        for (values, (column, func)) in collected.iter().zip(aggs) {
            let cell = func
                .apply(values)
                .map_err(|_| ProcessingError::Overflow(format!("{}_{}", column.as_ref(), func.name())))?;
            row.push(cell);
        }
        rows.push(row);
    }

    Ok(Table::new(columns, rows)?)
}

/// Sums `values` per group and keeps the input column names.
fn summed(table: &Table, keys: &[&str], values: &[&str]) -> Result<Table, ProcessingError> {
    let aggs: Vec<(&str, AggFunc)> = values.iter().map(|column| (*column, AggFunc::Sum)).collect();
    let mapping: HashMap<String, String> = values
        .iter()
        .map(|column| (format!("{}_{}", column, AggFunc::Sum.name()), column.to_string()))
        .collect();

    Ok(groupby(table, keys, &aggs)?.rename(&mapping)?)
}

fn sort_descending(table: &Table, column: &str) -> Result<Table, ProcessingError> {
    let index = table.column_index(column)?;
    let mut rows = table.rows().clone();
    rows.sort_by(|a, b| b[index].cmp(&a[index]));

    Ok(Table::new(table.columns().clone(), rows)?)
}

fn pivot(table: &Table, index: &str, columns: &str, values: &str, func: AggFunc) -> Result<Table, ProcessingError> {
    let index_pos = table.column_index(index)?;
    let columns_pos = table.column_index(columns)?;
    let values_pos = table.column_index(values)?;

    let mut cells: BTreeMap<(Cell, Cell), Vec<Decimal>> = BTreeMap::new();
    let mut index_values = BTreeSet::new();
    let mut column_values = BTreeSet::new();

    for row in table.rows() {
        let (key, column) = (&row[index_pos], &row[columns_pos]);
        if key.is_null() || column.is_null() {
            continue;
        }

        if let Some(value) = row[values_pos].as_decimal() {
            index_values.insert(key.clone());
            column_values.insert(column.clone());
            cells.entry((key.clone(), column.clone())).or_default().push(value);
        }
    }

    let mut header = vec![index.to_string()];
    header.extend(column_values.iter().map(|value| value.to_string()));

    let mut rows = Vec::with_capacity(index_values.len());
    for key in index_values {
        let mut row = vec![key.clone()];
        for column in &column_values {
            let cell = match cells.get(&(key.clone(), column.clone())) {
                Some(group) => func
                    .apply(group)
                    .map_err(|_| ProcessingError::Overflow(format!("{}_{}", values, func.name())))?,
                None => Cell::Null,
            };
            row.push(cell);
        }
        rows.push(row);
    }

    Ok(Table::new(header, rows)?)
}
