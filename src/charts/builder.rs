use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;

use super::{BarChart, Chart, ChartError, Histogram, PieChart};
use crate::processing::aggregator::revenue_cells;
use crate::processing::columns::{CATEGORY, CITY, PRICE, PRODUCT, QUANTITY, TOTAL};
use crate::processing::{AggFunc, DataAggregator};
use crate::table::{Cell, ColumnType, Table};

/// Builds charts from a sales table. A `total` column (`prix * quantite`) is
/// derived up front when the table does not carry one.
pub struct ChartBuilder {
    table: Table,
}

impl ChartBuilder {
    pub fn new(table: &Table) -> ChartBuilder {
        let mut table = table.clone();
        if !table.has_column(TOTAL) && table.has_column(PRICE) && table.has_column(QUANTITY) {
            if let Ok(total) = revenue_cells(&table).and_then(|cells| Ok(table.with_column(TOTAL, cells)?)) {
                table = total;
            }
        }

        ChartBuilder { table }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn plot_histogram(&self, column: &str, bins: usize) -> Result<Chart, ChartError> {
        let values = self.numeric_values(column)?;
        Ok(Histogram::new(column, &values, bins)?.into())
    }

    /// One bar per row, rows without a value are skipped.
    pub fn plot_bar(&self, x_col: &str, y_col: &str) -> Result<Chart, ChartError> {
        self.require_numeric(y_col)?;
        let (labels, values) = self
            .table
            .column(x_col)?
            .zip(self.table.column(y_col)?)
            .filter_map(|(label, value)| Some((label.to_string(), value.as_f64()?)))
            .unzip();

        let chart = BarChart::new(format!("{} par {}", y_col, x_col), labels, values)?.with_axes(x_col, y_col);
        Ok(chart.into())
    }

    /// Value counts of a categorical column, most frequent first.
    pub fn plot_pie(&self, column: &str) -> Result<Chart, ChartError> {
        let mut counts: BTreeMap<&Cell, usize> = BTreeMap::new();
        for cell in self.table.column(column)?.filter(|cell| !cell.is_null()) {
            *counts.entry(cell).or_default() += 1;
        }

        let mut counts: Vec<(&Cell, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        let (labels, values) = counts
            .into_iter()
            .map(|(cell, count)| (cell.to_string(), count as f64))
            .unzip();

        Ok(PieChart::new(format!("Répartition de {}", column), labels, values)?.into())
    }

    pub fn plot_sales_by_category(&self) -> Result<Chart, ChartError> {
        let chart = self.revenue_ranking(CATEGORY, "Chiffre d'affaires par catégorie", None)?;
        Ok(chart.with_axes("Catégorie", "Chiffre d'affaires").into())
    }

    pub fn plot_sales_by_city(&self) -> Result<Chart, ChartError> {
        let chart = self.revenue_ranking(CITY, "Chiffre d'affaires par ville", None)?;
        Ok(chart.with_axes("Ville", "Chiffre d'affaires").into())
    }

    pub fn plot_top_products(&self, n: usize) -> Result<Chart, ChartError> {
        let title = format!("Top {} produits par chiffre d'affaires", n);
        let chart = self.revenue_ranking(PRODUCT, &title, Some(n))?;
        Ok(chart.with_axes("Produit", "Chiffre d'affaires").with_size(1000, 500).into())
    }

    /// Revenue summed per `group`, largest first.
    fn revenue_ranking(&self, group: &str, title: &str, limit: Option<usize>) -> Result<BarChart, ChartError> {
        self.table.column_index(group)?;
        self.table.column_index(TOTAL)?;

        let grouped = DataAggregator::new(&self.table).groupby_multiple(&[group], &[(TOTAL, AggFunc::Sum)])?;
        let mut ranking: Vec<(String, f64)> = grouped
            .rows()
            .iter()
            .filter_map(|row| Some((row[0].to_string(), row[1].as_decimal()?.to_f64()?)))
            .collect();
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
        if let Some(limit) = limit {
            ranking.truncate(limit);
        }

        let (labels, values) = ranking.into_iter().unzip();
        BarChart::new(title, labels, values)
    }

    fn require_numeric(&self, column: &str) -> Result<(), ChartError> {
        match self.table.column_type(column)? {
            ColumnType::Number => Ok(()),
            ColumnType::Text if self.table.column(column)?.all(Cell::is_null) => Ok(()),
            ColumnType::Text => Err(ChartError::NotNumeric(column.to_string())),
        }
    }

    fn numeric_values(&self, column: &str) -> Result<Vec<f64>, ChartError> {
        self.require_numeric(column)?;
        Ok(self.table.column(column)?.filter_map(Cell::as_f64).collect())
    }
}
