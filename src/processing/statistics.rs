use serde::Serialize;

use super::aggregator::revenue_cells;
use super::columns::{QUANTITY, TOTAL};
use crate::table::{Cell, Table};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// `None` where the coefficient is undefined.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|column| column == a)?;
        let j = self.columns.iter().position(|column| column == b)?;
        self.values[i][j]
    }
}

/// Descriptive statistics over the numeric columns of a table. Missing cells
/// are ignored column by column.
pub struct StatisticsCalculator {
    table: Table,
}

impl StatisticsCalculator {
    pub fn new(table: &Table) -> StatisticsCalculator {
        StatisticsCalculator { table: table.clone() }
    }

    pub fn basic_stats(&self) -> Vec<ColumnStats> {
        self.table
            .numeric_columns()
            .into_iter()
            .filter_map(|column| {
                let values = self.values(&column);
                describe(&values).map(|(mean, median, std, min, max)| ColumnStats {
                    column,
                    mean,
                    median,
                    std,
                    min,
                    max,
                })
            })
            .collect()
    }

    /// Pearson coefficients computed on pairwise complete observations.
    pub fn correlation_matrix(&self) -> CorrelationMatrix {
        let columns = self.table.numeric_columns();
        let series: Vec<Vec<Option<f64>>> = columns.iter().map(|column| self.series(column)).collect();

        let values = series
            .iter()
            .map(|a| series.iter().map(|b| pearson(&paired(a, b))).collect())
            .collect();

        CorrelationMatrix { columns, values }
    }

    /// Correlation between revenue and sold quantity. Revenue is read from
    /// `total` when present and derived from `prix * quantite` otherwise.
    pub fn revenue_quantity_correlation(&self) -> Option<f64> {
        if !self.table.has_column(QUANTITY) {
            return None;
        }

        let revenue: Vec<Option<f64>> = if self.table.has_column(TOTAL) {
            self.series(TOTAL)
        } else {
            revenue_cells(&self.table).ok()?.iter().map(Cell::as_f64).collect()
        };

        pearson(&paired(&revenue, &self.series(QUANTITY)))
    }

    fn series(&self, column: &str) -> Vec<Option<f64>> {
        match self.table.column(column) {
            Ok(cells) => cells.map(Cell::as_f64).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn values(&self, column: &str) -> Vec<f64> {
        self.series(column).into_iter().flatten().collect()
    }
}

/// Returns (mean, median, population std, min, max), or `None` for no values.
fn describe(values: &[f64]) -> Option<(f64, f64, f64, f64, f64)> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };
    let variance = sorted.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / n as f64;

    Some((mean, median, variance.sqrt(), sorted[0], sorted[n - 1]))
}

fn paired(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<(f64, f64)> {
    a.iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect()
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }

    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}
