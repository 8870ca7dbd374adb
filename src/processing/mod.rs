use thiserror::Error;

use crate::table::TableError;

pub mod aggregator;
pub mod cleaner;
pub mod statistics;

pub use aggregator::{AggFunc, DataAggregator};
pub use cleaner::DataCleaner;
pub use statistics::{ColumnStats, CorrelationMatrix, StatisticsCalculator};

/// Column names of the sales CSV.
pub mod columns {
    pub const DATE: &str = "date";
    pub const PRODUCT: &str = "produit";
    pub const CATEGORY: &str = "categorie";
    pub const PRICE: &str = "prix";
    pub const QUANTITY: &str = "quantite";
    pub const CITY: &str = "ville";
    pub const SOURCE: &str = "source";

    pub const REVENUE: &str = "revenu";
    pub const TOTAL: &str = "total";

    pub const SALES: [&str; 7] = [DATE, PRODUCT, CATEGORY, PRICE, QUANTITY, CITY, SOURCE];
}

#[derive(Debug, PartialEq, Error)]
pub enum ProcessingError {
    #[error("column not found: {0}")]
    MissingColumn(String),
    #[error("decimal overflow while computing {0}")]
    Overflow(String),
    #[error("{0}")]
    Table(TableError),
}

impl From<TableError> for ProcessingError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::MissingColumn(column) => ProcessingError::MissingColumn(column),
            other => ProcessingError::Table(other),
        }
    }
}
