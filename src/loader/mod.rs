use thiserror::Error;

use crate::table::TableError;

pub mod csv_loader;
pub mod validator;

pub use csv_loader::CsvLoader;
pub use validator::DataValidator;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("no columns to parse from file")]
    Empty,
    #[error("{0}")]
    Table(#[from] TableError),
}

#[cfg(test)]
mod loader_tests;
