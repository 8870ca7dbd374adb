use std::fs;
use std::path::Path;

use enum_dispatch::enum_dispatch;
use image::{ImageFormat, RgbImage};
use log::debug;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::{BitMapBackend, DrawingArea, IntoDrawingArea, WHITE};
use thiserror::Error;

use crate::processing::ProcessingError;
use crate::table::TableError;

pub mod builder;
pub mod kinds;

pub use builder::ChartBuilder;
pub use kinds::{BarChart, Histogram, PieChart};

/// RGB bitmap the charts are drawn on.
pub type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("column not found: {0}")]
    MissingColumn(String),
    #[error("no data to plot for {0}")]
    NoData(String),
    #[error("column {0} is not numeric")]
    NotNumeric(String),
    #[error("{0}")]
    Processing(ProcessingError),
    #[error("failed to draw chart: {0}")]
    Draw(String),
    #[error("failed to write chart: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode chart: {0}")]
    Image(#[from] image::ImageError),
}

impl From<ProcessingError> for ChartError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::MissingColumn(column) => ChartError::MissingColumn(column),
            other => ChartError::Processing(other),
        }
    }
}

impl From<TableError> for ChartError {
    fn from(err: TableError) -> Self {
        ProcessingError::from(err).into()
    }
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Draw(err.to_string())
    }
}

#[enum_dispatch]
pub trait RenderChart {
    fn title(&self) -> &str;

    /// Pixel size of the rendered image.
    fn dimensions(&self) -> (u32, u32);

    /// Draws onto a canvas already filled with white.
    fn draw(&self, canvas: &Canvas<'_>) -> Result<(), ChartError>;

    /// Label/value pairs describing what the chart shows.
    fn summary_rows(&self) -> Vec<(String, String)>;
}

#[enum_dispatch(RenderChart)]
#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    BarChart,
    Histogram,
    PieChart,
}

impl Chart {
    pub fn render(&self) -> Result<RgbImage, ChartError> {
        let (width, height) = self.dimensions();
        let mut buffer = vec![255; width as usize * height as usize * 3];
        {
            let canvas = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            canvas.fill(&WHITE)?;
            self.draw(&canvas)?;
            canvas.present()?;
        }

        RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| ChartError::Draw(format!("bitmap for '{}' has the wrong size", self.title())))
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), ChartError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        self.render()?.save_with_format(path, ImageFormat::Png)?;
        debug!("chart '{}' written to {}", self.title(), path.display());

        Ok(())
    }
}

#[cfg(test)]
mod charts_tests;
