use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{debug, info, warn};

use crate::charts::{ChartBuilder, ChartError};
use crate::config::Settings;
use crate::loader::{CsvLoader, DataValidator};
use crate::processing::{DataAggregator, DataCleaner, ProcessingError, StatisticsCalculator};
use crate::report::{ReportGenerator, SECTIONS};
use crate::table::Table;

pub const PDF_REPORT_NAME: &str = "rapport_ventes.pdf";

const PREVIEW_ROWS: usize = 5;

/// The tables produced by one pass over a CSV file.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    pub raw: Table,
    pub valid: Table,
    pub clean: Table,
}

/// Validates then cleans a freshly loaded table.
pub fn prepare(raw: Table) -> Result<PipelineState, ProcessingError> {
    let valid = DataValidator::new(&raw).validate(None)?;
    let clean = DataCleaner::new(&valid).clean()?;

    Ok(PipelineState { raw, valid, clean })
}

/// Writes the chart images the PDF report looks for into `dir`. A chart with
/// nothing to plot is skipped and any older image of it removed, so the
/// report leaves that section out.
pub fn render_standard_charts(table: &Table, dir: &Path) -> Result<Vec<PathBuf>, ChartError> {
    let builder = ChartBuilder::new(table);
    let mut written = Vec::with_capacity(SECTIONS.len());

    for section in SECTIONS {
        let path = dir.join(section.file_name);
        match (section.build)(&builder) {
            Ok(chart) => {
                chart.save_png(&path)?;
                written.push(path);
            },
            Err(ChartError::NoData(what)) => {
                warn!("skipping chart '{}': no data to plot for {}", section.title, what);
                if path.exists() {
                    fs::remove_file(&path)?;
                }
            },
            Err(err) => return Err(err),
        }
    }

    Ok(written)
}

/// Full batch run: load, validate, clean, aggregate, chart and report.
/// Returns the path of the PDF.
pub fn run(settings: &Settings, csv: Option<&Path>) -> Result<PathBuf> {
    info!("=== sales analysis pipeline starting ===");
    settings.ensure_dirs()?;

    let csv = csv.map(Path::to_path_buf).unwrap_or_else(|| settings.csv_file());
    info!("loading {}", csv.display());
    let raw = CsvLoader::new(&csv).load()?;
    info!("raw: {} rows", raw.len());
    debug!("raw preview:\n{}", raw.head(PREVIEW_ROWS));

    let state = prepare(raw)?;
    info!("valid: {} rows", state.valid.len());
    debug!("valid preview:\n{}", state.valid.head(PREVIEW_ROWS));
    info!("clean: {} rows, columns {:?}", state.clean.len(), state.clean.columns());
    debug!("clean preview:\n{}", state.clean.head(PREVIEW_ROWS));

    info!("aggregating");
    let aggregator = DataAggregator::new(&state.clean);
    let by_category = aggregator.sales_by_category_and_source()?;
    let by_city = aggregator.revenue_by_city()?;
    let top_products = aggregator.top_products_by_revenue(10)?;
    debug!("sales by category and source:\n{}", by_category);
    debug!("revenue by city:\n{}", by_city);
    debug!("top products:\n{}", top_products);

    info!("computing statistics");
    for stats in StatisticsCalculator::new(&state.clean).basic_stats() {
        debug!(
            "{}: mean {:.2}, median {:.2}, std {:.2}, min {:.2}, max {:.2}",
            stats.column, stats.mean, stats.median, stats.std, stats.min, stats.max
        );
    }

    info!("rendering charts");
    let charts_dir = settings.charts_dir();
    let charts = render_standard_charts(&state.clean, &charts_dir)?;
    debug!("{} charts written to {}", charts.len(), charts_dir.display());

    info!("generating pdf report");
    let report = ReportGenerator::new(&state.clean, settings.report_dir())?;
    let pdf_path = report.generate_pdf_report(PDF_REPORT_NAME, Some(&charts_dir))?;

    info!("=== pipeline finished, report at {} ===", pdf_path.display());
    Ok(pdf_path)
}
