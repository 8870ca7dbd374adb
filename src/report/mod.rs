use std::fs;
use std::path::{Path, PathBuf};

use getset::Getters;
use log::{debug, info, warn};
use thiserror::Error;

use crate::charts::{Chart, ChartBuilder, ChartError, RenderChart};
use crate::processing::columns::QUANTITY;
use crate::processing::StatisticsCalculator;
use crate::table::Table;

mod html;
pub mod pdf;

use pdf::{Font, Page, PdfWriter, PAGE_HEIGHT, PAGE_WIDTH};

pub const REPORT_TITLE: &str = "Rapport de Ventes 2025";

const MARGIN: f32 = 50.0;
const BOTTOM: f32 = 60.0;
const ROW_HEIGHT: f32 = 14.0;
const MAX_TABLE_ROWS: usize = 15;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to build pdf: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("failed to read chart image: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Chart(#[from] ChartError),
}

/// One chart page of the PDF report.
#[derive(Clone, Copy)]
pub struct ReportSection {
    pub title: &'static str,
    pub file_name: &'static str,
    pub build: fn(&ChartBuilder) -> Result<Chart, ChartError>,
}

pub const SECTIONS: [ReportSection; 3] = [
    ReportSection {
        title: "Ventes par catégorie",
        file_name: "ventes_par_categorie.png",
        build: ChartBuilder::plot_sales_by_category,
    },
    ReportSection {
        title: "Ventes par ville",
        file_name: "ventes_par_ville.png",
        build: ChartBuilder::plot_sales_by_city,
    },
    ReportSection {
        title: "Top produits",
        file_name: "top_produits.png",
        build: plot_top_ten,
    },
];

fn plot_top_ten(builder: &ChartBuilder) -> Result<Chart, ChartError> {
    builder.plot_top_products(10)
}

/// Box in PDF points, origin at the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Largest placement of a `width × height` image inside `area` that keeps the
/// aspect ratio, centered on both axes.
pub fn fit_centered(width: u32, height: u32, area: Rect) -> Rect {
    let scale = (area.width / width as f32).min(area.height / height as f32);
    let (fitted_w, fitted_h) = (width as f32 * scale, height as f32 * scale);

    Rect {
        x: area.x + (area.width - fitted_w) / 2.0,
        y: area.y + (area.height - fitted_h) / 2.0,
        width: fitted_w,
        height: fitted_h,
    }
}

#[derive(Getters)]
pub struct ReportGenerator {
    #[getset(get = "pub")]
    output_dir: PathBuf,
    table: Table,
    charts: ChartBuilder,
}

impl ReportGenerator {
    pub fn new(table: &Table, output_dir: impl AsRef<Path>) -> Result<ReportGenerator, ReportError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;

        Ok(ReportGenerator {
            output_dir,
            table: table.clone(),
            charts: ChartBuilder::new(table),
        })
    }

    /// Writes one page per chart image found in `charts_dir` (default
    /// `<output_dir>/charts`) followed by a descriptive statistics page.
    pub fn generate_pdf_report(&self, filename: &str, charts_dir: Option<&Path>) -> Result<PathBuf, ReportError> {
        let charts_dir = charts_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.output_dir.join("charts"));
        let mut writer = PdfWriter::new();

        for section in SECTIONS {
            let image_path = charts_dir.join(section.file_name);
            if !image_path.exists() {
                debug!("skipping section '{}': {} not found", section.title, image_path.display());
                continue;
            }

            let rows = match (section.build)(&self.charts) {
                Ok(chart) => chart.summary_rows(),
                Err(err) => {
                    warn!("no value table for '{}': {}", section.title, err);
                    Vec::new()
                },
            };

            let image = writer.embed_image(&image_path)?;
            let mut page = Page::new();
            draw_header(&mut page, section.title);
            let table_top = draw_value_table(&mut page, &rows);

            let floor = if rows.is_empty() { BOTTOM } else { table_top + 10.0 };
            let area = Rect {
                x: MARGIN,
                y: floor,
                width: PAGE_WIDTH - 2.0 * MARGIN,
                height: PAGE_HEIGHT - 100.0 - floor,
            };
            let placed = fit_centered(image.width, image.height, area);
            page.image(&image, placed.x, placed.y, placed.width, placed.height);

            draw_page_number(&mut page, writer.page_count() + 1);
            writer.add_page(page)?;
        }

        let mut page = Page::new();
        self.draw_statistics(&mut page);
        draw_page_number(&mut page, writer.page_count() + 1);
        writer.add_page(page)?;

        let pdf_path = self.output_dir.join(filename);
        let pages = writer.page_count();
        writer.save(&pdf_path)?;
        info!("pdf report written to {} ({} pages)", pdf_path.display(), pages);

        Ok(pdf_path)
    }

    /// HTML page with a histogram of quantities and revenue per category.
    pub fn generate_html_report(&self, filename: &str) -> Result<PathBuf, ReportError> {
        let histogram = self.charts.plot_histogram(QUANTITY, 10)?;
        histogram.save_png(self.output_dir.join(html::HISTOGRAM_FILE))?;

        let by_category = self.charts.plot_sales_by_category()?;
        by_category.save_png(self.output_dir.join(html::CATEGORY_FILE))?;

        let html_path = self.output_dir.join(filename);
        fs::write(&html_path, html::render(&histogram, &by_category))?;
        info!("html report written to {}", html_path.display());

        Ok(html_path)
    }

    fn draw_statistics(&self, page: &mut Page) {
        draw_header(page, "Statistiques descriptives");
        page.text(
            Font::Regular,
            10.0,
            MARGIN,
            PAGE_HEIGHT - 100.0,
            &format!("Lignes analysées : {}", self.table.len()),
        );

        let stats = StatisticsCalculator::new(&self.table).basic_stats();
        if stats.is_empty() {
            page.text(Font::Regular, 10.0, MARGIN, PAGE_HEIGHT - 130.0, "Aucune colonne numérique.");
            return;
        }

        // Right edges of the value columns.
        let edges = [250.0, 320.0, 390.0, 460.0, PAGE_WIDTH - MARGIN];
        let headers = ["Moyenne", "Médiane", "Écart-type", "Min", "Max"];

        let mut y = PAGE_HEIGHT - 130.0;
        page.text(Font::Bold, 10.0, MARGIN, y, "Colonne");
        for (edge, header) in edges.iter().zip(headers) {
            page.text_right(Font::Bold, 10.0, *edge, y, header);
        }
        page.line(MARGIN, y - 4.0, PAGE_WIDTH - MARGIN, y - 4.0);

        for stat in stats {
            y -= ROW_HEIGHT;
            if y < BOTTOM {
                break;
            }
            page.text(Font::Regular, 10.0, MARGIN, y, &stat.column);
            let values = [stat.mean, stat.median, stat.std, stat.min, stat.max];
            for (edge, value) in edges.iter().zip(values) {
                page.text_right(Font::Regular, 10.0, *edge, y, &format!("{:.2}", value));
            }
        }
    }
}

fn draw_header(page: &mut Page, section: &str) {
    page.text(Font::Bold, 18.0, MARGIN, PAGE_HEIGHT - 50.0, REPORT_TITLE);
    page.text(Font::Bold, 13.0, MARGIN, PAGE_HEIGHT - 80.0, section);
}

fn draw_page_number(page: &mut Page, number: usize) {
    page.text_right(Font::Regular, 9.0, PAGE_WIDTH - MARGIN, 30.0, &format!("Page {}", number));
}

/// Label/value rows stacked upwards from the bottom margin. Returns the top
/// of the table.
fn draw_value_table(page: &mut Page, rows: &[(String, String)]) -> f32 {
    if rows.is_empty() {
        return BOTTOM;
    }

    let mut shown: Vec<(String, String)> = rows.iter().take(MAX_TABLE_ROWS).cloned().collect();
    if rows.len() > MAX_TABLE_ROWS {
        shown.push((format!("(+{} autres)", rows.len() - MAX_TABLE_ROWS), String::new()));
    }

    let right = PAGE_WIDTH - MARGIN;
    let header_y = BOTTOM + shown.len() as f32 * ROW_HEIGHT;
    page.text(Font::Bold, 10.0, MARGIN, header_y, "Libellé");
    page.text_right(Font::Bold, 10.0, right, header_y, "Valeur");
    page.line(MARGIN, header_y - 4.0, right, header_y - 4.0);

    for (index, (label, value)) in shown.iter().enumerate() {
        let y = header_y - (index + 1) as f32 * ROW_HEIGHT;
        page.text(Font::Regular, 10.0, MARGIN, y, label);
        page.text_right(Font::Regular, 10.0, right, y, value);
    }

    header_y + ROW_HEIGHT
}
