use plotters::prelude::{
    ChartBuilder, Color, IntoFont, IntoSegmentedCoord, Pie, RGBColor, Rectangle, SegmentValue, ShapeStyle, BLACK, WHITE,
};

use super::{Canvas, ChartError, RenderChart};

const TITLE_FONT: (&str, u32) = ("sans-serif", 26);
const LABEL_FONT: (&str, u32) = ("sans-serif", 14);

const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Value axis range including zero, padded above the tallest bar.
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((0.0_f64, 0.0_f64), |(min, max), v| (min.min(v), max.max(v)));
    if max - min <= f64::EPSILON {
        return (min, min + 1.0);
    }
    let pad = (max - min) * 0.05;
    (if min < 0.0 { min - pad } else { min }, max + pad)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub width: u32,
    pub height: u32,
}

impl BarChart {
    pub fn new(title: impl Into<String>, labels: Vec<String>, values: Vec<f64>) -> Result<BarChart, ChartError> {
        let title = title.into();
        if values.is_empty() || labels.len() != values.len() {
            return Err(ChartError::NoData(title));
        }

        Ok(BarChart {
            title,
            x_label: String::new(),
            y_label: String::new(),
            labels,
            values,
            width: 800,
            height: 500,
        })
    }

    pub fn with_axes(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> BarChart {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> BarChart {
        self.width = width;
        self.height = height;
        self
    }
}

impl RenderChart for BarChart {
    fn title(&self) -> &str {
        &self.title
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn draw(&self, canvas: &Canvas<'_>) -> Result<(), ChartError> {
        let (low, high) = value_range(self.values.iter().copied());
        let mut chart = ChartBuilder::on(canvas)
            .caption(&self.title, TITLE_FONT)
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d((0..self.values.len() as i32).into_segmented(), low..high)?;

        let category = |value: &SegmentValue<i32>| match value {
            SegmentValue::CenterOf(index) => usize::try_from(*index)
                .ok()
                .and_then(|index| self.labels.get(index))
                .cloned()
                .unwrap_or_default(),
            _ => String::new(),
        };
        let mut mesh = chart.configure_mesh();
        mesh.disable_x_mesh()
            .x_labels(self.labels.len())
            .x_label_formatter(&category)
            .x_label_style(LABEL_FONT)
            .y_label_style(LABEL_FONT)
            .axis_desc_style(LABEL_FONT);
        if !self.x_label.is_empty() {
            mesh.x_desc(self.x_label.as_str());
        }
        if !self.y_label.is_empty() {
            mesh.y_desc(self.y_label.as_str());
        }
        mesh.draw()?;

        let bar = |index: usize, value: f64, style: ShapeStyle| {
            let index = index as i32;
            let corners = [(SegmentValue::Exact(index), 0.0), (SegmentValue::Exact(index + 1), value)];
            let mut bar = Rectangle::new(corners, style);
            bar.set_margin(0, 0, 8, 8);
            bar
        };
        let values = || self.values.iter().copied().enumerate();
        chart.draw_series(values().map(|(index, value)| bar(index, value, PALETTE[0].filled())))?;
        chart.draw_series(values().map(|(index, value)| bar(index, value, BLACK.into())))?;

        Ok(())
    }

    fn summary_rows(&self) -> Vec<(String, String)> {
        self.labels
            .iter()
            .zip(&self.values)
            .map(|(label, value)| (label.clone(), format!("{:.2}", value)))
            .collect()
    }
}

/// Equal-width binning: the last bin is closed, a constant series spans
/// `value ± 0.5`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub title: String,
    pub column: String,
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn new(column: &str, values: &[f64], bins: usize) -> Result<Histogram, ChartError> {
        if values.is_empty() {
            return Err(ChartError::NoData(column.to_string()));
        }

        let bins = bins.max(1);
        let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if min == max {
            min -= 0.5;
            max += 0.5;
        }

        let width = (max - min) / bins as f64;
        let edges = (0..=bins).map(|i| min + width * i as f64).collect();
        let mut counts = vec![0; bins];
        for value in values {
            let index = (((value - min) / width) as usize).min(bins - 1);
            counts[index] += 1;
        }

        Ok(Histogram {
            title: format!("Histogramme de {}", column),
            column: column.to_string(),
            edges,
            counts,
        })
    }
}

impl RenderChart for Histogram {
    fn title(&self) -> &str {
        &self.title
    }

    fn dimensions(&self) -> (u32, u32) {
        (800, 500)
    }

    fn draw(&self, canvas: &Canvas<'_>) -> Result<(), ChartError> {
        let (first, last) = (self.edges[0], self.edges[self.edges.len() - 1]);
        let (_, high) = value_range(self.counts.iter().map(|count| *count as f64));
        let mut chart = ChartBuilder::on(canvas)
            .caption(&self.title, TITLE_FONT)
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(first..last, 0.0..high)?;

        chart
            .configure_mesh()
            .x_label_style(LABEL_FONT)
            .y_label_style(LABEL_FONT)
            .x_desc(self.column.as_str())
            .y_desc("Fréquence")
            .axis_desc_style(LABEL_FONT)
            .draw()?;

        let bins = || {
            self.counts
                .iter()
                .enumerate()
                .filter(|(_, count)| **count > 0)
                .map(|(bin, count)| [(self.edges[bin], 0.0), (self.edges[bin + 1], *count as f64)])
        };
        chart.draw_series(bins().map(|corners| Rectangle::new(corners, PALETTE[0].filled())))?;
        chart.draw_series(bins().map(|corners| Rectangle::new(corners, BLACK)))?;

        Ok(())
    }

    fn summary_rows(&self) -> Vec<(String, String)> {
        let last = self.counts.len() - 1;
        self.counts
            .iter()
            .enumerate()
            .map(|(bin, count)| {
                let close = if bin == last { ']' } else { ')' };
                let range = format!("[{:.2}, {:.2}{}", self.edges[bin], self.edges[bin + 1], close);
                (range, count.to_string())
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl PieChart {
    pub fn new(title: impl Into<String>, labels: Vec<String>, values: Vec<f64>) -> Result<PieChart, ChartError> {
        let title = title.into();
        if labels.len() != values.len() || values.iter().sum::<f64>() <= 0.0 {
            return Err(ChartError::NoData(title));
        }

        Ok(PieChart { title, labels, values })
    }

    fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

impl RenderChart for PieChart {
    fn title(&self) -> &str {
        &self.title
    }

    fn dimensions(&self) -> (u32, u32) {
        (600, 600)
    }

    /// Slices start at twelve o'clock and run counter-clockwise. The bitmap y
    /// axis points down, so the slices are handed over in reverse.
    fn draw(&self, canvas: &Canvas<'_>) -> Result<(), ChartError> {
        let area = canvas.titled(&self.title, TITLE_FONT)?;
        let (width, height) = area.dim_in_pixel();
        let center = (width as i32 / 2, height as i32 / 2);
        let radius = f64::from(width.min(height)) / 2.0 - 60.0;

        let sizes: Vec<f64> = self.values.iter().rev().map(|value| value.max(0.0)).collect();
        let labels: Vec<&str> = self.labels.iter().rev().map(String::as_str).collect();
        let colors: Vec<RGBColor> = (0..self.values.len())
            .rev()
            .map(|slice| PALETTE[slice % PALETTE.len()])
            .collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(-90.0);
        pie.label_style(LABEL_FONT.into_font().color(&BLACK));
        pie.percentages(LABEL_FONT.into_font().color(&WHITE));
        area.draw(&pie)?;

        Ok(())
    }

    fn summary_rows(&self) -> Vec<(String, String)> {
        let total = self.total();
        self.labels
            .iter()
            .zip(&self.values)
            .map(|(label, value)| (label.clone(), format!("{} ({:.1}%)", value, value / total * 100.0)))
            .collect()
    }
}
