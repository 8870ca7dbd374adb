use crate::charts::{Chart, RenderChart};

use super::REPORT_TITLE;

pub(super) const HISTOGRAM_FILE: &str = "hist_quantite.png";
pub(super) const CATEGORY_FILE: &str = "bar_categorie.png";

pub(super) fn render(histogram: &Chart, by_category: &Chart) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n</head>\n<body>\n", escape(REPORT_TITLE)));
    html.push_str(&format!("<h1>{}</h1>\n", escape(REPORT_TITLE)));

    section(&mut html, "Histogramme Quantité", HISTOGRAM_FILE, histogram);
    section(&mut html, "Total ventes par catégorie", CATEGORY_FILE, by_category);

    html.push_str("</body>\n</html>\n");
    html
}

fn section(html: &mut String, heading: &str, image: &str, chart: &Chart) {
    html.push_str(&format!("<h2>{}</h2>\n", escape(heading)));
    html.push_str(&format!("<img src=\"{}\" alt=\"{}\" width=\"600\">\n", image, escape(chart.title())));
    html.push_str("<table>\n");
    for (label, value) in chart.summary_rows() {
        html.push_str(&format!("<tr><td>{}</td><td>{}</td></tr>\n", escape(&label), escape(&value)));
    }
    html.push_str("</table>\n");
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
