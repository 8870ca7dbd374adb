use anyhow::{bail, Result};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

use super::*;
use crate::table::{Cell, Table};

fn sales() -> Result<Table> {
    let columns = ["produit", "categorie", "prix", "quantite", "ville"];
    Ok(Table::new(
        columns.iter().map(|c| c.to_string()).collect(),
        vec![
            vec!["Stylo".into(), "Fournitures".into(), dec!(1.5).into(), dec!(10).into(), "Paris".into()],
            vec!["Cahier".into(), "Fournitures".into(), dec!(3.0).into(), dec!(5).into(), "Lyon".into()],
            vec!["Souris".into(), "Electronique".into(), dec!(25.0).into(), dec!(2).into(), "Paris".into()],
        ],
    )?)
}

#[test]
fn test_builder_derives_total() -> Result<()> {
    let builder = ChartBuilder::new(&sales()?);
    let totals: Vec<Cell> = builder.table().column("total")?.cloned().collect();

    assert_eq!(totals, vec![Cell::Number(dec!(15)), Cell::Number(dec!(15)), Cell::Number(dec!(50))]);

    Ok(())
}

#[test]
fn test_sales_by_category() -> Result<()> {
    let chart = ChartBuilder::new(&sales()?).plot_sales_by_category()?;

    assert_eq!(chart.title(), "Chiffre d'affaires par catégorie");
    assert_eq!(
        chart.summary_rows(),
        vec![
            ("Electronique".to_string(), "50.00".to_string()),
            ("Fournitures".to_string(), "30.00".to_string())
        ]
    );

    Ok(())
}

#[test]
fn test_top_products_limit() -> Result<()> {
    let chart = ChartBuilder::new(&sales()?).plot_top_products(2)?;

    assert_eq!(chart.dimensions(), (1000, 500));
    let rows = chart.summary_rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, "Souris");

    Ok(())
}

#[test]
fn test_sales_chart_requires_columns() -> Result<()> {
    let table = sales()?.select(&["produit", "prix", "quantite"])?;

    match ChartBuilder::new(&table).plot_sales_by_city() {
        Err(ChartError::MissingColumn(column)) => assert_eq!(column, "ville"),
        Err(err) => bail!("unexpected error: {}", err),
        Ok(_) => bail!("a city chart needs a city column"),
    }

    Ok(())
}

#[test]
fn test_histogram_bins() -> Result<()> {
    let histogram = Histogram::new("quantite", &[1.0, 2.0, 2.0, 3.0, 5.0], 4)?;

    assert_eq!(histogram.edges, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(histogram.counts, vec![1, 2, 1, 1]);

    Ok(())
}

#[test]
fn test_histogram_constant_values() -> Result<()> {
    let histogram = Histogram::new("prix", &[3.0, 3.0], 2)?;

    assert_eq!(histogram.edges, vec![2.5, 3.0, 3.5]);
    assert_eq!(histogram.counts, vec![0, 2]);

    Ok(())
}

#[test]
fn test_histogram_rejects_text_column() -> Result<()> {
    match ChartBuilder::new(&sales()?).plot_histogram("ville", 10) {
        Err(ChartError::NotNumeric(column)) => assert_eq!(column, "ville"),
        _ => bail!("histograms need numbers"),
    }

    Ok(())
}

#[test]
fn test_pie_counts() -> Result<()> {
    let chart = ChartBuilder::new(&sales()?).plot_pie("ville")?;

    assert_eq!(chart.summary_rows()[0], ("Paris".to_string(), "2 (66.7%)".to_string()));

    Ok(())
}

#[test]
fn test_empty_table_has_no_data() -> Result<()> {
    let empty = sales()?.head(0);

    assert!(matches!(ChartBuilder::new(&empty).plot_sales_by_city(), Err(ChartError::NoData(_))));
    assert!(matches!(ChartBuilder::new(&empty).plot_pie("ville"), Err(ChartError::NoData(_))));

    Ok(())
}

#[test]
fn test_chart_saves_png() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let builder = ChartBuilder::new(&sales()?);

    let histogram = dir.path().join("histo.png");
    builder.plot_histogram("prix", 10)?.save_png(&histogram)?;
    assert_eq!(image::image_dimensions(&histogram)?, (800, 500));

    let pie = dir.path().join("nested").join("pie.png");
    builder.plot_pie("categorie")?.save_png(&pie)?;
    assert_eq!(image::image_dimensions(&pie)?, (600, 600));

    Ok(())
}

#[test]
fn test_bar_rendering_fills_plot_area() -> Result<()> {
    let chart: Chart = BarChart::new("test", vec!["a".to_string()], vec![10.0])?.into();
    let frame = chart.render()?;

    let bar = image::Rgb([31, 119, 180]);
    assert!((0..frame.width()).any(|x| *frame.get_pixel(x, 300) == bar));
    assert_eq!(*frame.get_pixel(2, 2), image::Rgb([255, 255, 255]));

    Ok(())
}

#[test]
fn test_title_and_axis_labels_are_drawn() -> Result<()> {
    let labels = vec!["Paris".to_string(), "Lyon".to_string()];
    let other = BarChart::new("Ventes", labels.clone(), vec![65.0, 40.0])?;
    let titled = BarChart::new("Chiffre d'affaires par ville", labels, vec![65.0, 40.0])?;

    let other_frame = Chart::from(other).render()?;
    let titled_frame = Chart::from(titled.clone()).render()?;
    let caption_inked = (0..40)
        .flat_map(|y| (0..800).map(move |x| (x, y)))
        .any(|(x, y)| titled_frame.get_pixel(x, y)[0] < 128);
    assert!(caption_inked);
    assert!(other_frame != titled_frame);

    let labelled_frame = Chart::from(titled.with_axes("Ville", "Chiffre d'affaires")).render()?;
    assert!(labelled_frame != titled_frame);

    Ok(())
}

#[test]
fn test_pie_rendering_is_titled() -> Result<()> {
    let chart = ChartBuilder::new(&sales()?).plot_pie("ville")?;
    let frame = chart.render()?;

    assert_eq!(frame.dimensions(), (600, 600));
    assert!((0..40).flat_map(|y| (0..600).map(move |x| (x, y))).any(|(x, y)| frame.get_pixel(x, y)[0] < 128));
    assert!(frame.pixels().any(|pixel| *pixel == image::Rgb([255, 127, 14])));

    Ok(())
}
