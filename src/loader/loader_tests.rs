use std::collections::HashMap;
use std::io::Write;

use anyhow::{bail, Result};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

use super::*;
use crate::table::{Cell, ColumnType, Table};

const SALES: &str = "date,produit,categorie,prix,quantite,ville,source
2025-01-01,Stylo,Fournitures,1.5,10,Paris,web
2025-01-01,Cahier,Fournitures,3.0,5,Lyon,magasin
";

#[test]
fn test_csv_loader_load_ok() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(SALES.as_bytes())?;

    let table = CsvLoader::new(file.path()).load()?;

    assert_eq!(table.len(), 2);
    assert_eq!(
        table.columns(),
        &vec!["date", "produit", "categorie", "prix", "quantite", "ville", "source"]
    );
    assert_eq!(table.column_type("prix")?, ColumnType::Number);
    assert_eq!(table.column_type("date")?, ColumnType::Text);
    assert_eq!(table.rows()[0][3], Cell::Number(dec!(1.5)));

    Ok(())
}

#[test]
fn test_csv_loader_missing_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    match CsvLoader::new(dir.path().join("missing.csv")).load() {
        Err(LoadError::Io { .. }) => Ok(()),
        Err(err) => bail!("unexpected error: {}", err),
        Ok(_) => bail!("loading a missing file should fail"),
    }
}

#[test]
fn test_csv_loader_empty_input() {
    let result = CsvLoader::new("unused.csv").read_from("".as_bytes());
    assert!(matches!(result, Err(LoadError::Empty)));
}

#[test]
fn test_csv_loader_rejects_unequal_records() {
    let result = CsvLoader::new("unused.csv").read_from("a,b\n1,2\n3\n".as_bytes());
    assert!(matches!(result, Err(LoadError::Csv(_))));
}

#[test]
fn test_csv_loader_null_markers_and_mixed_columns() -> Result<()> {
    let input = "code;quantite\n12;NA\nA7;3\n;4\n";
    let table = CsvLoader::new("unused.csv").with_separator(b';').read_from(input.as_bytes())?;

    assert_eq!(table.column_type("code")?, ColumnType::Text);
    assert_eq!(table.rows()[0], vec![Cell::from("12"), Cell::Null]);
    assert_eq!(table.rows()[2], vec![Cell::Null, Cell::Number(dec!(4))]);

    Ok(())
}

fn columns() -> Vec<String> {
    ["date", "produit", "prix", "quantite"].iter().map(|c| c.to_string()).collect()
}

#[test]
fn test_data_validator_drops_duplicates_and_fills_na() -> Result<()> {
    let table = Table::new(
        columns(),
        vec![
            vec!["2025-01-01".into(), "Stylo".into(), dec!(1.5).into(), dec!(10).into()],
            vec!["2025-01-01".into(), "Stylo".into(), dec!(1.5).into(), dec!(10).into()],
            vec!["2025-01-02".into(), "Souris".into(), dec!(25.0).into(), Cell::Null],
        ],
    )?;

    let validated = DataValidator::new(&table).validate(None)?;

    assert_eq!(validated.len(), 2);
    assert_eq!(validated.column("quantite")?.filter(|cell| cell.is_null()).count(), 0);
    assert_eq!(validated.rows()[1][3], Cell::Number(dec!(10)));

    Ok(())
}

#[test]
fn test_data_validator_coerces_types() -> Result<()> {
    let table = Table::new(
        columns(),
        vec![vec!["2025-01-01".into(), "Stylo".into(), "1.5".into(), dec!(10).into()]],
    )?;

    let expected = HashMap::from([
        ("prix".to_string(), ColumnType::Number),
        ("quantite".to_string(), ColumnType::Text),
        ("inconnue".to_string(), ColumnType::Number),
    ]);
    let validated = DataValidator::new(&table).validate(Some(&expected))?;

    assert_eq!(validated.rows()[0][2], Cell::Number(dec!(1.5)));
    assert_eq!(validated.rows()[0][3], Cell::from("10"));

    Ok(())
}

#[test]
fn test_data_validator_reports_bad_coercion() -> Result<()> {
    let table = Table::new(columns(), vec![vec!["2025-01-01".into(), "Stylo".into(), "gratuit".into(), dec!(1).into()]])?;
    let expected = HashMap::from([("prix".to_string(), ColumnType::Number)]);

    if let Err(err) = DataValidator::new(&table).validate(Some(&expected)) {
        assert_eq!(
            err,
            crate::table::TableError::TypeCoercion {
                column: "prix".to_string(),
                value: "gratuit".to_string()
            }
        );
    } else {
        bail!("non numeric prices should not be coerced");
    }

    Ok(())
}
