use std::fs;
use std::path::Path;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use salesreport::api::{build_router, AppState};
use salesreport::config::Settings;

const SALES_CSV: &str = "\
date,produit,categorie,prix,quantite,ville,source
2025-01-02,Stylo,Fournitures,1.5,10,Paris,web
2025-01-03,Cahier,Fournitures,3.0,5,Lyon,magasin
2025-01-03,Souris,Electronique,25.0,2,Paris,web
2025-01-04,Souris,Electronique,25.0,,Lyon,magasin
2025-01-04,Souris,Electronique,25.0,,Lyon,magasin
";

struct TestApp {
    dir: TempDir,
    router: Router,
}

impl TestApp {
    fn new() -> Result<TestApp> {
        TestApp::with_settings(|settings| settings)
    }

    fn with_settings(configure: impl FnOnce(Settings) -> Settings) -> Result<TestApp> {
        let dir = tempfile::tempdir()?;
        let defaults = Settings::new(dir.path().join("data"), dir.path().join("reports"), dir.path().join("logs"));
        let settings = configure(defaults);
        settings.ensure_dirs()?;
        fs::write(settings.csv_file(), SALES_CSV)?;

        Ok(TestApp {
            router: build_router(AppState::new(settings)),
            dir,
        })
    }

    fn csv_path(&self) -> String {
        self.dir.path().join("data").join("ventes_2025.csv").display().to_string()
    }

    async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Vec<u8>)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, body.to_vec()))
    }

    async fn get(&self, uri: &str) -> Result<(StatusCode, Value)> {
        let (status, body) = self.send(Request::get(uri).body(Body::empty())?).await?;
        Ok((status, serde_json::from_slice(&body)?))
    }

    async fn post_json(&self, uri: &str, payload: Value) -> Result<(StatusCode, Value)> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))?;
        let (status, body) = self.send(request).await?;
        Ok((status, serde_json::from_slice(&body)?))
    }

    async fn upload(&self, file_name: &str, content: &str) -> Result<(StatusCode, Value)> {
        let boundary = "salesreport-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: text/csv\r\n\r\n{content}\r\n--{boundary}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))?;
        let (status, body) = self.send(request).await?;
        Ok((status, serde_json::from_slice(&body)?))
    }

    async fn load(&self) -> Result<()> {
        let (status, _) = self.post_json("/load", json!({ "csv_path": self.csv_path() })).await?;
        assert_eq!(status, StatusCode::OK);
        Ok(())
    }
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let app = TestApp::new()?;

    assert_eq!(app.get("/health").await?, (StatusCode::OK, json!({ "status": "ok" })));

    Ok(())
}

#[tokio::test]
async fn test_data_endpoints_need_loaded_data() -> Result<()> {
    let app = TestApp::new()?;
    let expected = json!({ "detail": "No data loaded. Use /load or /upload first." });

    for uri in ["/data/preview", "/sales/by-city", "/stats/basic", "/stats/correlation"] {
        assert_eq!(app.get(uri).await?, (StatusCode::BAD_REQUEST, expected.clone()), "{}", uri);
    }
    let (status, _) = app.post_json("/report/pdf", json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_load_missing_file() -> Result<()> {
    let app = TestApp::new()?;

    let (status, body) = app.post_json("/load", json!({ "csv_path": "/nowhere/ventes.csv" })).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "File not found: /nowhere/ventes.csv");

    Ok(())
}

#[tokio::test]
async fn test_load_then_preview() -> Result<()> {
    let app = TestApp::new()?;
    app.load().await?;

    let (status, body) = app.get("/data/preview?limit=2").await?;
    assert_eq!(status, StatusCode::OK);
    // The duplicated last line is dropped and the missing quantity forward-filled.
    assert_eq!(body["rows"], 4);
    assert_eq!(body["columns"], json!(["date", "produit", "categorie", "prix", "quantite", "ville", "source"]));
    assert_eq!(body["preview"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["preview"][0]["produit"], "Stylo");
    assert_eq!(body["preview"][0]["quantite"], 10);

    Ok(())
}

#[tokio::test]
async fn test_sales_endpoints() -> Result<()> {
    let app = TestApp::new()?;
    app.load().await?;

    let (status, by_city) = app.get("/sales/by-city").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_city, json!([{ "ville": "Lyon", "revenu": 65.0 }, { "ville": "Paris", "revenu": 65.0 }]));

    let (_, top) = app.get("/sales/top-products?n=1").await?;
    assert_eq!(top, json!([{ "produit": "Souris", "revenu": 100.0 }]));

    let (_, quantities) = app.get("/sales/quantity-by-product").await?;
    assert_eq!(quantities[0], json!({ "produit": "Stylo", "quantite": 10 }));

    let (_, missing) = app.get("/data/missing").await?;
    assert_eq!(missing.as_array().map(Vec::len), Some(7));

    Ok(())
}

#[tokio::test]
async fn test_stats_endpoints() -> Result<()> {
    let app = TestApp::new()?;
    app.load().await?;

    let (status, stats) = app.get("/stats/basic").await?;
    assert_eq!(status, StatusCode::OK);
    let columns: Vec<&str> = stats["stats"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|row| row["column"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(columns, vec!["prix", "quantite"]);

    let (status, correlation) = app.get("/stats/correlation").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(correlation["columns"], json!(["prix", "quantite"]));
    let diagonal = correlation["matrix"][0][0].as_f64().unwrap_or_default();
    assert!((diagonal - 1.0).abs() < 1e-9);

    Ok(())
}

#[tokio::test]
async fn test_upload_rejects_non_csv() -> Result<()> {
    let app = TestApp::new()?;

    let (status, body) = app.upload("ventes.txt", SALES_CSV).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "The file must be a .csv");

    Ok(())
}

#[tokio::test]
async fn test_upload_stores_and_loads() -> Result<()> {
    let app = TestApp::new()?;

    let (status, body) = app.upload("Mars.CSV", SALES_CSV).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "File uploaded, loaded and processed: Mars.CSV");
    assert!(app.dir.path().join("reports").join("uploads").join("Mars.CSV").is_file());

    let (status, _) = app.get("/data/preview").await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

/// About 3 MB of valid rows, above axum's 2 MB default body limit.
fn large_csv() -> String {
    let mut csv = String::from("date,produit,categorie,prix,quantite,ville,source\n");
    let mut day = 0;
    while csv.len() < 3 * 1024 * 1024 {
        day += 1;
        csv.push_str(&format!("2025-03-{:02},Produit {},Fournitures,2.5,{},Paris,web\n", day % 28 + 1, day, day % 9 + 1));
    }
    csv
}

#[tokio::test]
async fn test_upload_larger_than_default_body_limit() -> Result<()> {
    let app = TestApp::new()?;

    let (status, body) = app.upload("gros.csv", &large_csv()).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (_, preview) = app.get("/data/preview?limit=1").await?;
    assert!(preview["rows"].as_u64().unwrap_or_default() > 50_000);

    Ok(())
}

#[tokio::test]
async fn test_upload_over_configured_limit() -> Result<()> {
    let app = TestApp::with_settings(|settings| settings.with_upload_limit(1024))?;

    let (status, _) = app.upload("gros.csv", &large_csv()).await?;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    Ok(())
}

#[tokio::test]
async fn test_pdf_generation_and_download() -> Result<()> {
    let app = TestApp::new()?;

    let (status, body) = app.get("/report/pdf/download").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "No PDF generated. Call /report/pdf first.");

    app.load().await?;
    let (status, body) = app.post_json("/report/pdf", json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    let pdf_path = body["pdf_path"].as_str().unwrap_or_default().to_string();
    assert!(pdf_path.ends_with("rapport_ventes_api.pdf"));
    assert!(Path::new(&pdf_path).is_file());
    assert!(app.dir.path().join("reports").join("charts").join("top_produits.png").is_file());

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/report/pdf/download").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    assert!(bytes.starts_with(b"%PDF"));

    Ok(())
}
