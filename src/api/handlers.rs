use std::fs;
use std::path::{Path, PathBuf};

use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{ApiError, Result};
use super::state::AppState;
use crate::loader::CsvLoader;
use crate::pipeline::{prepare, render_standard_charts, PipelineState};
use crate::processing::{ColumnStats, DataAggregator, StatisticsCalculator};
use crate::report::ReportGenerator;
use crate::table::Table;

pub const API_PDF_NAME: &str = "rapport_ventes_api.pdf";

type Records = Vec<Map<String, Value>>;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    pub csv_path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub rows: usize,
    pub columns: Vec<String>,
    pub preview: Records,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: Vec<ColumnStats>,
}

#[derive(Debug, Serialize)]
pub struct CorrelationResponse {
    pub columns: Vec<String>,
    pub matrix: Vec<Vec<Option<f64>>>,
    pub revenue_quantity: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportResponse {
    pub pdf_path: String,
}

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TopParams {
    pub n: Option<usize>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".to_string() })
}

/// Loads a CSV already present on the server.
pub async fn load_csv(State(state): State<AppState>, Json(request): Json<LoadRequest>) -> Result<Json<MessageResponse>> {
    let path = PathBuf::from(&request.csv_path);
    if !path.exists() {
        return Err(ApiError::NotFound(format!("File not found: {}", request.csv_path)));
    }

    let pipeline = blocking(move || load_and_prepare(&path)).await?;
    info!("loaded {} ({} clean rows)", request.csv_path, pipeline.clean.len());
    state.replace(pipeline).await;

    Ok(Json(MessageResponse {
        message: format!("CSV loaded and processed: {}", request.csv_path),
    }))
}

/// Stores the multipart `file` field under the uploads directory, then loads it.
pub async fn upload_csv(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<MessageResponse>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .and_then(|name| Path::new(name).file_name())
            .and_then(|name| name.to_str())
            .filter(|name| name.to_lowercase().ends_with(".csv"))
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("The file must be a .csv".to_string()))?;
        let bytes = field.bytes().await?;

        let uploads = state.settings.uploads_dir();
        let target = uploads.join(&file_name);
        let pipeline = blocking(move || {
            fs::create_dir_all(&uploads)?;
            fs::write(&target, &bytes)?;
            load_and_prepare(&target)
        })
        .await?;
        info!("uploaded {} ({} clean rows)", file_name, pipeline.clean.len());
        state.replace(pipeline).await;

        return Ok(Json(MessageResponse {
            message: format!("File uploaded, loaded and processed: {}", file_name),
        }));
    }

    Err(ApiError::BadRequest("missing multipart field 'file'".to_string()))
}

pub async fn preview(State(state): State<AppState>, Query(params): Query<PreviewParams>) -> Result<Json<PreviewResponse>> {
    let data = state.require_data().await?;
    let clean = &data.clean;

    Ok(Json(PreviewResponse {
        rows: clean.len(),
        columns: clean.columns().clone(),
        preview: clean.head(params.limit.unwrap_or(5)).to_records(),
    }))
}

pub async fn missing_values(State(state): State<AppState>) -> Result<Json<Records>> {
    on_clean(&state, |table| Ok(DataAggregator::new(table).missing_value_rate()?.to_records())).await
}

pub async fn sales_by_category(State(state): State<AppState>) -> Result<Json<Records>> {
    on_clean(&state, |table| Ok(DataAggregator::new(table).sales_by_category_and_source()?.to_records())).await
}

pub async fn sales_by_city(State(state): State<AppState>) -> Result<Json<Records>> {
    on_clean(&state, |table| Ok(DataAggregator::new(table).revenue_by_city()?.to_records())).await
}

pub async fn top_products(State(state): State<AppState>, Query(params): Query<TopParams>) -> Result<Json<Records>> {
    let n = params.n.unwrap_or(10);
    on_clean(&state, move |table| Ok(DataAggregator::new(table).top_products_by_revenue(n)?.to_records())).await
}

pub async fn quantity_by_product(State(state): State<AppState>) -> Result<Json<Records>> {
    on_clean(&state, |table| Ok(DataAggregator::new(table).total_quantity_by_product()?.to_records())).await
}

pub async fn basic_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    on_clean(&state, |table| {
        Ok(StatsResponse {
            stats: StatisticsCalculator::new(table).basic_stats(),
        })
    })
    .await
}

pub async fn correlation(State(state): State<AppState>) -> Result<Json<CorrelationResponse>> {
    on_clean(&state, |table| {
        let calculator = StatisticsCalculator::new(table);
        let matrix = calculator.correlation_matrix();

        Ok(CorrelationResponse {
            columns: matrix.columns,
            matrix: matrix.values,
            revenue_quantity: calculator.revenue_quantity_correlation(),
        })
    })
    .await
}

/// Renders the standard charts and the API copy of the PDF report.
pub async fn generate_pdf(State(state): State<AppState>) -> Result<Json<ReportResponse>> {
    let report_dir = state.settings.report_dir().clone();
    let charts_dir = state.settings.charts_dir();

    let Json(pdf_path) = on_clean(&state, move |table| {
        render_standard_charts(table, &charts_dir)?;
        Ok(ReportGenerator::new(table, &report_dir)?.generate_pdf_report(API_PDF_NAME, Some(&charts_dir))?)
    })
    .await?;

    Ok(Json(ReportResponse {
        pdf_path: pdf_path.display().to_string(),
    }))
}

pub async fn download_pdf(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let pdf_path = state.settings.report_dir().join(API_PDF_NAME);
    let bytes = match tokio::fs::read(&pdf_path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("No PDF generated. Call /report/pdf first.".to_string()));
        },
        Err(err) => return Err(err.into()),
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", API_PDF_NAME)),
        ],
        bytes,
    ))
}

fn load_and_prepare(path: &Path) -> Result<PipelineState> {
    let raw = CsvLoader::new(path).load()?;
    Ok(prepare(raw)?)
}

async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
}

/// Runs `task` against the loaded clean table on the blocking pool.
async fn on_clean<T, F>(state: &AppState, task: F) -> Result<Json<T>>
where
    F: FnOnce(&Table) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let data = state.require_data().await?;
    let value = blocking(move || task(&data.clean)).await?;
    Ok(Json(value))
}
