use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRequest, FromRequestParts, Multipart, Path, Query, State},
    http::header,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    config::AppConfig,
    dashboard::{
        DataPoint, Dataset, Metric, MetricSummary, Operation, Overview, Selection, TextStats,
        series::parse_categories,
        stats::{overview, summarize_points},
        tools,
    },
    error::{DashboardError, ServiceError},
    generation::{EventLog, PrdGenerator},
};

const INDEX_HTML: &str = include_str!("index.html");

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub generator: PrdGenerator,
    pub dataset: Arc<Dataset>,
}

pub fn build_router(
    config: Arc<AppConfig>,
    generator: PrdGenerator,
    dataset: Arc<Dataset>,
) -> Router {
    // two uploads plus multipart framing
    let body_limit = config
        .max_upload_bytes
        .saturating_mul(2)
        .saturating_add(64 * 1024);

    let state = AppState {
        config,
        generator,
        dataset,
    };

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/dashboard/overview", get(dashboard_overview))
        .route("/api/dashboard/series", get(dashboard_series))
        .route("/api/dashboard/summary", get(dashboard_summary))
        .route("/api/tools/calculate", post(calculate))
        .route("/api/tools/random", post(random_numbers))
        .route("/api/tools/text-analysis", post(text_analysis))
        .route("/api/prd/status", get(prd_status))
        .route("/api/prd/generate", post(generate_prd))
        .route("/api/prd/download/:file_name", get(download_prd))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> &'static str {
    "ok"
}

/// `Json` body whose rejection renders as a [`ServiceError`].
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ServiceError))]
struct ApiJson<T>(T);

/// `Query` whose rejection renders as a [`ServiceError`].
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ServiceError))]
struct ApiQuery<T>(T);

#[derive(Debug, Default, Deserialize)]
struct SelectionQuery {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    /// Comma separated, e.g. `A,C`.
    categories: Option<String>,
}

impl SelectionQuery {
    fn into_selection(self) -> Result<Selection, ServiceError> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(DashboardError::InvalidRange { start, end }.into());
            }
        }
        let categories = self
            .categories
            .as_deref()
            .map(parse_categories)
            .transpose()?;
        Ok(Selection {
            start: self.start,
            end: self.end,
            categories,
        })
    }
}

#[derive(Serialize)]
struct SeriesResponse {
    seed: u64,
    points: Vec<DataPoint>,
}

#[derive(Serialize)]
struct SummaryResponse {
    count: usize,
    metrics: std::collections::BTreeMap<Metric, MetricSummary>,
}

async fn dashboard_overview(State(state): State<AppState>) -> Json<Overview> {
    let points = state.dataset.select(&Selection::default());
    Json(overview(&points))
}

async fn dashboard_series(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SelectionQuery>,
) -> Result<Json<SeriesResponse>, ServiceError> {
    let selection = query.into_selection()?;
    let points = state
        .dataset
        .select(&selection)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(SeriesResponse {
        seed: state.dataset.seed(),
        points,
    }))
}

async fn dashboard_summary(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SelectionQuery>,
) -> Result<Json<SummaryResponse>, ServiceError> {
    let selection = query.into_selection()?;
    let points = state.dataset.select(&selection);
    Ok(Json(SummaryResponse {
        count: points.len(),
        metrics: summarize_points(&points),
    }))
}

#[derive(Deserialize)]
struct CalculateRequest {
    a: f64,
    b: f64,
    operation: Operation,
}

#[derive(Serialize)]
struct CalculateResponse {
    result: f64,
}

async fn calculate(
    ApiJson(request): ApiJson<CalculateRequest>,
) -> Result<Json<CalculateResponse>, ServiceError> {
    let result = tools::calculate(request.a, request.b, request.operation)?;
    Ok(Json(CalculateResponse { result }))
}

#[derive(Deserialize)]
struct RandomRequest {
    min: i64,
    max: i64,
    count: usize,
}

#[derive(Serialize)]
struct RandomResponse {
    numbers: Vec<i64>,
}

async fn random_numbers(
    ApiJson(request): ApiJson<RandomRequest>,
) -> Result<Json<RandomResponse>, ServiceError> {
    let numbers = tools::random_numbers(&mut rand::rng(), request.min, request.max, request.count)?;
    Ok(Json(RandomResponse { numbers }))
}

#[derive(Deserialize)]
struct TextRequest {
    text: String,
}

async fn text_analysis(ApiJson(request): ApiJson<TextRequest>) -> Json<TextStats> {
    Json(tools::analyze_text(&request.text))
}

#[derive(Serialize)]
struct StatusResponse {
    api_key_configured: bool,
    provider: String,
    model: String,
}

async fn prd_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let provider = state.generator.provider();
    Json(StatusResponse {
        api_key_configured: provider.has_credential(),
        provider: provider.provider_name().to_string(),
        model: state.generator.settings().model.clone(),
    })
}

#[derive(Serialize)]
struct GenerateResponse {
    file_name: String,
    content: String,
    generated_at: DateTime<Local>,
    attempts: u32,
}

async fn generate_prd(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<GenerateResponse>, ServiceError> {
    let uploads = tempfile::Builder::new().prefix("prd-upload-").tempdir()?;
    let mut context = None;
    let mut transcript = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let slot = match name.as_str() {
            "context" => &mut context,
            "transcript" => &mut transcript,
            _ => continue,
        };
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServiceError::BadRequest(e.to_string()))?;
        validate_upload(
            &name,
            &file_name,
            bytes.len(),
            state.config.max_upload_bytes,
        )?;

        let path = uploads.path().join(format!("{name}.docx"));
        tokio::fs::write(&path, &bytes).await?;
        *slot = Some(path);
    }

    let context = context.ok_or_else(|| ServiceError::BadRequest("missing context file".into()))?;
    let transcript =
        transcript.ok_or_else(|| ServiceError::BadRequest("missing transcript file".into()))?;

    let file_name = output_file_name(Local::now());
    let output_path = state.config.output_dir.join(&file_name);
    info!(%file_name, "generating PRD");

    let log = Arc::new(EventLog::default());
    let result = state
        .generator
        .with_observer(log.clone())
        .generate(&context, &transcript, &output_path)
        .await?;

    Ok(Json(GenerateResponse {
        file_name,
        content: result.content,
        generated_at: result.generated_at,
        attempts: log.attempts(),
    }))
}

fn validate_upload(
    field: &str,
    file_name: &str,
    size: usize,
    max_bytes: usize,
) -> Result<(), ServiceError> {
    if !file_name.to_ascii_lowercase().ends_with(".docx") {
        return Err(ServiceError::BadRequest(format!(
            "invalid {field} file: expected a .docx upload, got {file_name:?}"
        )));
    }
    if size > max_bytes {
        return Err(ServiceError::BadRequest(format!(
            "invalid {field} file: {size} bytes exceeds the {max_bytes} byte limit"
        )));
    }
    Ok(())
}

fn output_file_name(now: DateTime<Local>) -> String {
    format!(
        "generated_prd_{}_{:04x}.md",
        now.format("%Y-%m-%d_%H-%M-%S-%3f"),
        rand::random::<u16>()
    )
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum DownloadFormat {
    #[default]
    Markdown,
    Text,
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    #[serde(default)]
    format: DownloadFormat,
}

async fn download_prd(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
    ApiQuery(query): ApiQuery<DownloadQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    if !is_generated_file_name(&file_name) {
        return Err(ServiceError::BadRequest(format!(
            "invalid file name {file_name:?}"
        )));
    }

    let path = state.config.output_dir.join(&file_name);
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ServiceError::NotFound(file_name));
        }
        Err(e) => return Err(e.into()),
    };

    let (mime, download_name) = match query.format {
        DownloadFormat::Markdown => ("text/markdown; charset=utf-8", file_name),
        DownloadFormat::Text => (
            "text/plain; charset=utf-8",
            format!("{}.txt", file_name.trim_end_matches(".md")),
        ),
    };

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{download_name}\""),
            ),
        ],
        content,
    ))
}

/// A bare `.md` file name with no directory components.
fn is_generated_file_name(name: &str) -> bool {
    let as_path = std::path::Path::new(name);
    name.ends_with(".md")
        && !name.starts_with('.')
        && as_path.file_name().and_then(|n| n.to_str()) == Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_validation() {
        assert!(validate_upload("context", "Template.DOCX", 10, 100).is_ok());
        assert!(validate_upload("context", "template.pdf", 10, 100).is_err());
        assert!(validate_upload("transcript", "notes.docx", 101, 100).is_err());
        assert!(validate_upload("transcript", "", 1, 100).is_err());
    }

    #[test]
    fn generated_file_names_are_plain() {
        assert!(is_generated_file_name(
            "generated_prd_2024-01-01_10-00-00-000_0a1b.md"
        ));
        assert!(!is_generated_file_name("../secret.md"));
        assert!(!is_generated_file_name("nested/file.md"));
        assert!(!is_generated_file_name(".hidden.md"));
        assert!(!is_generated_file_name("notes.txt"));
    }

    #[test]
    fn output_names_are_markdown_and_timestamped() {
        let now = Local::now();
        let name = output_file_name(now);
        assert!(name.starts_with("generated_prd_"));
        assert!(is_generated_file_name(&name));
        assert!(name.contains(&now.format("%Y-%m-%d").to_string()));
    }
}
