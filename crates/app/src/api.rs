use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use rulebook_qa_core::{PipelineError, RulebookService};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Uploads carry whole rulebook PDFs, so the default 2 MB body cap is far
/// too small.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub type SharedService = Arc<RulebookService>;

pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/upload", post(upload))
        .route("/ask", post(ask))
        .route("/end", delete(end))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

fn upload_error(error: PipelineError) -> ApiError {
    match error {
        PipelineError::InvalidFileType(_) => {
            ApiError::new(StatusCode::BAD_REQUEST, "Only PDF files are allowed")
        }
        other => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to store documents: {other}"),
        ),
    }
}

fn ask_error(error: PipelineError) -> ApiError {
    match error {
        PipelineError::SessionNotFound(_) => {
            ApiError::new(StatusCode::NOT_FOUND, "Session not found")
        }
        other => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to answer question: {other}"),
        ),
    }
}

fn end_error(error: PipelineError) -> ApiError {
    match error {
        PipelineError::SessionNotFound(_) => {
            ApiError::new(StatusCode::NOT_FOUND, "Session not found")
        }
        other => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to end session: {other}"),
        ),
    }
}

async fn status() -> Json<serde_json::Value> {
    Json(json!({ "message": "Backend is running" }))
}

#[derive(Serialize)]
struct UploadResponse {
    session_id: String,
    collection_name: String,
    message: String,
}

async fn upload(
    State(service): State<SharedService>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut game_name: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|error| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("invalid multipart body: {error}"),
        )
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().map(str::to_string).ok_or_else(|| {
                    ApiError::new(StatusCode::BAD_REQUEST, "file field has no filename")
                })?;
                let bytes = field.bytes().await.map_err(|error| {
                    ApiError::new(
                        StatusCode::BAD_REQUEST,
                        format!("failed to read file field: {error}"),
                    )
                })?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("game_name") => {
                let value = field.text().await.map_err(|error| {
                    ApiError::new(
                        StatusCode::BAD_REQUEST,
                        format!("failed to read game_name field: {error}"),
                    )
                })?;
                game_name = Some(value);
            }
            _ => {}
        }
    }

    let (filename, bytes) =
        file.ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "missing file field"))?;
    let game_name = game_name
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "missing game_name field"))?;

    let outcome = service
        .upload(&filename, &bytes, &game_name)
        .await
        .map_err(upload_error)?;

    Ok(Json(UploadResponse {
        message: format!(
            "Successfully uploaded and processed {} chunks.",
            outcome.chunk_count
        ),
        session_id: outcome.session_id,
        collection_name: outcome.collection_name,
    }))
}

#[derive(Deserialize)]
struct AskRequest {
    session_id: String,
    question: String,
}

#[derive(Serialize)]
struct SourceRef {
    page: u32,
    source: String,
    text: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    sources: Vec<SourceRef>,
}

async fn ask(
    State(service): State<SharedService>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let outcome = service
        .ask(&request.session_id, &request.question)
        .await
        .map_err(ask_error)?;

    Ok(Json(AskResponse {
        answer: outcome.answer,
        sources: outcome
            .sources
            .into_iter()
            .map(|chunk| SourceRef {
                page: chunk.page,
                source: chunk.source,
                text: chunk.text,
            })
            .collect(),
    }))
}

#[derive(Deserialize)]
struct EndRequest {
    session_id: String,
}

async fn end(
    State(service): State<SharedService>,
    Json(request): Json<EndRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    service.end(&request.session_id).await.map_err(end_error)?;
    Ok(Json(
        json!({ "message": "Session ended and resources released" }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use rulebook_qa_core::{
        AnswerModel, Embedder, EmbedError, LlmError, MemoryVectorIndex,
    };
    use tempfile::tempdir;
    use tower::ServiceExt;

    struct StubEmbedder;

    impl Embedder for StubEmbedder {
        fn dimensions(&self) -> usize {
            4
        }

        fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0, 0.0]).collect())
        }

        fn embed_query(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
            Ok(vec![1.0, 0.0, 0.0, 0.0])
        }
    }

    struct StubModel;

    #[async_trait]
    impl AnswerModel for StubModel {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Ok("You roll two dice.".to_string())
        }
    }

    fn test_router(upload_dir: &std::path::Path) -> Router {
        let service = RulebookService::new(
            Arc::new(StubEmbedder),
            Arc::new(MemoryVectorIndex::new()),
            Arc::new(StubModel),
            upload_dir,
        );
        router(Arc::new(service))
    }

    async fn body_string(response: Response) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read response body")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    fn multipart_upload(filename: &str, game_name: &str) -> Request<Body> {
        let boundary = "rulebook-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             not a real pdf\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"game_name\"\r\n\r\n\
             {game_name}\r\n\
             --{boundary}--\r\n"
        );

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("build request")
    }

    #[tokio::test]
    async fn liveness_check_reports_running() {
        let dir = tempdir().expect("tempdir");
        let response = test_router(dir.path())
            .oneshot(Request::get("/").body(Body::empty()).expect("build request"))
            .await
            .expect("router call");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("Backend is running"));
    }

    #[tokio::test]
    async fn non_pdf_upload_is_a_400() {
        let dir = tempdir().expect("tempdir");
        let response = test_router(dir.path())
            .oneshot(multipart_upload("rules.txt", "Chess"))
            .await
            .expect("router call");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response)
            .await
            .contains("Only PDF files are allowed"));
    }

    #[tokio::test]
    async fn upload_without_game_name_is_a_400() {
        let dir = tempdir().expect("tempdir");
        let boundary = "rulebook-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"dice.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n\
             %PDF-1.4\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("build request");

        let response = test_router(dir.path())
            .oneshot(request)
            .await
            .expect("router call");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("game_name"));
    }

    #[tokio::test]
    async fn asking_an_unknown_session_is_a_404() {
        let dir = tempdir().expect("tempdir");
        let request = Request::builder()
            .method("POST")
            .uri("/ask")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "session_id": "never-issued", "question": "How many dice?" }).to_string(),
            ))
            .expect("build request");

        let response = test_router(dir.path())
            .oneshot(request)
            .await
            .expect("router call");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("Session not found"));
    }

    #[tokio::test]
    async fn ending_an_unknown_session_is_a_404() {
        let dir = tempdir().expect("tempdir");
        let request = Request::builder()
            .method("DELETE")
            .uri("/end")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "session_id": "never-issued" }).to_string(),
            ))
            .expect("build request");

        let response = test_router(dir.path())
            .oneshot(request)
            .await
            .expect("router call");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("Session not found"));
    }
}
