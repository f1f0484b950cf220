//! HTTP server exposing ingestion, job status and retrieval.

pub mod error;
pub mod routes;
pub mod state;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Build the full application router.
pub fn router(state: AppState, max_upload_size: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .merge(routes::api_routes(max_upload_size))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serve until ctrl-c, then stop the pipeline.
pub async fn serve(state: AppState, addr: &str, max_upload_size: usize) -> anyhow::Result<()> {
    let app = router(state.clone(), max_upload_size);

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down ingestion pipeline");
    state.pipeline().shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn index() -> Json<Value> {
    Json(json!({
        "name": "vox",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "POST /upload",
            "GET /status/:job_id",
            "GET /jobs",
            "GET /documents",
            "POST /search",
            "POST /ask",
        ],
    }))
}

async fn health() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use vox_config::{Config, WindowConfig};
    use vox_ingest::testing::{EchoGenerator, HashingEmbedder, ScriptedExtractor};
    use vox_ingest::{
        AnswerService, AskSettings, ChunkConfig, Chunker, IngestPipeline, PipelineSettings,
        RetrievalEngine,
    };

    const BOUNDARY: &str = "voxtestboundary";
    const PRICING: &str = "Q: pricing is too high. A: we plan to lower prices.";

    fn test_app() -> Router {
        let chunker = Chunker::new(ChunkConfig {
            short: WindowConfig::words(10, 2),
            long: WindowConfig::words(40, 5),
        })
        .unwrap();
        let extractor = ScriptedExtractor::new().with_delay(Duration::from_millis(500));
        let pipeline = IngestPipeline::new(
            Arc::new(extractor),
            Arc::new(HashingEmbedder::new(1024)),
            chunker,
            PipelineSettings::default(),
        );
        let retrieval = RetrievalEngine::new(pipeline.embedder().clone(), pipeline.index().clone());
        let answers = AnswerService::new(
            retrieval,
            Arc::new(EchoGenerator::new()),
            AskSettings::default(),
        );
        let state = AppState::new(pipeline, answers, &Config::default());
        router(state, 1024 * 1024)
    }

    fn multipart(fields: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, filename, value) in fields {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            match filename {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    name, f
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn upload(app: &Router, filename: &str, content: &str) -> Value {
        let (status, body) = send(app, multipart(&[("file", Some(filename), content)])).await;
        assert_eq!(status, StatusCode::ACCEPTED, "{}", body);
        body
    }

    async fn wait_done(app: &Router, job_id: &str) -> Value {
        for _ in 0..500 {
            let (status, body) = send(app, empty_request("GET", &format!("/status/{}", job_id))).await;
            assert_eq!(status, StatusCode::OK);
            if body["done"] == true {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} never finished", job_id);
    }

    #[tokio::test]
    async fn test_health_and_index() {
        let app = test_app();

        let response = app.clone().oneshot(empty_request("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"OK");

        let (status, body) = send(&app, empty_request("GET", "/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "vox");
    }

    #[tokio::test]
    async fn test_upload_then_search_and_ask() {
        let app = test_app();

        let accepted = upload(&app, "interview.txt", PRICING).await;
        let job_id = accepted["job_id"].as_str().unwrap().to_string();
        assert_eq!(accepted["status_url"], format!("/status/{}", job_id));

        let status = wait_done(&app, &job_id).await;
        assert_eq!(status["stage"], "ready");
        assert_eq!(status["progress"], 1.0);
        assert_eq!(status["current"], true);
        assert!(status["error"].is_null());

        let (code, body) = send(
            &app,
            json_request("POST", "/search", json!({"query": "pricing", "top_k": 2})),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0]["chunk"]["text"]
            .as_str()
            .unwrap()
            .contains("pricing"));

        let (code, body) = send(
            &app,
            json_request("POST", "/ask", json!({"question": "what about pricing?", "mode": "qa"})),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["mode"], "qa");
        assert!(body["answer"].as_str().unwrap().starts_with("what about pricing?"));
        assert!(!body["retrieved_chunks"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_upload_is_reported() {
        let app = test_app();

        let first = upload(&app, "interview.txt", PRICING).await;
        assert!(first.get("duplicates").is_none());

        let second = upload(&app, "copy.txt", PRICING).await;
        assert_eq!(second["duplicates"], json!([first["document_id"]]));
        assert_ne!(second["document_id"], first["document_id"]);
    }

    #[tokio::test]
    async fn test_ask_before_ingestion_is_degraded() {
        let app = test_app();

        let (code, body) = send(
            &app,
            json_request("POST", "/ask", json!({"question": "anything?"})),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
        assert!(body["answer"].is_null());
        assert!(body["degraded_reason"].is_string());
    }

    #[tokio::test]
    async fn test_failed_job_reports_error() {
        let app = test_app();

        let accepted = upload(&app, "broken.txt", "!fail header is unreadable").await;
        let status = wait_done(&app, accepted["job_id"].as_str().unwrap()).await;

        assert_eq!(status["stage"], "failed");
        assert!(status["error"]
            .as_str()
            .unwrap()
            .contains("header is unreadable"));
        assert_eq!(status["error_kind"], "extraction");
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let app = test_app();

        let (code, body) = send(&app, multipart(&[("kind", None, "document")])).await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "bad_request");

        let (code, body) = send(&app, multipart(&[("file", Some("photo.png"), "pixels")])).await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "unsupported_type");

        let (code, _) = send(
            &app,
            multipart(&[("file", Some("notes.txt"), "hello"), ("kind", None, "spreadsheet")]),
        )
        .await;
        assert_eq!(code, StatusCode::BAD_REQUEST);

        for top_k in [0, -2] {
            let (code, _) = send(
                &app,
                json_request("POST", "/search", json!({"query": "pricing", "top_k": top_k})),
            )
            .await;
            assert_eq!(code, StatusCode::BAD_REQUEST);
        }

        let (code, _) = send(
            &app,
            json_request("POST", "/ask", json!({"question": "q", "mode": "poem"})),
        )
        .await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_not_found() {
        let app = test_app();

        let (code, body) = send(&app, empty_request("GET", "/status/nope")).await;
        assert_eq!(code, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "not_found");

        let (code, _) = send(&app, empty_request("DELETE", "/documents/nope")).await;
        assert_eq!(code, StatusCode::NOT_FOUND);

        let (code, _) = send(&app, empty_request("POST", "/documents/nope/reingest")).await;
        assert_eq!(code, StatusCode::NOT_FOUND);

        let (code, _) = send(
            &app,
            multipart(&[("file", Some("notes.txt"), "hello"), ("document_id", None, "nope")]),
        )
        .await;
        assert_eq!(code, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reupload_replaces_document() {
        let app = test_app();

        let first = upload(&app, "interview.txt", PRICING).await;
        let first_job = first["job_id"].as_str().unwrap().to_string();
        let document_id = first["document_id"].as_str().unwrap().to_string();
        wait_done(&app, &first_job).await;

        let (code, second) = send(
            &app,
            multipart(&[
                ("file", Some("interview.txt"), "Shipping takes two weeks."),
                ("document_id", None, &document_id),
            ]),
        )
        .await;
        assert_eq!(code, StatusCode::ACCEPTED);
        assert_eq!(second["document_id"], document_id.as_str());
        let status = wait_done(&app, second["job_id"].as_str().unwrap()).await;
        assert_eq!(status["stage"], "ready");

        let (_, old) = send(&app, empty_request("GET", &format!("/status/{}", first_job))).await;
        assert_eq!(old["current"], false);

        let (_, body) = send(
            &app,
            json_request("POST", "/search", json!({"query": "pricing", "top_k": 10})),
        )
        .await;
        for result in body["results"].as_array().unwrap() {
            assert!(!result["chunk"]["text"].as_str().unwrap().contains("pricing"));
        }

        let (code, current) = send(
            &app,
            empty_request("GET", &format!("/documents/{}/status", document_id)),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(current["job_id"], second["job_id"]);
    }

    #[tokio::test]
    async fn test_clear_active_job_conflicts() {
        let app = test_app();

        let accepted = upload(&app, "slow.txt", "!slow eventually some text").await;
        let job_id = accepted["job_id"].as_str().unwrap().to_string();

        let (code, body) = send(&app, empty_request("DELETE", &format!("/jobs/{}", job_id))).await;
        assert_eq!(code, StatusCode::CONFLICT);
        assert_eq!(body["error"]["type"], "job_active");

        wait_done(&app, &job_id).await;
        let (code, _) = send(&app, empty_request("DELETE", &format!("/jobs/{}", job_id))).await;
        assert_eq!(code, StatusCode::OK);

        let (code, _) = send(&app, empty_request("GET", &format!("/status/{}", job_id))).await;
        assert_eq!(code, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_and_reingest_document() {
        let app = test_app();

        let accepted = upload(&app, "interview.txt", PRICING).await;
        let document_id = accepted["document_id"].as_str().unwrap().to_string();
        wait_done(&app, accepted["job_id"].as_str().unwrap()).await;

        let (code, again) = send(
            &app,
            empty_request("POST", &format!("/documents/{}/reingest", document_id)),
        )
        .await;
        assert_eq!(code, StatusCode::ACCEPTED);
        wait_done(&app, again["job_id"].as_str().unwrap()).await;

        let (_, listing) = send(&app, empty_request("GET", "/documents")).await;
        assert_eq!(listing["documents"].as_array().unwrap().len(), 1);
        assert_eq!(listing["documents"][0]["id"], document_id.as_str());
        assert_eq!(listing["documents"][0]["filename"], "interview.txt");
        assert_eq!(listing["documents"][0]["indexed_chunks"], 3);
        assert_eq!(listing["index"]["entries"], 3);

        let (_, jobs) = send(&app, empty_request("GET", "/jobs")).await;
        assert_eq!(jobs["stats"]["total"], 2);
        assert_eq!(jobs["jobs"].as_array().unwrap().len(), 2);

        let (code, report) = send(
            &app,
            empty_request("DELETE", &format!("/documents/{}", document_id)),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(report["entries_removed"], 3);

        let (code, body) = send(
            &app,
            json_request("POST", "/search", json!({"query": "pricing"})),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
        assert!(body["results"].as_array().unwrap().is_empty());
    }
}
