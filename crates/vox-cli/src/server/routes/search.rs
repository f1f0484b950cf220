//! Retrieval endpoints

use crate::server::error::{ApiError, ApiResult};
use crate::server::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use vox_core::ScoredChunk;
use vox_ingest::{AskMode, AskResponse};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<ScoredChunk>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub top_k: Option<i64>,
}

fn parse_top_k(top_k: Option<i64>) -> ApiResult<Option<usize>> {
    match top_k {
        None => Ok(None),
        Some(k) if k > 0 => Ok(Some(k as usize)),
        Some(k) => Err(ApiError::bad_request(format!(
            "top_k must be a positive integer, got {}",
            k
        ))),
    }
}

/// POST /search - rank chunks against a query
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<SearchResponse>> {
    let k = parse_top_k(request.top_k)?.unwrap_or(state.default_k());
    let results = state
        .answers()
        .retrieval()
        .retrieve(&request.query, k)
        .await?;

    Ok(Json(SearchResponse {
        query: request.query,
        results,
    }))
}

/// POST /ask - answer a question from retrieved chunks
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> ApiResult<Json<AskResponse>> {
    let mode = match request.mode.as_deref() {
        None => AskMode::Auto,
        Some(m) => AskMode::from_str(m).ok_or_else(|| {
            ApiError::bad_request(format!("Unknown mode '{}'. Use auto, qa or summary.", m))
        })?,
    };
    let k = parse_top_k(request.top_k)?;

    let response = state.answers().ask(&request.question, mode, k).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_top_k() {
        assert_eq!(parse_top_k(None).unwrap(), None);
        assert_eq!(parse_top_k(Some(4)).unwrap(), Some(4));
        assert!(parse_top_k(Some(0)).is_err());
        assert!(parse_top_k(Some(-3)).is_err());
    }
}
