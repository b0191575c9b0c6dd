use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use palette_core::{
    extract_snippet, fuzzy_search_multi_key, load_manifest_dir, suggest_queries, DocId, FuzzySearchOptions,
    IndexConfig, ManifestEntry, Markers, SearchIndex, SearchOptions, SharedIndex, SnippetOptions,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const COMMAND_KEYS: [(&str, f64); 2] = [("label", 1.0), ("keywords", 0.5)];

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub threshold: f64,
}
fn default_k() -> usize { 10 }

#[derive(Deserialize)]
pub struct SuggestParams {
    pub q: String,
    #[serde(default = "default_suggest_limit")]
    pub limit: usize,
}
fn default_suggest_limit() -> usize { 5 }

#[derive(Deserialize)]
pub struct CommandParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_command_limit")]
    pub limit: usize,
}
fn default_command_limit() -> usize { 8 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
    pub title: String,
    pub url: Option<String>,
    pub snippet: Option<String>,
}

#[derive(Serialize)]
pub struct CommandHit {
    pub command: Value,
    pub score: f64,
    pub key: Option<String>,
    pub highlighted: String,
}

#[derive(Clone)]
pub struct AppState {
    pub index: SharedIndex<ManifestEntry>,
    pub commands: Arc<Vec<Value>>,
    pub admin_token: Option<String>,
}

/// Where the server loads its data from at startup.
#[derive(Debug, Clone, Default)]
pub struct AppSettings {
    pub manifest: Option<PathBuf>,
    pub commands: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

pub fn default_commands() -> Vec<Value> {
    vec![
        json!({"id": "home", "label": "Go to home", "keywords": "index start"}),
        json!({"id": "blog", "label": "Open blog", "keywords": "posts articles"}),
        json!({"id": "theme", "label": "Toggle theme", "keywords": "dark light mode"}),
        json!({"id": "search", "label": "Search posts", "keywords": "find lookup"}),
        json!({"id": "rss", "label": "Copy RSS feed link", "keywords": "subscribe feed"}),
    ]
}

pub fn build_state(settings: &AppSettings) -> Result<AppState> {
    let config = match &settings.config {
        Some(path) => IndexConfig::from_json_file(path)?,
        None => IndexConfig {
            fields: Some(["title", "description", "category", "tags"].map(String::from).to_vec()),
            field_weights: [("title".to_string(), 2.0)].into_iter().collect(),
            ..IndexConfig::default()
        },
    };
    let mut index: SearchIndex<ManifestEntry> = config.build();
    if let Some(path) = &settings.manifest {
        let entries = load_manifest_dir(path)?;
        index.add_all(entries.into_iter().map(|e| (e.id.clone(), e)));
    }
    let commands: Vec<Value> = match &settings.commands {
        Some(path) => {
            let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => default_commands(),
    };
    tracing::info!(num_docs = index.len(), num_commands = commands.len(), "loaded search state");
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    Ok(AppState { index: SharedIndex::new(index), commands: Arc::new(commands), admin_token })
}

pub fn build_app(settings: &AppSettings) -> Result<Router> {
    let state = build_state(settings)?;

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Ok(router(state).layer(cors).layer(TraceLayer::new_for_http()))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/suggest", get(suggest_handler))
        .route("/commands", get(commands_handler))
        .route("/doc/:doc_id", get(doc_handler).delete(delete_handler))
        .route("/index/batch", post(index_batch))
        .with_state(state)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let k = params.k.clamp(1, 100);
    let hits = state.index.search_owned(&params.q, SearchOptions { limit: k, threshold: params.threshold });

    let raw_terms: Vec<&str> = params.q.split_whitespace().collect();
    let opts = SnippetOptions { markers: Markers::new("<em>", "</em>"), ..SnippetOptions::default() };
    let results: Vec<SearchHit> = hits
        .into_iter()
        .map(|hit| {
            let snippet = (!hit.doc.description.is_empty())
                .then(|| extract_snippet(&hit.doc.description, &raw_terms, &opts));
            SearchHit { doc_id: hit.doc_id, score: hit.score, title: hit.doc.title, url: hit.doc.url, snippet }
        })
        .collect();

    let elapsed = start.elapsed();
    tracing::debug!(query = params.q.as_str(), hits = results.len(), "search");
    Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: results.len(), results })
}

pub async fn suggest_handler(State(state): State<AppState>, Query(params): Query<SuggestParams>) -> Json<Vec<String>> {
    let limit = params.limit.clamp(1, 50);
    Json(state.index.with(|index| suggest_queries(&params.q, index, limit)))
}

pub async fn commands_handler(State(state): State<AppState>, Query(params): Query<CommandParams>) -> Json<Vec<CommandHit>> {
    let opts = FuzzySearchOptions { limit: Some(params.limit.clamp(1, 50)), ..FuzzySearchOptions::default() };
    let hits = fuzzy_search_multi_key(&params.q, state.commands.as_slice(), &COMMAND_KEYS, &opts)
        .into_iter()
        .map(|m| CommandHit {
            command: m.original.clone(),
            score: m.result.score,
            key: m.key,
            highlighted: m.result.highlighted,
        })
        .collect();
    Json(hits)
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<String>) -> Result<Json<ManifestEntry>, (StatusCode, String)> {
    state
        .index
        .get(&DocId::parse(&doc_id))
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("no document {doc_id}")))
}

// --- Admin endpoints ---
async fn index_batch(State(state): State<AppState>, headers: HeaderMap, Json(entries): Json<Vec<ManifestEntry>>) -> Result<Json<Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let indexed = entries.len();
    state.index.with_mut(|index| index.add_all(entries.into_iter().map(|e| (e.id.clone(), e))));
    tracing::info!(indexed, "batch indexed");
    Ok(Json(json!({ "indexed": indexed, "total": state.index.len() })))
}

async fn delete_handler(State(state): State<AppState>, headers: HeaderMap, Path(doc_id): Path<String>) -> Result<Json<Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let removed = state.index.remove(&DocId::parse(&doc_id));
    Ok(Json(json!({ "removed": removed })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
