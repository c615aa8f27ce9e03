#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use ongaku_tag::aggregate::{aggregate, TrackTags};
use ongaku_tag::{EmbedRequest, TaggerClient};

/// Everything the stand-in backend has received, plus its files.
#[derive(Default)]
pub struct Backend {
    pub files: Vec<TrackTags>,
    pub calls: Vec<String>,
    pub scan_bodies: Vec<Value>,
    pub search_params: Vec<HashMap<String, String>>,
    pub cover_params: Vec<HashMap<String, String>>,
    pub embed_bodies: Vec<Value>,
    pub update_bodies: Vec<Value>,
    pub fail_embed: bool,
    pub fail_scan: bool,
}

pub type Shared = Arc<Mutex<Backend>>;

pub fn file(path: &str, album: &str, number: &str, has_cover: bool) -> TrackTags {
    TrackTags {
        path: path.to_string(),
        title: format!("Track {}", number),
        artist: "The Beatles".to_string(),
        album: album.to_string(),
        year: "1969".to_string(),
        track_number: number.to_string(),
        has_cover,
        ..Default::default()
    }
}

async fn scan(State(backend): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut backend = backend.lock();
    backend.calls.push("scan".to_string());
    backend.scan_bodies.push(body);
    if backend.fail_scan {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(aggregate(backend.files.clone())).into_response()
}

async fn search(
    State(backend): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let mut backend = backend.lock();
    backend.calls.push("search".to_string());
    let limit: usize = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10);
    backend.search_params.push(params);

    let results: Vec<Value> = (1..=limit as i64)
        .map(|id| {
            let thumb = format!("https://img.example/{}/100x100bb.jpg", id);
            if id % 2 == 0 {
                // Backend that did not enrich the result.
                json!({
                    "collectionId": id,
                    "artistName": "The Beatles",
                    "collectionName": format!("Abbey Road ({})", id),
                    "releaseDate": "1969-09-26T07:00:00Z",
                    "artworkUrl100": thumb,
                })
            } else {
                json!({
                    "collectionId": id,
                    "artistName": "The Beatles",
                    "collectionName": format!("Abbey Road ({})", id),
                    "releaseDate": "1969-09-26T07:00:00Z",
                    "artworkUrl100": thumb,
                    "artworkUrlPreview": format!("https://img.example/{}/600x600bb.jpg", id),
                    "artworkUrlHighRes": format!("https://img.example/{}/10000x10000bb.jpg", id),
                })
            }
        })
        .collect();
    Json(Value::Array(results))
}

async fn cover(
    State(backend): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut backend = backend.lock();
    backend.calls.push("cover".to_string());
    let path = params.get("path").cloned().unwrap_or_default();
    backend.cover_params.push(params);
    let has_cover = backend
        .files
        .iter()
        .any(|f| f.path == path && f.has_cover);
    if has_cover {
        ([(header::CONTENT_TYPE, "image/png")], vec![0x89, b'P', b'N', b'G']).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn embed(State(backend): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut backend = backend.lock();
    backend.calls.push("embed".to_string());
    backend.embed_bodies.push(body.clone());
    if backend.fail_embed {
        return (StatusCode::INTERNAL_SERVER_ERROR, "download failed").into_response();
    }
    let request: EmbedRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(_) => return StatusCode::UNPROCESSABLE_ENTITY.into_response(),
    };
    for file in backend.files.iter_mut() {
        if request.file_paths.contains(&file.path) {
            file.has_cover = true;
        }
    }
    Json(json!({"status": "success", "processed": request.file_paths.len()})).into_response()
}

async fn update_meta(State(backend): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut backend = backend.lock();
    backend.calls.push("update_meta".to_string());
    backend.update_bodies.push(body.clone());
    let paths: Vec<String> = body["file_paths"]
        .as_array()
        .map(|paths| {
            paths
                .iter()
                .filter_map(|p| p.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();
    let text = |key: &str| body.get(key).and_then(|v| v.as_str()).map(|s| s.to_string());
    for file in backend.files.iter_mut().filter(|f| paths.contains(&f.path)) {
        if let Some(album) = text("album") {
            file.album = album;
        }
        if let Some(artist) = text("artist") {
            file.artist = artist;
        }
        if let Some(year) = text("year") {
            file.year = year;
        }
        if let Some(genre) = text("genre") {
            file.genre = genre;
        }
        if let Some(composer) = text("composer") {
            file.composer = composer;
        }
    }
    Json(json!({"status": "success", "processed": paths.len()})).into_response()
}

/// Serves the stand-in backend on an ephemeral local port.
pub async fn spawn_backend(files: Vec<TrackTags>) -> (Shared, SocketAddr) {
    let shared: Shared = Arc::new(Mutex::new(Backend {
        files,
        ..Default::default()
    }));
    let app = Router::new()
        .route("/api/library/scan", post(scan))
        .route("/api/search/", get(search))
        .route("/api/library/cover", get(cover))
        .route("/api/library/embed", post(embed))
        .route("/api/library/update_meta", post(update_meta))
        .with_state(shared.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (shared, addr)
}

pub fn client(addr: SocketAddr) -> TaggerClient {
    TaggerClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap()
}
