//! In-process stand-in for the Firestore REST `documents` endpoints.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use podcast_core::config::CatalogConfig;
use serde_json::{json, Value};

pub const PROJECT: &str = "test-project";

#[derive(Default)]
pub struct MockFirestore {
    /// collection → documents, served in `pageSize` chunks
    pub collections: HashMap<String, Vec<Value>>,
    /// collections answering with a 500
    pub failing: Vec<String>,
    pub utils: Option<Value>,
    /// `(path, query)` of every request received
    pub requests: Mutex<Vec<(String, HashMap<String, String>)>>,
}

impl MockFirestore {
    pub fn with_collection(mut self, name: &str, docs: Vec<Value>) -> Self {
        self.collections.insert(name.to_string(), docs);
        self
    }

    pub fn failing(mut self, name: &str) -> Self {
        self.failing.push(name.to_string());
        self
    }

    pub fn with_utils(mut self, fields: Value) -> Self {
        self.utils = Some(json!({
            "name": format!("projects/{}/databases/(default)/documents/utils/utils", PROJECT),
            "fields": fields,
        }));
        self
    }

    pub fn requests(&self) -> Vec<(String, HashMap<String, String>)> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn episode_doc(collection: &str, id: &str, title: &str) -> Value {
    json!({
        "name": format!("projects/{}/databases/(default)/documents/{}/{}", PROJECT, collection, id),
        "fields": {
            "title": { "stringValue": title },
            "description": { "stringValue": format!("{} description", title) },
            "path_to_audio": { "stringValue": format!("https://cdn.example/{}.mp3", id) },
        }
    })
}

pub fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

async fn documents(
    State(mock): State<Arc<MockFirestore>>,
    Path((project, _database, path)): Path<(String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    mock.requests
        .lock()
        .unwrap()
        .push((path.clone(), query.clone()));

    if project != PROJECT {
        return StatusCode::NOT_FOUND.into_response();
    }
    if path == "utils/utils" {
        return match &mock.utils {
            Some(doc) => Json(doc.clone()).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        };
    }
    if mock.failing.contains(&path) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let Some(docs) = mock.collections.get(&path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let page_size: usize = query
        .get("pageSize")
        .and_then(|s| s.parse().ok())
        .unwrap_or(docs.len().max(1));
    let start: usize = query
        .get("pageToken")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let end = (start + page_size).min(docs.len());
    let page = docs.get(start..end).unwrap_or(&[]).to_vec();

    let mut body = json!({});
    if !page.is_empty() {
        body["documents"] = Value::Array(page);
    }
    if end < docs.len() {
        body["nextPageToken"] = Value::String(end.to_string());
    }
    Json(body).into_response()
}

/// Serve `mock` on an ephemeral port; returns its address.
pub async fn serve(mock: Arc<MockFirestore>) -> SocketAddr {
    let app = Router::new()
        .route(
            "/v1/projects/:project/databases/:database/documents/*path",
            get(documents),
        )
        .with_state(mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub fn catalog_config(addr: SocketAddr, page_size: u32) -> CatalogConfig {
    CatalogConfig {
        base_url: format!("http://{}/v1", addr),
        project_id: PROJECT.to_string(),
        api_key: Some("test-key".to_string()),
        page_size,
    }
}
