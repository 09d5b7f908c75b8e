//! Firestore REST client implementing `CatalogService`.
//!
//! Documents come back in Firestore's typed-value encoding:
//!
//! ```text
//! { "name": "projects/p/databases/(default)/documents/podcasts/ep1",
//!   "fields": { "title": { "stringValue": "..." },
//!               "links": { "arrayValue": { "values": [
//!                   { "mapValue": { "fields": { "title": {..}, "link": {..} } } } ] } } } }
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::catalog::{CatalogService, Category, Episode, EpisodeLink};
use crate::config::CatalogConfig;
use crate::error::FetchError;

/// Shared document holding per-category blurbs and the mailing-list link.
pub const UTILS_DOCUMENT: &str = "utils/utils";
pub const MAILING_LIST_FIELD: &str = "mailing_list_link";

pub struct FirestoreCatalog {
    client: Client,
    base_url: String,
    project_id: String,
    api_key: Option<String>,
    page_size: u32,
}

impl FirestoreCatalog {
    pub fn new(config: &CatalogConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("p0dcast/", env!("CARGO_PKG_VERSION")))
            .build()?;
        info!(
            "[firestore] project={} base={}",
            config.project_id, config.base_url
        );
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            page_size: config.page_size.max(1),
        })
    }

    fn documents_url(&self, path: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.base_url, self.project_id, path
        )
    }

    /// GET a Firestore resource.  `Ok(None)` on 404.
    async fn get_json(
        &self,
        path_url: &str,
        params: &[(&str, String)],
    ) -> Result<Option<Value>, FetchError> {
        let mut query: Vec<(&str, String)> = params.to_vec();
        if let Some(key) = &self.api_key {
            query.push(("key", key.clone()));
        }
        let url = Url::parse_with_params(path_url, &query)
            .map_err(|e| FetchError::malformed(format!("bad url {}: {}", path_url, e)))?;

        debug!("[firestore] GET {}", path_url);
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: path_url.to_string(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url: path_url.to_string(),
                status,
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|source| FetchError::Transport {
                url: path_url.to_string(),
                source,
            })?;
        Ok(Some(body))
    }

    async fn utils_fields(&self) -> Result<Map<String, Value>, FetchError> {
        let url = self.documents_url(UTILS_DOCUMENT);
        let fields = self
            .get_json(&url, &[])
            .await?
            .and_then(|doc| doc.get("fields").and_then(Value::as_object).cloned())
            .unwrap_or_default();
        Ok(fields)
    }
}

#[async_trait]
impl CatalogService for FirestoreCatalog {
    async fn list_episodes(&self, category: Category) -> Result<Vec<Episode>, FetchError> {
        let url = self.documents_url(category.collection());
        let mut episodes = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("pageSize", self.page_size.to_string())];
            if let Some(token) = page_token.take() {
                params.push(("pageToken", token));
            }
            // A missing collection reads as empty rather than failing.
            let Some(body) = self.get_json(&url, &params).await? else {
                break;
            };
            let (page, next) = parse_document_list(&body)?;
            episodes.extend(page);
            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            "[firestore] {} → {} episodes",
            category.collection(),
            episodes.len()
        );
        Ok(episodes)
    }

    async fn get_description(&self, category: Category) -> Result<String, FetchError> {
        let fields = self.utils_fields().await?;
        Ok(field_string(&fields, category.description_field()).unwrap_or_default())
    }

    async fn get_mailing_list_url(&self) -> Result<Option<String>, FetchError> {
        let fields = self.utils_fields().await?;
        Ok(field_string(&fields, MAILING_LIST_FIELD))
    }
}

// ── decoding ─────────────────────────────────────────────────────────────────

/// Parse one page of a `documents.list` response.
/// Returns the episodes and the next page token, if any.
pub fn parse_document_list(body: &Value) -> Result<(Vec<Episode>, Option<String>), FetchError> {
    let obj = body
        .as_object()
        .ok_or_else(|| FetchError::malformed("list response is not an object"))?;

    let episodes = match obj.get("documents") {
        None => Vec::new(),
        Some(Value::Array(docs)) => docs.iter().map(parse_episode).collect::<Result<_, _>>()?,
        Some(_) => return Err(FetchError::malformed("'documents' is not an array")),
    };

    let next = obj
        .get("nextPageToken")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    Ok((episodes, next))
}

/// Decode a single episode document.
pub fn parse_episode(doc: &Value) -> Result<Episode, FetchError> {
    let name = doc
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| FetchError::malformed("document without name"))?;
    let id = name
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| FetchError::malformed(format!("bad document name '{}'", name)))?;

    let empty = Map::new();
    let fields = doc
        .get("fields")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    Ok(Episode {
        id: id.to_string(),
        title: field_string(fields, "title").unwrap_or_default(),
        description: field_string(fields, "description").unwrap_or_default(),
        audio_source_url: field_string(fields, "path_to_audio").unwrap_or_default(),
        links: field_links(fields, "links"),
    })
}

/// Read a scalar field as text.  Blank strings count as absent.
pub fn field_string(fields: &Map<String, Value>, field_name: &str) -> Option<String> {
    let value = fields.get(field_name)?.as_object()?;
    for kind in ["stringValue", "timestampValue", "integerValue"] {
        if let Some(s) = value.get(kind).and_then(Value::as_str) {
            let s = s.trim();
            if !s.is_empty() {
                return Some(s.to_string());
            }
        }
    }
    None
}

fn field_links(fields: &Map<String, Value>, field_name: &str) -> Vec<EpisodeLink> {
    let Some(values) = fields
        .get(field_name)
        .and_then(|v| v.get("arrayValue"))
        .and_then(|v| v.get("values"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    values
        .iter()
        .filter_map(|v| v.get("mapValue")?.get("fields")?.as_object())
        .filter_map(|link| {
            let url = field_string(link, "link")?;
            let title = field_string(link, "title").unwrap_or_else(|| url.clone());
            Some(EpisodeLink { title, url })
        })
        .collect()
}
