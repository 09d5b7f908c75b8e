//! Catalog data model and the remote query surface.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FetchError;

/// A reference link attached to an episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeLink {
    pub title: String,
    pub url: String,
}

/// One catalog entry.  Read-only once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub id: String,
    pub title: String,
    pub description: String,
    pub audio_source_url: String,
    #[serde(default)]
    pub links: Vec<EpisodeLink>,
}

/// Named partition of the catalog.  The set is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    Podcasts,
    TwoObjects,
    Funny,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Podcasts, Category::TwoObjects, Category::Funny];

    /// Firestore collection holding this category's episodes.
    pub fn collection(self) -> &'static str {
        match self {
            Self::Podcasts => "podcasts",
            Self::TwoObjects => "podcasts_2obj",
            Self::Funny => "podcasts_funny",
        }
    }

    /// Field of the shared utils document carrying this category's blurb.
    pub fn description_field(self) -> &'static str {
        match self {
            Self::Podcasts => "description",
            Self::TwoObjects => "description_2obj",
            Self::Funny => "description_funny",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Podcasts => "podcasts",
            Self::TwoObjects => "two objects",
            Self::Funny => "funny",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Podcasts => 0,
            Self::TwoObjects => 1,
            Self::Funny => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "podcasts" | "podcast" => Ok(Self::Podcasts),
            "two-objects" | "2obj" | "podcasts_2obj" => Ok(Self::TwoObjects),
            "funny" | "podcasts_funny" => Ok(Self::Funny),
            other => Err(format!("unknown category '{}'", other)),
        }
    }
}

/// Query surface of the remote document store.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// All episodes of `category`.  No partial results.
    async fn list_episodes(&self, category: Category) -> Result<Vec<Episode>, FetchError>;

    /// Category blurb; absent data yields an empty string.
    async fn get_description(&self, category: Category) -> Result<String, FetchError>;

    async fn get_mailing_list_url(&self) -> Result<Option<String>, FetchError>;
}

/// Everything the view needs after a category switch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    pub episodes: Vec<Episode>,
    pub description: String,
    pub mailing_list_url: Option<String>,
}

/// Fetch episodes, description and mailing-list URL concurrently.
///
/// Each failure is logged and degraded to its empty value; the call itself
/// never fails.
pub async fn load_catalog(service: &dyn CatalogService, category: Category) -> CatalogSnapshot {
    let (episodes, description, mailing) = tokio::join!(
        service.list_episodes(category),
        service.get_description(category),
        service.get_mailing_list_url(),
    );

    let episodes = episodes.unwrap_or_else(|e| {
        warn!("[catalog] episodes for {} unavailable: {}", category, e);
        Vec::new()
    });
    let description = description.unwrap_or_else(|e| {
        warn!("[catalog] description for {} unavailable: {}", category, e);
        String::new()
    });
    let mailing_list_url = mailing.unwrap_or_else(|e| {
        warn!("[catalog] mailing list link unavailable: {}", e);
        None
    });

    debug!(
        "[catalog] {}: {} episodes, description {} chars",
        category,
        episodes.len(),
        description.len()
    );

    CatalogSnapshot {
        episodes,
        description,
        mailing_list_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    #[async_trait]
    impl CatalogService for Broken {
        async fn list_episodes(&self, _: Category) -> Result<Vec<Episode>, FetchError> {
            Err(FetchError::malformed("boom"))
        }
        async fn get_description(&self, _: Category) -> Result<String, FetchError> {
            Err(FetchError::malformed("boom"))
        }
        async fn get_mailing_list_url(&self) -> Result<Option<String>, FetchError> {
            Err(FetchError::malformed("boom"))
        }
    }

    struct DescriptionOnly;

    #[async_trait]
    impl CatalogService for DescriptionOnly {
        async fn list_episodes(&self, _: Category) -> Result<Vec<Episode>, FetchError> {
            Err(FetchError::malformed("no list"))
        }
        async fn get_description(&self, category: Category) -> Result<String, FetchError> {
            Ok(format!("about {}", category.collection()))
        }
        async fn get_mailing_list_url(&self) -> Result<Option<String>, FetchError> {
            Ok(Some("https://list.example".into()))
        }
    }

    #[tokio::test]
    async fn test_load_catalog_degrades_to_empty() {
        let snap = load_catalog(&Broken, Category::Funny).await;
        assert_eq!(snap, CatalogSnapshot::default());
    }

    #[tokio::test]
    async fn test_load_catalog_failures_are_independent() {
        let snap = load_catalog(&DescriptionOnly, Category::TwoObjects).await;
        assert!(snap.episodes.is_empty());
        assert_eq!(snap.description, "about podcasts_2obj");
        assert_eq!(snap.mailing_list_url.as_deref(), Some("https://list.example"));
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(Category::Podcasts.collection(), "podcasts");
        assert_eq!(Category::TwoObjects.description_field(), "description_2obj");
        assert_eq!(Category::Funny.collection(), "podcasts_funny");
    }

    #[test]
    fn test_category_cycle() {
        assert_eq!(Category::Podcasts.next(), Category::TwoObjects);
        assert_eq!(Category::Funny.next(), Category::Podcasts);
        assert_eq!(Category::Podcasts.prev(), Category::Funny);
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("funny".parse::<Category>(), Ok(Category::Funny));
        assert_eq!("Two-Objects".parse::<Category>(), Ok(Category::TwoObjects));
        assert!("jazz".parse::<Category>().is_err());
    }
}
