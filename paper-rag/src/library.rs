//! Reference-library access.
//!
//! [`LibraryClient`] is the seam between the pipeline and the library that
//! knows which papers exist. [`ZoteroClient`] (feature `zotero`) implements it
//! over the Zotero Web API v3.

use async_trait::async_trait;

use crate::document::{Collection, PaperRecord};
use crate::error::Result;

/// A source of paper records.
#[async_trait]
pub trait LibraryClient: Send + Sync {
    /// List the collections in the library.
    async fn list_collections(&self) -> Result<Vec<Collection>>;

    /// List the PDF papers in the library, or in one collection when
    /// `collection` is given.
    async fn list_papers(&self, collection: Option<&str>) -> Result<Vec<PaperRecord>>;
}

#[cfg(feature = "zotero")]
pub use zotero::{ZOTERO_API_BASE, ZoteroClient};

#[cfg(feature = "zotero")]
mod zotero {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use serde::Deserialize;
    use serde::de::DeserializeOwned;
    use tracing::{debug, error, info};

    use super::LibraryClient;
    use crate::document::{Collection, PaperRecord};
    use crate::error::{RagError, Result};

    /// The Zotero Web API base URL.
    pub const ZOTERO_API_BASE: &str = "https://api.zotero.org";

    /// Maximum page size accepted by the Zotero API.
    const PAGE_SIZE: usize = 100;

    const PDF_CONTENT_TYPE: &str = "application/pdf";

    /// A [`LibraryClient`] for a personal Zotero library.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use paper_rag::{LibraryClient, ZoteroClient};
    ///
    /// let zotero = ZoteroClient::new("1234567", "api-key")?;
    /// for paper in zotero.list_papers(None).await? {
    ///     println!("{} {}", paper.document_id, paper.title);
    /// }
    /// ```
    pub struct ZoteroClient {
        client: reqwest::Client,
        user_id: String,
        api_key: String,
        base_url: String,
    }

    impl ZoteroClient {
        /// Create a client for the library of `user_id`.
        pub fn new(user_id: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
            let user_id = user_id.into();
            let api_key = api_key.into();
            if user_id.is_empty() || api_key.is_empty() {
                return Err(RagError::Config(
                    "Zotero user id and API key must not be empty".to_string(),
                ));
            }
            Ok(Self {
                client: reqwest::Client::new(),
                user_id,
                api_key,
                base_url: ZOTERO_API_BASE.to_string(),
            })
        }

        /// Use a different API host (e.g. a local proxy).
        pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
            self.base_url = base_url.into().trim_end_matches('/').to_string();
            self
        }

        /// Fetch every page of a listing endpoint.
        async fn fetch_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
            let url = format!("{}/users/{}/{path}", self.base_url, self.user_id);
            let mut all = Vec::new();
            let mut start = 0usize;

            loop {
                debug!(%url, start, "fetching library page");
                let response = self
                    .client
                    .get(&url)
                    .header("Zotero-API-Key", &self.api_key)
                    .header("Zotero-API-Version", "3")
                    .query(&[("limit", PAGE_SIZE), ("start", start)])
                    .send()
                    .await
                    .map_err(|e| {
                        error!(error = %e, "library request failed");
                        library_error(format!("request to {url} failed: {e}"))
                    })?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    error!(%status, "library API error");
                    return Err(library_error(format!("API returned {status}: {}", body.trim())));
                }

                let page: Vec<T> = response.json().await.map_err(|e| {
                    error!(error = %e, "failed to parse library response");
                    library_error(format!("failed to parse response: {e}"))
                })?;

                let fetched = page.len();
                all.extend(page);
                if fetched < PAGE_SIZE {
                    break;
                }
                start += fetched;
            }

            Ok(all)
        }
    }

    fn library_error(message: String) -> RagError {
        RagError::Library { message }
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct ZoteroCollection {
        key: String,
        data: ZoteroCollectionData,
        #[serde(default)]
        meta: ZoteroCollectionMeta,
    }

    #[derive(Debug, Deserialize)]
    struct ZoteroCollectionData {
        name: String,
    }

    #[derive(Debug, Default, Deserialize)]
    struct ZoteroCollectionMeta {
        #[serde(rename = "numItems", default)]
        num_items: u64,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct ZoteroItem {
        key: String,
        data: ZoteroItemData,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct ZoteroItemData {
        #[serde(rename = "itemType")]
        item_type: String,
        title: String,
        #[serde(rename = "parentItem")]
        parent_item: Option<String>,
        #[serde(rename = "contentType")]
        content_type: Option<String>,
        #[serde(rename = "publicationTitle")]
        publication_title: String,
        #[serde(rename = "DOI")]
        doi: String,
    }

    pub(super) fn collections_from(raw: Vec<ZoteroCollection>) -> Vec<Collection> {
        raw.into_iter()
            .map(|c| Collection { key: c.key, name: c.data.name, item_count: c.meta.num_items })
            .collect()
    }

    /// Join PDF attachments with their parent items.
    ///
    /// Attachments whose parent is not part of `items` are dropped. Output
    /// follows the order of the attachments in `items`.
    pub(super) fn papers_from_items(items: &[ZoteroItem]) -> Vec<PaperRecord> {
        let by_key: HashMap<&str, &ZoteroItem> =
            items.iter().map(|item| (item.key.as_str(), item)).collect();

        items
            .iter()
            .filter(|item| item.data.content_type.as_deref() == Some(PDF_CONTENT_TYPE))
            .filter_map(|attachment| {
                let parent_id = attachment.data.parent_item.as_deref()?;
                let parent = by_key.get(parent_id)?;
                Some(PaperRecord {
                    title: parent.data.title.clone(),
                    item_type: parent.data.item_type.clone(),
                    publication: parent.data.publication_title.clone(),
                    doi: parent.data.doi.clone(),
                    document_id: attachment.key.clone(),
                    parent_id: parent_id.to_string(),
                })
            })
            .collect()
    }

    #[async_trait]
    impl LibraryClient for ZoteroClient {
        async fn list_collections(&self) -> Result<Vec<Collection>> {
            let raw: Vec<ZoteroCollection> = self.fetch_all("collections").await?;
            let collections = collections_from(raw);
            info!(collection_count = collections.len(), "listed collections");
            Ok(collections)
        }

        async fn list_papers(&self, collection: Option<&str>) -> Result<Vec<PaperRecord>> {
            let path = match collection {
                Some(key) => format!("collections/{key}/items"),
                None => "items".to_string(),
            };
            let items: Vec<ZoteroItem> = self.fetch_all(&path).await?;
            let papers = papers_from_items(&items);
            info!(
                item_count = items.len(),
                paper_count = papers.len(),
                collection,
                "listed papers"
            );
            Ok(papers)
        }
    }
}
