mod store;

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult, db::{StoreError, StoreResult}, models::ModelRegistry, version};

pub use store::SqliteGalleryStore;

/// Display tags in the order clients show them.
pub const DISPLAY_TAGS: &[&str] = &[
    "All",
    "LLM",
    "Workplace",
    "Learning",
    "Entertainment",
    "Celebrities",
    "Creative Life",
];

/// `room_type` tag of catalog entries curated by the operator.
pub const SYSTEM_GALLERY_TYPE: &str = "system";

/// A preset persona template. Read-only; cloning copies it into a new room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryRoom {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub model: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub init_message: String,
    #[serde(default)]
    pub max_context: i64,
    #[serde(default)]
    pub avatar_id: i64,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default = "system_type")]
    pub room_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub version_min: String,
    #[serde(default)]
    pub version_max: String,
}

fn system_type() -> String {
    SYSTEM_GALLERY_TYPE.to_owned()
}

#[async_trait]
pub trait GalleryStore: Send + Sync {
    async fn list_all(&self) -> StoreResult<Vec<GalleryRoom>>;

    /// Fails with [`StoreError::NotFound`] when absent.
    async fn get(&self, id: i64) -> StoreResult<GalleryRoom>;

    /// Missing ids are left out of the result.
    async fn get_many(&self, ids: &[i64]) -> StoreResult<Vec<GalleryRoom>>;
}

#[derive(Debug, Clone, Serialize)]
pub struct VisibleGallery {
    #[serde(rename = "data")]
    pub rooms: Vec<GalleryRoom>,
    pub tags: Vec<String>,
}

/// Restricted models are hidden in restricted mode, except for users holding
/// the extra-permission exemption.
pub fn restricted_models_hidden(restricted_mode: bool, extra_permission: bool) -> bool {
    restricted_mode && !extra_permission
}

#[derive(Clone)]
pub struct GalleryCatalog {
    store: Arc<dyn GalleryStore>,
}

impl GalleryCatalog {
    pub fn new(store: Arc<dyn GalleryStore>) -> Self {
        Self { store }
    }

    pub async fn list_visible(
        &self,
        registry: &ModelRegistry,
        client_version: &str,
        hide_restricted: bool,
    ) -> AppResult<VisibleGallery> {
        let rooms = self.store.list_all().await.map_err(|err| {
            tracing::error!("query room galleries failed: {err}");
            anyhow::Error::from(err)
        })?;

        let rooms: Vec<_> = rooms
            .into_iter()
            .filter(|item| is_visible(item, registry, client_version, hide_restricted))
            .collect();
        let tags = display_tags(&rooms);

        Ok(VisibleGallery { rooms, tags })
    }

    pub async fn get_item(&self, id: i64) -> AppResult<GalleryRoom> {
        match self.store.get(id).await {
            Ok(item) => Ok(item),
            Err(StoreError::NotFound) => Err(AppError::NotFound("gallery item")),
            Err(err) => {
                tracing::error!(gallery_id = id, "query room gallery item failed: {err}");
                Err(anyhow::Error::from(err).into())
            }
        }
    }

    pub async fn get_items(&self, ids: &[i64]) -> AppResult<Vec<GalleryRoom>> {
        self.store.get_many(ids).await.map_err(|err| {
            tracing::error!(?ids, "query room gallery items failed: {err}");
            anyhow::Error::from(err).into()
        })
    }
}

pub fn is_visible(
    item: &GalleryRoom,
    registry: &ModelRegistry,
    client_version: &str,
    hide_restricted: bool,
) -> bool {
    let Some(model) = registry.get(&item.model) else {
        return false;
    };

    if hide_restricted && item.room_type == SYSTEM_GALLERY_TYPE && model.restricted {
        return false;
    }

    if model.is_disabled() {
        return false;
    }

    within_version_bounds(item, client_version)
}

fn within_version_bounds(item: &GalleryRoom, client_version: &str) -> bool {
    if client_version.is_empty() {
        return true;
    }

    if !item.version_min.is_empty() && version::older(client_version, &item.version_min) {
        return false;
    }

    if !item.version_max.is_empty() && version::newer(client_version, &item.version_max) {
        return false;
    }

    true
}

/// Tags used by `rooms`, restricted to [`DISPLAY_TAGS`] and in its order.
pub fn display_tags(rooms: &[GalleryRoom]) -> Vec<String> {
    let used: HashSet<&str> = rooms
        .iter()
        .flat_map(|room| room.tags.iter().map(String::as_str))
        .collect();

    DISPLAY_TAGS
        .iter()
        .filter(|tag| used.contains(*tag))
        .map(|tag| (*tag).to_owned())
        .collect()
}

#[cfg(test)]
pub(crate) fn gallery_room(id: i64, name: &str, model: &str) -> GalleryRoom {
    GalleryRoom {
        id,
        name: name.to_owned(),
        description: String::new(),
        model: model.to_owned(),
        vendor: "openai".to_owned(),
        prompt: format!("You are {name}."),
        init_message: "Hi!".to_owned(),
        max_context: 8,
        avatar_id: 3,
        avatar_url: String::new(),
        room_type: SYSTEM_GALLERY_TYPE.to_owned(),
        tags: Vec::new(),
        version_min: String::new(),
        version_max: String::new(),
    }
}
