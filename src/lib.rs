pub mod appresult;
pub mod config;
pub mod db;
pub mod gallery;
pub mod models;
pub mod provider;
pub mod rooms;
pub mod settings;
pub mod tokens;
pub mod version;

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

pub use appresult::{AppError, AppResult};

use crate::{
    config::RoomsConfig,
    gallery::{GalleryCatalog, SqliteGalleryStore, VisibleGallery},
    models::ModelRegistry,
    rooms::{RoomLifecycle, SqliteRoomStore},
    tokens::{ApproxTokenCounter, TokenCounter},
};

/// Everything a transport needs to serve rooms and the gallery.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub rooms: RoomLifecycle,
    pub gallery: GalleryCatalog,
    pub config: RoomsConfig,
}

impl AppState {
    /// Wires SQLite-backed stores and the approximate token counter.
    pub fn sqlite(db_pool: SqlitePool, config: RoomsConfig) -> Self {
        Self::with_counter(db_pool, config, Arc::new(ApproxTokenCounter))
    }

    pub fn with_counter(db_pool: SqlitePool, config: RoomsConfig, tokens: Arc<dyn TokenCounter>) -> Self {
        let gallery = GalleryCatalog::new(Arc::new(SqliteGalleryStore::new(db_pool.clone())));
        let rooms = RoomLifecycle::new(
            Arc::new(SqliteRoomStore::new(db_pool)),
            gallery.clone(),
            tokens,
            config.clone(),
        );

        Self { rooms, gallery, config }
    }

    /// Gallery as seen by one user; restricted models are hidden according to
    /// the deployment mode and the user's extra-permission exemption.
    pub async fn visible_gallery(
        &self,
        registry: &ModelRegistry,
        client_version: &str,
        extra_permission: bool,
    ) -> AppResult<VisibleGallery> {
        let hide_restricted = gallery::restricted_models_hidden(self.config.restricted_mode, extra_permission);
        self.gallery.list_visible(registry, client_version, hide_restricted).await
    }
}
