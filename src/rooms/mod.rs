mod new;
mod request;
mod room;
mod store;
mod update;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{config::RoomsConfig, db::StoreResult, gallery::GalleryCatalog, tokens::TokenCounter};

pub use new::parse_gallery_ids;
pub use request::RoomRequest;
pub use room::{DEFAULT_ROOM_ID, default_room};
pub use store::SqliteRoomStore;

/// Where a room sits in its personalization lifecycle.
///
/// Preset rooms come from the gallery and become `PresetCustom` once edited.
/// `Custom` and `GroupChat` rooms never change type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    SystemPreset,
    PresetCustom,
    Custom,
    GroupChat,
}

impl RoomType {
    pub fn as_i64(self) -> i64 {
        use RoomType::*;
        match self {
            SystemPreset => 1,
            PresetCustom => 2,
            Custom => 3,
            GroupChat => 4,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        use RoomType::*;
        match value {
            1 => Some(SystemPreset),
            2 => Some(PresetCustom),
            3 => Some(Custom),
            4 => Some(GroupChat),
            _ => None,
        }
    }

    /// Type of a room after one of its fields was edited.
    pub fn after_edit(self) -> Self {
        use RoomType::*;
        match self {
            SystemPreset | PresetCustom => PresetCustom,
            other => other,
        }
    }
}

/// A user's chat persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: String,
    pub model: String,
    pub vendor: String,
    pub system_prompt: String,
    pub init_message: String,
    pub max_context: i64,
    pub avatar_id: i64,
    pub avatar_url: String,
    pub room_type: RoomType,
    #[serde(with = "time::serde::rfc3339")]
    pub last_active_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Room {
    pub fn has_avatar(&self) -> bool {
        self.avatar_id > 0 || !self.avatar_url.is_empty()
    }
}

/// Persistence for user rooms. Every call is scoped to the owning user.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Fails with [`StoreError::Exists`](crate::db::StoreError::Exists) when
    /// `check_name_conflict` is set and the user already has a room with this name.
    async fn create(&self, user_id: i64, room: &Room, check_name_conflict: bool) -> StoreResult<i64>;

    async fn get(&self, user_id: i64, id: i64) -> StoreResult<Room>;

    async fn list(&self, user_id: i64, types: &[RoomType], limit: i64) -> StoreResult<Vec<Room>>;

    async fn update(&self, user_id: i64, id: i64, room: &Room) -> StoreResult<()>;

    async fn delete(&self, user_id: i64, id: i64) -> StoreResult<()>;

    async fn touch_active(&self, user_id: i64, id: i64) -> StoreResult<()>;
}

/// Create, clone, read, update and delete operations on users' rooms.
#[derive(Clone)]
pub struct RoomLifecycle {
    store: Arc<dyn RoomStore>,
    gallery: GalleryCatalog,
    tokens: Arc<dyn TokenCounter>,
    config: RoomsConfig,
}

impl RoomLifecycle {
    pub fn new(
        store: Arc<dyn RoomStore>,
        gallery: GalleryCatalog,
        tokens: Arc<dyn TokenCounter>,
        config: RoomsConfig,
    ) -> Self {
        Self { store, gallery, tokens, config }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_preset_family_changes_type() {
        assert_eq!(RoomType::SystemPreset.after_edit(), RoomType::PresetCustom);
        assert_eq!(RoomType::PresetCustom.after_edit(), RoomType::PresetCustom);
        assert_eq!(RoomType::Custom.after_edit(), RoomType::Custom);
        assert_eq!(RoomType::GroupChat.after_edit(), RoomType::GroupChat);
    }

    #[test]
    fn room_type_codes() {
        for ty in [RoomType::SystemPreset, RoomType::PresetCustom, RoomType::Custom, RoomType::GroupChat] {
            assert_eq!(RoomType::from_i64(ty.as_i64()), Some(ty));
        }
        assert_eq!(RoomType::from_i64(0), None);
    }
}
