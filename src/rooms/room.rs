use time::OffsetDateTime;

use crate::{AppError, AppResult, db::StoreError, models::ModelRegistry, version};

use super::{Room, RoomLifecycle, RoomType};

/// Room id served from code instead of the store.
pub const DEFAULT_ROOM_ID: i64 = 1;

/// The built-in general chat room every user has.
pub fn default_room(model: &str) -> Room {
    Room {
        id: DEFAULT_ROOM_ID,
        user_id: 0,
        name: "Chat".to_owned(),
        description: "General-purpose assistant".to_owned(),
        model: model.to_owned(),
        vendor: "openai".to_owned(),
        system_prompt: String::new(),
        init_message: String::new(),
        max_context: 10,
        avatar_id: 0,
        avatar_url: String::new(),
        room_type: RoomType::SystemPreset,
        last_active_time: OffsetDateTime::UNIX_EPOCH,
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

impl RoomLifecycle {
    pub async fn room(&self, user_id: i64, room_id: i64, registry: &ModelRegistry) -> AppResult<Room> {
        if room_id == DEFAULT_ROOM_ID {
            return Ok(default_room(&self.config.default_role_model));
        }

        let mut room = match self.store.get(user_id, room_id).await {
            Ok(room) => room,
            Err(StoreError::NotFound) => return Err(AppError::NotFound("room")),
            Err(err) => {
                tracing::error!(user_id, room_id, "query room failed: {err}");
                return Err(anyhow::Error::from(err).into());
            }
        };

        // display-time fallback only, never written back
        if !room.has_avatar() {
            if let Some(url) = registry.avatar_url(&room.model) {
                room.avatar_url = url.to_owned();
            }
        }

        Ok(room)
    }

    /// Rooms of `user_id`; group chats only for clients that support them.
    pub async fn rooms(&self, user_id: i64, client_version: &str) -> AppResult<Vec<Room>> {
        let mut types = vec![RoomType::SystemPreset, RoomType::PresetCustom, RoomType::Custom];
        if version::newer(client_version, &self.config.group_chat_min_version) {
            types.push(RoomType::GroupChat);
        }

        self.store
            .list(user_id, &types, self.config.rooms_query_limit)
            .await
            .map_err(|err| {
                tracing::error!(user_id, "query rooms failed: {err}");
                anyhow::Error::from(err).into()
            })
    }

    /// Deleting a room the user does not own is a permission error.
    pub async fn delete(&self, user_id: i64, room_id: i64) -> AppResult<()> {
        match self.store.get(user_id, room_id).await {
            Ok(_) => {}
            Err(StoreError::NotFound) => {
                tracing::error!(user_id, room_id, "no permission to delete room");
                return Err(AppError::Forbidden("no permission to delete this room".to_owned()));
            }
            Err(err) => {
                tracing::error!(user_id, room_id, "query room before delete failed: {err}");
                return Err(anyhow::Error::from(err).into());
            }
        }

        self.store.delete(user_id, room_id).await.map_err(|err| {
            tracing::error!(user_id, room_id, "delete room failed: {err}");
            anyhow::Error::from(err).into()
        })
    }

    pub async fn touch_active(&self, user_id: i64, room_id: i64) -> AppResult<()> {
        self.store.touch_active(user_id, room_id).await.map_err(|err| {
            tracing::error!(user_id, room_id, "update room active time failed: {err}");
            anyhow::Error::from(err).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db,
        rooms::{RoomStore, testing::{fixture, request}},
    };

    fn stored(user_id: i64, name: &str, ty: RoomType) -> Room {
        Room {
            user_id,
            name: name.to_owned(),
            room_type: ty,
            ..default_room("gpt-4o")
        }
    }

    #[tokio::test]
    async fn default_room_bypasses_store() {
        let f = fixture().await;
        let room = f.rooms.room(42, DEFAULT_ROOM_ID, &f.registry).await.unwrap();
        assert_eq!(room.id, DEFAULT_ROOM_ID);
        assert_eq!(room.model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn read_is_owner_scoped() {
        let f = fixture().await;
        let id = f.rooms.create(7, request("Mine"), &f.registry).await.unwrap();

        assert_eq!(f.rooms.room(7, id, &f.registry).await.unwrap().name, "Mine");
        assert!(matches!(f.rooms.room(8, id, &f.registry).await, Err(AppError::NotFound(_))));
        assert!(matches!(f.rooms.room(7, 999, &f.registry).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn missing_avatar_is_backfilled_but_not_saved() {
        let f = fixture().await;
        let id = f.store.create(7, &stored(7, "Bare", RoomType::Custom), true).await.unwrap();

        let room = f.rooms.room(7, id, &f.registry).await.unwrap();
        assert_eq!(room.avatar_url, "https://cdn.example.com/gpt-4o.png");
        assert_eq!(f.store.get(7, id).await.unwrap().avatar_url, "");
    }

    #[tokio::test]
    async fn avatar_id_suppresses_backfill() {
        let f = fixture().await;
        let room = Room { avatar_id: 9, ..stored(7, "Curated", RoomType::Custom) };
        let id = f.store.create(7, &room, true).await.unwrap();

        assert_eq!(f.rooms.room(7, id, &f.registry).await.unwrap().avatar_url, "");
    }

    #[tokio::test]
    async fn group_chats_need_newer_client() {
        let f = fixture().await;
        f.store.create(7, &stored(7, "Preset", RoomType::SystemPreset), true).await.unwrap();
        f.store.create(7, &stored(7, "Group", RoomType::GroupChat), true).await.unwrap();

        assert_eq!(f.rooms.rooms(7, "1.0.6").await.unwrap().len(), 1);
        assert_eq!(f.rooms.rooms(7, "").await.unwrap().len(), 1);
        assert_eq!(f.rooms.rooms(7, "1.0.7").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_foreign_room_is_forbidden() {
        let f = fixture().await;
        let id = f.rooms.create(7, request("Mine"), &f.registry).await.unwrap();

        assert!(matches!(f.rooms.delete(8, id).await, Err(AppError::Forbidden(_))));
        assert!(matches!(f.rooms.delete(7, 999).await, Err(AppError::Forbidden(_))));

        f.rooms.delete(7, id).await.unwrap();
        assert!(matches!(f.rooms.room(7, id, &f.registry).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn touch_only_moves_active_time() {
        let f = fixture().await;
        let room = Room { last_active_time: db::from_unix(10), ..stored(7, "Idle", RoomType::Custom) };
        let id = f.store.create(7, &room, true).await.unwrap();

        f.rooms.touch_active(7, id).await.unwrap();
        let touched = f.store.get(7, id).await.unwrap();
        assert!(db::to_unix(touched.last_active_time) > 10);
        assert_eq!(touched.name, "Idle");

        // someone else's touch is a no-op
        f.rooms.touch_active(8, id).await.unwrap();
    }
}
