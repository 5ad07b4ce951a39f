use std::collections::{HashMap, HashSet};

use crate::{
    AppError, AppResult,
    db::{self, StoreError},
    gallery::GalleryRoom,
    models::ModelRegistry,
};

use super::{Room, RoomLifecycle, RoomRequest, RoomType};

const DEFAULT_MAX_CONTEXT: i64 = 10;

/// Parses a comma-separated id list. Entries that are not numbers are kept as
/// `0` and dropped later with the other non-positive ids.
pub fn parse_gallery_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(|s| s.trim().parse().unwrap_or(0))
        .collect()
}

impl Room {
    fn from_gallery(user_id: i64, item: &GalleryRoom) -> Self {
        let now = db::now();
        Self {
            id: 0,
            user_id,
            name: item.name.clone(),
            description: String::new(),
            model: item.model.clone(),
            vendor: item.vendor.clone(),
            system_prompt: item.prompt.clone(),
            init_message: item.init_message.clone(),
            max_context: item.max_context,
            avatar_id: item.avatar_id,
            avatar_url: item.avatar_url.clone(),
            room_type: RoomType::SystemPreset,
            last_active_time: now,
            created_at: now,
            updated_at: now,
        }
    }
}

impl RoomLifecycle {
    /// Creates a custom room and returns its id.
    pub async fn create(&self, user_id: i64, req: RoomRequest, registry: &ModelRegistry) -> AppResult<i64> {
        let mut req = req.validate(&self.config.default_role_model, self.tokens.as_ref())?;

        if req.max_context == 0 {
            req.max_context = DEFAULT_MAX_CONTEXT;
        }

        let Some(model) = registry.get(&req.model) else {
            return Err(AppError::validation(format!("unsupported model {}", req.model)));
        };

        if req.avatar_url.is_empty() && req.avatar_id <= 0 {
            req.avatar_url = model.avatar_url.clone();
        }

        let now = db::now();
        let room = Room {
            id: 0,
            user_id,
            name: req.name,
            description: req.description,
            model: req.model,
            vendor: req.vendor,
            system_prompt: req.system_prompt,
            init_message: req.init_message,
            max_context: req.max_context,
            avatar_id: req.avatar_id,
            avatar_url: req.avatar_url,
            room_type: RoomType::Custom,
            last_active_time: now,
            created_at: now,
            updated_at: now,
        };

        match self.store.create(user_id, &room, true).await {
            Ok(id) => Ok(id),
            Err(StoreError::Exists) => Err(AppError::Conflict("room name already exists".to_owned())),
            Err(err) => {
                tracing::error!(user_id, "create custom room failed: {err}");
                Err(anyhow::Error::from(err).into())
            }
        }
    }

    /// Copies gallery items into rooms of `user_id`.
    ///
    /// Items whose name the user already uses are skipped; the ids of the rooms
    /// that were created are returned in request order.
    pub async fn copy_gallery_items(&self, user_id: i64, ids: &[i64]) -> AppResult<Vec<i64>> {
        let mut seen = HashSet::new();
        let ids: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|&id| id > 0 && seen.insert(id))
            .collect();
        if ids.is_empty() {
            return Err(AppError::validation("invalid ids"));
        }

        let items: HashMap<i64, GalleryRoom> = self
            .gallery
            .get_items(&ids)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        let mut copied = Vec::with_capacity(items.len());
        for id in ids {
            let Some(item) = items.get(&id) else {
                continue;
            };

            match self.store.create(user_id, &Room::from_gallery(user_id, item), true).await {
                Ok(new_id) => copied.push(new_id),
                Err(StoreError::Exists) => {
                    tracing::debug!(user_id, gallery_id = id, "room already exists, skipped");
                }
                Err(err) => {
                    tracing::error!(user_id, gallery_id = id, "copy gallery room failed: {err}");
                    return Err(anyhow::Error::from(err).into());
                }
            }
        }

        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gallery::gallery_room,
        rooms::{RoomStore, testing::{fixture, request}},
    };

    #[tokio::test]
    async fn create_makes_custom_rooms() {
        let f = fixture().await;
        let id = f.rooms.create(7, request("Coach"), &f.registry).await.unwrap();

        let room = f.store.get(7, id).await.unwrap();
        assert_eq!(room.room_type, RoomType::Custom);
        assert_eq!(room.max_context, DEFAULT_MAX_CONTEXT);
        assert_eq!(room.avatar_url, "https://cdn.example.com/gpt-4o.png");
    }

    #[tokio::test]
    async fn create_validates_max_context() {
        let f = fixture().await;
        for bad in [-1, 31] {
            let req = RoomRequest { max_context: bad, ..request("Coach") };
            assert!(matches!(f.rooms.create(7, req, &f.registry).await, Err(AppError::Validation(_))));
        }

        let req = RoomRequest { max_context: 25, ..request("Coach") };
        let id = f.rooms.create(7, req, &f.registry).await.unwrap();
        assert_eq!(f.store.get(7, id).await.unwrap().max_context, 25);
    }

    #[tokio::test]
    async fn create_keeps_explicit_avatar() {
        let f = fixture().await;
        let req = RoomRequest { avatar_url: "https://img.example.com/me.png".into(), ..request("A") };
        let id = f.rooms.create(7, req, &f.registry).await.unwrap();
        assert_eq!(f.store.get(7, id).await.unwrap().avatar_url, "https://img.example.com/me.png");

        let req = RoomRequest { avatar_id: 5, ..request("B") };
        let id = f.rooms.create(7, req, &f.registry).await.unwrap();
        let room = f.store.get(7, id).await.unwrap();
        assert_eq!(room.avatar_id, 5);
        assert_eq!(room.avatar_url, "");
    }

    #[tokio::test]
    async fn create_defaults_model_and_rejects_unknown() {
        let f = fixture().await;
        let req = RoomRequest { model: String::new(), ..request("A") };
        let id = f.rooms.create(7, req, &f.registry).await.unwrap();
        assert_eq!(f.store.get(7, id).await.unwrap().model, "gpt-4o-mini");

        let req = RoomRequest { model: "mystery".into(), ..request("B") };
        assert!(matches!(f.rooms.create(7, req, &f.registry).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn duplicate_name_is_conflict() {
        let f = fixture().await;
        f.rooms.create(7, request("Coach"), &f.registry).await.unwrap();
        assert!(matches!(
            f.rooms.create(7, request("Coach"), &f.registry).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn clone_is_partial_success() {
        let f = fixture().await;
        let taken = f.gallery.insert(&gallery_room(0, "Taken", "gpt-4o")).await.unwrap();
        let fresh = f.gallery.insert(&gallery_room(0, "Fresh", "gpt-4o")).await.unwrap();
        f.rooms.create(7, request("Taken"), &f.registry).await.unwrap();

        let copied = f
            .rooms
            .copy_gallery_items(7, &[taken, taken, -1, fresh])
            .await
            .unwrap();

        assert_eq!(copied.len(), 1);
        let room = f.store.get(7, copied[0]).await.unwrap();
        assert_eq!(room.name, "Fresh");
        assert_eq!(room.room_type, RoomType::SystemPreset);
        assert_eq!(room.system_prompt, "You are Fresh.");
        assert_eq!(room.max_context, 8);
        assert_eq!(room.avatar_id, 3);
    }

    #[tokio::test]
    async fn clone_keeps_request_order_and_skips_missing() {
        let f = fixture().await;
        let a = f.gallery.insert(&gallery_room(0, "A", "gpt-4o")).await.unwrap();
        let b = f.gallery.insert(&gallery_room(0, "B", "gpt-4o")).await.unwrap();

        let copied = f.rooms.copy_gallery_items(7, &[b, 404, a]).await.unwrap();
        let names: Vec<_> = room_names(&f.store, &copied).await;
        assert_eq!(names, vec!["B", "A"]);
    }

    async fn room_names(store: &crate::rooms::SqliteRoomStore, ids: &[i64]) -> Vec<String> {
        let mut names = Vec::new();
        for id in ids {
            names.push(store.get(7, *id).await.unwrap().name);
        }
        names
    }

    #[tokio::test]
    async fn clone_without_valid_ids_is_rejected() {
        let f = fixture().await;
        assert!(matches!(
            f.rooms.copy_gallery_items(7, &[0, -3]).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(f.rooms.copy_gallery_items(7, &[]).await, Err(AppError::Validation(_))));
    }

    #[test]
    fn parse_ids() {
        assert_eq!(parse_gallery_ids("5, 5,x,-1,7"), vec![5, 5, 0, -1, 7]);
        assert_eq!(parse_gallery_ids(""), vec![0]);
    }
}
