use crate::{AppError, AppResult, db::{self, StoreError}};

use super::{DEFAULT_ROOM_ID, Room, RoomLifecycle, RoomRequest, request::check_max_context};

/// Compares one field (or coupled group of fields) of the request with the
/// room, writes it into the room when it differs and reports whether it did.
type FieldDiff = fn(&mut Room, &RoomRequest) -> AppResult<bool>;

/// Evaluated in this order on every update.
const FIELD_DIFFS: &[(&str, FieldDiff)] = &[
    ("name", |room, req| Ok(replace(&mut room.name, &req.name))),
    ("description", |room, req| Ok(replace(&mut room.description, &req.description))),
    ("avatar", diff_avatar),
    ("model", |room, req| Ok(replace(&mut room.model, &req.model))),
    ("vendor", |room, req| Ok(replace(&mut room.vendor, &req.vendor))),
    ("system_prompt", |room, req| Ok(replace(&mut room.system_prompt, &req.system_prompt))),
    ("init_message", |room, req| Ok(replace(&mut room.init_message, &req.init_message))),
    ("max_context", diff_max_context),
];

fn replace(field: &mut String, value: &str) -> bool {
    if field == value {
        return false;
    }
    *field = value.to_owned();
    true
}

/// Avatar id and url are one unit: a new positive id clears the url, then a
/// differing url replaces it without touching the id.
fn diff_avatar(room: &mut Room, req: &RoomRequest) -> AppResult<bool> {
    let mut changed = false;

    if req.avatar_id > 0 && req.avatar_id != room.avatar_id {
        room.avatar_id = req.avatar_id;
        room.avatar_url.clear();
        changed = true;
    }

    changed |= replace(&mut room.avatar_url, &req.avatar_url);
    Ok(changed)
}

// 0 means "keep"
fn diff_max_context(room: &mut Room, req: &RoomRequest) -> AppResult<bool> {
    if req.max_context == 0 || req.max_context == room.max_context {
        return Ok(false);
    }

    check_max_context(req.max_context)?;
    room.max_context = req.max_context;
    Ok(true)
}

/// Applies every field diff; returns the names of the fields that changed.
fn apply(room: &mut Room, req: &RoomRequest) -> AppResult<Vec<&'static str>> {
    let mut changed = Vec::new();
    for (field, diff) in FIELD_DIFFS {
        if diff(room, req)? {
            changed.push(*field);
        }
    }
    Ok(changed)
}

impl RoomLifecycle {
    /// Updates a room and returns it as stored.
    ///
    /// Any effective change turns a preset room into a customized preset.
    pub async fn update(&self, user_id: i64, room_id: i64, req: RoomRequest) -> AppResult<Room> {
        let req = req.validate(&self.config.default_role_model, self.tokens.as_ref())?;

        if room_id == DEFAULT_ROOM_ID {
            return Err(AppError::NotFound("room"));
        }

        let mut room = match self.store.get(user_id, room_id).await {
            Ok(room) => room,
            Err(StoreError::NotFound) => return Err(AppError::NotFound("room")),
            Err(err) => {
                tracing::error!(user_id, room_id, "query room failed: {err}");
                return Err(anyhow::Error::from(err).into());
            }
        };

        room.user_id = user_id;
        let changed = apply(&mut room, &req)?;
        if !changed.is_empty() {
            tracing::debug!(user_id, room_id, ?changed, "room fields changed");
            room.room_type = room.room_type.after_edit();
        }
        room.updated_at = db::now();

        match self.store.update(user_id, room_id, &room).await {
            Ok(()) => Ok(room),
            Err(StoreError::NotFound) => Err(AppError::NotFound("room")),
            Err(err) => {
                tracing::error!(user_id, room_id, "update room failed: {err}");
                Err(anyhow::Error::from(err).into())
            }
        }
    }
}
