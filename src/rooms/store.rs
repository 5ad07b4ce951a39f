use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::db::{self, StoreError, StoreResult};

use super::{Room, RoomStore, RoomType};

const COLUMNS: &str = "id,user_id,name,description,model,vendor,system_prompt,init_message,\
    max_context,avatar_id,avatar_url,room_type,last_active_time,created_at,updated_at";

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: i64,
    user_id: i64,
    name: String,
    description: String,
    model: String,
    vendor: String,
    system_prompt: String,
    init_message: String,
    max_context: i64,
    avatar_id: i64,
    avatar_url: String,
    room_type: i64,
    last_active_time: i64,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<RoomRow> for Room {
    type Error = StoreError;

    fn try_from(r: RoomRow) -> StoreResult<Self> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            description: r.description,
            model: r.model,
            vendor: r.vendor,
            system_prompt: r.system_prompt,
            init_message: r.init_message,
            max_context: r.max_context,
            avatar_id: r.avatar_id,
            avatar_url: r.avatar_url,
            room_type: RoomType::from_i64(r.room_type).ok_or(StoreError::UnknownRoomType(r.room_type))?,
            last_active_time: db::from_unix(r.last_active_time),
            created_at: db::from_unix(r.created_at),
            updated_at: db::from_unix(r.updated_at),
        })
    }
}

/// SQLite-backed room store.
#[derive(Clone)]
pub struct SqliteRoomStore {
    pool: SqlitePool,
}

impl SqliteRoomStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomStore for SqliteRoomStore {
    async fn create(&self, user_id: i64, room: &Room, check_name_conflict: bool) -> StoreResult<i64> {
        // name check and insert stay a single statement so concurrent writers
        // only ever wait on the busy timeout
        let sql = if check_name_conflict {
            "INSERT INTO rooms (user_id,name,description,model,vendor,system_prompt,init_message,\
             max_context,avatar_id,avatar_url,room_type,last_active_time,created_at,updated_at) \
             SELECT ?,?,?,?,?,?,?,?,?,?,?,?,?,? \
             WHERE NOT EXISTS (SELECT 1 FROM rooms WHERE user_id=? AND name=?)"
        } else {
            "INSERT INTO rooms (user_id,name,description,model,vendor,system_prompt,init_message,\
             max_context,avatar_id,avatar_url,room_type,last_active_time,created_at,updated_at) \
             VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?)"
        };

        let now = db::to_unix(db::now());
        let mut query = sqlx::query(sql)
            .bind(user_id)
            .bind(&room.name)
            .bind(&room.description)
            .bind(&room.model)
            .bind(&room.vendor)
            .bind(&room.system_prompt)
            .bind(&room.init_message)
            .bind(room.max_context)
            .bind(room.avatar_id)
            .bind(&room.avatar_url)
            .bind(room.room_type.as_i64())
            .bind(db::to_unix(room.last_active_time))
            .bind(now)
            .bind(now);
        if check_name_conflict {
            query = query.bind(user_id).bind(&room.name);
        }

        let result = query.execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Exists);
        }
        Ok(result.last_insert_rowid())
    }

    async fn get(&self, user_id: i64, id: i64) -> StoreResult<Room> {
        let row: Option<RoomRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM rooms WHERE id=? AND user_id=?"))
                .bind(id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        row.ok_or(StoreError::NotFound)?.try_into()
    }

    async fn list(&self, user_id: i64, types: &[RoomType], limit: i64) -> StoreResult<Vec<Room>> {
        if types.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM rooms WHERE user_id="));
        query.push_bind(user_id).push(" AND room_type IN (");
        let mut separated = query.separated(",");
        for ty in types {
            separated.push_bind(ty.as_i64());
        }
        separated.push_unseparated(") ORDER BY last_active_time DESC, id DESC LIMIT ");
        query.push_bind(limit);

        let rows: Vec<RoomRow> = query.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(Room::try_from).collect()
    }

    async fn update(&self, user_id: i64, id: i64, room: &Room) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE rooms SET name=?,description=?,model=?,vendor=?,system_prompt=?,init_message=?,\
             max_context=?,avatar_id=?,avatar_url=?,room_type=?,updated_at=? WHERE id=? AND user_id=?",
        )
        .bind(&room.name)
        .bind(&room.description)
        .bind(&room.model)
        .bind(&room.vendor)
        .bind(&room.system_prompt)
        .bind(&room.init_message)
        .bind(room.max_context)
        .bind(room.avatar_id)
        .bind(&room.avatar_url)
        .bind(room.room_type.as_i64())
        .bind(db::to_unix(room.updated_at))
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, user_id: i64, id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM rooms WHERE id=? AND user_id=?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn touch_active(&self, user_id: i64, id: i64) -> StoreResult<()> {
        sqlx::query("UPDATE rooms SET last_active_time=? WHERE id=? AND user_id=?")
            .bind(db::to_unix(db::now()))
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
