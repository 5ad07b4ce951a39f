use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::db::{StoreError, StoreResult};

use super::{GalleryRoom, GalleryStore};

const COLUMNS: &str = "id,name,description,model,vendor,prompt,init_message,max_context,\
    avatar_id,avatar_url,room_type,tags,version_min,version_max";

#[derive(sqlx::FromRow)]
struct GalleryRow {
    id: i64,
    name: String,
    description: String,
    model: String,
    vendor: String,
    prompt: String,
    init_message: String,
    max_context: i64,
    avatar_id: i64,
    avatar_url: String,
    room_type: String,
    tags: String,
    version_min: String,
    version_max: String,
}

impl TryFrom<GalleryRow> for GalleryRoom {
    type Error = StoreError;

    fn try_from(r: GalleryRow) -> StoreResult<Self> {
        Ok(Self {
            id: r.id,
            name: r.name,
            description: r.description,
            model: r.model,
            vendor: r.vendor,
            prompt: r.prompt,
            init_message: r.init_message,
            max_context: r.max_context,
            avatar_id: r.avatar_id,
            avatar_url: r.avatar_url,
            room_type: r.room_type,
            tags: serde_json::from_str(&r.tags)?,
            version_min: r.version_min,
            version_max: r.version_max,
        })
    }
}

fn decode(rows: Vec<GalleryRow>) -> StoreResult<Vec<GalleryRoom>> {
    rows.into_iter().map(GalleryRoom::try_from).collect()
}

/// SQLite-backed gallery catalog.
#[derive(Clone)]
pub struct SqliteGalleryStore {
    pool: SqlitePool,
}

impl SqliteGalleryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Adds a catalog entry; the stored id is assigned by the database.
    pub async fn insert(&self, item: &GalleryRoom) -> StoreResult<i64> {
        let result = sqlx::query(
            "INSERT INTO room_galleries (name,description,model,vendor,prompt,init_message,max_context,\
             avatar_id,avatar_url,room_type,tags,version_min,version_max) VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?)",
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.model)
        .bind(&item.vendor)
        .bind(&item.prompt)
        .bind(&item.init_message)
        .bind(item.max_context)
        .bind(item.avatar_id)
        .bind(&item.avatar_url)
        .bind(&item.room_type)
        .bind(serde_json::to_string(&item.tags)?)
        .bind(&item.version_min)
        .bind(&item.version_max)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}

#[async_trait]
impl GalleryStore for SqliteGalleryStore {
    async fn list_all(&self) -> StoreResult<Vec<GalleryRoom>> {
        let rows: Vec<GalleryRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM room_galleries ORDER BY id ASC"))
                .fetch_all(&self.pool)
                .await?;
        decode(rows)
    }

    async fn get(&self, id: i64) -> StoreResult<GalleryRoom> {
        let row: Option<GalleryRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM room_galleries WHERE id=?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.ok_or(StoreError::NotFound)?.try_into()
    }

    async fn get_many(&self, ids: &[i64]) -> StoreResult<Vec<GalleryRoom>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {COLUMNS} FROM room_galleries WHERE id IN ("
        ));
        let mut separated = query.separated(",");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY id ASC");

        let rows: Vec<GalleryRow> = query.build_query_as().fetch_all(&self.pool).await?;
        decode(rows)
    }
}
