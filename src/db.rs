use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use time::OffsetDateTime;

/// Failures reported by the room and gallery stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("a room with this name already exists")]
    Exists,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("malformed column: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unknown room type {0}")]
    UnknownRoomType(i64),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub async fn connect(url: &str) -> sqlx::Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(16)
        .connect(url)
        .await
}

// rooms: unique (id); name unique per user_id, checked by the store
// room_galleries: unique (id)
pub async fn init(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS rooms (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id          INTEGER NOT NULL,
            name             TEXT NOT NULL,
            description      TEXT NOT NULL DEFAULT '',
            model            TEXT NOT NULL,
            vendor           TEXT NOT NULL DEFAULT '',
            system_prompt    TEXT NOT NULL DEFAULT '',
            init_message     TEXT NOT NULL DEFAULT '',
            max_context      INTEGER NOT NULL DEFAULT 10,
            avatar_id        INTEGER NOT NULL DEFAULT 0,
            avatar_url       TEXT NOT NULL DEFAULT '',
            room_type        INTEGER NOT NULL,
            last_active_time INTEGER NOT NULL,
            created_at       INTEGER NOT NULL,
            updated_at       INTEGER NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_rooms_user ON rooms (user_id, room_type)")
        .execute(pool)
        .await?;

    // id 1 is the built-in default room, stored rooms start at 2
    sqlx::query(
        "INSERT INTO sqlite_sequence (name, seq) SELECT 'rooms', 1 \
         WHERE NOT EXISTS (SELECT 1 FROM sqlite_sequence WHERE name='rooms')",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS room_galleries (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            name          TEXT NOT NULL,
            description   TEXT NOT NULL DEFAULT '',
            model         TEXT NOT NULL,
            vendor        TEXT NOT NULL DEFAULT '',
            prompt        TEXT NOT NULL DEFAULT '',
            init_message  TEXT NOT NULL DEFAULT '',
            max_context   INTEGER NOT NULL DEFAULT 10,
            avatar_id     INTEGER NOT NULL DEFAULT 0,
            avatar_url    TEXT NOT NULL DEFAULT '',
            room_type     TEXT NOT NULL DEFAULT 'system',
            tags          TEXT NOT NULL DEFAULT '[]',
            version_min   TEXT NOT NULL DEFAULT '',
            version_max   TEXT NOT NULL DEFAULT ''
        )"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub(crate) fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub(crate) fn to_unix(ts: OffsetDateTime) -> i64 {
    ts.unix_timestamp()
}

pub(crate) fn from_unix(secs: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(secs).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// Single-connection in-memory database; a larger pool would hand out
/// separate empty databases.
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init(&pool).await.unwrap();
    pool
}
