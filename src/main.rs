use anyhow::Context;
use roomforge::{
    config::RoomsConfig, db, gallery::{GalleryRoom, GalleryStore, SqliteGalleryStore},
    provider::{self, Profile}, settings::Settings,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env();
    let config = RoomsConfig::from_settings(&settings)?;

    let database_url = settings.get("DATABASE_URL").context("DATABASE_URL is not set")?;
    let db_pool = db::connect(database_url).await?;
    db::init(&db_pool).await?;

    let gallery = SqliteGalleryStore::new(db_pool);
    if let Some(path) = settings.get("GALLERY_SEED").filter(|p| !p.is_empty()) {
        let raw = tokio::fs::read_to_string(path).await.with_context(|| format!("reading {path}"))?;
        let items: Vec<GalleryRoom> = serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;

        for item in &items {
            gallery.insert(item).await?;
        }
        tracing::info!(count = items.len(), "imported gallery seed");
    }
    let gallery_size = gallery.list_all().await?.len();
    tracing::info!(
        gallery = gallery_size,
        max_rooms = config.rooms_query_limit,
        default_model = %config.default_role_model,
        "room store ready"
    );

    for profile in [Profile::Primary, Profile::Backup, Profile::ImageGeneration] {
        let resolved = provider::resolve(&settings, profile)?;
        tracing::info!(
            ?profile,
            enabled = resolved.enabled,
            azure = resolved.azure,
            servers = resolved.servers.len(),
            keys = resolved.keys.len(),
            "provider profile"
        );
    }

    Ok(())
}
