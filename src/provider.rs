use std::fmt;

use serde::Serialize;

use crate::settings::Settings;

/// Feature that needs an AI backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Primary,
    Backup,
    ImageGeneration,
}

/// Effective provider configuration for one profile.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderConfig {
    pub enabled: bool,
    pub azure: bool,
    pub api_version: String,
    pub organization: String,
    pub servers: Vec<String>,
    #[serde(skip_serializing)]
    pub keys: Vec<String>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("enabled", &self.enabled)
            .field("azure", &self.azure)
            .field("api_version", &self.api_version)
            .field("organization", &self.organization)
            .field("servers", &self.servers)
            .field("keys", &format_args!("[{} redacted]", self.keys.len()))
            .finish()
    }
}

/// Setting keys of one settings group.
struct Keys {
    enabled: &'static str,
    azure: &'static str,
    api_version: &'static str,
    organization: &'static str,
    servers: &'static str,
    keys: &'static str,
}

const PRIMARY: Keys = Keys {
    enabled: "OPENAI_ENABLED",
    azure: "OPENAI_AZURE",
    api_version: "OPENAI_API_VERSION",
    organization: "OPENAI_ORGANIZATION",
    servers: "OPENAI_SERVERS",
    keys: "OPENAI_KEYS",
};

const BACKUP: Keys = Keys {
    enabled: "FALLBACK_OPENAI_ENABLED",
    azure: "FALLBACK_OPENAI_AZURE",
    api_version: "FALLBACK_OPENAI_API_VERSION",
    organization: "FALLBACK_OPENAI_ORGANIZATION",
    servers: "FALLBACK_OPENAI_SERVERS",
    keys: "FALLBACK_OPENAI_KEYS",
};

const IMAGE: Keys = Keys {
    enabled: "OPENAI_DALLE_ENABLED",
    azure: "OPENAI_DALLE_AZURE",
    api_version: "OPENAI_DALLE_API_VERSION",
    organization: "OPENAI_DALLE_ORGANIZATION",
    servers: "OPENAI_DALLE_SERVERS",
    keys: "OPENAI_DALLE_KEYS",
};

const IMAGE_USES_PRIMARY: &str = "DALLE_USING_OPENAI_SETTING";

fn read_group(settings: &Settings, keys: &Keys) -> anyhow::Result<ProviderConfig> {
    Ok(ProviderConfig {
        enabled: settings.get_bool(keys.enabled)?,
        azure: settings.get_bool(keys.azure)?,
        api_version: settings.get_str(keys.api_version),
        organization: settings.get_str(keys.organization),
        servers: settings.get_list(keys.servers),
        keys: settings.get_list(keys.keys),
    })
}

/// Resolves the provider configuration for `profile`.
///
/// Pure; settings may change at runtime so results are never cached.
pub fn resolve(settings: &Settings, profile: Profile) -> anyhow::Result<ProviderConfig> {
    match profile {
        Profile::Primary => read_group(settings, &PRIMARY),
        Profile::Backup => read_group(settings, &BACKUP),
        Profile::ImageGeneration => {
            if settings.get_bool(IMAGE_USES_PRIMARY)? {
                let image_enabled = settings.get_bool(IMAGE.enabled)?;
                let primary = read_group(settings, &PRIMARY)?;
                Ok(ProviderConfig {
                    enabled: primary.enabled && image_enabled,
                    ..primary
                })
            } else {
                read_group(settings, &IMAGE)
            }
        }
    }
}
