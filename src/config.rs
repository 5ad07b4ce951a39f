use crate::settings::Settings;

#[derive(Debug, Clone)]
pub struct RoomsConfig {
    /// Model bound to rooms created without one.
    pub default_role_model: String,
    pub rooms_query_limit: i64,
    /// Group-chat rooms are listed only for clients newer than this.
    pub group_chat_min_version: String,
    /// Deployment runs in restricted (local models only) mode.
    pub restricted_mode: bool,
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            default_role_model: "gpt-4o-mini".to_owned(),
            rooms_query_limit: 100,
            group_chat_min_version: "1.0.6".to_owned(),
            restricted_mode: false,
        }
    }
}

impl RoomsConfig {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let default = Self::default();
        Ok(Self {
            default_role_model: settings.get_or("DEFAULT_ROLE_MODEL", &default.default_role_model),
            rooms_query_limit: settings.get_parsed("ROOMS_QUERY_LIMIT", default.rooms_query_limit)?,
            group_chat_min_version: settings
                .get_or("GROUP_CHAT_MIN_VERSION", &default.group_chat_min_version),
            restricted_mode: settings.get_bool("RESTRICTED_MODE")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let config = RoomsConfig::from_settings(&Settings::default()).unwrap();
        assert_eq!(config.default_role_model, "gpt-4o-mini");
        assert_eq!(config.rooms_query_limit, 100);
        assert_eq!(config.group_chat_min_version, "1.0.6");
        assert!(!config.restricted_mode);
    }

    #[test]
    fn overrides() {
        let settings: Settings = [
            ("DEFAULT_ROLE_MODEL", "qwen-max"),
            ("ROOMS_QUERY_LIMIT", "20"),
            ("RESTRICTED_MODE", "yes"),
        ]
        .into_iter()
        .collect();

        let config = RoomsConfig::from_settings(&settings).unwrap();
        assert_eq!(config.default_role_model, "qwen-max");
        assert_eq!(config.rooms_query_limit, 20);
        assert!(config.restricted_mode);
    }
}
