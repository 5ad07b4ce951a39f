use std::collections::HashMap;

use anyhow::{Context, bail};

/// Flat key/value settings snapshot.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    /// Snapshot of the process environment, after loading `.env` if present.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        std::env::vars().collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.trim())
    }

    pub fn get_str(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_owned()
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(v) if !v.is_empty() => v.to_owned(),
            _ => default.to_owned(),
        }
    }

    /// Missing or blank keys read as `false`.
    pub fn get_bool(&self, key: &str) -> anyhow::Result<bool> {
        let Some(raw) = self.get(key).filter(|v| !v.is_empty()) else {
            return Ok(false);
        };

        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => bail!("{key}: expected a boolean, got {raw:?}"),
        }
    }

    pub fn get_parsed<T>(&self, key: &str, default: T) -> anyhow::Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(key).filter(|v| !v.is_empty()) {
            Some(raw) => raw.parse().with_context(|| format!("{key}: invalid value {raw:?}")),
            None => Ok(default),
        }
    }

    /// Comma-separated list, trimmed, blanks dropped, order kept.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Settings {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
