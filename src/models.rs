use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    #[default]
    Enabled,
    Disabled,
}

/// An entry of the live model registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub status: ModelStatus,
    /// Hidden from system gallery entries when restricted mode is active.
    #[serde(default)]
    pub restricted: bool,
    #[serde(default)]
    pub avatar_url: String,
}

impl ModelInfo {
    pub fn is_disabled(&self) -> bool {
        self.status == ModelStatus::Disabled
    }
}

/// Read-only snapshot of the model registry.
///
/// Callers own refreshing it; every operation that needs model data takes a
/// snapshot explicitly.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<ModelInfo>,
    by_id: HashMap<String, usize>,
}

impl ModelRegistry {
    pub fn new(models: Vec<ModelInfo>) -> Self {
        let mut by_id = HashMap::with_capacity(models.len());
        for (i, model) in models.iter().enumerate() {
            by_id.entry(model.id.clone()).or_insert(i);
        }
        Self { models, by_id }
    }

    pub fn list_models(&self, include_disabled: bool) -> impl Iterator<Item = &ModelInfo> {
        self.models
            .iter()
            .filter(move |m| include_disabled || !m.is_disabled())
    }

    /// Looks up a model regardless of its status.
    pub fn get(&self, id: &str) -> Option<&ModelInfo> {
        self.by_id.get(id).map(|&i| &self.models[i])
    }

    /// Default avatar of a model, if it has one.
    pub fn avatar_url(&self, id: &str) -> Option<&str> {
        self.get(id)
            .map(|m| m.avatar_url.as_str())
            .filter(|url| !url.is_empty())
    }
}

impl FromIterator<ModelInfo> for ModelRegistry {
    fn from_iter<T: IntoIterator<Item = ModelInfo>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
pub(crate) fn model(id: &str) -> ModelInfo {
    ModelInfo {
        id: id.to_owned(),
        name: id.to_owned(),
        vendor: "openai".to_owned(),
        status: ModelStatus::Enabled,
        restricted: false,
        avatar_url: format!("https://cdn.example.com/{id}.png"),
    }
}
