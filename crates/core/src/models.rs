use serde::{Deserialize, Serialize};

/// A model the hosted service can route prompts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    /// Advertised list price. Display only; billed cost comes from the server.
    pub cost_per_token: f64,
}

impl ModelInfo {
    pub fn new(id: &str, name: &str, cost_per_token: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            cost_per_token,
        }
    }
}

/// Known models, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRegistry {
    models: Vec<ModelInfo>,
}

impl ModelRegistry {
    pub const DEFAULT_MODEL: &'static str = "gpt-3.5-turbo";

    /// Models served by the hosted backend.
    pub fn builtin() -> Self {
        Self {
            models: vec![
                ModelInfo::new("gpt-3.5-turbo", "GPT-3.5 Turbo", 0.000002),
                ModelInfo::new("gpt-4", "GPT-4", 0.000045),
                ModelInfo::new("claude-2", "Claude 2", 0.000011),
                ModelInfo::new("llama-2-70b", "Llama 2 70B", 0.000009),
            ],
        }
    }

    /// Built-in models plus `extra`. An extra entry with a known id replaces it.
    pub fn with_extra(extra: impl IntoIterator<Item = ModelInfo>) -> Self {
        let mut registry = Self::builtin();
        for model in extra {
            registry.insert(model);
        }
        registry
    }

    pub fn insert(&mut self, model: ModelInfo) {
        match self.models.iter_mut().find(|m| m.id == model.id) {
            Some(existing) => *existing = model,
            None => self.models.push(model),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ModelInfo> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelInfo> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_contains_default_model() {
        let registry = ModelRegistry::builtin();
        assert_eq!(registry.len(), 4);
        assert!(registry.get(ModelRegistry::DEFAULT_MODEL).is_some());
        assert_eq!(registry.iter().next().unwrap().id, "gpt-3.5-turbo");
    }

    #[test]
    fn extra_models_append_or_replace() {
        let registry = ModelRegistry::with_extra([
            ModelInfo::new("gpt-4", "GPT-4 (team)", 0.00003),
            ModelInfo::new("mistral-7b", "Mistral 7B", 0.000001),
        ]);
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.get("gpt-4").unwrap().name, "GPT-4 (team)");
        assert_eq!(registry.iter().last().unwrap().id, "mistral-7b");
    }
}
