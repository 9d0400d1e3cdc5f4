use dashmap::DashMap;
use std::sync::Arc;

use super::SynthesisEngine;

/// Name to engine mapping, owned by the worker and shared with every job.
///
/// Names are case-insensitive. Registering a name that is already taken keeps
/// the existing engine.
#[derive(Default)]
pub struct ProviderRegistry {
    engines: DashMap<String, Arc<dyn SynthesisEngine>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when an engine was already registered under `name`
    pub fn register(&self, name: &str, engine: Arc<dyn SynthesisEngine>) -> bool {
        let mut inserted = false;
        self.engines.entry(name.to_lowercase()).or_insert_with(|| {
            inserted = true;
            engine
        });

        if inserted {
            tracing::info!(provider = %name.to_lowercase(), "TTS provider registered");
        }
        inserted
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SynthesisEngine>> {
        self.engines
            .get(&name.to_lowercase())
            .map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.engines.contains_key(&name.to_lowercase())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engines.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}
