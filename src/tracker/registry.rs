//! Task definition registry
//!
//! Host integrations register their task definitions here at startup so
//! publish-time handling can pick up per-definition tracking options
//! without reaching into host framework internals.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use super::TrackingOptions;

/// A registered host task and its baseline tracking options
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDefinition {
    /// Fully qualified host task name
    pub name: String,
    /// Options applied to every scheduling of this task
    pub options: TrackingOptions,
}

/// Registry of tracked task definitions
#[derive(Default)]
pub struct TaskRegistry {
    definitions: RwLock<HashMap<String, TaskDefinition>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task definition; re-registering a name replaces it
    pub fn register(&self, name: impl Into<String>, options: TrackingOptions) {
        let name = name.into();
        debug!(task_name = %name, "Task definition registered");
        let definition = TaskDefinition {
            name: name.clone(),
            options,
        };
        self.definitions.write().insert(name, definition);
    }

    /// Baseline options for a task name, if it was registered
    pub fn options_for(&self, name: &str) -> Option<TrackingOptions> {
        self.definitions
            .read()
            .get(name)
            .map(|definition| definition.options.clone())
    }

    /// Full definition for a task name
    pub fn definition(&self, name: &str) -> Option<TaskDefinition> {
        self.definitions.read().get(name).cloned()
    }

    /// Names of all registered tasks, unordered
    pub fn registered_names(&self) -> Vec<String> {
        self.definitions.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let registry = TaskRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.options_for("app.tasks.resize").is_none());

        let options = TrackingOptions {
            value_max: Some(100),
            ..Default::default()
        };
        registry.register("app.tasks.resize", options.clone());

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.options_for("app.tasks.resize"), Some(options));
        assert_eq!(
            registry.definition("app.tasks.resize").map(|d| d.name),
            Some("app.tasks.resize".to_string())
        );
    }

    #[test]
    fn test_reregister_replaces() {
        let registry = TaskRegistry::new();
        registry.register(
            "app.tasks.resize",
            TrackingOptions {
                value_max: Some(100),
                ..Default::default()
            },
        );
        registry.register(
            "app.tasks.resize",
            TrackingOptions {
                value_max: Some(500),
                ..Default::default()
            },
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.options_for("app.tasks.resize").and_then(|o| o.value_max),
            Some(500)
        );
    }

    #[test]
    fn test_registered_names() {
        let registry = TaskRegistry::new();
        registry.register("a", TrackingOptions::default());
        registry.register("b", TrackingOptions::default());

        let mut names = registry.registered_names();
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }
}
