//! Secret store trait

/// Read-only source of API keys
///
/// The key can be a gateway adapter name (`"anthropic"`), which stores map
/// to their own naming, or a literal variable name (`"ANTHROPIC_API_KEY"`).
pub trait SecretStore: Send + Sync {
    /// Human-readable name of this store
    fn name(&self) -> &str;

    /// Retrieve a secret by key
    fn get(&self, key: &str) -> Option<String>;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

impl<T: SecretStore + ?Sized> SecretStore for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}
