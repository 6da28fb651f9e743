use crate::domain::api_key::{ApiKey, Permission};
use crate::error::{AppError, Result};
use crate::storage::ApiKeyStore;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct ApiKeyService {
    keys: Arc<dyn ApiKeyStore>,
}

impl ApiKeyService {
    #[must_use]
    pub fn new(keys: Arc<dyn ApiKeyStore>) -> Self {
        Self { keys }
    }

    /// Resolves an active key that grants `permission`.
    ///
    /// # Errors
    /// `Forbidden` when the header is missing, the key is unknown or inactive, or lacks the permission.
    pub async fn authorize(&self, key: Option<&str>, permission: Permission) -> Result<ApiKey> {
        let key = key.ok_or_else(|| AppError::forbidden("Forbidden Error"))?;
        let api_key = self
            .keys
            .find(key)
            .await?
            .filter(|api_key| api_key.active)
            .ok_or_else(|| AppError::forbidden("Forbidden Error"))?;
        if !api_key.allows(permission) {
            return Err(AppError::forbidden("Permission denied"));
        }
        Ok(api_key)
    }

    /// Registers `key` with the basic permission unless it already exists.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the insert fails.
    pub async fn ensure_basic(&self, key: &str) -> Result<()> {
        self.keys.ensure(ApiKey { key: key.to_string(), active: true, permissions: vec![Permission::Basic] }).await
    }
}
