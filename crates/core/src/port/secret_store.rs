// Secret Store Port
// Provider credentials, keyed by account name

use crate::error::Result;
use async_trait::async_trait;

/// Account holding the Kling access key
pub const KLING_ACCESS_KEY_ACCOUNT: &str = "api_key_kling_access";

/// Account holding the Kling secret key
pub const KLING_SECRET_KEY_ACCOUNT: &str = "api_key_kling_secret";

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Load a stored value (None if the account has no value)
    async fn load(&self, account: &str) -> Result<Option<String>>;

    /// Store or replace a value
    async fn save(&self, account: &str, value: &str) -> Result<()>;

    /// Remove a value (no-op if absent)
    async fn delete(&self, account: &str) -> Result<()>;
}

/// Save `value`, or delete the account when the value is blank
pub async fn save_or_clear(store: &dyn SecretStore, account: &str, value: &str) -> Result<()> {
    let value = value.trim();
    if value.is_empty() {
        store.delete(account).await
    } else {
        store.save(account, value).await
    }
}

/// True when both Kling keys are present and non-blank
pub async fn has_kling_credentials(store: &dyn SecretStore) -> Result<bool> {
    for account in [KLING_ACCESS_KEY_ACCOUNT, KLING_SECRET_KEY_ACCOUNT] {
        let present = store
            .load(account)
            .await?
            .is_some_and(|v| !v.trim().is_empty());
        if !present {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Process-local secret store (tests, ephemeral sessions)
#[derive(Default)]
pub struct InMemorySecretStore {
    values: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kling_keys(access_key: &str, secret_key: &str) -> Self {
        let store = Self::new();
        {
            let mut values = store.values.lock().unwrap_or_else(|e| e.into_inner());
            values.insert(KLING_ACCESS_KEY_ACCOUNT.to_string(), access_key.to_string());
            values.insert(KLING_SECRET_KEY_ACCOUNT.to_string(), secret_key.to_string());
        }
        store
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn load(&self, account: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(account).cloned())
    }

    async fn save(&self, account: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(account.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, account: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.remove(account);
        Ok(())
    }
}
