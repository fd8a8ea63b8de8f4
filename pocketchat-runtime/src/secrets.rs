use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use anyhow::Context;

/// Keyring service name. Changing it would orphan stored tokens.
const SERVICE: &str = "pocketchat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretKey {
    /// Overrides the token used for the chat endpoint.
    ApiToken,
}

impl SecretKey {
    fn user(self) -> &'static str {
        match self {
            SecretKey::ApiToken => "chat_api_token",
        }
    }
}

fn entry(key: SecretKey) -> anyhow::Result<keyring::Entry> {
    keyring::Entry::new(SERVICE, key.user()).context("create keyring entry")
}

fn set_secret(key: SecretKey, value: &str) -> anyhow::Result<()> {
    entry(key)?.set_password(value).context("set secret")
}

fn get_secret(key: SecretKey) -> anyhow::Result<Option<String>> {
    match entry(key)?.get_password() {
        Ok(v) if v.trim().is_empty() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(anyhow::Error::new(e)).context("get secret"),
    }
}

fn delete_secret(key: SecretKey) -> anyhow::Result<()> {
    match entry(key)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(anyhow::Error::new(e)).context("delete secret"),
    }
}

/// Where secrets live. The OS keyring in the app; memory in tests.
pub trait SecretStore: Send + Sync {
    fn set(&self, key: SecretKey, value: &str) -> anyhow::Result<()>;
    fn get(&self, key: SecretKey) -> anyhow::Result<Option<String>>;
    fn delete(&self, key: SecretKey) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringSecrets;

impl SecretStore for KeyringSecrets {
    fn set(&self, key: SecretKey, value: &str) -> anyhow::Result<()> {
        set_secret(key, value)
    }

    fn get(&self, key: SecretKey) -> anyhow::Result<Option<String>> {
        get_secret(key)
    }

    fn delete(&self, key: SecretKey) -> anyhow::Result<()> {
        delete_secret(key)
    }
}

/// Process-local store with the same blank-means-absent rule as the keyring.
#[derive(Debug, Default)]
pub struct MemorySecrets {
    values: Mutex<HashMap<SecretKey, String>>,
}

impl SecretStore for MemorySecrets {
    fn set(&self, key: SecretKey, value: &str) -> anyhow::Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.to_string());
        Ok(())
    }

    fn get(&self, key: SecretKey) -> anyhow::Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(&key).filter(|v| !v.trim().is_empty()).cloned())
    }

    fn delete(&self, key: SecretKey) -> anyhow::Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_treats_blank_as_absent() {
        let store = MemorySecrets::default();
        assert_eq!(store.get(SecretKey::ApiToken).unwrap(), None);

        store.set(SecretKey::ApiToken, "  ").unwrap();
        assert_eq!(store.get(SecretKey::ApiToken).unwrap(), None);

        store.set(SecretKey::ApiToken, "abc").unwrap();
        assert_eq!(store.get(SecretKey::ApiToken).unwrap().as_deref(), Some("abc"));

        store.delete(SecretKey::ApiToken).unwrap();
        store.delete(SecretKey::ApiToken).unwrap();
        assert_eq!(store.get(SecretKey::ApiToken).unwrap(), None);
    }

    #[test]
    fn key_names_are_stable() {
        // Only the mapping is checked; tests never touch the real keyring.
        assert_eq!(SecretKey::ApiToken.user(), "chat_api_token");
        assert_eq!(SERVICE, "pocketchat");
    }
}
