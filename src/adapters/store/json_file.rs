use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::StoreDocument;
use crate::domain::{AgentSettings, UserId, UserSettings, WalletRecord};
use crate::ports::{StoreError, WalletStore};

/// Store backed by a JSON document on disk.
///
/// The file is re-read on every call, so edits made by the chat layer are
/// seen at the next settings check without restarting controllers.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<StoreDocument, StoreError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        if contents.trim().is_empty() {
            return Ok(StoreDocument::default());
        }
        Ok(serde_json::from_str(&contents)?)
    }
}

#[async_trait]
impl WalletStore for JsonFileStore {
    async fn agent_settings(
        &self,
        user: &UserId,
        agent: &str,
    ) -> Result<AgentSettings, StoreError> {
        Ok(self.load().await?.agent_settings(user, agent))
    }

    async fn user_settings(&self, user: &UserId) -> Result<UserSettings, StoreError> {
        Ok(self.load().await?.user_settings(user))
    }

    async fn user_wallets(&self, user: &UserId) -> Result<Vec<WalletRecord>, StoreError> {
        Ok(self.load().await?.user_wallets(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DOC: &str = r#"{
        "users": {
            "42": {
                "settings": { "token_address": "Mint111", "withdraw_address": "" },
                "wallets": [
                    { "index": 1, "base58_key": "agentkey", "role": "agent", "agent_name": "alpha" },
                    { "index": 0, "base58_key": "rootkey", "role": "root" }
                ],
                "agents": { "alpha": { "fixed_buy": 0.01, "fixed_rest_delay": 4 } }
            }
        }
    }"#;

    fn write_doc(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_reads_document() {
        let file = write_doc(DOC);
        let store = JsonFileStore::new(file.path());
        let user = UserId::new("42");

        let settings = store.user_settings(&user).await.unwrap();
        assert_eq!(settings.token(), Some("Mint111"));
        assert!(settings.withdraw_destination().is_none());

        let wallets = store.user_wallets(&user).await.unwrap();
        assert!(wallets[0].is_root());
        assert_eq!(wallets[1].label(), "alpha");

        let agent = store.agent_settings(&user, "alpha").await.unwrap();
        assert_eq!(agent.fixed_buy, dec!(0.01));
        assert_eq!(agent.fixed_rest_delay, 4);
        assert!(agent.sell_enabled);
    }

    #[tokio::test]
    async fn test_rereads_on_every_call() {
        let file = write_doc(DOC);
        let store = JsonFileStore::new(file.path());
        let user = UserId::new("42");
        assert!(store.agent_settings(&user, "alpha").await.unwrap().is_buy_configured());

        std::fs::write(file.path(), DOC.replace("0.01", "0")).unwrap();
        assert!(!store.agent_settings(&user, "alpha").await.unwrap().is_buy_configured());
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let store = JsonFileStore::new("/nonexistent/lynx-store.json");
        let result = store.user_settings(&UserId::new("1")).await;
        assert!(matches!(result, Err(StoreError::Io(_))));
    }

    #[tokio::test]
    async fn test_malformed_file_is_error() {
        let file = write_doc("{ not json");
        let store = JsonFileStore::new(file.path());
        let result = store.user_wallets(&UserId::new("1")).await;
        assert!(matches!(result, Err(StoreError::Parse(_))));
    }

    #[tokio::test]
    async fn test_empty_file_is_empty_store() {
        let file = write_doc("");
        let store = JsonFileStore::new(file.path());
        assert!(store.user_wallets(&UserId::new("1")).await.unwrap().is_empty());
    }
}
