use std::path::{Path, PathBuf};

use anyhow::Context;
use galay_domain::SessionId;
use tracing::debug;

/// Persists the conversation id between runs so the service keeps memory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.galay/chat_session`, or `./.galay/chat_session` without a home
    /// directory.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(".galay"))
            .unwrap_or(PathBuf::from(".").join(".galay"))
            .join("chat_session")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored id, creating and saving a new one when there is
    /// none.
    pub async fn load_or_create(&self) -> anyhow::Result<SessionId> {
        if let Some(id) = self.load().await? {
            return Ok(id);
        }
        let id = SessionId::generate();
        self.save(&id).await?;
        debug!(session = %id, path = %self.path.display(), "Created chat session");
        Ok(id)
    }

    pub async fn load(&self) -> anyhow::Result<Option<SessionId>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let id = content.trim();
                Ok((!id.is_empty()).then(|| SessionId::new(id)))
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error)
                .with_context(|| format!("Failed to read session file {}", self.path.display())),
        }
    }

    pub async fn save(&self, id: &SessionId) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&self.path, id.as_str())
            .await
            .with_context(|| format!("Failed to write session file {}", self.path.display()))
    }

    /// Forgets the stored id. Missing files are not an error.
    pub async fn clear(&self) -> anyhow::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error)
                .with_context(|| format!("Failed to remove session file {}", self.path.display())),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_load_or_create_persists_new_id() {
        let root = tempdir().unwrap();
        let fixture = SessionStore::new(root.path().join("nested/chat_session"));

        let first = fixture.load_or_create().await.unwrap();
        let second = fixture.load_or_create().await.unwrap();

        assert!(first.as_str().starts_with("session_"));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_save_overwrites_and_trims() {
        let root = tempdir().unwrap();
        let fixture = SessionStore::new(root.path().join("chat_session"));
        fixture.save(&SessionId::new("a")).await.unwrap();
        fixture.save(&SessionId::new("b")).await.unwrap();
        std::fs::write(fixture.path(), "b\n").unwrap();

        let actual = fixture.load().await.unwrap();
        let expected = Some(SessionId::new("b"));
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_clear_forgets_session() {
        let root = tempdir().unwrap();
        let fixture = SessionStore::new(root.path().join("chat_session"));
        fixture.save(&SessionId::new("a")).await.unwrap();

        fixture.clear().await.unwrap();
        fixture.clear().await.unwrap();

        assert_eq!(fixture.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_file_counts_as_missing() {
        let root = tempdir().unwrap();
        let fixture = SessionStore::new(root.path().join("chat_session"));
        std::fs::write(fixture.path(), "  \n").unwrap();

        assert_eq!(fixture.load().await.unwrap(), None);
    }

    #[test]
    fn test_default_path_ends_with_chat_session() {
        let actual = SessionStore::default_path();
        assert!(actual.ends_with(".galay/chat_session"));
    }
}
