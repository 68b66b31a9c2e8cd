// Folder Bookmark Port
// Remembers the output directory chosen by the user

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Remember the output folder
    async fn save(&self, path: &Path) -> Result<()>;

    /// Stored output folder, None if unset or the folder no longer exists
    async fn load(&self) -> Result<Option<PathBuf>>;
}
