use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::models::FavoriteList;
use crate::utils::error::AppError;

/// The flat JSON file holding the single favorites record.
#[derive(Debug, Clone)]
pub struct FavoritesStore {
    path: PathBuf,
}

impl FavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validates, then overwrites the whole file.
    pub async fn save(&self, list: &FavoriteList) -> Result<(), AppError> {
        list.validate()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // serde_json writes non-ASCII as-is, so fruit names stay readable.
        let json = serde_json::to_string_pretty(list)?;
        tokio::fs::write(&self.path, json).await?;

        tracing::info!(
            path = %self.path.display(),
            email = %list.email,
            fruits = list.fruits.len(),
            "Saved favorites"
        );
        Ok(())
    }

    /// `None` when nothing has been saved yet.
    pub async fn load(&self) -> Result<Option<FavoriteList>, AppError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let list: FavoriteList = serde_json::from_str(&contents)?;
        Ok(Some(list))
    }
}
