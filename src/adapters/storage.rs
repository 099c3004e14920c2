use crate::core::Storage;
use crate::utils::error::Result;
use std::ffi::OsString;
use std::path::PathBuf;

/// Writes report bundles into a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    output_dir: PathBuf,
}

impl LocalStorage {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn resolve(&self, filename: &str) -> PathBuf {
        self.output_dir.join(filename)
    }
}

impl Storage for LocalStorage {
    /// The bundle is staged as `<name>.partial` and renamed into place, so an
    /// existing report is only replaced by a complete one.
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let target = self.resolve(path);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut staged_name = target
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("bundle"));
        staged_name.push(".partial");
        let staged = target.with_file_name(staged_name);

        tokio::fs::write(&staged, data).await?;
        if let Err(e) = tokio::fs::rename(&staged, &target).await {
            let _ = tokio::fs::remove_file(&staged).await;
            return Err(e.into());
        }

        tracing::debug!("Wrote {} bytes to {}", data.len(), target.display());
        Ok(())
    }
}
