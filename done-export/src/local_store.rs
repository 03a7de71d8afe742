/// Filesystem-backed [`DocumentStore`]: writes export files below a local root
/// directory instead of a document library.
///
/// The server-relative target folder is mirrored beneath the root, so
/// `/Shared Documents/Exports` with root `./out` lands in
/// `./out/Shared Documents/Exports/`. Existing files are overwritten.
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use done_export_core::contract::{DocumentStore, FileUpload, PublishedFile, RemoteError};

#[derive(Debug, Clone)]
pub struct LocalFolderStore {
    root: PathBuf,
}

impl LocalFolderStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `folder/file_name` beneath the root. Parent or absolute
    /// components are rejected so nothing is written outside the root.
    pub fn resolve(&self, folder: &str, file_name: &str) -> Result<PathBuf, RemoteError> {
        let relative = Path::new(folder.trim_start_matches('/')).join(file_name);
        let mut path = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                other => {
                    return Err(format!(
                        "refusing to write outside {}: {:?} in {}",
                        self.root.display(),
                        other,
                        relative.display()
                    )
                    .into())
                }
            }
        }
        Ok(path)
    }
}

#[async_trait]
impl DocumentStore for LocalFolderStore {
    async fn put_file(&self, upload: FileUpload) -> Result<PublishedFile, RemoteError> {
        let path = self.resolve(&upload.folder, &upload.file_name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = upload.content.len();
        tokio::fs::write(&path, &upload.content).await?;
        tracing::info!(path = %path.display(), bytes, "Wrote export file to local folder");
        Ok(PublishedFile {
            location: path.display().to_string(),
            bytes,
        })
    }
}
