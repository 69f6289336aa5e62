use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use apisync_core::{ArtifactCoordinate, Error, GenerationMode, PolicyDocument, Result};

/// Tracing target for output tree operations.
const TRACING_TARGET: &str = "apisync_worker::output";

/// Suffix of the hidden sibling file a document is staged in before the
/// rename.
const STAGING_SUFFIX: &str = ".tmp";

/// Git pathspec excluding staging files left behind by an interrupted write.
pub(crate) const STAGING_PATHSPEC: &str = ":(exclude,glob)**/.*.tmp";

/// Directory tree holding one YAML file per (coordinate, mode).
///
/// Paths are a pure function of the coordinate and the mode, so writing the
/// same document twice leaves identical bytes on disk. Coordinates are
/// validated at construction, which keeps every path below the root.
#[derive(Debug, Clone)]
pub struct OutputTree {
    root: PathBuf,
}

impl OutputTree {
    /// Creates a tree rooted at `root`. Nothing is created on disk yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `<root>/<group>/<artifactId>`.
    pub fn artifact_dir(&self, coordinate: &ArtifactCoordinate) -> PathBuf {
        self.root
            .join(coordinate.group())
            .join(coordinate.artifact_id())
    }

    /// Returns `<root>/<group>/<artifactId>/<version>`.
    pub fn version_dir(&self, coordinate: &ArtifactCoordinate) -> Result<PathBuf> {
        let version = coordinate.require_version()?;
        Ok(self.artifact_dir(coordinate).join(version))
    }

    /// Returns the file a mode's document is stored in.
    pub fn file_path(
        &self,
        coordinate: &ArtifactCoordinate,
        mode: GenerationMode,
    ) -> Result<PathBuf> {
        let version = coordinate.require_version()?;
        let file_name = format!(
            "{}_{}_v{}_{}.yaml",
            coordinate.group(),
            coordinate.artifact_id(),
            version,
            mode
        );
        Ok(self.version_dir(coordinate)?.join(file_name))
    }

    /// Writes one generated document, replacing any previous file.
    ///
    /// The top-level `status` field is removed first. The file is staged
    /// in a hidden sibling and renamed into place, so readers never see a
    /// partially written document.
    pub async fn write(
        &self,
        coordinate: &ArtifactCoordinate,
        mode: GenerationMode,
        document: PolicyDocument,
    ) -> Result<PathBuf> {
        let path = self.file_path(coordinate, mode)?;
        let yaml = document.without_status().to_yaml()?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| write_error("failed to create directory", parent, e))?;
        }

        let staging = staging_path(&path);

        if let Err(e) = tokio::fs::write(&staging, yaml.as_bytes()).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(write_error("failed to write file", &staging, e));
        }
        if let Err(e) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(write_error("failed to move file into place", &path, e));
        }

        tracing::debug!(
            target: TRACING_TARGET,
            coordinate = %coordinate,
            mode = %mode,
            path = %path.display(),
            bytes = yaml.len(),
            "Wrote policy document"
        );

        Ok(path)
    }

    /// Removes the subtree of one version.
    ///
    /// Returns whether anything existed.
    pub async fn delete_version(&self, coordinate: &ArtifactCoordinate) -> Result<bool> {
        let dir = self.version_dir(coordinate)?;
        remove_subtree(coordinate, &dir).await
    }

    /// Removes the subtree of an artifact and all of its versions.
    ///
    /// Only the group and artifact id of `coordinate` are used. Returns
    /// whether anything existed.
    pub async fn delete_artifact(&self, coordinate: &ArtifactCoordinate) -> Result<bool> {
        let dir = self.artifact_dir(coordinate);
        remove_subtree(coordinate, &dir).await
    }
}

/// Returns `<dir>/.<file name>.tmp` for `path`.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    if let Some(file_name) = path.file_name() {
        name.push(file_name);
    }
    name.push(STAGING_SUFFIX);
    path.with_file_name(name)
}

async fn remove_subtree(coordinate: &ArtifactCoordinate, dir: &Path) -> Result<bool> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {
            tracing::info!(
                target: TRACING_TARGET,
                coordinate = %coordinate,
                path = %dir.display(),
                "Removed policy subtree"
            );
            Ok(true)
        }
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            tracing::info!(
                target: TRACING_TARGET,
                coordinate = %coordinate,
                path = %dir.display(),
                "Nothing to remove"
            );
            Ok(false)
        }
        Err(e) => Err(write_error("failed to remove directory", dir, e)),
    }
}

fn write_error(message: &'static str, path: &Path, source: std::io::Error) -> Error {
    Error::write()
        .with_message(message)
        .with_context(path.display().to_string())
        .with_source(source)
}
