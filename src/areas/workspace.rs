use crate::artifacts::index::index_entry::EntryMetadata;
use anyhow::Context;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const IGNORED_PATHS: [&str; 3] = [".git", ".", ".."];

/// The working tree: the directory holding `.git`
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every file under `root` (the whole workspace when `None`), relative to
    /// the workspace and sorted
    ///
    /// A file given as `root` lists just that file.
    pub fn list_files(&self, root: Option<&Path>) -> anyhow::Result<Vec<PathBuf>> {
        let root = match root {
            Some(path) => self.absolute(path),
            None => self.path.to_path_buf(),
        };

        let metadata = std::fs::symlink_metadata(&root)
            .with_context(|| format!("pathspec '{}' did not match any files", root.display()))?;

        if !metadata.is_dir() {
            let relative = self.relative(&root)?;
            return Ok((!Self::is_ignored(&relative))
                .then_some(relative)
                .into_iter()
                .collect());
        }

        let mut files = WalkDir::new(&root)
            .into_iter()
            .filter_entry(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.path)
                    .map(|relative| !Self::is_ignored(relative))
                    .unwrap_or(true)
            })
            .filter_map(|entry| entry.ok())
            .filter(|entry| !entry.file_type().is_dir())
            .filter_map(|entry| self.relative(entry.path()).ok())
            .collect::<Vec<_>>();
        files.sort();

        Ok(files)
    }

    /// `path` relative to the workspace root (empty for the root itself)
    pub fn relative(&self, path: &Path) -> anyhow::Result<PathBuf> {
        self.absolute(path)
            .strip_prefix(&self.path)
            .map(Path::to_path_buf)
            .with_context(|| {
                format!(
                    "{} is outside repository at {}",
                    path.display(),
                    self.path.display()
                )
            })
    }

    /// Render a workspace-relative path in index form (`/`-separated)
    pub fn index_path(path: &Path) -> anyhow::Result<String> {
        let mut components = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(name) => components.push(
                    name.to_str()
                        .with_context(|| format!("path {} is not valid UTF-8", path.display()))?,
                ),
                Component::CurDir => {}
                _ => anyhow::bail!("path {} is outside the workspace", path.display()),
            }
        }

        Ok(components.join("/"))
    }

    /// File content, or the link target for a symbolic link
    pub fn read_file(&self, file_path: &Path) -> anyhow::Result<Bytes> {
        let path = self.path.join(file_path);
        let metadata = std::fs::symlink_metadata(&path)
            .with_context(|| format!("open('{}'): No such file", file_path.display()))?;

        if metadata.file_type().is_symlink() {
            let target = std::fs::read_link(&path)
                .with_context(|| format!("readlink('{}') failed", file_path.display()))?;
            return Ok(Bytes::from(target.to_string_lossy().into_owned()));
        }

        let content = std::fs::read(&path)
            .with_context(|| format!("open('{}'): Permission denied", file_path.display()))?;

        Ok(Bytes::from(content))
    }

    pub fn stat_file(&self, file_path: &Path) -> anyhow::Result<EntryMetadata> {
        let metadata = std::fs::symlink_metadata(self.path.join(file_path))
            .with_context(|| format!("stat('{}') failed", file_path.display()))?;

        EntryMetadata::try_from(&metadata)
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.path.join(path)
        };

        // resolve `..` and symlinked parents when the path exists
        joined.canonicalize().unwrap_or(joined)
    }

    fn is_ignored(path: &Path) -> bool {
        // Check if any component of the path is in IGNORED_PATHS
        path.components().any(|component| {
            if let Component::Normal(name) = component {
                IGNORED_PATHS.contains(&name.to_string_lossy().as_ref())
            } else {
                false
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;

    fn workspace(dir: &TempDir) -> Workspace {
        Workspace::new(dir.path().canonicalize().unwrap().into_boxed_path())
    }

    #[test]
    fn lists_files_sorted_without_git_dir() {
        let dir = TempDir::new().unwrap();
        dir.child("b.txt").write_str("b").unwrap();
        dir.child("a/inner.txt").write_str("i").unwrap();
        dir.child(".git/HEAD").write_str("ref: refs/heads/master").unwrap();

        let files = workspace(&dir).list_files(None).unwrap();

        assert_eq!(
            files,
            vec![PathBuf::from("a/inner.txt"), PathBuf::from("b.txt")]
        );
    }

    #[test]
    fn lists_single_file_and_subdirectory() {
        let dir = TempDir::new().unwrap();
        dir.child("a/one.txt").write_str("1").unwrap();
        dir.child("a/two.txt").write_str("2").unwrap();
        dir.child("c.txt").write_str("c").unwrap();
        let workspace = workspace(&dir);

        assert_eq!(
            workspace.list_files(Some(Path::new("c.txt"))).unwrap(),
            vec![PathBuf::from("c.txt")]
        );
        assert_eq!(workspace.list_files(Some(Path::new("a"))).unwrap().len(), 2);
        assert!(workspace.list_files(Some(Path::new("missing"))).is_err());
    }

    #[test]
    fn relative_paths_stay_inside_workspace() {
        let dir = TempDir::new().unwrap();
        dir.child("a/b.txt").write_str("b").unwrap();
        let workspace = workspace(&dir);

        assert_eq!(workspace.relative(Path::new("a/b.txt")).unwrap(), PathBuf::from("a/b.txt"));
        assert_eq!(workspace.relative(Path::new(".")).unwrap(), PathBuf::new());
        assert!(workspace.relative(Path::new("/")).is_err());
    }

    #[test]
    fn converts_paths_to_index_form() {
        assert_eq!(
            Workspace::index_path(Path::new("./dir/nested/file.rs")).unwrap(),
            "dir/nested/file.rs"
        );
        assert!(Workspace::index_path(Path::new("../outside")).is_err());
    }

    #[test]
    fn reads_bytes_and_stats_files() {
        let dir = TempDir::new().unwrap();
        dir.child("data.bin").write_binary(&[0, 159, 146, 150]).unwrap();
        let workspace = workspace(&dir);

        let content = workspace.read_file(Path::new("data.bin")).unwrap();
        let stat = workspace.stat_file(Path::new("data.bin")).unwrap();

        assert_eq!(content.as_ref(), &[0, 159, 146, 150]);
        assert_eq!(stat.size, 4);
    }
}
