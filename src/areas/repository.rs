use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::core::config::RepositoryConfig;
use crate::errors::StoreError;
use std::cell::{RefCell, RefMut};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Name of the repository directory inside the workspace
pub const GIT_DIR: &str = ".git";

/// Everything one command needs, passed explicitly instead of living in globals
///
/// Several repositories (e.g. test fixtures) can coexist in one process.
pub struct Repository {
    path: Box<Path>,
    config: RepositoryConfig,
    writer: RefCell<Box<dyn std::io::Write>>,
    index: Arc<Mutex<Index>>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Open the repository rooted at `path`, configured from the environment
    /// and the object format recorded by `init`
    pub fn new(path: &Path, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        let config = RepositoryConfig::load_from_env(&path.join(GIT_DIR))?;
        Self::with_config(path, config, writer)
    }

    /// Fails `InvalidFormat` when `config` disagrees with the recorded object format
    pub fn with_config(
        path: &Path,
        config: RepositoryConfig,
        writer: Box<dyn std::io::Write>,
    ) -> anyhow::Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(path)?;
        }
        let path = path.canonicalize()?;
        let git_path = path.join(GIT_DIR);

        if let Some(stored) = RepositoryConfig::read_object_format(&git_path)?
            && stored != config.hash
        {
            return Err(StoreError::InvalidFormat(format!(
                "repository stores {stored} objects, {} was requested",
                config.hash
            ))
            .into());
        }

        let index = Index::new(git_path.join("index").into_boxed_path(), config.hash);
        let database = Database::new(git_path.join("objects").into_boxed_path(), config);
        let workspace = Workspace::new(path.clone().into_boxed_path());
        let refs = Refs::new(git_path.into_boxed_path());

        Ok(Repository {
            path: path.into_boxed_path(),
            config,
            writer: RefCell::new(writer),
            index: Arc::new(Mutex::new(index)),
            database,
            workspace,
            refs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn git_path(&self) -> PathBuf {
        self.path.join(GIT_DIR)
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn index(&self) -> Arc<Mutex<Index>> {
        self.index.clone()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }
}
