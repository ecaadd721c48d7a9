use serde::{Deserialize, Serialize};
use std::fmt;

pub type RepositoryId = i64;
pub type ModuleId = i64;
pub type DirectoryId = i64;

/// The (repository, module, directory) triple an upload session works in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub repository: RepositoryId,
    pub module: Option<ModuleId>,
    pub directory: Option<DirectoryId>,
}

impl Scope {
    pub fn new(
        repository: RepositoryId,
        module: Option<ModuleId>,
        directory: Option<DirectoryId>,
    ) -> Self {
        Self {
            repository,
            module,
            directory,
        }
    }

    /// Query parameters for list endpoints scoped to this triple.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("repositorio", self.repository.to_string())];
        if let Some(module) = self.module {
            query.push(("modulo", module.to_string()));
        }
        if let Some(directory) = self.directory {
            query.push(("directorio", directory.to_string()));
        }
        query
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "repo={}", self.repository)?;
        match self.module {
            Some(module) => write!(f, " module={}", module)?,
            None => write!(f, " module=-")?,
        }
        match self.directory {
            Some(directory) => write!(f, " dir={}", directory),
            None => write!(f, " dir=root"),
        }
    }
}
