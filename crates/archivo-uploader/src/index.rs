//! Existing-asset index: duplicate keys already present at the current scope.
//!
//! A refresh is split into `begin` (capture a ticket), the fetch itself, and
//! `apply` (accept the response only if no later scope change superseded it).

use std::collections::HashSet;
use std::fmt;

use archivo_core::{AssetBackend, AssetRecord, BackendError, DuplicateKey, ModuleType, Scope};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexState {
    /// Never loaded for the current scope.
    Unloaded,
    Fresh,
    /// Last refresh failed; keys are whatever the previous load left behind.
    Stale { reason: String },
}

impl fmt::Display for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexState::Unloaded => f.write_str("not loaded"),
            IndexState::Fresh => f.write_str("fresh"),
            IndexState::Stale { reason } => write!(f, "stale ({})", reason),
        }
    }
}

/// Identifies one refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexTicket {
    pub scope: Scope,
    generation: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Failed to load existing assets for {scope}: {source}")]
    Fetch {
        scope: Scope,
        #[source]
        source: BackendError,
    },

    #[error("Existing-asset response for {0} arrived after a scope change and was discarded")]
    Superseded(Scope),
}

#[derive(Debug)]
pub struct ExistingAssetIndex {
    scope: Option<Scope>,
    generation: u64,
    keys: HashSet<DuplicateKey>,
    state: IndexState,
}

impl Default for ExistingAssetIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ExistingAssetIndex {
    pub fn new() -> Self {
        Self {
            scope: None,
            generation: 0,
            keys: HashSet::new(),
            state: IndexState::Unloaded,
        }
    }

    pub fn scope(&self) -> Option<Scope> {
        self.scope
    }

    pub fn state(&self) -> &IndexState {
        &self.state
    }

    pub fn is_fresh(&self) -> bool {
        self.state == IndexState::Fresh
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &DuplicateKey) -> bool {
        self.keys.contains(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.keys.iter().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        keys
    }

    /// Start a refresh for `scope`. Any ticket issued earlier becomes stale.
    pub fn begin(&mut self, scope: Scope) -> IndexTicket {
        self.generation += 1;
        if self.scope != Some(scope) {
            self.state = IndexState::Unloaded;
        }
        self.scope = Some(scope);
        IndexTicket {
            scope,
            generation: self.generation,
        }
    }

    /// Apply a fetch result. The key set is replaced wholesale on success and
    /// left untouched on failure.
    pub fn apply(
        &mut self,
        ticket: IndexTicket,
        result: Result<Vec<AssetRecord>, BackendError>,
    ) -> Result<usize, IndexError> {
        if ticket.generation != self.generation {
            return Err(IndexError::Superseded(ticket.scope));
        }

        match result {
            Ok(records) => {
                self.keys = records
                    .iter()
                    .filter_map(AssetRecord::file_name)
                    .map(|name| DuplicateKey::from_name(&name))
                    .collect();
                self.state = IndexState::Fresh;
                info!(scope = %ticket.scope, keys = self.keys.len(), "Existing-asset index loaded");
                Ok(self.keys.len())
            }
            Err(source) => {
                warn!(
                    scope = %ticket.scope,
                    error = %source,
                    "Existing-asset index fetch failed; duplicate detection may miss server files"
                );
                self.state = IndexState::Stale {
                    reason: source.to_string(),
                };
                Err(IndexError::Fetch {
                    scope: ticket.scope,
                    source,
                })
            }
        }
    }

    /// Grow the set after a successful upload so a second attempt is blocked locally.
    pub fn record_uploaded(&mut self, key: DuplicateKey) {
        self.keys.insert(key);
    }

    pub async fn refresh(
        &mut self,
        backend: &dyn AssetBackend,
        module_type: &ModuleType,
        scope: Scope,
    ) -> Result<usize, IndexError> {
        let ticket = self.begin(scope);
        let result = fetch(backend, module_type, &ticket).await;
        self.apply(ticket, result)
    }
}

/// One list query for the ticket's scope against the module's resource family.
pub async fn fetch(
    backend: &dyn AssetBackend,
    module_type: &ModuleType,
    ticket: &IndexTicket,
) -> Result<Vec<AssetRecord>, BackendError> {
    backend.list_assets(module_type, &ticket.scope).await
}
