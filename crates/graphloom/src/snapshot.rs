//! Immutable, versioned build results and the hot-reload holder.
//!
//! A [`SchemaSnapshot`] is never mutated after [`build`](crate::build)
//! returns it. Readers hold an `Arc` to the snapshot they started with;
//! [`SchemaHandle::reload`] builds a replacement and swaps the pointer, so
//! in-flight requests keep a consistent view.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use graphloom_auth::{AuthorizationOperation, Claims, RequestError, RuleSet, ValidateWhen};
use graphloom_schema::{DerivedSchema, ResolvedGraph};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::BuildError;

/// One successful build.
#[derive(Debug, Clone)]
pub struct SchemaSnapshot {
    /// Starts at 1 and increases with every successful reload.
    pub version: u64,
    pub graph: ResolvedGraph,
    pub schema: DerivedSchema,
    pub sdl: String,
    /// Empty when authorization is disabled.
    pub rules: RuleSet,
    pub claims_namespace: Option<String>,
}

impl SchemaSnapshot {
    /// Claims for a request, using the configured namespace. `None` is an
    /// anonymous request.
    #[must_use]
    pub fn claims(&self, raw: Option<Value>) -> Claims {
        let claims = match raw {
            Some(raw) => Claims::new(raw),
            None => Claims::anonymous(),
        };
        claims.with_namespace(self.claims_namespace.clone())
    }

    /// Checks the `validate` rules of `entity`.
    ///
    /// # Errors
    ///
    /// Returns the request error produced by the first failing rule.
    pub fn authorize(
        &self,
        entity: &str,
        operation: AuthorizationOperation,
        when: ValidateWhen,
        claims: &Claims,
        node: &Value,
    ) -> Result<(), RequestError> {
        self.rules.authorize(entity, operation, when, claims, node)
    }

    /// Nodes of `entity` visible to the caller for `operation`.
    #[must_use]
    pub fn filter_nodes<'n>(
        &self,
        entity: &str,
        operation: AuthorizationOperation,
        claims: &Claims,
        nodes: &'n [Value],
    ) -> Vec<&'n Value> {
        self.rules.filter_nodes(entity, operation, claims, nodes)
    }
}

/// Holds the current snapshot and swaps in rebuilt ones.
#[derive(Clone)]
pub struct SchemaHandle {
    current: Arc<ArcSwap<SchemaSnapshot>>,
    next_version: Arc<AtomicU64>,
}

impl SchemaHandle {
    #[must_use]
    pub fn new(snapshot: SchemaSnapshot) -> Self {
        let next_version = Arc::new(AtomicU64::new(snapshot.version + 1));
        Self {
            current: Arc::new(ArcSwap::from_pointee(snapshot)),
            next_version,
        }
    }

    /// Builds the first snapshot.
    ///
    /// # Errors
    ///
    /// Returns the build error when `type_defs` or `config` are invalid.
    pub fn build(type_defs: &str, config: &AppConfig) -> Result<Self, BuildError> {
        Ok(Self::new(crate::build(type_defs, config)?))
    }

    /// The snapshot to use for one request.
    #[must_use]
    pub fn current(&self) -> Arc<SchemaSnapshot> {
        self.current.load_full()
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    /// Rebuilds from `type_defs` and swaps the result in.
    ///
    /// # Errors
    ///
    /// Returns the build error and keeps serving the previous snapshot.
    pub fn reload(
        &self,
        type_defs: &str,
        config: &AppConfig,
    ) -> Result<Arc<SchemaSnapshot>, BuildError> {
        match crate::build(type_defs, config) {
            Ok(mut snapshot) => {
                snapshot.version = self.next_version.fetch_add(1, Ordering::SeqCst);
                let snapshot = Arc::new(snapshot);
                let previous = self.current.swap(Arc::clone(&snapshot));
                info!(
                    previous = previous.version,
                    version = snapshot.version,
                    "Schema snapshot swapped"
                );
                Ok(snapshot)
            }
            Err(e) => {
                warn!(
                    version = self.version(),
                    error = %e,
                    "Schema reload failed, keeping current snapshot"
                );
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for SchemaHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaHandle")
            .field("version", &self.version())
            .finish()
    }
}
