//! Graphloom: compile directive-annotated GraphQL type definitions into a
//! derived API schema with compiled authorization rules.
//!
//! [`build`] runs the whole pipeline and returns an immutable
//! [`SchemaSnapshot`]. Schema and authorization problems are reported
//! together in one error. [`SchemaHandle`] serves snapshots to concurrent
//! readers and hot-reloads them.
//!
//! ```ignore
//! let config = graphloom::config::loader::load_config(None)?;
//! let handle = graphloom::SchemaHandle::build(&type_defs, &config)?;
//! println!("{}", handle.current().sdl);
//! ```

pub mod config;
pub mod error;
pub mod mutation;
pub mod snapshot;
pub mod telemetry;

pub use config::AppConfig;
pub use error::{BuildError, ConfigError};
pub use mutation::{CreatePlan, PlannedNode, plan_create};
pub use snapshot::{SchemaHandle, SchemaSnapshot};

pub use graphloom_auth as auth;
pub use graphloom_schema as schema;

use graphloom_auth::RuleSet;
use graphloom_schema::{CompiledSchema, SchemaError, SchemaValidationError};
use tracing::{debug, info};

/// Builds the first snapshot of `type_defs` under `config`.
///
/// # Errors
///
/// Returns [`BuildError::Config`] for an invalid configuration and
/// [`BuildError::Schema`] for parse errors or for the aggregated schema and
/// authorization issues.
pub fn build(type_defs: &str, config: &AppConfig) -> Result<SchemaSnapshot, BuildError> {
    config.validate().map_err(ConfigError::Invalid)?;
    let options = config.schema_options();

    let (resolved, mut issues) = graphloom_schema::analyze(type_defs, &options)?;
    let rules = if config.authorization.enabled {
        let (rules, rule_issues) = graphloom_auth::compile_rules(&resolved.graph);
        issues.extend(rule_issues);
        rules
    } else {
        debug!("Authorization disabled, skipping rule compilation");
        RuleSet::default()
    };
    SchemaValidationError::check(issues).map_err(SchemaError::from)?;

    let compiled = CompiledSchema::from_resolved(resolved, &options)?;
    info!(
        entities = compiled.graph.graph.entities.len(),
        types = compiled.schema.len(),
        rules = rules.len(),
        "Schema snapshot built"
    );
    Ok(SchemaSnapshot {
        version: 1,
        graph: compiled.graph,
        schema: compiled.schema,
        sdl: compiled.sdl,
        rules,
        claims_namespace: config.authorization.claims_namespace.clone(),
    })
}
