//! Graphloom schema compiler.
//!
//! Compiles directive-annotated GraphQL type definitions into a complete
//! derived API surface:
//!
//! 1. [`model`] builds the entity graph from SDL (Type Model Builder).
//! 2. [`relationships`] resolves every relationship field into a typed edge.
//! 3. [`augment`] derives filter, sort, aggregate, mutation and connection
//!    types (Schema Augmenter).
//! 4. [`sdl`] registers the derived types into a dynamic schema, which
//!    checks the type system, and prints it.
//!
//! Every stage collects issues instead of failing fast; a failed build
//! reports all of them in one [`SchemaValidationError`].
//!
//! ```ignore
//! use graphloom_schema::{BuildOptions, compile};
//!
//! let compiled = compile("type Movie { title: String }", &BuildOptions::default())?;
//! assert!(compiled.sdl.contains("type Movie"));
//! ```

pub mod augment;
pub mod config;
pub mod error;
pub mod model;
pub mod relationships;
pub mod sdl;

use tracing::debug;

pub use augment::{DerivedSchema, DerivedType, DerivedTypeKind};
pub use config::BuildOptions;
pub use error::{
    Location, RelationshipResolutionError, SchemaError, SchemaValidationError, ValidationIssue,
};
pub use model::{Entity, EntityGraph, Field, FieldRole, ScalarCategory, ScalarKind};
pub use relationships::{PropertiesBinding, RelationshipEdge, ResolvedGraph};

/// Output of a successful build.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    pub graph: ResolvedGraph,
    pub schema: DerivedSchema,
    pub sdl: String,
}

impl CompiledSchema {
    /// Derives and prints the schema for an already validated graph.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Derived`] when the derived types fail the
    /// dynamic schema's type system checks.
    pub fn from_resolved(graph: ResolvedGraph, options: &BuildOptions) -> Result<Self, SchemaError> {
        let schema = augment::augment(&graph, options);
        let sdl = sdl::print_schema(&schema, options.sort_sdl)?;
        Ok(Self { graph, schema, sdl })
    }
}

/// Parses, classifies and resolves `type_defs`, returning the resolved graph
/// together with every issue found by both stages.
///
/// # Errors
///
/// Returns [`SchemaError::Options`] for invalid options and
/// [`SchemaError::Parse`] for syntactically invalid SDL. Validation issues
/// are returned in the tuple, not as an error.
pub fn analyze(
    type_defs: &str,
    options: &BuildOptions,
) -> Result<(ResolvedGraph, Vec<ValidationIssue>), SchemaError> {
    options.validate().map_err(SchemaError::Options)?;

    let document = model::parse_type_defs(type_defs)?;
    let (graph, mut issues) = model::TypeModelBuilder::new(options).build(&document);
    debug!(
        entities = graph.entities.len(),
        issues = issues.len(),
        "Type model built"
    );

    let (resolved, resolution_issues) =
        relationships::RelationshipResolver::new(options).resolve(graph);
    issues.extend(resolution_issues);
    Ok((resolved, issues))
}

/// Compiles `type_defs` into a derived schema and its SDL.
///
/// # Errors
///
/// Returns a parse error, an options error, or one validation error listing
/// every issue found.
pub fn compile(type_defs: &str, options: &BuildOptions) -> Result<CompiledSchema, SchemaError> {
    let (resolved, issues) = analyze(type_defs, options)?;
    SchemaValidationError::check(issues)?;
    CompiledSchema::from_resolved(resolved, options)
}
