use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use graphloom::auth::{AuthorizationOperation, ValidateWhen};

#[derive(Parser)]
#[command(name = "graphloom")]
#[command(about = "Graphloom: compile directive-annotated GraphQL type definitions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ./graphloom.toml when present)
    #[arg(short, long, global = true, env = "GRAPHLOOM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (overrides logging.level)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the derived schema as SDL
    Sdl(SdlArgs),
    /// Report every validation issue in the type definitions
    Check(FileArgs),
    /// Print the compiled authorization rules as JSON
    Rules(FileArgs),
    /// Evaluate the authorization rules of an entity for one node
    Authorize(AuthorizeArgs),
}

#[derive(clap::Args)]
pub struct FileArgs {
    /// Type definitions file
    pub file: PathBuf,
}

#[derive(clap::Args)]
pub struct SdlArgs {
    /// Type definitions file
    pub file: PathBuf,
    /// Emit the subscription surface regardless of configuration
    #[arg(long)]
    pub subscriptions: bool,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum When {
    Before,
    #[default]
    After,
}

impl From<When> for ValidateWhen {
    fn from(value: When) -> Self {
        match value {
            When::Before => Self::Before,
            When::After => Self::After,
        }
    }
}

#[derive(clap::Args)]
pub struct AuthorizeArgs {
    /// Type definitions file
    pub file: PathBuf,
    /// Entity to authorize against
    #[arg(short, long)]
    pub entity: String,
    /// Operation, e.g. READ or CREATE_RELATIONSHIP
    #[arg(short, long)]
    pub operation: AuthorizationOperation,
    /// Claims JSON file; the request is anonymous without one
    #[arg(long)]
    pub claims: Option<PathBuf>,
    /// Candidate node JSON file
    #[arg(long)]
    pub node: Option<PathBuf>,
    /// Validation timing
    #[arg(long, default_value = "after")]
    pub when: When,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_authorize() {
        let cli = Cli::try_parse_from([
            "graphloom",
            "--log-level",
            "debug",
            "authorize",
            "schema.graphql",
            "--entity",
            "User",
            "--operation",
            "create_relationship",
            "--claims",
            "claims.json",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Commands::Authorize(args) = cli.command else {
            panic!("expected authorize");
        };
        assert_eq!(args.operation, AuthorizationOperation::CreateRelationship);
        assert!(matches!(args.when, When::After));
        assert!(args.node.is_none());
    }

    #[test]
    fn test_unknown_operation_is_rejected() {
        let result = Cli::try_parse_from([
            "graphloom",
            "authorize",
            "schema.graphql",
            "--entity",
            "User",
            "--operation",
            "PUBLISH",
        ]);
        assert!(result.is_err());
    }
}
