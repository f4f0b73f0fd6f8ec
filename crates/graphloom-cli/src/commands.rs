use std::path::Path;

use anyhow::{Context, Result, bail};
use graphloom::schema::SchemaError;
use graphloom::{AppConfig, BuildError, SchemaSnapshot};
use serde_json::{Value, json};

use crate::cli::{AuthorizeArgs, FileArgs, SdlArgs};
use crate::output::{print_denied, print_issue, print_json, print_success};

fn read_type_defs(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn build(path: &Path, config: &AppConfig) -> Result<SchemaSnapshot> {
    let type_defs = read_type_defs(path)?;
    match graphloom::build(&type_defs, config) {
        Ok(snapshot) => Ok(snapshot),
        Err(BuildError::Schema(SchemaError::Validation(err))) => {
            for issue in &err.issues {
                print_issue(&issue.to_string());
            }
            bail!("{} has {} issue(s)", path.display(), err.len())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn sdl(args: &SdlArgs, config: &AppConfig) -> Result<()> {
    let mut config = config.clone();
    config.features.subscriptions |= args.subscriptions;
    let snapshot = build(&args.file, &config)?;
    print!("{}", snapshot.sdl);
    Ok(())
}

pub fn check(args: &FileArgs, config: &AppConfig) -> Result<()> {
    let snapshot = build(&args.file, config)?;
    print_success(&format!(
        "{}: {} entities, {} derived types, {} with authorization rules",
        args.file.display(),
        snapshot.graph.graph.entities.len(),
        snapshot.schema.len(),
        snapshot.rules.len()
    ));
    Ok(())
}

pub fn rules(args: &FileArgs, config: &AppConfig) -> Result<()> {
    let snapshot = build(&args.file, config)?;
    print_json(&serde_json::to_value(&snapshot.rules)?)
}

pub fn authorize(args: &AuthorizeArgs, config: &AppConfig) -> Result<()> {
    let snapshot = build(&args.file, config)?;
    if snapshot.graph.graph.entity(&args.entity).is_none() {
        bail!("Unknown entity: {}", args.entity);
    }

    let raw_claims = args.claims.as_deref().map(read_json).transpose()?;
    let node = match &args.node {
        Some(path) => read_json(path)?,
        None => json!({}),
    };
    let claims = snapshot.claims(raw_claims);
    tracing::debug!(
        entity = %args.entity,
        operation = %args.operation,
        authenticated = claims.is_authenticated(),
        "Evaluating rules"
    );

    if let Err(e) = snapshot.authorize(
        &args.entity,
        args.operation,
        args.when.into(),
        &claims,
        &node,
    ) {
        print_denied(&e.to_string());
        bail!("{} denied", args.operation);
    }

    let visible = snapshot.filter_nodes(
        &args.entity,
        args.operation,
        &claims,
        std::slice::from_ref(&node),
    );
    if visible.is_empty() {
        print_denied(&format!(
            "{} on `{}` allowed, but the node is hidden by filter rules",
            args.operation, args.entity
        ));
        return Ok(());
    }
    print_success(&format!("{} on `{}` allowed", args.operation, args.entity));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use graphloom::auth::AuthorizationOperation;

    use super::*;
    use crate::cli::When;

    const POSTS: &str = r#"
        type Post @authorization(validate: [{ where: { node: { authorId: "$jwt.sub" } }, operations: [READ] }]) {
            title: String
            authorId: ID!
        }
    "#;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn authorize_args(dir: &tempfile::TempDir, sub: &str) -> AuthorizeArgs {
        AuthorizeArgs {
            file: write(dir, "schema.graphql", POSTS),
            entity: "Post".into(),
            operation: AuthorizationOperation::Read,
            claims: Some(write(dir, "claims.json", &json!({ "sub": sub }).to_string())),
            node: Some(write(dir, "node.json", r#"{"title": "t", "authorId": "u1"}"#)),
            when: When::After,
        }
    }

    #[test]
    fn test_check_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let args = FileArgs {
            file: write(&dir, "schema.graphql", POSTS),
        };
        assert!(check(&args, &AppConfig::default()).is_ok());
        assert!(rules(&args, &AppConfig::default()).is_ok());
    }

    #[test]
    fn test_check_reports_issue_count() {
        let dir = tempfile::tempdir().unwrap();
        let args = FileArgs {
            file: write(&dir, "schema.graphql", "type Movie { title: Stars, year: Years }"),
        };
        let err = check(&args, &AppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("has 2 issue(s)"), "{err}");
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let args = FileArgs {
            file: dir.path().join("missing.graphql"),
        };
        let err = check(&args, &AppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_authorize_owner_and_stranger() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default();

        assert!(authorize(&authorize_args(&dir, "u1"), &config).is_ok());

        let err = authorize(&authorize_args(&dir, "u2"), &config).unwrap_err();
        assert_eq!(err.to_string(), "READ denied");
    }

    #[test]
    fn test_authorize_unknown_entity() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = authorize_args(&dir, "u1");
        args.entity = "Comment".into();
        let err = authorize(&args, &AppConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "Unknown entity: Comment");
    }
}
