//! Request-scoped claims and context values.

use serde_json::Value;

/// Claims of the current request, plus the request context that
/// `$context.<path>` references read from.
///
/// Anonymous requests carry no claims. Lookups are by dotted path
/// (`org.id` reads `{"org": {"id": ...}}`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Claims {
    raw: Option<Value>,
    namespace: Option<String>,
    context: Value,
}

impl Claims {
    /// Claims decoded from an authenticated request.
    #[must_use]
    pub fn new(raw: Value) -> Self {
        Self {
            raw: Some(raw),
            namespace: None,
            context: Value::Null,
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Prefix tried on the first path segment before the plain key.
    #[must_use]
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace.filter(|n| !n.is_empty());
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.raw.is_some()
    }

    /// Claim value at `path`. Missing claims and explicit nulls are `None`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let raw = self.raw.as_ref()?;
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        let root = self
            .namespace
            .as_ref()
            .and_then(|ns| raw.get(format!("{ns}{head}")))
            .or_else(|| raw.get(head))?;
        match rest {
            Some(rest) => lookup(root, rest),
            None => non_null(root),
        }
    }

    /// Context value at `path`.
    #[must_use]
    pub fn context(&self, path: &str) -> Option<&Value> {
        lookup(&self.context, path)
    }
}

/// Follows a dotted path through nested objects.
#[must_use]
pub fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.get(segment))
        .and_then(non_null)
}

fn non_null(value: &Value) -> Option<&Value> {
    (!value.is_null()).then_some(value)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_dotted_lookup() {
        let claims = Claims::new(json!({"sub": "u1", "org": {"id": "o1", "name": null}}));
        assert_eq!(claims.get("sub"), Some(&json!("u1")));
        assert_eq!(claims.get("org.id"), Some(&json!("o1")));
        assert_eq!(claims.get("org.name"), None);
        assert_eq!(claims.get("org.missing"), None);
        assert!(claims.is_authenticated());
    }

    #[test]
    fn test_namespace_prefers_prefixed_key() {
        let claims = Claims::new(json!({
            "https://example.com/roles": ["admin"],
            "roles": ["user"],
            "sub": "u1"
        }))
        .with_namespace(Some("https://example.com/".into()));

        assert_eq!(claims.get("roles"), Some(&json!(["admin"])));
        assert_eq!(claims.get("sub"), Some(&json!("u1")));
    }

    #[test]
    fn test_anonymous_has_no_claims() {
        let claims = Claims::anonymous().with_context(json!({"tenant": "t1"}));
        assert!(!claims.is_authenticated());
        assert_eq!(claims.get("sub"), None);
        assert_eq!(claims.context("tenant"), Some(&json!("t1")));
    }
}
