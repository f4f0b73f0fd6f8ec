//! Build options for the schema compiler.
//!
//! Options are normally produced from the `[schema]` and `[features]`
//! sections of `graphloom.toml` by the facade crate, but can be constructed
//! directly when the compiler is used as a library.

use serde::{Deserialize, Serialize};

/// Options that influence a schema build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Sort types, fields, arguments and enum values lexicographically when
    /// printing SDL. When false, declaration order is kept.
    /// Default: true
    #[serde(default = "default_sort_sdl")]
    pub sort_sdl: bool,

    /// Emit the event subscription surface.
    /// Default: false
    #[serde(default)]
    pub subscriptions: bool,

    /// Registered callback names. When set, every `@populatedBy` callback
    /// must be one of them.
    #[serde(default)]
    pub callbacks: Option<Vec<String>>,

    /// Depth of interface-to-interface relationship nesting that still gets
    /// native query support.
    /// Default: 1
    #[serde(default = "default_max_interface_nesting")]
    pub max_interface_nesting: usize,
}

fn default_sort_sdl() -> bool {
    true
}

fn default_max_interface_nesting() -> usize {
    1
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            sort_sdl: default_sort_sdl(),
            subscriptions: false,
            callbacks: None,
            max_interface_nesting: default_max_interface_nesting(),
        }
    }
}

impl BuildOptions {
    #[must_use]
    pub fn with_subscriptions(mut self, enabled: bool) -> Self {
        self.subscriptions = enabled;
        self
    }

    #[must_use]
    pub fn with_callbacks(mut self, callbacks: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.callbacks = Some(callbacks.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_sort_sdl(mut self, sort: bool) -> Self {
        self.sort_sdl = sort;
        self
    }

    /// Returns true if `name` may be used as a `@populatedBy` callback.
    #[must_use]
    pub fn is_callback_registered(&self, name: &str) -> bool {
        match &self.callbacks {
            Some(registered) => registered.iter().any(|c| c == name),
            None => true,
        }
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns an error if option values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(callbacks) = &self.callbacks
            && callbacks.iter().any(|c| c.trim().is_empty())
        {
            return Err("schema.callbacks must not contain empty names".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = BuildOptions::default();
        assert!(options.sort_sdl);
        assert!(!options.subscriptions);
        assert!(options.callbacks.is_none());
        assert_eq!(options.max_interface_nesting, 1);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_callback_registration() {
        let open = BuildOptions::default();
        assert!(open.is_callback_registered("anything"));

        let closed = BuildOptions::default().with_callbacks(["slug"]);
        assert!(closed.is_callback_registered("slug"));
        assert!(!closed.is_callback_registered("other"));
    }

    #[test]
    fn test_empty_callback_name_rejected() {
        let options = BuildOptions::default().with_callbacks([" "]);
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml = r#"
            sort_sdl = false
            callbacks = ["slug", "now"]
        "#;

        let options: BuildOptions = toml::from_str(toml).unwrap();
        assert!(!options.sort_sdl);
        assert_eq!(options.max_interface_nesting, 1);
        assert!(options.is_callback_registered("now"));
    }
}
