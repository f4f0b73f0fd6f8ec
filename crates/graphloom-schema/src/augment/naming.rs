//! Derived type and field naming.
//!
//! Clients hand-write queries against these names, so every rule here is
//! fixed: simple English pluralisation with no irregular plurals, and plain
//! concatenation of owner names with a kind suffix.

/// Pluralises a type name: consonant + `y` becomes `ies`, a trailing
/// `s`/`x`/`z`/`ch`/`sh` gets `es`, anything else gets `s`.
#[must_use]
pub fn pluralize(name: &str) -> String {
    let lower = name.to_ascii_lowercase();

    if let Some(stem) = name.strip_suffix(['y', 'Y']) {
        let before = stem.chars().last();
        if before.is_some_and(|c| !is_vowel(c)) {
            return format!("{stem}ies");
        }
    }
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{name}es");
    }
    format!("{name}s")
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

#[must_use]
pub fn upper_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[must_use]
pub fn lower_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Root-level names for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootNames {
    /// `movies`
    pub list: String,
    /// `moviesAggregate`
    pub aggregate: String,
    /// `moviesConnection`
    pub connection: String,
    /// `createMovies`
    pub create: String,
    /// `updateMovies`
    pub update: String,
    /// `deleteMovies`
    pub delete: String,
    /// `MoviesConnection`
    pub connection_type: String,
    /// `CreateMoviesMutationResponse`
    pub create_response: String,
    /// `UpdateMoviesMutationResponse`
    pub update_response: String,
}

impl RootNames {
    /// `plural` is the capitalised plural stem, e.g. `Movies`.
    #[must_use]
    pub fn new(plural: &str) -> Self {
        let lower = lower_first(plural);
        Self {
            aggregate: format!("{lower}Aggregate"),
            connection: format!("{lower}Connection"),
            list: lower,
            create: format!("create{plural}"),
            update: format!("update{plural}"),
            delete: format!("delete{plural}"),
            connection_type: format!("{plural}Connection"),
            create_response: format!("Create{plural}MutationResponse"),
            update_response: format!("Update{plural}MutationResponse"),
        }
    }
}

/// Names of the types derived for one relationship field.
///
/// `prefix` is `<Source><UpperField>`; `connection_prefix` is the same for the
/// outermost interface declaring the field, which owns the connection types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeNames {
    pub prefix: String,
    pub connection_prefix: String,
    pub aggregate_prefix: String,
}

impl EdgeNames {
    #[must_use]
    pub fn new(source: &str, field: &str, target: &str, connection_owner: &str) -> Self {
        let upper = upper_first(field);
        Self {
            prefix: format!("{source}{upper}"),
            connection_prefix: format!("{connection_owner}{upper}"),
            aggregate_prefix: format!("{source}{target}{upper}"),
        }
    }

    fn with(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.prefix)
    }

    #[must_use]
    pub fn connection(&self) -> String {
        format!("{}Connection", self.connection_prefix)
    }

    #[must_use]
    pub fn relationship(&self) -> String {
        format!("{}Relationship", self.connection_prefix)
    }

    #[must_use]
    pub fn connection_where(&self) -> String {
        format!("{}ConnectionWhere", self.connection_prefix)
    }

    #[must_use]
    pub fn connection_sort(&self) -> String {
        format!("{}ConnectionSort", self.connection_prefix)
    }

    #[must_use]
    pub fn properties_union(&self) -> String {
        format!("{}RelationshipProperties", self.connection_prefix)
    }

    #[must_use]
    pub fn field_input(&self) -> String {
        self.with("FieldInput")
    }

    #[must_use]
    pub fn create_field_input(&self) -> String {
        self.with("CreateFieldInput")
    }

    #[must_use]
    pub fn connect_field_input(&self) -> String {
        self.with("ConnectFieldInput")
    }

    #[must_use]
    pub fn update_field_input(&self) -> String {
        self.with("UpdateFieldInput")
    }

    #[must_use]
    pub fn update_connection_input(&self) -> String {
        self.with("UpdateConnectionInput")
    }

    #[must_use]
    pub fn delete_field_input(&self) -> String {
        self.with("DeleteFieldInput")
    }

    #[must_use]
    pub fn disconnect_field_input(&self) -> String {
        self.with("DisconnectFieldInput")
    }

    #[must_use]
    pub fn aggregate_input(&self) -> String {
        self.with("AggregateInput")
    }

    #[must_use]
    pub fn node_aggregation_where(&self) -> String {
        self.with("NodeAggregationWhereInput")
    }

    #[must_use]
    pub fn edge_create_input(&self) -> String {
        self.with("EdgeCreateInput")
    }

    #[must_use]
    pub fn edge_update_input(&self) -> String {
        self.with("EdgeUpdateInput")
    }

    #[must_use]
    pub fn edge_where(&self) -> String {
        self.with("EdgeWhere")
    }

    #[must_use]
    pub fn edge_sort(&self) -> String {
        self.with("EdgeSort")
    }

    #[must_use]
    pub fn edge_aggregation_where(&self) -> String {
        self.with("EdgeAggregationWhereInput")
    }

    #[must_use]
    pub fn aggregation_selection(&self) -> String {
        format!("{}AggregationSelection", self.aggregate_prefix)
    }

    #[must_use]
    pub fn node_aggregate_selection(&self) -> String {
        format!("{}NodeAggregateSelection", self.aggregate_prefix)
    }

    #[must_use]
    pub fn edge_aggregate_selection(&self) -> String {
        format!("{}EdgeAggregateSelection", self.aggregate_prefix)
    }

    /// Prefix for the per-member inputs of a union-typed relationship.
    #[must_use]
    pub fn member(&self, member: &str) -> Self {
        Self {
            prefix: format!("{}{member}", self.prefix),
            connection_prefix: format!("{}{member}", self.connection_prefix),
            aggregate_prefix: self.aggregate_prefix.clone(),
        }
    }

    /// Union input keyed by member: `<prefix><suffix>`, e.g. `MovieSearchCreateInput`.
    #[must_use]
    pub fn keyed(&self, suffix: &str) -> String {
        self.with(suffix)
    }
}
