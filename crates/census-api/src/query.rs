//! Census query builder
//!
//! A [`Query`] describes one top-level request against a collection,
//! including its search terms, query commands (`c:*` parameters) and any
//! joined sub-queries. URLs are generated by [`Query::url`].

use std::fmt;

/// Namespace used when none is given
pub const DEFAULT_NAMESPACE: &str = "ps2:v2";

/// Comparison applied by a search term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchModifier {
    #[default]
    EqualTo,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    StartsWith,
    Contains,
    NotEqual,
}

impl SearchModifier {
    /// The literal prepended to the value in the query string
    pub fn literal(&self) -> &'static str {
        match self {
            Self::EqualTo => "",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "[",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => "]",
            Self::StartsWith => "^",
            Self::Contains => "*",
            Self::NotEqual => "!",
        }
    }

    /// Parse a modifier from the first character of an API literal
    pub fn from_literal(c: char) -> Option<Self> {
        match c {
            '<' => Some(Self::LessThan),
            '[' => Some(Self::LessThanOrEqual),
            '>' => Some(Self::GreaterThan),
            ']' => Some(Self::GreaterThanOrEqual),
            '^' => Some(Self::StartsWith),
            '*' => Some(Self::Contains),
            '!' => Some(Self::NotEqual),
            _ => None,
        }
    }
}

/// A single field filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub field: String,
    pub value: String,
    pub modifier: SearchModifier,
}

impl Term {
    pub fn new(field: impl Into<String>, value: impl ToString) -> Self {
        Self {
            field: field.into(),
            value: value.to_string(),
            modifier: SearchModifier::EqualTo,
        }
    }

    pub fn with_modifier(mut self, modifier: SearchModifier) -> Self {
        self.modifier = modifier;
        self
    }

    /// Build a term from a value that may start with a modifier literal,
    /// e.g. `("battle_rank.value", ">100")`
    pub fn infer(field: impl Into<String>, value: &str) -> Self {
        let mut chars = value.chars();
        match chars.next().and_then(SearchModifier::from_literal) {
            Some(modifier) => Self::new(field, chars.as_str()).with_modifier(modifier),
            None => Self::new(field, value),
        }
    }

    /// The value as sent to the API, including the modifier literal
    pub fn query_value(&self) -> String {
        format!("{}{}", self.modifier.literal(), self.value)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field, self.query_value())
    }
}

/// Sort key with direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub ascending: bool,
}

/// Tree transformation of the result list (`c:tree`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    pub field: String,
    pub is_list: bool,
    pub prefix: Option<String>,
    pub start: Option<String>,
}

/// A joined sub-query (`c:join`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub collection: String,
    pub on: Option<String>,
    pub to: Option<String>,
    pub is_list: bool,
    pub is_outer: bool,
    pub show: Vec<String>,
    pub hide: Vec<String>,
    pub inject_at: Option<String>,
    pub terms: Vec<Term>,
    pub joins: Vec<Join>,
}

impl Join {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            on: None,
            to: None,
            is_list: false,
            is_outer: true,
            show: Vec::new(),
            hide: Vec::new(),
            inject_at: None,
            terms: Vec::new(),
            joins: Vec::new(),
        }
    }

    /// Field of the parent collection to join on
    pub fn on(mut self, field: impl Into<String>) -> Self {
        self.on = Some(field.into());
        self
    }

    /// Field of the joined collection to match against
    pub fn to(mut self, field: impl Into<String>) -> Self {
        self.to = Some(field.into());
        self
    }

    /// Set both the parent and child field
    pub fn fields(self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.on(field.clone()).to(field)
    }

    pub fn list(mut self, is_list: bool) -> Self {
        self.is_list = is_list;
        self
    }

    pub fn outer(mut self, is_outer: bool) -> Self {
        self.is_outer = is_outer;
        self
    }

    pub fn show(mut self, field: impl Into<String>) -> Self {
        self.show.push(field.into());
        self
    }

    pub fn hide(mut self, field: impl Into<String>) -> Self {
        self.hide.push(field.into());
        self
    }

    pub fn inject_at(mut self, name: impl Into<String>) -> Self {
        self.inject_at = Some(name.into());
        self
    }

    pub fn term(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Key under which the API nests the joined payload in each parent
    /// element, e.g. `faction_id_join_faction`
    pub fn payload_key(&self) -> Option<String> {
        self.on
            .as_ref()
            .map(|on| format!("{}_join_{}", on, self.collection))
    }

    /// Serialise the join into its `c:join` representation.
    ///
    /// Values left at their defaults are omitted unless `verbose` is set.
    pub fn serialise(&self, verbose: bool) -> String {
        let mut out = String::new();
        if verbose {
            out.push_str("type:");
        }
        out.push_str(&self.collection);
        if let Some(on) = &self.on {
            out.push_str(&format!("^on:{}", on));
        }
        if let Some(to) = &self.to {
            out.push_str(&format!("^to:{}", to));
        }
        if self.is_list || verbose {
            out.push_str(if self.is_list { "^list:1" } else { "^list:0" });
        }
        if !self.is_outer || verbose {
            out.push_str(if self.is_outer { "^outer:1" } else { "^outer:0" });
        }
        if !self.show.is_empty() {
            out.push_str(&format!("^show:{}", self.show.join("'")));
        } else if !self.hide.is_empty() {
            out.push_str(&format!("^hide:{}", self.hide.join("'")));
        }
        if let Some(name) = &self.inject_at {
            out.push_str(&format!("^inject_at:{}", name));
        }
        if !self.terms.is_empty() {
            let terms: Vec<String> = self.terms.iter().map(|t| t.to_string()).collect();
            out.push_str(&format!("^terms:{}", terms.join("'")));
        }
        if !self.joins.is_empty() {
            let inner: Vec<String> = self.joins.iter().map(|j| j.serialise(verbose)).collect();
            out.push_str(&format!("({})", inner.join(",")));
        }
        out
    }
}

/// Query verb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Count,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Count => "count",
        }
    }
}

/// A top-level Census query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub(crate) namespace: String,
    pub(crate) collection: Option<String>,
    pub(crate) terms: Vec<Term>,
    pub(crate) show: Vec<String>,
    pub(crate) hide: Vec<String>,
    pub(crate) sort: Vec<Sort>,
    pub(crate) has: Vec<String>,
    pub(crate) resolve: Vec<String>,
    pub(crate) case_sensitive: bool,
    pub(crate) limit: u32,
    pub(crate) limit_per_db: u32,
    pub(crate) start: u32,
    pub(crate) include_null: bool,
    pub(crate) lang: Option<String>,
    pub(crate) joins: Vec<Join>,
    pub(crate) tree: Option<Tree>,
    pub(crate) timing: bool,
    pub(crate) exact_match_first: bool,
    pub(crate) distinct: Option<String>,
    pub(crate) retry: bool,
}

impl Query {
    /// Create a query for a collection in the default namespace
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: Some(collection.into()),
            ..Self::namespace_only(DEFAULT_NAMESPACE)
        }
    }

    /// Create a query without a collection, which lists the collections
    /// of a namespace
    pub fn namespace_only(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            collection: None,
            terms: Vec::new(),
            show: Vec::new(),
            hide: Vec::new(),
            sort: Vec::new(),
            has: Vec::new(),
            resolve: Vec::new(),
            case_sensitive: true,
            limit: 1,
            limit_per_db: 1,
            start: 0,
            include_null: false,
            lang: None,
            joins: Vec::new(),
            tree: None,
            timing: false,
            exact_match_first: false,
            distinct: None,
            retry: true,
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn get_limit(&self) -> u32 {
        self.limit
    }

    pub fn get_start(&self) -> u32 {
        self.start
    }

    /// Add an equality term
    pub fn term(self, field: impl Into<String>, value: impl ToString) -> Self {
        self.add_term(Term::new(field, value))
    }

    pub fn add_term(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    pub fn show(mut self, field: impl Into<String>) -> Self {
        self.show.push(field.into());
        self
    }

    pub fn hide(mut self, field: impl Into<String>) -> Self {
        self.hide.push(field.into());
        self
    }

    pub fn sort(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.sort.push(Sort {
            field: field.into(),
            ascending,
        });
        self
    }

    pub fn has(mut self, field: impl Into<String>) -> Self {
        self.has.push(field.into());
        self
    }

    pub fn resolve(mut self, name: impl Into<String>) -> Self {
        self.resolve.push(name.into());
        self
    }

    /// Toggle case-sensitive string comparison (`c:case`)
    pub fn case(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit_per_db(mut self, limit: u32) -> Self {
        self.limit_per_db = limit;
        self
    }

    /// Number of results to skip (`c:start`)
    pub fn offset(mut self, start: u32) -> Self {
        self.start = start;
        self
    }

    pub fn include_null(mut self, include_null: bool) -> Self {
        self.include_null = include_null;
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn tree(mut self, tree: Tree) -> Self {
        self.tree = Some(tree);
        self
    }

    pub fn timing(mut self, timing: bool) -> Self {
        self.timing = timing;
        self
    }

    pub fn exact_match_first(mut self, exact_match_first: bool) -> Self {
        self.exact_match_first = exact_match_first;
        self
    }

    pub fn distinct(mut self, field: impl Into<String>) -> Self {
        self.distinct = Some(field.into());
        self
    }

    pub fn retry(mut self, retry: bool) -> Self {
        self.retry = retry;
        self
    }

    /// Query commands as `(key, value)` pairs, keys including the `c:`
    /// prefix. Mutually exclusive commands keep the first of the pair:
    /// `show` over `hide`, `limit` over `limitPerDB`.
    pub fn commands(&self) -> Vec<(String, String)> {
        let mut commands: Vec<(&str, String)> = Vec::new();

        if !self.show.is_empty() {
            commands.push(("show", self.show.join(",")));
        } else if !self.hide.is_empty() {
            commands.push(("hide", self.hide.join(",")));
        }
        if !self.sort.is_empty() {
            let sorts: Vec<String> = self
                .sort
                .iter()
                .map(|s| {
                    if s.ascending {
                        s.field.clone()
                    } else {
                        format!("{}:-1", s.field)
                    }
                })
                .collect();
            commands.push(("sort", sorts.join(",")));
        }
        if !self.has.is_empty() {
            commands.push(("has", self.has.join(",")));
        }
        if !self.resolve.is_empty() {
            commands.push(("resolve", self.resolve.join(",")));
        }
        if !self.case_sensitive {
            commands.push(("case", "0".to_string()));
        }
        if self.limit > 1 {
            commands.push(("limit", self.limit.to_string()));
        } else if self.limit_per_db > 1 {
            commands.push(("limitPerDB", self.limit_per_db.to_string()));
        }
        if self.start > 0 {
            commands.push(("start", self.start.to_string()));
        }
        if self.include_null {
            commands.push(("includeNull", "1".to_string()));
        }
        if let Some(lang) = &self.lang {
            commands.push(("lang", lang.clone()));
        }
        if !self.joins.is_empty() {
            let joins: Vec<String> = self.joins.iter().map(|j| j.serialise(false)).collect();
            commands.push(("join", joins.join(",")));
        }
        if let Some(tree) = &self.tree {
            let mut value = tree.field.clone();
            if let Some(prefix) = &tree.prefix {
                value.push_str(&format!("^prefix:{}", prefix));
            }
            if tree.is_list {
                value.push_str("^list:1");
            }
            if let Some(start) = &tree.start {
                value.push_str(&format!("^start:{}", start));
            }
            commands.push(("tree", value));
        }
        if self.timing {
            commands.push(("timing", "1".to_string()));
        }
        if self.exact_match_first {
            commands.push(("exactMatchFirst", "1".to_string()));
        }
        if let Some(distinct) = &self.distinct {
            commands.push(("distinct", distinct.clone()));
        }
        if !self.retry {
            commands.push(("retry", "0".to_string()));
        }

        commands
            .into_iter()
            .map(|(k, v)| (format!("c:{}", k), v))
            .collect()
    }
}
