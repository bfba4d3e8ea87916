//! Endpoint classification.
//!
//! Every outbound call is classified as [`Access::Public`] or
//! [`Access::Protected`] before a credential is considered. The rule set is
//! fixed once the policy is built, and any path that matches no rule is
//! protected, so a newly added endpoint never leaks out unauthenticated.

use std::collections::HashSet;
use std::fmt;

use regex::Regex;

use crate::error::InvalidInputError;

/// Paths that are reachable without a credential.
///
/// Relative to the API base URL.
pub const PUBLIC_PATHS: &[&str] = &[
    // Session entry points
    "/auth/login",
    "/auth/refresh",
    "/auth/google",
    "/auth/google-login",
    "/usuarios/register",
    // Read-only reference data
    "/departamentos/activos",
    "/carreras/activas",
    "/ciclos/todos",
    "/anuncios/general",
    "/anuncios/general/todos",
    // Health checks
    "/health",
    "/carreras/health",
    "/aulas/health",
];

/// Parameterized public paths. Each pattern must match the whole path.
pub const PUBLIC_PATTERNS: &[&str] = &[
    r"/carreras/departamento/\d+/activas",
    r"/secciones/carrera/\d+",
    r"/secciones/carrera/\d+/ciclo/\d+",
    r"/oauth2/(?:authorize|callback)/[A-Za-z0-9_-]+",
];

/// Whether a request needs a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Public,
    Protected,
}

impl Access {
    pub fn is_public(self) -> bool {
        self == Access::Public
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Protected => "protected",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rule marking paths as public.
#[derive(Debug, Clone)]
pub enum EndpointRule {
    /// Matches one path exactly.
    Exact(String),
    /// Matches any path the anchored pattern matches in full.
    Pattern(Regex),
}

impl EndpointRule {
    /// Returns true if the rule covers `path`.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            EndpointRule::Exact(exact) => exact == path,
            EndpointRule::Pattern(re) => re.is_match(path),
        }
    }
}

/// Static classifier from request path to [`Access`].
///
/// # Example
///
/// ```
/// use tecbook_core::{Access, EndpointPolicy};
///
/// let policy = EndpointPolicy::default();
/// assert_eq!(policy.classify("/departamentos/activos"), Access::Public);
/// assert_eq!(policy.classify("/secciones/carrera/4/ciclo/2"), Access::Public);
/// assert_eq!(policy.classify("/aulas/12/anuncios"), Access::Protected);
/// ```
#[derive(Debug, Clone)]
pub struct EndpointPolicy {
    exact: HashSet<String>,
    patterns: Vec<Regex>,
}

impl EndpointPolicy {
    /// Start an empty rule set (everything protected).
    pub fn builder() -> EndpointPolicyBuilder {
        EndpointPolicyBuilder::default()
    }

    /// Classify a request path.
    ///
    /// The query string and fragment are ignored; matching is case-sensitive.
    pub fn classify(&self, path: &str) -> Access {
        let path = strip_query(path);

        if self.exact.contains(path) || self.patterns.iter().any(|re| re.is_match(path)) {
            Access::Public
        } else {
            Access::Protected
        }
    }

    /// Returns the rules of this policy.
    pub fn rules(&self) -> Vec<EndpointRule> {
        let mut exact: Vec<_> = self.exact.iter().cloned().collect();
        exact.sort();
        exact
            .into_iter()
            .map(EndpointRule::Exact)
            .chain(self.patterns.iter().cloned().map(EndpointRule::Pattern))
            .collect()
    }
}

impl Default for EndpointPolicy {
    /// The TecBook public surface: [`PUBLIC_PATHS`] and [`PUBLIC_PATTERNS`].
    fn default() -> Self {
        let mut builder = EndpointPolicy::builder().exact_paths(PUBLIC_PATHS.iter().copied());
        for pattern in PUBLIC_PATTERNS {
            builder = builder
                .pattern(pattern)
                .expect("built-in public patterns are valid");
        }
        builder.build()
    }
}

/// Builder for [`EndpointPolicy`].
#[derive(Debug, Default)]
pub struct EndpointPolicyBuilder {
    exact: HashSet<String>,
    patterns: Vec<Regex>,
}

impl EndpointPolicyBuilder {
    /// Mark one exact path as public.
    pub fn exact(mut self, path: impl Into<String>) -> Self {
        self.exact.insert(path.into());
        self
    }

    /// Mark several exact paths as public.
    pub fn exact_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exact.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Mark every path fully matching `pattern` as public.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regular expression.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, InvalidInputError> {
        let anchored = format!("^(?:{})$", pattern);
        let re = Regex::new(&anchored).map_err(|e| InvalidInputError::Pattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        self.patterns.push(re);
        Ok(self)
    }

    pub fn build(self) -> EndpointPolicy {
        EndpointPolicy {
            exact: self.exact,
            patterns: self.patterns,
        }
    }
}

fn strip_query(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}
