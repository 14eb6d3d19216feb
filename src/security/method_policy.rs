//! Path-aware method policy.
//!
//! # Responsibilities
//! - Compile the global allowlist and per-path route rules at startup
//! - Select the guard that applies to a request path
//!
//! # Design Decisions
//! - Longest matching prefix wins; ties cannot occur (prefixes are unique)
//! - Prefixes match whole path segments: `/api` covers `/api` and
//!   `/api/x`, never `/apiv2`; a trailing `/` on a prefix is ignored
//! - Matching is case-sensitive (no globs, no regex)
//! - A disabled rule exempts its prefix from enforcement
//! - Compiled once, immutable; reloads build a fresh policy

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::config::schema::SecurityConfig;
use crate::security::allowed_methods::{ConfigError, MethodGuard};

/// A security configuration that cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("{location}: {source}")]
    Guard {
        location: String,
        #[source]
        source: ConfigError,
    },

    #[error("{location}: path_prefix {prefix:?} must start with '/'")]
    InvalidPrefix { location: String, prefix: String },

    #[error("{location}: path_prefix {prefix:?} is already used by another rule")]
    DuplicatePrefix { location: String, prefix: String },

    #[error("{location}: enabled rule has no allowedMethodsRestricter")]
    MissingAllowlist { location: String },
}

#[derive(Debug)]
struct RouteRule {
    prefix: String,
    /// `None` when the rule disables enforcement.
    guard: Option<Arc<MethodGuard>>,
}

/// Compiled set of guards keyed by path.
#[derive(Debug)]
pub struct MethodPolicy {
    global: Option<Arc<MethodGuard>>,
    /// Sorted longest prefix first.
    rules: Vec<RouteRule>,
}

impl MethodPolicy {
    /// Compile the security section.
    ///
    /// Returns `Ok(None)` when neither a global allowlist nor route rules are
    /// configured. Every problem is reported, not just the first.
    pub fn from_config(config: &SecurityConfig) -> Result<Option<Self>, Vec<PolicyError>> {
        let mut errors = Vec::new();

        let global = match &config.allowed_methods_restricter {
            Some(methods) => match MethodGuard::create(methods) {
                Ok(guard) => Some(Arc::new(guard)),
                Err(source) => {
                    errors.push(PolicyError::Guard {
                        location: "security.allowedMethodsRestricter".to_string(),
                        source,
                    });
                    None
                }
            },
            None => None,
        };

        let mut rules: Vec<RouteRule> = Vec::with_capacity(config.route_rules.len());
        let mut seen: HashSet<&str> = HashSet::new();
        for (i, rule) in config.route_rules.iter().enumerate() {
            let location = format!("security.route_rules[{}]", i);

            if !rule.path_prefix.starts_with('/') {
                errors.push(PolicyError::InvalidPrefix {
                    location,
                    prefix: rule.path_prefix.clone(),
                });
                continue;
            }

            let prefix = trim_prefix(&rule.path_prefix);
            if !seen.insert(prefix) {
                errors.push(PolicyError::DuplicatePrefix {
                    location,
                    prefix: rule.path_prefix.clone(),
                });
                continue;
            }

            let guard = if !rule.enabled {
                None
            } else {
                match &rule.allowed_methods_restricter {
                    Some(methods) => match MethodGuard::create(methods) {
                        Ok(guard) => Some(Arc::new(guard)),
                        Err(source) => {
                            errors.push(PolicyError::Guard {
                                location: format!("{}.allowedMethodsRestricter", location),
                                source,
                            });
                            continue;
                        }
                    },
                    None => {
                        errors.push(PolicyError::MissingAllowlist { location });
                        continue;
                    }
                }
            };

            rules.push(RouteRule {
                prefix: prefix.to_string(),
                guard,
            });
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        if global.is_none() && rules.is_empty() {
            return Ok(None);
        }

        rules.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Ok(Some(Self { global, rules }))
    }

    /// The guard enforced for `path`, if any.
    pub fn guard_for(&self, path: &str) -> Option<&MethodGuard> {
        match self.rules.iter().find(|r| segment_match(&r.prefix, path)) {
            Some(rule) => rule.guard.as_deref(),
            None => self.global.as_deref(),
        }
    }

    pub fn global(&self) -> Option<&MethodGuard> {
        self.global.as_deref()
    }

    /// Route rules in match order as `(prefix, guard)`.
    pub fn rules(&self) -> impl Iterator<Item = (&str, Option<&MethodGuard>)> {
        self.rules
            .iter()
            .map(|r| (r.prefix.as_str(), r.guard.as_deref()))
    }
}

/// `/api/` and `/api` name the same rule; `/` stays as is.
fn trim_prefix(prefix: &str) -> &str {
    match prefix.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

fn segment_match(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteRuleConfig;
    use crate::security::allowed_methods::DecisionReason;

    fn rule(prefix: &str, methods: Option<&[&str]>, enabled: bool) -> RouteRuleConfig {
        RouteRuleConfig {
            path_prefix: prefix.to_string(),
            allowed_methods_restricter: methods
                .map(|m| m.iter().map(|s| s.to_string()).collect()),
            enabled,
        }
    }

    fn security(global: Option<&[&str]>, route_rules: Vec<RouteRuleConfig>) -> SecurityConfig {
        SecurityConfig {
            allowed_methods_restricter: global
                .map(|m| m.iter().map(|s| s.to_string()).collect()),
            route_rules,
        }
    }

    #[test]
    fn test_nothing_configured_installs_nothing() {
        let policy = MethodPolicy::from_config(&SecurityConfig::default()).unwrap();
        assert!(policy.is_none());
    }

    #[test]
    fn test_global_guard_applies_everywhere() {
        let policy = MethodPolicy::from_config(&security(Some(&["POST"]), vec![]))
            .unwrap()
            .unwrap();

        for path in ["/", "/api", "/deep/nested/path"] {
            let guard = policy.guard_for(path).unwrap();
            assert!(guard.evaluate("POST").allowed);
            assert!(!guard.evaluate("GET").allowed);
        }
    }

    #[test]
    fn test_longest_prefix_wins() {
        let config = security(
            Some(&["GET"]),
            vec![
                rule("/api", Some(&["POST"]), true),
                rule("/api/uploads", Some(&["PUT"]), true),
            ],
        );
        let policy = MethodPolicy::from_config(&config).unwrap().unwrap();

        let uploads = policy.guard_for("/api/uploads/1").unwrap();
        assert!(uploads.evaluate("PUT").allowed);
        assert!(!uploads.evaluate("POST").allowed);

        let api = policy.guard_for("/api/users").unwrap();
        assert!(api.evaluate("POST").allowed);

        let root = policy.guard_for("/index.html").unwrap();
        assert!(root.evaluate("GET").allowed);

        let prefixes: Vec<&str> = policy.rules().map(|(p, _)| p).collect();
        assert_eq!(prefixes, vec!["/api/uploads", "/api"]);
    }

    #[test]
    fn test_prefix_matches_whole_segments_only() {
        let config = security(
            Some(&["GET"]),
            vec![
                rule("/health", None, false),
                rule("/api/", Some(&["POST"]), true),
            ],
        );
        let policy = MethodPolicy::from_config(&config).unwrap().unwrap();

        assert!(policy.guard_for("/health").is_none());
        assert!(policy.guard_for("/health/live").is_none());
        assert!(policy.guard_for("/healthcare/records").is_some());
        assert!(policy.guard_for("/healthz-admin").is_some());

        assert!(policy.guard_for("/api").unwrap().evaluate("POST").allowed);
        assert!(policy.guard_for("/api/users").unwrap().evaluate("POST").allowed);
        let sibling = policy.guard_for("/apiv2").unwrap();
        assert!(sibling.evaluate("GET").allowed);
        assert!(!sibling.evaluate("POST").allowed);

        let prefixes: Vec<&str> = policy.rules().map(|(p, _)| p).collect();
        assert_eq!(prefixes, vec!["/health", "/api"]);
    }

    #[test]
    fn test_root_rule_covers_every_path() {
        let config = security(Some(&["GET"]), vec![rule("/", Some(&["PUT"]), true)]);
        let policy = MethodPolicy::from_config(&config).unwrap().unwrap();
        assert!(policy.guard_for("/anything").unwrap().evaluate("PUT").allowed);
    }

    #[test]
    fn test_disabled_rule_exempts_prefix() {
        let config = security(Some(&["POST"]), vec![rule("/health", None, false)]);
        let policy = MethodPolicy::from_config(&config).unwrap().unwrap();

        assert!(policy.guard_for("/health").is_none());
        assert!(policy.guard_for("/other").is_some());
    }

    #[test]
    fn test_rules_without_global_leave_other_paths_open() {
        let config = security(None, vec![rule("/admin", Some(&["get"]), true)]);
        let policy = MethodPolicy::from_config(&config).unwrap().unwrap();

        assert!(policy.global().is_none());
        assert!(policy.guard_for("/public").is_none());
        let d = policy.guard_for("/admin/x").unwrap().evaluate("delete");
        assert_eq!(d.reason, DecisionReason::MethodNotAllowed);
    }

    #[test]
    fn test_prefix_match_is_case_sensitive() {
        let config = security(None, vec![rule("/Admin", Some(&["GET"]), true)]);
        let policy = MethodPolicy::from_config(&config).unwrap().unwrap();
        assert!(policy.guard_for("/admin").is_none());
    }

    #[test]
    fn test_all_errors_are_reported_with_locations() {
        let config = security(
            Some(&[]),
            vec![
                rule("api", Some(&["GET"]), true),
                rule("/a", Some(&["FETCH"]), true),
                rule("/b", None, true),
                rule("/c", Some(&["GET"]), true),
                rule("/c/", Some(&["POST"]), true),
                rule("/d", Some(&["FOO"]), true),
                rule("/d", Some(&["GET"]), true),
            ],
        );
        let errors = MethodPolicy::from_config(&config).unwrap_err();

        assert_eq!(
            errors,
            vec![
                PolicyError::Guard {
                    location: "security.allowedMethodsRestricter".into(),
                    source: ConfigError::Empty,
                },
                PolicyError::InvalidPrefix {
                    location: "security.route_rules[0]".into(),
                    prefix: "api".into(),
                },
                PolicyError::Guard {
                    location: "security.route_rules[1].allowedMethodsRestricter".into(),
                    source: ConfigError::UnknownMethod { value: "FETCH".into() },
                },
                PolicyError::MissingAllowlist {
                    location: "security.route_rules[2]".into(),
                },
                PolicyError::DuplicatePrefix {
                    location: "security.route_rules[4]".into(),
                    prefix: "/c/".into(),
                },
                PolicyError::Guard {
                    location: "security.route_rules[5].allowedMethodsRestricter".into(),
                    source: ConfigError::UnknownMethod { value: "FOO".into() },
                },
                PolicyError::DuplicatePrefix {
                    location: "security.route_rules[6]".into(),
                    prefix: "/d".into(),
                },
            ]
        );
        assert_eq!(
            errors[2].to_string(),
            "security.route_rules[1].allowedMethodsRestricter: unknown HTTP method \"FETCH\" (expected one of GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS, CONNECT, TRACE)"
        );
    }
}
