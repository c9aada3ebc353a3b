//! Ordered first-match command routing.
//!
//! Routes are tried in declaration order and the first pattern that matches the
//! whole command wins, so more specific patterns must be registered before more
//! general ones. Building the table also computes which earlier routes can
//! shadow later ones, from each pattern's leading literal text, and logs a
//! warning per shadow pair; dispatch itself always honors declaration order.

use regex::Regex;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("invalid pattern `{pattern}` for route `{name}`: {source}")]
    Pattern {
        name: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

struct Route<H> {
    name: &'static str,
    pattern: Regex,
    literal: String,
    handler: H,
}

/// A matched route: the handler to run plus positional captures in pattern
/// order. An unmatched optional capture group comes through as an empty string.
pub struct RouteMatch<'r, H> {
    pub name: &'static str,
    pub handler: &'r H,
    pub captures: Vec<String>,
}

pub struct Router<H> {
    routes: Vec<Route<H>>,
    overlaps: Vec<(String, String)>,
}

impl<H> Router<H> {
    pub fn builder() -> RouterBuilder<H> {
        RouterBuilder { routes: Vec::new() }
    }

    /// First route whose pattern matches the full command text, in declaration
    /// order. `None` means the command is unrecognized; nothing ran.
    pub fn dispatch(&self, input: &str) -> Option<RouteMatch<'_, H>> {
        for route in &self.routes {
            if let Some(captures) = route.pattern.captures(input) {
                let captured = captures
                    .iter()
                    .skip(1)
                    .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect();
                return Some(RouteMatch {
                    name: route.name,
                    handler: &route.handler,
                    captures: captured,
                });
            }
        }
        None
    }

    /// Shadow pairs found at build time: `(earlier, later)` where the earlier,
    /// more general route can swallow commands meant for the later one.
    pub fn overlaps(&self) -> &[(String, String)] {
        &self.overlaps
    }
}

pub struct RouterBuilder<H> {
    routes: Vec<(&'static str, String, H)>,
}

impl<H> RouterBuilder<H> {
    /// Registers a route. The pattern is anchored to the whole command text;
    /// write it without `^`/`$`.
    pub fn route(mut self, name: &'static str, pattern: &str, handler: H) -> Self {
        self.routes.push((name, pattern.to_string(), handler));
        self
    }

    pub fn build(self) -> Result<Router<H>, RouterError> {
        let mut routes = Vec::with_capacity(self.routes.len());
        for (name, pattern, handler) in self.routes {
            let anchored = format!("^(?:{pattern})$");
            let compiled = Regex::new(&anchored).map_err(|source| RouterError::Pattern {
                name: name.to_string(),
                pattern: pattern.clone(),
                source,
            })?;
            routes.push(Route {
                name,
                literal: literal_prefix(&pattern),
                pattern: compiled,
                handler,
            });
        }

        let overlaps = find_overlaps(&routes);
        for (earlier, later) in &overlaps {
            warn!("route `{earlier}` may shadow later route `{later}`; register the more specific pattern first");
        }
        Ok(Router { routes, overlaps })
    }
}

/// Leading literal text of a pattern, up to the first regex metacharacter.
fn literal_prefix(pattern: &str) -> String {
    pattern
        .chars()
        .take_while(|ch| !r"\.+*?()|[]{}^$".contains(*ch))
        .collect()
}

/// An earlier route shadows a later one when its literal prefix is a
/// word-boundary prefix of the later route's literal prefix: whatever text the
/// later pattern insists on, the earlier pattern may already match first.
fn find_overlaps<H>(routes: &[Route<H>]) -> Vec<(String, String)> {
    let mut overlaps = Vec::new();
    for (index, earlier) in routes.iter().enumerate() {
        for later in &routes[index + 1..] {
            if is_word_prefix(&earlier.literal, &later.literal) {
                overlaps.push((earlier.name.to_string(), later.name.to_string()));
            }
        }
    }
    overlaps
}

fn is_word_prefix(prefix: &str, text: &str) -> bool {
    match text.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => prefix.ends_with(' ') || rest.starts_with(' '),
        None => false,
    }
}
