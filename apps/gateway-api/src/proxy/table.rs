//! Immutable prefix-to-upstream route table, loaded once at startup.

use serde_json::Value;

/// One proxy target: requests whose path starts with `prefix` go to
/// `upstream`.
#[derive(Debug, Clone)]
pub struct Route {
    pub prefix: String,
    pub upstream: String,
}

/// Ordered prefix table. Resolution picks the longest matching prefix;
/// equal-length ties go to the earlier entry, so resolution is
/// deterministic for any table.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from `(prefix, upstream)` pairs, keeping their order.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            routes: pairs
                .into_iter()
                .map(|(prefix, upstream)| Route {
                    upstream: upstream.trim_end_matches('/').to_string(),
                    prefix,
                })
                .collect(),
        }
    }

    /// Load the table from a JSON object file mapping path prefixes to
    /// upstream base URLs. A missing or unparsable file yields an empty
    /// table: every proxied request then fails closed.
    pub fn load(path: &str) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(%path, ?e, "route table unreadable; proxying disabled");
                return Self::empty();
            }
        };
        let parsed: Value = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(%path, ?e, "route table unparsable; proxying disabled");
                return Self::empty();
            }
        };
        let Some(map) = parsed.as_object() else {
            tracing::warn!(%path, "route table is not a JSON object; proxying disabled");
            return Self::empty();
        };

        let table = Self::from_pairs(map.iter().filter_map(|(prefix, upstream)| {
            upstream.as_str().map(|u| (prefix.clone(), u.to_string()))
        }));
        tracing::info!(%path, routes = table.len(), "route table loaded");
        table
    }

    /// Longest-prefix match against the request path.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let mut best: Option<&Route> = None;
        for route in &self.routes {
            if !path.starts_with(&route.prefix) {
                continue;
            }
            if best.map_or(true, |b| route.prefix.len() > b.prefix.len()) {
                best = Some(route);
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
