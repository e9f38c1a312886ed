//! Runtime configuration read from the environment.

use crate::models::Category;
use std::collections::HashMap;
use std::path::PathBuf;

/// Participant cap used for the built-in categories when none is configured.
pub const DEFAULT_CATEGORY_LIMIT: usize = 32;

/// Category -> maximum number of participants. A category absent from the
/// table is not open for brackets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CategoryLimits(HashMap<Category, usize>);

impl Default for CategoryLimits {
    fn default() -> Self {
        Self(
            Category::defaults()
                .into_iter()
                .map(|c| (c, DEFAULT_CATEGORY_LIMIT))
                .collect(),
        )
    }
}

impl CategoryLimits {
    pub fn new(limits: impl IntoIterator<Item = (Category, usize)>) -> Self {
        Self(limits.into_iter().collect())
    }

    pub fn limit_for(&self, category: &Category) -> Option<usize> {
        self.0.get(category).copied()
    }

    /// Parse `slug=limit,slug=limit`. Malformed entries are skipped with a warning.
    pub fn parse(raw: &str) -> Self {
        let mut limits = HashMap::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let parsed = entry
                .split_once('=')
                .and_then(|(name, limit)| Some((Category::parse(name), limit.trim().parse::<usize>().ok()?)))
                .filter(|(category, _)| !category.is_empty());
            match parsed {
                Some((category, limit)) => {
                    limits.insert(category, limit);
                }
                None => log::warn!("Ignoring malformed CATEGORY_LIMITS entry '{}'", entry),
            }
        }
        Self(limits)
    }
}

/// Server settings. Override with env: HOST, PORT, REGISTRATIONS_CSV, CATEGORY_LIMITS.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub registrations_csv: Option<PathBuf>,
    pub category_limits: CategoryLimits,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            registrations_csv: None,
            category_limits: CategoryLimits::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment in production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let port = match non_empty("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT '{}'", raw);
                default_port()
            }),
            None => default_port(),
        };
        Self {
            host: non_empty("HOST").unwrap_or_else(default_host),
            port,
            registrations_csv: non_empty("REGISTRATIONS_CSV").map(PathBuf::from),
            category_limits: non_empty("CATEGORY_LIMITS")
                .map(|raw| CategoryLimits::parse(&raw))
                .unwrap_or_default(),
        }
    }
}
