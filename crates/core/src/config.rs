// Gateway Configuration - loaded once at startup, shared read-only

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use crate::domain::cors::CorsPolicy;
use crate::domain::pool::DEFAULT_MIME;

/// Process-wide settings handed to every controller by `Arc`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub sys: SysConfig,

    /// Command name -> shell string
    #[serde(default)]
    pub cli: HashMap<String, String>,

    #[serde(default)]
    pub cors: CorsPolicy,

    #[serde(default)]
    pub init: InitList,
}

/// `[sys]` section
#[derive(Debug, Clone, Deserialize)]
pub struct SysConfig {
    /// Pretty, unescaped output and verbose error text
    #[serde(default)]
    pub diagnostic: bool,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_mime")]
    pub mime: String,

    #[serde(default)]
    pub app_path: String,
}

impl Default for SysConfig {
    fn default() -> Self {
        Self {
            diagnostic: false,
            timezone: default_timezone(),
            mime: default_mime(),
            app_path: String::new(),
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_mime() -> String {
    DEFAULT_MIME.to_string()
}

/// One `init` entry: a dependency or a group of dependencies
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum InitEntry {
    One(String),
    Many(Vec<String>),
}

/// The `init` section, written either as a list or as a keyed table
///
/// Tables (the natural shape in ini files) run in key order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum InitList {
    List(Vec<InitEntry>),
    Table(BTreeMap<String, InitEntry>),
}

impl Default for InitList {
    fn default() -> Self {
        InitList::List(Vec::new())
    }
}

impl InitList {
    /// Flatten one level: groups are spliced in, single entries kept
    pub fn flatten(&self) -> Vec<String> {
        let entries: Vec<&InitEntry> = match self {
            InitList::List(list) => list.iter().collect(),
            InitList::Table(table) => table.values().collect(),
        };

        let mut flat = Vec::new();
        for entry in entries {
            match entry {
                InitEntry::One(item) => flat.push(item.clone()),
                InitEntry::Many(items) => flat.extend(items.iter().cloned()),
            }
        }
        flat
    }

    pub fn is_empty(&self) -> bool {
        match self {
            InitList::List(list) => list.is_empty(),
            InitList::Table(table) => table.is_empty(),
        }
    }
}

impl GatewayConfig {
    /// Normalise values that have a canonical form
    ///
    /// `app_path` becomes slash-trimmed with exactly one trailing `/`.
    pub fn normalized(mut self) -> Self {
        let trimmed = self.sys.app_path.trim_matches(|c| c == '/' || c == '\\');
        self.sys.app_path = if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}/")
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let cfg: GatewayConfig = serde_json::from_value(json!({})).unwrap();
        assert!(!cfg.sys.diagnostic);
        assert_eq!(cfg.sys.mime, DEFAULT_MIME);
        assert_eq!(cfg.sys.timezone, "UTC");
        assert!(cfg.cli.is_empty());
        assert!(cfg.cors.is_empty());
        assert!(cfg.init.is_empty());
    }

    #[test]
    fn test_init_flatten_one_level() {
        let cfg: GatewayConfig = serde_json::from_value(json!({
            "init": ["db-connect", ["cache-warm", "log-open"], "auth-load"]
        }))
        .unwrap();

        assert_eq!(
            cfg.init.flatten(),
            vec!["db-connect", "cache-warm", "log-open", "auth-load"]
        );
    }

    #[test]
    fn test_init_table_runs_in_key_order() {
        let cfg: GatewayConfig = serde_json::from_value(json!({
            "init": {"b": "second", "a": ["first-1", "first-2"]}
        }))
        .unwrap();

        assert_eq!(cfg.init.flatten(), vec!["first-1", "first-2", "second"]);
    }

    #[test]
    fn test_full_document() {
        let cfg = serde_json::from_value::<GatewayConfig>(json!({
            "sys": {"diagnostic": true, "app_path": "/apps/demo/"},
            "cli": {"ls": "ls -la"},
            "cors": {"*": "Content-Type, X-Token"}
        }))
        .unwrap()
        .normalized();

        assert!(cfg.sys.diagnostic);
        assert_eq!(cfg.sys.app_path, "apps/demo/");
        assert_eq!(cfg.cli.get("ls").map(String::as_str), Some("ls -la"));
        assert_eq!(cfg.cors.allowed_headers("https://x.test"), Some("Content-Type, X-Token"));
    }

    #[test]
    fn test_empty_app_path_stays_empty() {
        let cfg = GatewayConfig::default().normalized();
        assert_eq!(cfg.sys.app_path, "");
    }
}
