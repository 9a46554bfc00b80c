//! Host Environment
//!
//! Properties and active profiles backed by figment. Sources, in increasing
//! priority:
//! 1. an optional TOML file
//! 2. `APP_`-prefixed environment variables, `__` separating nesting levels
//!    (`APP_DEVTOOLS__MCP__PORT=8080` sets `devtools.mcp.port`)

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde_json::Value;

use devtools_types::{Environment, HostError, HostResult};

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "APP_";

/// Property holding the active profiles (TOML array or comma-separated string)
pub const ACTIVE_PROFILES_KEY: &str = "profiles.active";

/// Resolved host configuration
#[derive(Debug, Clone, Default)]
pub struct HostEnvironment {
    values: Value,
}

impl HostEnvironment {
    /// Load from an optional TOML file plus `APP_*` environment variables
    pub fn load(config_file: Option<&Path>) -> HostResult<Self> {
        Self::from_figment(&Self::figment(config_file))
    }

    /// The unresolved source stack, for callers that merge their own overrides
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::new();
        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Resolve an arbitrary figment
    pub fn from_figment(figment: &Figment) -> HostResult<Self> {
        let values: Value = figment
            .extract()
            .map_err(|e| HostError::Parse(e.to_string()))?;
        Ok(Self { values })
    }

    /// Parse properties from a TOML document
    pub fn from_toml_str(toml: &str) -> HostResult<Self> {
        Self::from_figment(&Figment::from(Toml::string(toml)))
    }

    /// Wrap an already-resolved property tree
    pub fn from_value(values: Value) -> Self {
        Self { values }
    }

    /// Find a property node
    ///
    /// A literal top-level key (`"devtools.mcp.port" = 1`) wins over the
    /// nested path (`[devtools.mcp] port = 1`).
    fn lookup(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.values.get(key) {
            return Some(value);
        }
        key.split('.')
            .try_fold(&self.values, |node, segment| node.get(segment))
    }
}

/// Render a scalar (or a list of scalars) the way a property lookup reports it
fn render(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(items.iter().filter_map(render).collect::<Vec<_>>().join(",")),
        Value::Null | Value::Object(_) => None,
    }
}

impl Environment for HostEnvironment {
    fn active_profiles(&self) -> Vec<String> {
        match self.lookup(ACTIVE_PROFILES_KEY) {
            Some(Value::Array(items)) => items.iter().filter_map(render).collect(),
            Some(Value::String(list)) => list
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn property(&self, key: &str) -> Option<String> {
        self.lookup(key).and_then(render)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_property() {
        let env = HostEnvironment::from_toml_str(
            r#"
            [devtools.mcp]
            port = 8080
            path = "/tools"
            "#,
        )
        .unwrap();

        assert_eq!(env.property("devtools.mcp.port").as_deref(), Some("8080"));
        assert_eq!(env.property("devtools.mcp.path").as_deref(), Some("/tools"));
        assert_eq!(env.property("devtools.mcp.host"), None);
        assert_eq!(env.property_or("devtools.mcp.host", "0.0.0.0"), "0.0.0.0");
    }

    #[test]
    fn test_literal_dotted_key() {
        let env = HostEnvironment::from_toml_str(r#""devtools.mcp.port" = "7000""#).unwrap();
        assert_eq!(env.property("devtools.mcp.port").as_deref(), Some("7000"));
    }

    #[test]
    fn test_tables_are_not_properties() {
        let env = HostEnvironment::from_toml_str("[devtools.mcp]\nport = 1").unwrap();
        assert_eq!(env.property("devtools.mcp"), None);
    }

    #[test]
    fn test_profiles_array_keeps_order_and_duplicates() {
        let env = HostEnvironment::from_toml_str(
            r#"
            [profiles]
            active = ["dev", "local", "dev"]
            "#,
        )
        .unwrap();
        assert_eq!(env.active_profiles(), vec!["dev", "local", "dev"]);
    }

    #[test]
    fn test_profiles_comma_separated() {
        let env = HostEnvironment::from_value(serde_json::json!({
            "profiles": { "active": " dev, local ,," }
        }));
        assert_eq!(env.active_profiles(), vec!["dev", "local"]);
    }

    #[test]
    fn test_no_profiles() {
        let env = HostEnvironment::default();
        assert!(env.active_profiles().is_empty());
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "app.toml",
                r#"
                [devtools.mcp]
                port = 9000

                [profiles]
                active = ["prod"]
                "#,
            )?;
            jail.set_env("APP_DEVTOOLS__MCP__PORT", "8081");
            jail.set_env("APP_PROFILES__ACTIVE", "dev,local");

            let env = HostEnvironment::load(Some(Path::new("app.toml")))
                .map_err(|e| e.to_string())?;

            assert_eq!(env.property("devtools.mcp.port").as_deref(), Some("8081"));
            assert_eq!(env.active_profiles(), vec!["dev", "local"]);
            Ok(())
        });
    }

    #[test]
    fn test_figment_accepts_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("APP_DEVTOOLS__MCP__PORT", "8081");

            let figment = HostEnvironment::figment(None)
                .merge(figment::providers::Serialized::default("devtools.mcp.port", 9100));
            let env = HostEnvironment::from_figment(&figment).map_err(|e| e.to_string())?;

            assert_eq!(env.property("devtools.mcp.port").as_deref(), Some("9100"));
            Ok(())
        });
    }
}
