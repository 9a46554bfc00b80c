//! MCP Tools
//!
//! The introspection operations as named, schema-described tools. Handlers
//! are plain functions over an [`Introspector`] and return the tool output as
//! JSON; every host-side failure is already data by the time it gets here.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::error::ToolError;
use crate::inspect::Introspector;
use crate::server::ToolInfo;

pub const LIST_OBJECTS: &str = "listObjects";
pub const DESCRIBE_OBJECT: &str = "describeObject";
pub const GET_ACTIVE_PROFILES: &str = "getActiveProfiles";
pub const GET_HEALTH_INFO: &str = "getHealthInfo";
pub const GET_DEPENDENCY_INFO: &str = "getDependencyInfo";

type ToolHandler = fn(&Introspector, &Map<String, Value>) -> Result<Value, ToolError>;

/// A callable tool
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    handler: ToolHandler,
}

impl ToolDescriptor {
    /// Advertised form, as returned by `tools/list`
    pub fn info(&self) -> ToolInfo {
        ToolInfo {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema: self.input_schema.clone(),
        }
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Tools in registration order
#[derive(Debug, Clone)]
pub struct ToolTable {
    tools: Vec<ToolDescriptor>,
}

impl ToolTable {
    /// The five introspection tools
    pub fn builtin() -> Self {
        Self {
            tools: vec![
                ToolDescriptor {
                    name: LIST_OBJECTS,
                    description: "List all registered objects with their concrete type names. Objects that \
                                  fail to load are listed with an error string instead of a type.",
                    input_schema: empty_schema(),
                    handler: list_objects,
                },
                ToolDescriptor {
                    name: DESCRIBE_OBJECT,
                    description: "Describe one registered object: concrete type, simple type name, \
                                  interfaces and scope.",
                    input_schema: json!({
                        "type": "object",
                        "properties": {
                            "name": {
                                "type": "string",
                                "description": "Registered name of the object (e.g., 'clock')"
                            }
                        },
                        "required": ["name"]
                    }),
                    handler: describe_object,
                },
                ToolDescriptor {
                    name: GET_ACTIVE_PROFILES,
                    description: "List the active configuration profiles in declaration order.",
                    input_schema: empty_schema(),
                    handler: get_active_profiles,
                },
                ToolDescriptor {
                    name: GET_HEALTH_INFO,
                    description: "Report process health: memory in MB, processors, runtime and OS \
                                  identity, start time, uptime and thread counts.",
                    input_schema: empty_schema(),
                    handler: get_health_info,
                },
                ToolDescriptor {
                    name: GET_DEPENDENCY_INFO,
                    description: "List loaded libraries with name, version and package.",
                    input_schema: empty_schema(),
                    handler: get_dependency_info,
                },
            ],
        }
    }

    pub fn list(&self) -> Vec<ToolInfo> {
        self.tools.iter().map(ToolDescriptor::info).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool by name
    pub fn call(
        &self,
        introspector: &Introspector,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        (tool.handler)(introspector, arguments)
    }
}

fn empty_schema() -> Value {
    json!({
        "type": "object",
        "properties": {}
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for describeObject
#[derive(Debug, Deserialize)]
pub struct DescribeObjectArgs {
    pub name: String,
}

fn parse_args<T: for<'de> Deserialize<'de>>(tool: &str, arguments: &Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(arguments.clone())).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

fn list_objects(introspector: &Introspector, _: &Map<String, Value>) -> Result<Value, ToolError> {
    Ok(serde_json::to_value(introspector.objects.list_objects())?)
}

fn describe_object(introspector: &Introspector, arguments: &Map<String, Value>) -> Result<Value, ToolError> {
    let args: DescribeObjectArgs = parse_args(DESCRIBE_OBJECT, arguments)?;
    Ok(serde_json::to_value(introspector.objects.describe_object(&args.name))?)
}

fn get_active_profiles(introspector: &Introspector, _: &Map<String, Value>) -> Result<Value, ToolError> {
    Ok(serde_json::to_value(introspector.profiles.list_active_profiles())?)
}

fn get_health_info(introspector: &Introspector, _: &Map<String, Value>) -> Result<Value, ToolError> {
    Ok(serde_json::to_value(introspector.health.sample())?)
}

fn get_dependency_info(introspector: &Introspector, _: &Map<String, Value>) -> Result<Value, ToolError> {
    Ok(serde_json::to_value(introspector.dependencies.list_dependencies())?)
}
