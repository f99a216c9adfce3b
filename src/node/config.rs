//! Static node descriptors.
//!
//! A [`NodeConfig`] is constructed once, from a literal, when the node is
//! registered; the engine and UI read it for graph building and
//! validation. It is the only wire format this layer owns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::node::Credit;

/// Semantic tag carried by a port. The engine only matches tags when
/// wiring nodes; the catalog never inspects payloads through them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PortKind {
    /// Control link from/to another node.
    Flow,
    Text,
    Number,
    Json,
    Image,
    Video,
    Audio,
    /// LLM-callable capability object.
    Tool,
    #[default]
    Any,
}

/// UI input kind of an editable field.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    TextArea,
    Number,
    Select,
    Checkbox,
    Json,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

/// One typed input or output port.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PortSpec {
    pub name: String,
    pub kind: PortKind,
    #[serde(default)]
    pub description: String,
}

impl PortSpec {
    pub fn new<N: Into<String>, D: Into<String>>(
        name: N,
        kind: PortKind,
        description: D,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
        }
    }
}

/// One user-editable field.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub description: String,
    /// Explicit default, applied after inputs and contents.
    #[serde(default)]
    pub default: Value,
    /// Enumerated choices for select fields.
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl FieldSpec {
    pub fn new<N: Into<String>, D: Into<String>>(
        name: N,
        kind: FieldKind,
        description: D,
        default: Value,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            default,
            options: None,
            min: None,
            max: None,
        }
    }

    pub fn with_options(
        mut self,
        options: Vec<String>,
    ) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_bounds(
        mut self,
        min: f64,
        max: f64,
    ) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

/// Immutable descriptor of one catalog node.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NodeConfig {
    pub title: String,
    pub category: String,
    /// Registry key; unique across the catalog.
    pub node_type: String,
    #[serde(default)]
    pub description: String,
    /// Base credit cost of one execution.
    pub credit: Credit,
    #[serde(default)]
    pub inputs: Vec<PortSpec>,
    #[serde(default)]
    pub outputs: Vec<PortSpec>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NodeConfig {
    /// Default value declared for `field`, when one exists.
    pub fn field_default(
        &self,
        field: &str,
    ) -> Option<&Value> {
        self.fields.iter().find(|spec| spec.name == field).map(|spec| &spec.default)
    }

    /// Names of the declared data outputs, excluding flow and tool ports.
    pub fn data_output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().filter(|port| !matches!(port.kind, PortKind::Flow | PortKind::Tool)).map(|port| port.name.as_str())
    }
}
