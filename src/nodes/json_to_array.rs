use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    common::Vars,
    console::Console,
    node::{FieldKind, FieldSpec, NodeConfig, NodeContract, PortKind, PortSpec, PortValue, RunOutput, params},
    server::ServerContext,
};

/// Normalizes arbitrary JSON into an array.
///
/// An array passes through unchanged; a lone object or scalar is wrapped
/// into a one-element array so downstream loop constructs always see a
/// sequence.
pub struct JsonToArrayNode {
    config: NodeConfig,
}

impl JsonToArrayNode {
    pub fn new() -> Self {
        Self {
            config: NodeConfig {
                title: "JSON to Array".to_string(),
                category: "transform".to_string(),
                node_type: "json_to_array".to_string(),
                description: "Normalize a JSON value into an array.".to_string(),
                credit: 0.0,
                inputs: vec![PortSpec::new("In", PortKind::Flow, "Trigger"), PortSpec::new("jsons", PortKind::Json, "JSON value to normalize")],
                outputs: vec![PortSpec::new("Out", PortKind::Flow, "Next node"), PortSpec::new("array", PortKind::Json, "Normalized array")],
                fields: vec![FieldSpec::new("jsons", FieldKind::Json, "Static JSON value", json!(null))],
                difficulty: Default::default(),
                tags: vec!["transform".to_string(), "json".to_string()],
            },
        }
    }

    fn normalize(value: Value) -> Value {
        match value {
            Value::Array(_) => value,
            other => Value::Array(vec![other]),
        }
    }
}

impl Default for JsonToArrayNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeContract for JsonToArrayNode {
    fn config(&self) -> &NodeConfig {
        &self.config
    }

    async fn run(
        &self,
        inputs: &[PortValue],
        contents: &[PortValue],
        console: &dyn Console,
        _server: &ServerContext,
    ) -> Option<RunOutput> {
        match params::resolve_value("jsons", inputs, contents) {
            Some(value) => {
                let mut values = Vars::new();
                values.set("array", Self::normalize(value));
                Some(RunOutput::success(values, 0.0))
            }
            None => {
                console.error("JSON to Array: no value provided");
                Some(RunOutput::declined(&self.config))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::RecordingConsole;

    #[tokio::test]
    async fn test_single_object_is_wrapped() {
        let node = JsonToArrayNode::new();
        let console = RecordingConsole::new();
        let server = ServerContext::builder().build();
        let inputs = vec![PortValue::new("jsons", json!({"a": 1}))];

        let output = node.run(&inputs, &[], &console, &server).await.unwrap();

        assert_eq!(output.values.get("array"), Some(&json!([{"a": 1}])));
        assert_eq!(output.credit, 0.0);
    }

    #[tokio::test]
    async fn test_array_passes_through() {
        let node = JsonToArrayNode::new();
        let console = RecordingConsole::new();
        let server = ServerContext::builder().build();
        let inputs = vec![PortValue::new("jsons", json!([1, 2]))];

        let output = node.run(&inputs, &[], &console, &server).await.unwrap();

        assert_eq!(output.values.get("array"), Some(&json!([1, 2])));
    }

    #[tokio::test]
    async fn test_scalar_is_wrapped() {
        let node = JsonToArrayNode::new();
        let console = RecordingConsole::new();
        let server = ServerContext::builder().build();
        let contents = vec![PortValue::new("jsons", json!("solo"))];

        let output = node.run(&[], &contents, &console, &server).await.unwrap();

        assert_eq!(output.values.get("array"), Some(&json!(["solo"])));
    }

    #[tokio::test]
    async fn test_missing_value_declines() {
        let node = JsonToArrayNode::new();
        let console = RecordingConsole::new();
        let server = ServerContext::builder().build();

        let output = node.run(&[], &[], &console, &server).await.unwrap();

        assert_eq!(output.values.get("array"), Some(&json!(null)));
        assert_eq!(output.credit, 0.0);
    }
}
