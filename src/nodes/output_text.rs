use async_trait::async_trait;
use serde_json::json;

use crate::{
    common::Vars,
    console::Console,
    node::{FieldKind, FieldSpec, NodeConfig, NodeContract, PortKind, PortSpec, PortValue, RunOutput, params},
    server::ServerContext,
};

/// Surfaces a text value to the end user. Free of charge.
pub struct OutputTextNode {
    config: NodeConfig,
}

impl OutputTextNode {
    pub fn new() -> Self {
        Self {
            config: NodeConfig {
                title: "Output Text".to_string(),
                category: "output".to_string(),
                node_type: "output_text".to_string(),
                description: "Display a text value produced by the workflow.".to_string(),
                credit: 0.0,
                inputs: vec![PortSpec::new("In", PortKind::Flow, "Trigger"), PortSpec::new("Text", PortKind::Text, "Text to display")],
                outputs: vec![PortSpec::new("Out", PortKind::Flow, "Next node"), PortSpec::new("Text", PortKind::Text, "The displayed text")],
                fields: vec![FieldSpec::new("Text", FieldKind::TextArea, "Static text to display", json!(""))],
                difficulty: Default::default(),
                tags: vec!["output".to_string(), "text".to_string()],
            },
        }
    }
}

impl Default for OutputTextNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeContract for OutputTextNode {
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
        match params::resolve::<String>("Text", inputs, contents) {
            Some(text) => {
                console.success("Output Text: value forwarded");
                let mut values = Vars::new();
                values.set("Text", text);
                Some(RunOutput::success(values, 0.0))
            }
            None => {
                console.error("Output Text: no text provided");
                Some(RunOutput::declined(&self.config))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::console::testing::RecordingConsole;

    #[tokio::test]
    async fn test_static_content_is_forwarded() {
        let node = OutputTextNode::new();
        let console = RecordingConsole::new();
        let server = ServerContext::builder().build();
        let contents = vec![PortValue::new("Text", "hello")];

        let output = node.run(&[], &contents, &console, &server).await.unwrap();

        assert_eq!(output.values.get("Text"), Some(&json!("hello")));
        assert_eq!(output.credit, 0.0);
    }

    #[tokio::test]
    async fn test_input_wins_over_content() {
        let node = OutputTextNode::new();
        let console = RecordingConsole::new();
        let server = ServerContext::builder().build();
        let inputs = vec![PortValue::new("Text", "upstream")];
        let contents = vec![PortValue::new("Text", "static")];

        let output = node.run(&inputs, &contents, &console, &server).await.unwrap();

        assert_eq!(output.values.get("Text"), Some(&json!("upstream")));
    }

    #[tokio::test]
    async fn test_missing_text_declines_with_null_field() {
        let node = OutputTextNode::new();
        let console = RecordingConsole::new();
        let server = ServerContext::builder().build();

        let output = node.run(&[], &[], &console, &server).await.unwrap();

        assert_eq!(output.values.get("Text"), Some(&json!(null)));
        assert_eq!(output.credit, 0.0);
        assert_eq!(console.messages("error").len(), 1);
    }
}
