use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    FlowkitError, Result,
    common::Vars,
    console::Console,
    node::{FieldKind, FieldSpec, NodeConfig, NodeContract, PortKind, PortSpec, PortValue, RunOutput, Tool, params},
    server::ServerContext,
};

const CHAT_API_URL: &str = "CHAT_API_URL";
const DEFAULT_PROVIDER: &str = "chat";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Posts a message through the workflow's connected chat account.
///
/// Presence of the provider's access token in the connected-account map
/// is the sole authorization signal; without it the node short-circuits
/// with credit 0.
pub struct ChatPostNode {
    config: NodeConfig,
}

/// Captured collaborator state for the send side effect, so the tool
/// handler can run it independently of `run`.
#[derive(Clone)]
struct SendDeps {
    api_url: Option<String>,
    access_token: Option<String>,
    channel: String,
}

impl ChatPostNode {
    pub fn new() -> Self {
        Self {
            config: NodeConfig {
                title: "Post Chat Message".to_string(),
                category: "social".to_string(),
                node_type: "chat_post".to_string(),
                description: "Post a message to a channel of the connected chat account.".to_string(),
                credit: 1.0,
                inputs: vec![PortSpec::new("In", PortKind::Flow, "Trigger"), PortSpec::new("Message", PortKind::Text, "Message text")],
                outputs: vec![
                    PortSpec::new("Out", PortKind::Flow, "Next node"),
                    PortSpec::new("Message ID", PortKind::Text, "Identifier of the posted message"),
                    PortSpec::new("Tool", PortKind::Tool, "LLM-callable message sender"),
                ],
                fields: vec![
                    FieldSpec::new("Message", FieldKind::TextArea, "Message text", json!("")),
                    FieldSpec::new("Channel", FieldKind::Text, "Target channel", json!("general")),
                    FieldSpec::new("Provider", FieldKind::Text, "Connected account provider name", json!(DEFAULT_PROVIDER)),
                ],
                difficulty: Default::default(),
                tags: vec!["social".to_string(), "chat".to_string()],
            },
        }
    }

    fn build_tool(
        &self,
        deps: SendDeps,
    ) -> Tool {
        Tool::builder("send_message")
            .description("Send a chat message to the configured channel and return its id.")
            .parameters(json!({
                "type": "object",
                "required": ["message"],
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "Message text to send"
                    },
                    "channel": {
                        "type": "string",
                        "description": "Target channel, defaults to the node's configured channel"
                    }
                }
            }))
            .credit(self.config.credit)
            .handler(move |payload| {
                let deps = deps.clone();
                Box::pin(async move {
                    let message: String = payload.get_as("message").ok_or_else(|| FlowkitError::Input("message is required".to_string()))?;
                    let channel: String = payload.get_as("channel").unwrap_or_else(|| deps.channel.clone());

                    let message_id = send_message(&deps, &channel, &message).await?;
                    Ok(json!({ "message_id": message_id }))
                })
            })
            .build()
    }
}

impl Default for ChatPostNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeContract for ChatPostNode {
    fn config(&self) -> &NodeConfig {
        &self.config
    }

    async fn run(
        &self,
        inputs: &[PortValue],
        contents: &[PortValue],
        console: &dyn Console,
        server: &ServerContext,
    ) -> Option<RunOutput> {
        let provider = params::resolve_or("Provider", inputs, contents, DEFAULT_PROVIDER.to_string());
        let channel = params::resolve_or("Channel", inputs, contents, "general".to_string());

        let deps = SendDeps {
            api_url: server.env(CHAT_API_URL).map(str::to_string),
            access_token: server.access_token(&provider).map(str::to_string),
            channel: channel.clone(),
        };
        let tool = self.build_tool(deps.clone());

        let Some(message) = params::resolve_text("Message", inputs, contents) else {
            console.error("Post Chat Message: message is empty");
            return Some(RunOutput::declined(&self.config).with_tool(tool));
        };

        if deps.access_token.is_none() {
            console.error(&format!("Post Chat Message: no connected account for provider '{provider}'"));
            return Some(RunOutput::declined(&self.config).with_tool(tool));
        }

        match send_message(&deps, &channel, &message).await {
            Ok(message_id) => {
                console.success(&format!("Post Chat Message: sent to #{channel}"));
                let mut values = Vars::new();
                values.set("Message ID", message_id);
                Some(RunOutput::success(values, self.config.credit).with_tool(tool).with_stat("channel", channel))
            }
            Err(error) => {
                console.error(&format!("Post Chat Message: {error}"));
                Some(RunOutput::declined(&self.config).with_tool(tool))
            }
        }
    }
}

/// The one send side effect, shared by `run` and the tool handler.
async fn send_message(
    deps: &SendDeps,
    channel: &str,
    message: &str,
) -> Result<String> {
    let api_url = deps.api_url.as_deref().ok_or_else(|| FlowkitError::Config(format!("{CHAT_API_URL} is not set")))?;
    let access_token = deps.access_token.as_deref().ok_or_else(|| FlowkitError::Config("no connected account".to_string()))?;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{api_url}/v1/messages"))
        .bearer_auth(access_token)
        .timeout(REQUEST_TIMEOUT)
        .json(&json!({
            "channel": channel,
            "text": message,
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(FlowkitError::External(format!("message post failed with status {}", response.status())));
    }

    let body: Value = response.json().await?;
    body.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| FlowkitError::External("message post response carried no id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{console::testing::RecordingConsole, server::SocialAccount};

    #[tokio::test]
    async fn test_missing_token_short_circuits_with_tool() {
        let node = ChatPostNode::new();
        let console = RecordingConsole::new();
        // No connected account; the token gate must fire before any
        // network attempt.
        let server = ServerContext::builder().env(CHAT_API_URL, "https://chat.invalid").build();
        let contents = vec![PortValue::new("Message", "deploy finished")];

        let output = node.run(&[], &contents, &console, &server).await.unwrap();

        assert_eq!(output.values.get("Message ID"), Some(&json!(null)));
        assert_eq!(output.credit, 0.0);
        assert!(output.tool.is_some());
        assert_eq!(console.messages("error"), vec!["Post Chat Message: no connected account for provider 'chat'".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_message_declines_first() {
        let node = ChatPostNode::new();
        let console = RecordingConsole::new();
        let server = ServerContext::builder()
            .social(
                DEFAULT_PROVIDER,
                SocialAccount {
                    access_token: "tok".to_string(),
                    ..Default::default()
                },
            )
            .build();

        let output = node.run(&[], &[], &console, &server).await.unwrap();

        assert_eq!(output.values.get("Message ID"), Some(&json!(null)));
        assert_eq!(output.credit, 0.0);
        assert!(output.tool.is_some());
    }

    #[tokio::test]
    async fn test_tool_invoke_without_account_never_errors() {
        let node = ChatPostNode::new();
        let deps = SendDeps {
            api_url: Some("https://chat.invalid".to_string()),
            access_token: None,
            channel: "general".to_string(),
        };
        let tool = node.build_tool(deps);

        let (result, credit) = tool.invoke(json!({"message": "hi"})).await;

        assert_eq!(credit, 0.0);
        assert_eq!(result, "no connected account");
    }
}
