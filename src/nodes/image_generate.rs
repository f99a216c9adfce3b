use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::{Value, json};

use crate::{
    FlowkitError, Result,
    common::Vars,
    console::Console,
    node::{Difficulty, FieldKind, FieldSpec, NodeConfig, NodeContract, PortKind, PortSpec, PortValue, RunOutput, Tool, params},
    server::{ObjectStore, ServerContext},
    utils,
};

const IMAGE_API_URL: &str = "IMAGE_API_URL";
const IMAGE_API_KEY: &str = "IMAGE_API_KEY";

const POLL_INTERVAL: Duration = Duration::from_secs(3);
const MAX_POLL_ATTEMPTS: u32 = 60;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const MODEL_FLASH: &str = "flash";
const MODEL_ULTRA: &str = "ultra";

/// Text-to-image generation against a job-based generation API.
///
/// Submits one job, then polls its status on a fixed interval up to a
/// fixed cap. Polling retries the read only; the job is never
/// resubmitted. The decoded image passes through a scratch file that is
/// removed on every exit path before the generated URL is returned.
pub struct ImageGenerateNode {
    config: NodeConfig,
}

/// Effective parameters of one generation call.
#[derive(Debug, Clone)]
struct GenerateParams {
    prompt: String,
    model: String,
    size: String,
}

/// Everything the generation side effect needs from the outside world,
/// captured up front so the tool handler can run it independently.
#[derive(Clone)]
struct GenerateDeps {
    api_url: Option<String>,
    api_key: Option<String>,
    object_store: Option<Arc<dyn ObjectStore>>,
    workflow_id: String,
    scratch_dir: std::path::PathBuf,
}

impl GenerateDeps {
    fn from_server(server: &ServerContext) -> Self {
        Self {
            api_url: server.env(IMAGE_API_URL).map(str::to_string),
            api_key: server.env(IMAGE_API_KEY).map(str::to_string),
            object_store: server.object_store(),
            workflow_id: server.workflow_id().to_string(),
            scratch_dir: server.scratch_dir().to_path_buf(),
        }
    }
}

impl ImageGenerateNode {
    pub fn new() -> Self {
        Self {
            config: NodeConfig {
                title: "Generate Image".to_string(),
                category: "generation".to_string(),
                node_type: "image_generate".to_string(),
                description: "Generate an image from a text prompt.".to_string(),
                credit: 5.0,
                inputs: vec![PortSpec::new("In", PortKind::Flow, "Trigger"), PortSpec::new("Prompt", PortKind::Text, "Text prompt")],
                outputs: vec![
                    PortSpec::new("Out", PortKind::Flow, "Next node"),
                    PortSpec::new("Image Link", PortKind::Image, "URL of the generated image"),
                    PortSpec::new("Tool", PortKind::Tool, "LLM-callable image generator"),
                ],
                fields: vec![
                    FieldSpec::new("Prompt", FieldKind::TextArea, "Text prompt", json!("")),
                    FieldSpec::new("Model", FieldKind::Select, "Generation model", json!(MODEL_FLASH))
                        .with_options(vec![MODEL_FLASH.to_string(), MODEL_ULTRA.to_string()]),
                    FieldSpec::new("Size", FieldKind::Select, "Output size", json!("1024x1024"))
                        .with_options(vec!["512x512".to_string(), "1024x1024".to_string()]),
                ],
                difficulty: Difficulty::Medium,
                tags: vec!["generation".to_string(), "image".to_string()],
            },
        }
    }

    fn model_credit(model: &str) -> f64 {
        match model {
            MODEL_ULTRA => 10.0,
            _ => 5.0,
        }
    }

    fn build_tool(
        &self,
        deps: GenerateDeps,
        model: String,
    ) -> Tool {
        let credit = Self::model_credit(&model);

        Tool::builder("generate_image")
            .description("Generate an image from a text prompt and return its URL.")
            .parameters(json!({
                "type": "object",
                "required": ["prompt"],
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "Text description of the image to generate"
                    },
                    "size": {
                        "type": "string",
                        "enum": ["512x512", "1024x1024"],
                        "description": "Output size, defaults to 1024x1024"
                    }
                }
            }))
            .credit(credit)
            .handler(move |payload| {
                let deps = deps.clone();
                let model = model.clone();
                Box::pin(async move {
                    let prompt: String = payload.get_as("prompt").ok_or_else(|| FlowkitError::Input("prompt is required".to_string()))?;
                    let size: String = payload.get_as("size").unwrap_or_else(|| "1024x1024".to_string());

                    let url = generate_image(
                        GenerateParams {
                            prompt,
                            model,
                            size,
                        },
                        &deps,
                    )
                    .await?;

                    Ok(json!({ "image_link": url }))
                })
            })
            .build()
    }
}

impl Default for ImageGenerateNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeContract for ImageGenerateNode {
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
        let model = params::resolve_or("Model", inputs, contents, MODEL_FLASH.to_string());
        let size = params::resolve_or("Size", inputs, contents, "1024x1024".to_string());
        let deps = GenerateDeps::from_server(server);
        let tool = self.build_tool(deps.clone(), model.clone());

        let Some(prompt) = params::resolve_text("Prompt", inputs, contents) else {
            console.error("Generate Image: prompt is empty");
            return Some(RunOutput::declined(&self.config).with_tool(tool));
        };

        if deps.api_url.is_none() || deps.api_key.is_none() {
            console.error("Generate Image: IMAGE_API_URL/IMAGE_API_KEY not configured for this workflow");
            return Some(RunOutput::declined(&self.config).with_tool(tool));
        }

        console.info(&format!("Generate Image: submitting job (model: {model})"));
        let started = utils::time_millis();

        let result = generate_image(
            GenerateParams {
                prompt,
                model: model.clone(),
                size,
            },
            &deps,
        )
        .await;

        match result {
            Ok(url) => {
                console.success(&format!("Generate Image: ready at {url}"));
                let mut values = Vars::new();
                values.set("Image Link", url);
                Some(
                    RunOutput::success(values, Self::model_credit(&model))
                        .with_tool(tool)
                        .with_stat("model", model)
                        .with_stat("elapsed_ms", utils::time_millis() - started),
                )
            }
            Err(error) => {
                console.error(&format!("Generate Image: {error}"));
                Some(RunOutput::declined(&self.config).with_tool(tool))
            }
        }
    }

    fn estimate_usage(
        &self,
        inputs: &[PortValue],
        contents: &[PortValue],
        _server: &ServerContext,
    ) -> f64 {
        let model = params::resolve_or("Model", inputs, contents, MODEL_FLASH.to_string());
        Self::model_credit(&model)
    }
}

/// The one generation side effect, shared by `run` and the tool handler.
///
/// Returns the stored image URL.
async fn generate_image(
    request: GenerateParams,
    deps: &GenerateDeps,
) -> Result<String> {
    let api_url = deps.api_url.as_deref().ok_or_else(|| FlowkitError::Config(format!("{IMAGE_API_URL} is not set")))?;
    let api_key = deps.api_key.as_deref().ok_or_else(|| FlowkitError::Config(format!("{IMAGE_API_KEY} is not set")))?;

    let client = reqwest::Client::new();

    // Submit the job
    let response = client
        .post(format!("{api_url}/v1/images/jobs"))
        .bearer_auth(api_key)
        .timeout(REQUEST_TIMEOUT)
        .json(&json!({
            "prompt": request.prompt,
            "model": request.model,
            "size": request.size,
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(FlowkitError::External(format!("job submission failed with status {}", response.status())));
    }

    let submitted: Value = response.json().await?;
    let job_id = submitted
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| FlowkitError::External("job submission response carried no id".to_string()))?
        .to_string();

    // Poll the job until it settles. Reads are retried; the job is not.
    let image_b64 = poll_for_image(&client, api_url, api_key, &job_id).await?;
    let bytes = STANDARD.decode(image_b64.as_bytes()).map_err(|err| FlowkitError::Convert(err.to_string()))?;

    store_image(deps, bytes).await
}

async fn poll_for_image(
    client: &reqwest::Client,
    api_url: &str,
    api_key: &str,
    job_id: &str,
) -> Result<String> {
    for _ in 0..MAX_POLL_ATTEMPTS {
        let response = client.get(format!("{api_url}/v1/images/jobs/{job_id}")).bearer_auth(api_key).timeout(REQUEST_TIMEOUT).send().await?;

        if !response.status().is_success() {
            return Err(FlowkitError::External(format!("job poll failed with status {}", response.status())));
        }

        let status: Value = response.json().await?;
        match status.get("status").and_then(Value::as_str) {
            Some("succeeded") => {
                return status
                    .get("image_base64")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| FlowkitError::External("job succeeded without image payload".to_string()));
            }
            Some("failed") => {
                let reason = status.get("error").and_then(Value::as_str).unwrap_or("unknown reason");
                return Err(FlowkitError::External(format!("generation failed: {reason}")));
            }
            _ => tokio::time::sleep(POLL_INTERVAL).await,
        }
    }

    Err(FlowkitError::External(format!("job {job_id} did not finish within the polling window")))
}

/// Spool the decoded image through a scratch file and upload it.
///
/// The scratch file is removed on every exit path.
async fn store_image(
    deps: &GenerateDeps,
    bytes: Vec<u8>,
) -> Result<String> {
    let store = deps.object_store.clone().ok_or_else(|| FlowkitError::Config("no object storage attached to this workflow".to_string()))?;

    let file_name = format!("{}/generated-{}.png", deps.workflow_id, nanoid::nanoid!(10));
    let scratch = deps.scratch_dir.join(format!("flowkit-{}.png", nanoid::nanoid!(10)));

    if let Err(error) = tokio::fs::write(&scratch, &bytes).await {
        remove_scratch(&scratch).await;
        return Err(error.into());
    }

    let data = match tokio::fs::read(&scratch).await {
        Ok(data) => data,
        Err(error) => {
            remove_scratch(&scratch).await;
            return Err(error.into());
        }
    };

    let reply = store.add_file(&file_name, data, "image/png").await;

    remove_scratch(&scratch).await;

    if !reply.success {
        return Err(FlowkitError::External(format!("upload failed: {}", reply.message)));
    }
    reply.file_url.ok_or_else(|| FlowkitError::External("upload succeeded without a file URL".to_string()))
}

/// Delete a scratch file; failures are logged and swallowed.
async fn remove_scratch(path: &std::path::Path) {
    if let Err(error) = tokio::fs::remove_file(path).await {
        tracing::warn!(target: "flowkit::node", "failed to remove scratch file {}: {error}", path.display());
    }
}
