//! LLM-callable tool capability objects.
//!
//! A [`Tool`] wraps a node's underlying side effect behind a
//! schema-validated parameter contract so an external LLM agent can call
//! it independently of the workflow graph. `invoke` is total: schema
//! rejections and handler failures come back as the serialized message
//! with credit 0, never as an error.

use std::{fmt, sync::Arc};

use futures::future::BoxFuture;
use serde_json::Value;

use crate::{Result, common::Vars, node::Credit};

type ToolHandler = Arc<dyn Fn(Vars) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// First-class command object: name, description, JSON-Schema parameter
/// contract and an async handler closing over the node's side effect.
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    parameters: Value,
    credit: Credit,
    handler: ToolHandler,
}

impl Tool {
    pub fn builder<N: Into<String>>(name: N) -> ToolBuilder {
        ToolBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// JSON Schema for the payload `invoke` accepts.
    pub fn parameters(&self) -> &Value {
        &self.parameters
    }

    /// Execute the tool with `payload`.
    ///
    /// Returns the serialized result and the credit charged: the tool's
    /// configured credit on success, 0 on schema rejection or handler
    /// failure.
    pub async fn invoke(
        &self,
        payload: Value,
    ) -> (String, Credit) {
        if let Err(error) = jsonschema::validate(&self.parameters, &payload) {
            return (format!("invalid parameters: {error}"), 0.0);
        }

        match (self.handler)(Vars::from(payload)).await {
            Ok(result) => {
                let serialized = serde_json::to_string(&result).unwrap_or_else(|_| result.to_string());
                (serialized, self.credit)
            }
            Err(error) => (error.to_string(), 0.0),
        }
    }
}

impl fmt::Debug for Tool {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("credit", &self.credit)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Tool`].
pub struct ToolBuilder {
    name: String,
    description: String,
    parameters: Value,
    credit: Credit,
    handler: Option<ToolHandler>,
}

impl ToolBuilder {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parameters: serde_json::json!({"type": "object"}),
            credit: 0.0,
            handler: None,
        }
    }

    pub fn description<D: Into<String>>(
        mut self,
        description: D,
    ) -> Self {
        self.description = description.into();
        self
    }

    pub fn parameters(
        mut self,
        schema: Value,
    ) -> Self {
        self.parameters = schema;
        self
    }

    /// Credit charged when the handler succeeds.
    pub fn credit(
        mut self,
        credit: Credit,
    ) -> Self {
        self.credit = credit;
        self
    }

    pub fn handler<F>(
        mut self,
        handler: F,
    ) -> Self
    where
        F: Fn(Vars) -> BoxFuture<'static, Result<Value>> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Tool {
        let handler = self.handler.unwrap_or_else(|| {
            Arc::new(|_: Vars| -> BoxFuture<'static, Result<Value>> { Box::pin(async { Ok(Value::Null) }) })
        });

        Tool {
            name: self.name,
            description: self.description,
            parameters: self.parameters,
            credit: self.credit,
            handler,
        }
    }
}
