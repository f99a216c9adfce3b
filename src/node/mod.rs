//! The Node Execution Contract.
//!
//! Every catalog node implements [`NodeContract`] so the external
//! workflow engine can introspect and execute it without per-node
//! special-casing. A node's `run` is a terminal error boundary: it never
//! panics and no error type escapes it. Failures come back as a
//! [`RunOutput`] with null data fields and credit 0, or as `None` when
//! the node cannot proceed at all.

pub mod config;
pub mod params;
mod registry;
mod tool;

use async_trait::async_trait;

use crate::{
    common::Vars,
    console::Console,
    server::ServerContext,
};

pub use config::{Difficulty, FieldKind, FieldSpec, NodeConfig, PortKind, PortSpec};
pub use params::{PortValue, resolve, resolve_or, resolve_text, resolve_value};
pub use registry::NodeRegistry;
pub use tool::{Tool, ToolBuilder};

/// Abstract usage-cost unit charged per node execution.
pub type Credit = f64;

/// Result of one node execution.
///
/// Credit and stats are explicit fields here rather than hidden mutable
/// state on the node instance, so a run is fully described by its return
/// value.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    /// Result map keyed by the node's declared output names.
    pub values: Vars,
    /// Credit actually charged for this execution.
    pub credit: Credit,
    /// Free-form execution telemetry, last-write-wins per key.
    pub stats: Vars,
    /// LLM-callable wrapper around the node's side effect, when the node
    /// defines one. Populated even on short-circuited runs.
    pub tool: Option<Tool>,
}

impl RunOutput {
    /// Successful execution charging `credit`.
    pub fn success(
        values: Vars,
        credit: Credit,
    ) -> Self {
        Self {
            values,
            credit,
            stats: Vars::new(),
            tool: None,
        }
    }

    /// Short-circuited execution: every declared data output of `config`
    /// is present and null, credit is 0.
    ///
    /// Used both for missing required parameters/credentials and for
    /// failed external calls, so every node fails in the same shape.
    pub fn declined(config: &NodeConfig) -> Self {
        let mut values = Vars::new();
        for name in config.data_output_names() {
            values.set(name, serde_json::Value::Null);
        }

        Self {
            values,
            credit: 0.0,
            stats: Vars::new(),
            tool: None,
        }
    }

    pub fn with_tool(
        mut self,
        tool: Tool,
    ) -> Self {
        self.tool = Some(tool);
        self
    }

    pub fn with_stat<K, V>(
        mut self,
        key: K,
        value: V,
    ) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.stats.set(key, value);
        self
    }
}

/// The uniform shape every plugin node implements.
///
/// The engine drives one `run` per graph visit and never invokes `run`
/// concurrently on the same instance; nodes issue any multiple external
/// calls sequentially.
#[async_trait]
pub trait NodeContract: Send + Sync {
    /// The immutable descriptor. No side effects, always succeeds.
    fn config(&self) -> &NodeConfig;

    /// Execute the node.
    ///
    /// Parameters are resolved inputs-first, contents-second through
    /// [`params`]. Returning `None` is reserved for "cannot proceed at
    /// all"; every other failure returns a populated output with null
    /// data fields and credit 0. Any scratch resource acquired during
    /// the call is released on every exit path.
    async fn run(
        &self,
        inputs: &[PortValue],
        contents: &[PortValue],
        console: &dyn Console,
        server: &ServerContext,
    ) -> Option<RunOutput>;

    /// Side-effect-free credit estimate for a hypothetical execution
    /// with the given parameters. Defaults to the configured base cost.
    fn estimate_usage(
        &self,
        _inputs: &[PortValue],
        _contents: &[PortValue],
        _server: &ServerContext,
    ) -> Credit {
        self.config().credit
    }
}
