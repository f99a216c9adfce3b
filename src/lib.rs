//! # Flowkit
//!
//! Flowkit is a catalog of independent node plugins for a visual
//! workflow-automation platform, built around one uniform execution
//! contract. The workflow engine that sequences nodes lives outside this
//! crate; it loads a node's static descriptor, resolves its parameters
//! and drives `run` once per graph visit.
//!
//! ## Core Pieces
//!
//! - **Node Contract**: the [`NodeContract`] trait every plugin
//!   implements (descriptor, `run`, credit estimate)
//! - **Dual-mode execution**: nodes return both their data outputs and an
//!   LLM-callable [`Tool`] wrapping the same side effect
//! - **Registry**: a name-keyed [`NodeRegistry`] the engine looks nodes
//!   up in
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flowkit::{NodeRegistry, PortValue, ServerContext, TracingConsole};
//!
//! let registry = NodeRegistry::builtin();
//! let node = registry.get("output_text")?;
//!
//! let server = ServerContext::builder().build();
//! let contents = vec![PortValue::new("Text", "hello")];
//! let output = node.run(&[], &contents, &TracingConsole, &server).await;
//! ```

mod common;
mod console;
mod error;
pub mod node;
pub mod nodes;
mod server;
mod utils;

pub use common::{MemCache, Vars};
pub use console::{Console, TracingConsole};
pub use error::FlowkitError;
pub use node::{
    Credit, NodeConfig, NodeContract, NodeRegistry, PortValue, RunOutput, Tool, ToolBuilder,
};
pub use server::{KvReply, KvStore, MemKvStore, MemObjectStore, ObjectStore, ServerContext, SocialAccount, StoreReply, TokenSink};

/// Result type alias for Flowkit operations.
pub type Result<T> = std::result::Result<T, FlowkitError>;
