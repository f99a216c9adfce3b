//! Name-keyed node catalog.

use std::{collections::HashMap, sync::Arc};

use crate::{
    FlowkitError, Result,
    node::{NodeConfig, NodeContract},
};

/// Registry mapping a node's type identifier to its implementation.
///
/// Built once at startup; the external engine looks nodes up by the
/// `node_type` carried in the workflow graph.
#[derive(Default)]
pub struct NodeRegistry {
    nodes: HashMap<String, Arc<dyn NodeContract>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the shipped catalog.
    pub fn builtin() -> Self {
        use crate::nodes::{ChatPostNode, DbQueryNode, ImageGenerateNode, JsonToArrayNode, OutputTextNode};

        let mut registry = Self::new();
        registry.register(OutputTextNode::new());
        registry.register(JsonToArrayNode::new());
        registry.register(ImageGenerateNode::new());
        registry.register(DbQueryNode::new());
        registry.register(ChatPostNode::new());
        registry
    }

    /// Register `node` under its configured type identifier. A second
    /// registration under the same identifier replaces the first.
    pub fn register<N: NodeContract + 'static>(
        &mut self,
        node: N,
    ) {
        let key = node.config().node_type.clone();
        self.nodes.insert(key, Arc::new(node));
    }

    /// Look up a node by type identifier.
    pub fn get(
        &self,
        node_type: &str,
    ) -> Result<Arc<dyn NodeContract>> {
        self.nodes.get(node_type).cloned().ok_or_else(|| FlowkitError::Registry(format!("unknown node type: {node_type}")))
    }

    /// Descriptors of every registered node, for the engine/UI surface.
    pub fn configs(&self) -> Vec<&NodeConfig> {
        self.nodes.values().map(|node| node.config()).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_complete() {
        let registry = NodeRegistry::builtin();

        for node_type in ["output_text", "json_to_array", "image_generate", "db_query", "chat_post"] {
            assert!(registry.get(node_type).is_ok(), "missing builtin node: {node_type}");
        }
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_unknown_node_type_is_an_error() {
        let registry = NodeRegistry::builtin();
        let err = registry.get("does_not_exist").err().unwrap();
        assert_eq!(err, FlowkitError::Registry("unknown node type: does_not_exist".to_string()));
    }

    #[test]
    fn test_configs_expose_every_descriptor() {
        let registry = NodeRegistry::builtin();
        let mut types: Vec<&str> = registry.configs().iter().map(|config| config.node_type.as_str()).collect();
        types.sort();
        assert_eq!(types, vec!["chat_post", "db_query", "image_generate", "json_to_array", "output_text"]);
    }
}
