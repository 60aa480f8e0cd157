// src/model/network.rs

use crate::error::ConfigError;
use crate::model::node::{Node, NodeId, NodeKind, NodeSnapshot};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// What the visualization side gets to see: snapshots and directed supply edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphView {
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<(NodeId, NodeId)>,
}

/// Validated supply network.
///
/// Raw-material nodes are kept in insertion order; `requirements[i]` is the
/// number of units of the i-th raw-material node consumed per assembled unit.
#[derive(Debug, Clone)]
pub struct Network {
    nodes: Vec<Node>,
    requirements: Vec<u32>,
    raw_materials: Vec<usize>,
    sub_assembly: Option<usize>,
    edges: Vec<(NodeId, NodeId)>,
}

impl Network {
    pub fn new(nodes: Vec<Node>, requirements: Vec<u32>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for node in &nodes {
            if !seen.insert(node.id()) {
                return Err(ConfigError::DuplicateNode(node.id()));
            }
        }

        let mut edges = BTreeSet::new();
        for node in &nodes {
            let config = node.config();
            for &up in config.upstream() {
                if !seen.contains(&up) {
                    return Err(ConfigError::UnknownEdgeEndpoint { node: node.id(), missing: up });
                }
                edges.insert((up, node.id()));
            }
            for &down in config.downstream() {
                if !seen.contains(&down) {
                    return Err(ConfigError::UnknownEdgeEndpoint { node: node.id(), missing: down });
                }
                edges.insert((node.id(), down));
            }
        }

        let raw_materials: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.config().kind() == NodeKind::RawMaterial)
            .map(|(i, _)| i)
            .collect();
        let assemblies: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.config().kind() == NodeKind::SubAssembly)
            .map(|(i, _)| i)
            .collect();

        if assemblies.len() > 1 {
            return Err(ConfigError::MultipleSubAssemblies(assemblies.len()));
        }
        let sub_assembly = assemblies.first().copied();

        if let Some(idx) = sub_assembly {
            if raw_materials.is_empty() {
                return Err(ConfigError::MissingRawMaterials(nodes[idx].id()));
            }
            if requirements.len() != raw_materials.len() {
                return Err(ConfigError::RequirementLength {
                    expected: raw_materials.len(),
                    actual: requirements.len(),
                });
            }
            if let Some(pos) = requirements.iter().position(|&r| r == 0) {
                return Err(ConfigError::ZeroRequirement(pos));
            }
        }

        Ok(Self {
            nodes,
            requirements,
            raw_materials,
            sub_assembly,
            edges: edges.into_iter().collect(),
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id() == id)
    }

    /// Assembly bill of materials, aligned with [`Network::raw_material_indices`].
    pub fn requirements(&self) -> &[u32] {
        &self.requirements
    }

    pub fn raw_material_indices(&self) -> &[usize] {
        &self.raw_materials
    }

    pub fn sub_assembly_index(&self) -> Option<usize> {
        self.sub_assembly
    }

    pub fn edges(&self) -> &[(NodeId, NodeId)] {
        &self.edges
    }

    pub fn graph_view(&self) -> GraphView {
        GraphView {
            nodes: self.nodes.iter().map(Node::snapshot).collect(),
            edges: self.edges.clone(),
        }
    }
}
