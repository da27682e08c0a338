use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::GraphError;
use crate::limits;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Goal,
    Milestone,
    Requirement,
    Note,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Blocked,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relationship {
    DependsOn,
    LeadsTo,
    #[default]
    Related,
    Blocks,
}

/// Side of a node an edge attaches to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Position {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NodeData {
    pub fn titled(title: impl Into<String>) -> Self {
        NodeData {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Replace tags, dropping repeats while keeping first-seen order
    pub fn set_tags<I, T>(&mut self, tags: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = dedup_tags(tags.into_iter().map(Into::into));
    }
}

pub(crate) fn dedup_tags(tags: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.filter(|t| seen.insert(t.clone())).collect()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    pub position: Position,
    pub data: NodeData,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, kind: NodeKind, position: Position, data: NodeData) -> Self {
        GraphNode {
            id: id.into(),
            kind,
            position,
            data,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<Side>,
    #[serde(default)]
    pub relationship: Relationship,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GraphEdge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        relationship: Relationship,
    ) -> Self {
        GraphEdge {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
            relationship,
            label: None,
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// One goal map's nodes and edges at a point in time
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        GraphSnapshot { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    /// Every id in use by a node or an edge
    pub fn taken_ids(&self) -> HashSet<String> {
        self.nodes
            .iter()
            .map(|n| n.id.clone())
            .chain(self.edges.iter().map(|e| e.id.clone()))
            .collect()
    }

    /// Structural checks applied to graphs arriving from outside the session
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.nodes.len() > limits::MAX_NODES {
            return Err(GraphError::TooManyNodes {
                max: limits::MAX_NODES,
                got: self.nodes.len(),
            });
        }
        if self.edges.len() > limits::MAX_EDGES {
            return Err(GraphError::TooManyEdges {
                max: limits::MAX_EDGES,
                got: self.edges.len(),
            });
        }
        let mut node_ids = HashSet::with_capacity(self.nodes.len());
        for n in &self.nodes {
            if !node_ids.insert(n.id.as_str()) {
                return Err(GraphError::DuplicateId(n.id.clone()));
            }
            if !limits::in_coord_bounds(n.position.x) || !limits::in_coord_bounds(n.position.y) {
                return Err(GraphError::PositionOutOfBounds(n.id.clone()));
            }
            if n.data.progress > 100 {
                return Err(GraphError::ProgressOutOfRange {
                    node: n.id.clone(),
                    got: n.data.progress,
                });
            }
            if n.data.tags.len() > limits::MAX_TAGS_PER_NODE {
                return Err(GraphError::TooManyTags(n.id.clone()));
            }
            let mut tags = HashSet::new();
            if !n.data.tags.iter().all(|t| tags.insert(t.as_str())) {
                return Err(GraphError::DuplicateTag(n.id.clone()));
            }
        }
        let mut edge_ids = HashSet::with_capacity(self.edges.len());
        for e in &self.edges {
            if !edge_ids.insert(e.id.as_str()) {
                return Err(GraphError::DuplicateId(e.id.clone()));
            }
            for end in [&e.source, &e.target] {
                if !node_ids.contains(end.as_str()) {
                    return Err(GraphError::DanglingEdge {
                        edge: e.id.clone(),
                        node: end.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Partial payload update; `None` fields are left as they are
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<NodeStatus>,
    pub priority: Option<Priority>,
    pub progress: Option<u8>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NodePatch {
    pub fn is_empty(&self) -> bool {
        *self == NodePatch::default()
    }

    pub fn apply_to(&self, data: &mut NodeData) {
        if let Some(title) = &self.title {
            data.title = title.clone();
        }
        if let Some(description) = &self.description {
            data.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            data.status = status;
        }
        if let Some(priority) = self.priority {
            data.priority = priority;
        }
        if let Some(progress) = self.progress {
            data.progress = progress.min(100);
        }
        if let Some(category) = &self.category {
            data.category = Some(category.clone());
        }
        if let Some(tags) = &self.tags {
            data.set_tags(tags.iter().cloned());
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}
