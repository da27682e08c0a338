//! Bulk and single-entity edits over a graph snapshot.
//!
//! Every function borrows the current graph and returns a new one; the input
//! is never modified. Selection-driven operations fail with
//! [`MutationError::NothingSelected`] when no selected id names a node, so a
//! caller can skip recording history for an empty edit.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::EditorConfig;
use crate::error::MutationError;
use crate::ids::{fresh_id, IdGenerator};
use crate::limits;
use crate::model::{
    GraphEdge, GraphNode, GraphSnapshot, NodeData, NodeKind, NodePatch, Position, Relationship,
    Side,
};
use crate::selection::Selection;

fn ensure_selection(graph: &GraphSnapshot, selection: &Selection) -> Result<(), MutationError> {
    if graph.nodes.iter().any(|n| selection.contains(&n.id)) {
        Ok(())
    } else {
        Err(MutationError::NothingSelected)
    }
}

fn copy_of(node: &GraphNode, id: String, config: &EditorConfig) -> GraphNode {
    let mut copy = node.clone();
    copy.id = id;
    copy.position = node
        .position
        .offset(config.duplicate_offset.x, config.duplicate_offset.y);
    copy.data.title = format!("{}{}", node.data.title, config.copy_suffix);
    copy
}

/// Append an offset copy of every selected node. Copies get fresh ids, are
/// not connected to any edge and are not selected.
pub fn duplicate_selected(
    graph: &GraphSnapshot,
    selection: &Selection,
    ids: &mut dyn IdGenerator,
    config: &EditorConfig,
) -> Result<GraphSnapshot, MutationError> {
    ensure_selection(graph, selection)?;
    let mut taken = graph.taken_ids();
    let mut copies = Vec::new();
    for node in graph.nodes.iter().filter(|n| selection.contains(&n.id)) {
        let id = fresh_id(ids, &mut taken)?;
        copies.push(copy_of(node, id, config));
    }
    let mut next = graph.clone();
    next.nodes.extend(copies);
    Ok(next)
}

/// Append an offset copy of one explicit node, regardless of selection
pub fn duplicate_node(
    graph: &GraphSnapshot,
    node: &GraphNode,
    ids: &mut dyn IdGenerator,
    config: &EditorConfig,
) -> Result<GraphSnapshot, MutationError> {
    let mut taken = graph.taken_ids();
    taken.insert(node.id.clone());
    let id = fresh_id(ids, &mut taken)?;
    let mut next = graph.clone();
    next.nodes.push(copy_of(node, id, config));
    Ok(next)
}

/// Remove selected nodes together with every edge touching them
pub fn delete_selected(
    graph: &GraphSnapshot,
    selection: &Selection,
) -> Result<GraphSnapshot, MutationError> {
    ensure_selection(graph, selection)?;
    Ok(without_nodes(graph, |id| selection.contains(id)))
}

/// Remove the named nodes and their edges; unknown ids are an error
pub fn remove_nodes(graph: &GraphSnapshot, node_ids: &[String]) -> Result<GraphSnapshot, MutationError> {
    if let Some(missing) = node_ids.iter().find(|id| !graph.contains_node(id)) {
        return Err(MutationError::NodeNotFound(missing.clone()));
    }
    if node_ids.is_empty() {
        return Err(MutationError::NothingSelected);
    }
    let doomed: HashSet<&str> = node_ids.iter().map(String::as_str).collect();
    Ok(without_nodes(graph, |id| doomed.contains(id)))
}

fn without_nodes(graph: &GraphSnapshot, doomed: impl Fn(&str) -> bool) -> GraphSnapshot {
    GraphSnapshot {
        nodes: graph
            .nodes
            .iter()
            .filter(|n| !doomed(&n.id))
            .cloned()
            .collect(),
        edges: graph
            .edges
            .iter()
            .filter(|e| !doomed(&e.source) && !doomed(&e.target))
            .cloned()
            .collect(),
    }
}

/// Translate selected nodes. Cheap enough to call per drag step.
pub fn move_selected(
    graph: &GraphSnapshot,
    selection: &Selection,
    dx: f64,
    dy: f64,
) -> Result<GraphSnapshot, MutationError> {
    if !dx.is_finite() || !dy.is_finite() {
        return Err(MutationError::InvalidPosition);
    }
    ensure_selection(graph, selection)?;
    let mut next = graph.clone();
    for node in next.nodes.iter_mut().filter(|n| selection.contains(&n.id)) {
        let moved = node.position.offset(dx, dy);
        if !limits::in_coord_bounds(moved.x) || !limits::in_coord_bounds(moved.y) {
            return Err(MutationError::InvalidPosition);
        }
        node.position = moved;
    }
    Ok(next)
}

/// Merge `patch` into the payload of every selected node
pub fn update_selected(
    graph: &GraphSnapshot,
    selection: &Selection,
    patch: &NodePatch,
) -> Result<GraphSnapshot, MutationError> {
    ensure_selection(graph, selection)?;
    let mut next = graph.clone();
    for node in next.nodes.iter_mut().filter(|n| selection.contains(&n.id)) {
        patch.apply_to(&mut node.data);
    }
    Ok(next)
}

/// Add a new node, returns the graph and the node id
pub fn add_node(
    graph: &GraphSnapshot,
    kind: NodeKind,
    position: Position,
    mut data: NodeData,
    ids: &mut dyn IdGenerator,
) -> Result<(GraphSnapshot, String), MutationError> {
    if !limits::in_coord_bounds(position.x) || !limits::in_coord_bounds(position.y) {
        return Err(MutationError::InvalidPosition);
    }
    let mut taken = graph.taken_ids();
    let id = fresh_id(ids, &mut taken)?;
    data.progress = data.progress.min(100);
    let tags = std::mem::take(&mut data.tags);
    data.set_tags(tags);
    let mut next = graph.clone();
    next.nodes.push(GraphNode::new(id.clone(), kind, position, data));
    Ok((next, id))
}

/// Endpoints and presentation of a new edge
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Connection {
    pub source: String,
    pub target: String,
    pub source_handle: Option<Side>,
    pub target_handle: Option<Side>,
    pub relationship: Relationship,
    pub label: Option<String>,
}

/// Connect two existing nodes, returns the graph and the edge id
pub fn connect(
    graph: &GraphSnapshot,
    conn: Connection,
    ids: &mut dyn IdGenerator,
) -> Result<(GraphSnapshot, String), MutationError> {
    if conn.source == conn.target {
        return Err(MutationError::SelfLoop);
    }
    for end in [&conn.source, &conn.target] {
        if !graph.contains_node(end) {
            return Err(MutationError::NodeNotFound(end.clone()));
        }
    }
    let exists = graph.edges.iter().any(|e| {
        e.source == conn.source && e.target == conn.target && e.relationship == conn.relationship
    });
    if exists {
        return Err(MutationError::DuplicateEdge {
            from: conn.source,
            to: conn.target,
        });
    }
    let mut taken = graph.taken_ids();
    let id = fresh_id(ids, &mut taken)?;
    let mut next = graph.clone();
    next.edges.push(GraphEdge {
        id: id.clone(),
        source: conn.source,
        target: conn.target,
        source_handle: conn.source_handle,
        target_handle: conn.target_handle,
        relationship: conn.relationship,
        label: conn.label,
    });
    Ok((next, id))
}

pub fn remove_edges(graph: &GraphSnapshot, edge_ids: &[String]) -> Result<GraphSnapshot, MutationError> {
    if let Some(missing) = edge_ids.iter().find(|id| graph.edge(id).is_none()) {
        return Err(MutationError::EdgeNotFound(missing.clone()));
    }
    let mut next = graph.clone();
    next.edges.retain(|e| !edge_ids.contains(&e.id));
    Ok(next)
}
