//! Editing state for the active map.
//!
//! An [`EditingSession`] owns the live graph, its undo history and the
//! current selection. Discrete edits go through [`EditingSession::apply`],
//! which computes the new graph and records history in one step. Drag moves
//! change the graph without history until [`EditingSession::commit`].

use log::debug;

use crate::config::EditorConfig;
use crate::error::{MutationError, SessionError};
use crate::history::History;
use crate::ids::{IdGenerator, UuidIds};
use crate::model::{GraphSnapshot, NodeData, NodeKind, NodePatch, Position};
use crate::mutation::{self, Connection};
use crate::selection::Selection;
use crate::shortcuts::EditorCommand;

/// What a dispatched command did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    GraphChanged,
    SelectionChanged,
    /// The command belongs to the renderer (fit view)
    Delegated(EditorCommand),
}

pub struct EditingSession {
    map_id: String,
    graph: GraphSnapshot,
    history: History<GraphSnapshot>,
    selection: Selection,
    ids: Box<dyn IdGenerator>,
    config: EditorConfig,
}

impl EditingSession {
    pub fn new(map_id: impl Into<String>, graph: GraphSnapshot, config: EditorConfig) -> Self {
        EditingSession::with_ids(map_id, graph, config, Box::new(UuidIds))
    }

    pub fn with_ids(
        map_id: impl Into<String>,
        graph: GraphSnapshot,
        config: EditorConfig,
        ids: Box<dyn IdGenerator>,
    ) -> Self {
        let config = config.validated();
        let mut history = History::new(config.history_limit);
        history.push(graph.clone());
        EditingSession {
            map_id: map_id.into(),
            graph,
            history,
            selection: Selection::new(),
            ids,
            config,
        }
    }

    pub fn map_id(&self) -> &str {
        &self.map_id
    }

    pub fn graph(&self) -> &GraphSnapshot {
        &self.graph
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &History<GraphSnapshot> {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Swap in another map's graph. History and selection start over.
    pub fn replace_graph(&mut self, map_id: impl Into<String>, graph: GraphSnapshot) {
        self.map_id = map_id.into();
        self.history.clear();
        self.history.push(graph.clone());
        self.graph = graph;
        self.selection.clear();
    }

    /// Record the live graph if it differs from the history head
    pub fn commit(&mut self) -> bool {
        if self.history.current() == Some(&self.graph) {
            return false;
        }
        self.history.push(self.graph.clone());
        true
    }

    /// Run one discrete edit. On error nothing changes; on success the
    /// pre-edit graph is recorded before the result becomes current.
    pub fn apply<F>(&mut self, label: &str, edit: F) -> Result<&GraphSnapshot, SessionError>
    where
        F: FnOnce(
            &GraphSnapshot,
            &Selection,
            &mut dyn IdGenerator,
            &EditorConfig,
        ) -> Result<GraphSnapshot, MutationError>,
    {
        let next = edit(&self.graph, &self.selection, self.ids.as_mut(), &self.config)?;
        self.commit();
        self.history.push(next.clone());
        self.graph = next;
        debug!(
            "{} on map {}: {} nodes, {} edges",
            label,
            self.map_id,
            self.graph.nodes.len(),
            self.graph.edges.len()
        );
        Ok(&self.graph)
    }

    // Selection

    pub fn toggle_selection(&mut self, node_id: &str) -> bool {
        self.selection.toggle(node_id)
    }

    pub fn select_all(&mut self) {
        self.selection
            .select_all(self.graph.nodes.iter().map(|n| n.id.clone()));
    }

    pub fn set_selection<I, T>(&mut self, ids: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.selection.select_all(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // Edits

    pub fn duplicate_selected(&mut self) -> Result<&GraphSnapshot, SessionError> {
        self.apply("duplicate selection", mutation::duplicate_selected)
    }

    pub fn duplicate_node(&mut self, node_id: &str) -> Result<&GraphSnapshot, SessionError> {
        let node = self
            .graph
            .node(node_id)
            .cloned()
            .ok_or_else(|| MutationError::NodeNotFound(node_id.to_string()))?;
        self.apply("duplicate node", |g, _, ids, cfg| {
            mutation::duplicate_node(g, &node, ids, cfg)
        })
    }

    pub fn delete_selected(&mut self) -> Result<&GraphSnapshot, SessionError> {
        let next = mutation::delete_selected(&self.graph, &self.selection)?;
        self.selection.clear();
        self.apply("delete selection", |_, _, _, _| Ok(next))
    }

    /// Drag step; not recorded until [`EditingSession::commit`]
    pub fn move_selected(&mut self, dx: f64, dy: f64) -> Result<&GraphSnapshot, SessionError> {
        self.graph = mutation::move_selected(&self.graph, &self.selection, dx, dy)?;
        Ok(&self.graph)
    }

    pub fn update_selected(&mut self, patch: &NodePatch) -> Result<&GraphSnapshot, SessionError> {
        self.apply("update selection", |g, sel, _, _| {
            mutation::update_selected(g, sel, patch)
        })
    }

    pub fn add_node(
        &mut self,
        kind: NodeKind,
        position: Position,
        data: NodeData,
    ) -> Result<String, SessionError> {
        let mut created = None;
        self.apply("add node", |g, _, ids, _| {
            let (next, id) = mutation::add_node(g, kind, position, data, ids)?;
            created = Some(id);
            Ok(next)
        })?;
        Ok(created.unwrap_or_default())
    }

    pub fn connect(&mut self, conn: Connection) -> Result<String, SessionError> {
        let mut created = None;
        self.apply("connect", |g, _, ids, _| {
            let (next, id) = mutation::connect(g, conn, ids)?;
            created = Some(id);
            Ok(next)
        })?;
        Ok(created.unwrap_or_default())
    }

    pub fn remove_edges(&mut self, edge_ids: &[String]) -> Result<&GraphSnapshot, SessionError> {
        self.apply("remove edges", |g, _, _, _| mutation::remove_edges(g, edge_ids))
    }

    pub fn remove_nodes(&mut self, node_ids: &[String]) -> Result<&GraphSnapshot, SessionError> {
        let next = mutation::remove_nodes(&self.graph, node_ids)?;
        for id in node_ids {
            self.selection.deselect(id);
        }
        self.apply("remove nodes", |_, _, _, _| Ok(next))
    }

    /// Accept a graph edited outside the core as one undoable step
    pub fn record_external(&mut self, graph: GraphSnapshot) -> Result<&GraphSnapshot, SessionError> {
        let next = self.apply("external edit", |_, _, _, _| Ok(graph))?.clone();
        self.selection.retain_existing(&next);
        Ok(&self.graph)
    }

    // History

    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || self.has_pending_moves()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo() && !self.has_pending_moves()
    }

    fn has_pending_moves(&self) -> bool {
        self.history.current() != Some(&self.graph)
    }

    pub fn undo(&mut self) -> Result<&GraphSnapshot, SessionError> {
        self.commit();
        let restored = self.history.undo().ok_or(SessionError::NothingToUndo)?;
        self.restore(restored);
        Ok(&self.graph)
    }

    pub fn redo(&mut self) -> Result<&GraphSnapshot, SessionError> {
        if self.has_pending_moves() {
            return Err(SessionError::NothingToRedo);
        }
        let restored = self.history.redo().ok_or(SessionError::NothingToRedo)?;
        self.restore(restored);
        Ok(&self.graph)
    }

    fn restore(&mut self, graph: GraphSnapshot) {
        self.graph = graph;
        self.selection.retain_existing(&self.graph);
    }

    /// Execute a keyboard command
    pub fn dispatch(&mut self, command: EditorCommand) -> Result<Dispatch, SessionError> {
        match command {
            EditorCommand::Undo => self.undo().map(|_| Dispatch::GraphChanged),
            EditorCommand::Redo => self.redo().map(|_| Dispatch::GraphChanged),
            EditorCommand::DuplicateSelection => {
                self.duplicate_selected().map(|_| Dispatch::GraphChanged)
            }
            EditorCommand::DeleteSelection => self.delete_selected().map(|_| Dispatch::GraphChanged),
            EditorCommand::SelectAll => {
                self.select_all();
                Ok(Dispatch::SelectionChanged)
            }
            EditorCommand::ClearSelection => {
                self.clear_selection();
                Ok(Dispatch::SelectionChanged)
            }
            EditorCommand::FitView => Ok(Dispatch::Delegated(command)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::model::{GraphEdge, GraphNode, Relationship};

    fn session() -> EditingSession {
        let g = GraphSnapshot::new(
            vec![
                GraphNode::new("g1", NodeKind::Goal, Position::new(0.0, 0.0), NodeData::titled("Run")),
                GraphNode::new("g2", NodeKind::Milestone, Position::new(10.0, 0.0), NodeData::titled("10k")),
            ],
            vec![GraphEdge::new("e1", "g1", "g2", Relationship::LeadsTo)],
        );
        EditingSession::with_ids("m1", g, EditorConfig::default(), Box::new(SequentialIds::new("id")))
    }

    #[test]
    fn test_empty_selection_does_not_touch_history() {
        let mut s = session();
        let before = s.history().len();
        assert_eq!(
            s.duplicate_selected().unwrap_err(),
            SessionError::Mutation(MutationError::NothingSelected)
        );
        assert_eq!(s.history().len(), before);
        assert!(!s.can_undo());
    }

    #[test]
    fn test_delete_then_undo_restores() {
        let mut s = session();
        s.toggle_selection("g1");
        s.delete_selected().unwrap();
        assert!(!s.selection().has_selection());
        assert_eq!(s.graph().nodes.len(), 1);
        assert!(s.graph().edges.is_empty());

        let g = s.undo().unwrap().clone();
        assert_eq!(g.nodes.len(), 2);
        assert_eq!(g.edges.len(), 1);
        assert!(s.can_redo());
        s.redo().unwrap();
        assert_eq!(s.graph().nodes.len(), 1);
    }

    #[test]
    fn test_moves_are_committed_lazily() {
        let mut s = session();
        s.toggle_selection("g2");
        let len = s.history().len();
        s.move_selected(1.0, 0.0).unwrap();
        s.move_selected(1.0, 0.0).unwrap();
        assert_eq!(s.history().len(), len);
        assert!(s.can_undo());
        assert!(s.commit());
        assert!(!s.commit());
        assert_eq!(s.history().len(), len + 1);
        s.undo().unwrap();
        assert_eq!(s.graph().node("g2").unwrap().position, Position::new(10.0, 0.0));
    }

    #[test]
    fn test_undo_records_pending_moves_first() {
        let mut s = session();
        s.toggle_selection("g1");
        s.move_selected(5.0, 5.0).unwrap();
        s.undo().unwrap();
        assert_eq!(s.graph().node("g1").unwrap().position, Position::new(0.0, 0.0));
        s.redo().unwrap();
        assert_eq!(s.graph().node("g1").unwrap().position, Position::new(5.0, 5.0));
    }

    #[test]
    fn test_add_and_connect_return_ids() {
        let mut s = session();
        let id = s
            .add_node(NodeKind::Requirement, Position::new(3.0, 4.0), NodeData::titled("Shoes"))
            .unwrap();
        assert_eq!(id, "id-1");
        let eid = s
            .connect(Connection {
                source: id.clone(),
                target: "g1".into(),
                relationship: Relationship::DependsOn,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(s.graph().edge(&eid).unwrap().source, id);
        s.undo().unwrap();
        assert!(s.graph().edge(&eid).is_none());
    }

    #[test]
    fn test_replace_graph_resets_state() {
        let mut s = session();
        s.select_all();
        s.duplicate_selected().unwrap();
        s.replace_graph("m2", GraphSnapshot::default());
        assert_eq!(s.map_id(), "m2");
        assert!(!s.selection().has_selection());
        assert!(!s.can_undo());
        assert_eq!(s.history().len(), 1);
    }

    #[test]
    fn test_dispatch() {
        let mut s = session();
        assert_eq!(s.dispatch(EditorCommand::SelectAll), Ok(Dispatch::SelectionChanged));
        assert_eq!(s.selection().count(), 2);
        assert_eq!(s.dispatch(EditorCommand::DuplicateSelection), Ok(Dispatch::GraphChanged));
        assert_eq!(s.graph().nodes.len(), 4);
        assert_eq!(
            s.dispatch(EditorCommand::FitView),
            Ok(Dispatch::Delegated(EditorCommand::FitView))
        );
        assert_eq!(s.dispatch(EditorCommand::ClearSelection), Ok(Dispatch::SelectionChanged));
        assert_eq!(
            s.dispatch(EditorCommand::DeleteSelection),
            Err(SessionError::Mutation(MutationError::NothingSelected))
        );
        assert_eq!(s.dispatch(EditorCommand::Undo), Ok(Dispatch::GraphChanged));
        assert_eq!(s.graph().nodes.len(), 2);
        assert_eq!(s.dispatch(EditorCommand::Undo), Err(SessionError::NothingToUndo));
    }

    #[test]
    fn test_record_external_prunes_selection() {
        let mut s = session();
        s.select_all();
        let mut g = s.graph().clone();
        g.nodes.retain(|n| n.id == "g2");
        g.edges.clear();
        s.record_external(g).unwrap();
        assert_eq!(s.selection().to_sorted_vec(), vec!["g2"]);
        assert!(s.can_undo());
    }
}
