//! The editable layer and its reconstruction from the action log.
//!
//! The layer is a derived view: it is destroyed and replayed from the log on
//! every undo and redo, never diffed. Mutations queue [`SceneEvent`]s that
//! the owner drains and forwards to observers.

use crate::action::Action;
use crate::history::ActionLog;
use crate::shapes::{Node, NodeId, NodeTrait};
use kurbo::{Point, Vec2};

/// A change to the layer's node set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneEvent {
    NodeAdded { id: NodeId, name: Option<String> },
    NodeRemoved { id: NodeId, name: Option<String> },
}

impl SceneEvent {
    /// Name of the affected node, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            SceneEvent::NodeAdded { name, .. } | SceneEvent::NodeRemoved { name, .. } => {
                name.as_deref()
            }
        }
    }
}

/// Retained nodes of the editable layer, back to front.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    nodes: Vec<Node>,
    events: Vec<SceneEvent>,
}

impl Layer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a node on top of the layer.
    pub fn add(&mut self, node: Node) {
        self.events.push(SceneEvent::NodeAdded {
            id: node.id(),
            name: node.name().map(str::to_string),
        });
        self.nodes.push(node);
    }

    /// Swap the node with the same id, keeping its place in paint order.
    /// Returns false when no such node is attached.
    pub fn replace(&mut self, node: Node) -> bool {
        let Some(slot) = self.nodes.iter_mut().find(|n| n.id() == node.id()) else {
            return false;
        };
        let old = std::mem::replace(slot, node);
        self.events.push(SceneEvent::NodeRemoved {
            id: old.id(),
            name: old.name().map(str::to_string),
        });
        self.events.push(SceneEvent::NodeAdded {
            id: slot.id(),
            name: slot.name().map(str::to_string),
        });
        true
    }

    /// Move a node in place while it is being dragged. Membership does not
    /// change, so no event is queued.
    pub fn translate(&mut self, id: NodeId, delta: Vec2) -> bool {
        match self.nodes.iter_mut().find(|n| n.id() == id) {
            Some(node) => {
                node.translate(delta);
                true
            }
            None => false,
        }
    }

    /// Destroy every node on the layer.
    pub fn destroy_children(&mut self) {
        for node in self.nodes.drain(..) {
            self.events.push(SceneEvent::NodeRemoved {
                id: node.id(),
                name: node.name().map(str::to_string),
            });
        }
    }

    /// Nodes in paint order (back to front).
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Get a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    /// Check whether a node with the given name is attached.
    pub fn contains_named(&self, name: &str) -> bool {
        self.nodes.iter().any(|n| n.name() == Some(name))
    }

    /// Find painting nodes at a world point, front to back.
    ///
    /// Erase strokes are not selectable and are skipped.
    pub fn nodes_at(&self, point: Point, tolerance: f64) -> Vec<NodeId> {
        self.nodes
            .iter()
            .rev()
            .filter(|n| !n.is_eraser() && n.hit_test(point, tolerance))
            .map(|n| n.id())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Take the queued change notifications.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Rebuild the layer from the active prefix of the log.
pub fn rebuild(layer: &mut Layer, log: &ActionLog) {
    replay(layer, log.actions(), log.cursor());
}

/// Destroy the layer and replay `actions[..=cursor]` in recording order.
///
/// Order matters: an erase stroke only removes content replayed before it.
/// A `None` cursor leaves the layer empty.
pub fn replay(layer: &mut Layer, actions: &[Action], cursor: Option<usize>) {
    layer.destroy_children();

    let Some(cursor) = cursor else {
        return;
    };
    for action in actions.iter().take(cursor + 1) {
        action.apply(layer);
    }
}
