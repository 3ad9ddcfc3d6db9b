//! Layout tree management

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, Key, SlotMap};
use taffy::{AvailableSpace, Layout, NodeId, Style, TaffyError, TaffyTree};

new_key_type! {
    pub struct LayoutNodeId;
}

impl LayoutNodeId {
    /// Convert to a raw u64 representation
    pub fn to_raw(self) -> u64 {
        self.data().as_ffi()
    }
}

/// Maps between Xenon node IDs and Taffy node IDs
pub struct LayoutTree {
    taffy: TaffyTree<()>,
    node_map: SlotMap<LayoutNodeId, NodeId>,
    /// Reverse mapping from Taffy NodeId to our LayoutNodeId
    reverse_map: FxHashMap<NodeId, LayoutNodeId>,
}

impl LayoutTree {
    pub fn new() -> Self {
        Self {
            taffy: TaffyTree::new(),
            node_map: SlotMap::with_key(),
            reverse_map: FxHashMap::default(),
        }
    }

    /// Create a new layout node with the given style
    pub fn create_node(&mut self, style: Style) -> Result<LayoutNodeId, TaffyError> {
        let taffy_node = self.taffy.new_leaf(style)?;
        let id = self.node_map.insert(taffy_node);
        self.reverse_map.insert(taffy_node, id);
        Ok(id)
    }

    /// Get the style of a node
    pub fn style(&self, id: LayoutNodeId) -> Option<&Style> {
        self.node_map
            .get(id)
            .and_then(|&taffy_node| self.taffy.style(taffy_node).ok())
    }

    /// Set the style for a node
    pub fn set_style(&mut self, id: LayoutNodeId, style: Style) {
        if let Some(&taffy_node) = self.node_map.get(id) {
            let _ = self.taffy.set_style(taffy_node, style);
        }
    }

    /// Add a child to a parent node
    pub fn add_child(&mut self, parent: LayoutNodeId, child: LayoutNodeId) -> Result<(), TaffyError> {
        if let (Some(&parent_node), Some(&child_node)) =
            (self.node_map.get(parent), self.node_map.get(child))
        {
            self.taffy.add_child(parent_node, child_node)?;
        }
        Ok(())
    }

    /// Compute layout for a tree rooted at the given node
    pub fn compute_layout(
        &mut self,
        root: LayoutNodeId,
        available_space: taffy::Size<AvailableSpace>,
    ) -> Result<(), TaffyError> {
        match self.node_map.get(root) {
            Some(&taffy_node) => self.taffy.compute_layout(taffy_node, available_space),
            None => Ok(()),
        }
    }

    /// Get the computed layout for a node
    pub fn get_layout(&self, id: LayoutNodeId) -> Option<&Layout> {
        self.node_map
            .get(id)
            .and_then(|&taffy_node| self.taffy.layout(taffy_node).ok())
    }

    /// Check if a node exists in this tree
    pub fn node_exists(&self, id: LayoutNodeId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Get children of a layout node
    pub fn children(&self, parent: LayoutNodeId) -> Vec<LayoutNodeId> {
        let Some(&taffy_node) = self.node_map.get(parent) else {
            return Vec::new();
        };

        let Ok(children) = self.taffy.children(taffy_node) else {
            return Vec::new();
        };

        children
            .iter()
            .filter_map(|&child_taffy| self.reverse_map.get(&child_taffy).copied())
            .collect()
    }

    /// Get the content size for a scrollable node
    ///
    /// Returns (content_width, content_height), which may exceed the node's
    /// own size when its children overflow.
    pub fn get_content_size(&self, id: LayoutNodeId) -> Option<(f32, f32)> {
        self.get_layout(id)
            .map(|layout| (layout.content_size.width, layout.content_size.height))
    }

    /// Get the number of nodes in the tree
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Check if the tree is empty
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Drop every node
    pub fn clear(&mut self) {
        self.taffy.clear();
        self.node_map.clear();
        self.reverse_map.clear();
    }
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taffy::{Dimension, FlexDirection};
    use taffy::prelude::TaffyMaxContent;

    fn fixed(w: f32, h: f32) -> Style {
        Style {
            size: taffy::Size {
                width: Dimension::Length(w),
                height: Dimension::Length(h),
            },
            flex_shrink: 0.0,
            ..Style::default()
        }
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut tree = LayoutTree::new();
        let root = tree.create_node(fixed(100.0, 100.0)).unwrap();
        let a = tree.create_node(fixed(10.0, 10.0)).unwrap();
        let b = tree.create_node(fixed(10.0, 10.0)).unwrap();
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();

        assert_eq!(tree.children(root), vec![a, b]);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_content_size_reports_overflow() {
        let mut tree = LayoutTree::new();
        let root = tree
            .create_node(Style {
                flex_direction: FlexDirection::Column,
                ..fixed(100.0, 100.0)
            })
            .unwrap();
        for _ in 0..4 {
            let child = tree.create_node(fixed(100.0, 50.0)).unwrap();
            tree.add_child(root, child).unwrap();
        }

        tree.compute_layout(root, taffy::Size::MAX_CONTENT).unwrap();
        let (_, h) = tree.get_content_size(root).unwrap();
        assert_eq!(h, 200.0);
        assert_eq!(tree.get_layout(tree.children(root)[3]).unwrap().location.y, 150.0);
    }
}
