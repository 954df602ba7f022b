//! In-memory document the runtime renders into.
//!
//! Nodes live in an arena of generational slots. Removing a node frees its
//! whole subtree, including the handler registries owned by its elements,
//! and bumps the slot generation so stale [`NodeId`]s stop resolving.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use trellis_core::{is_void_tag, NodeId};

use crate::events::{Handler, HandlerRegistry};

pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

pub type SharedDocument = Rc<RefCell<Document>>;

/// Counters for every observable document mutation. Reads never count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationStats {
    pub nodes_created: usize,
    pub nodes_inserted: usize,
    pub nodes_moved: usize,
    pub nodes_removed: usize,
    pub attributes_set: usize,
    pub attributes_removed: usize,
    pub properties_set: usize,
    pub properties_removed: usize,
    pub text_writes: usize,
    pub inner_html_writes: usize,
    pub listeners_added: usize,
    pub listeners_removed: usize,
}

impl MutationStats {
    pub fn total(&self) -> usize {
        self.nodes_created
            + self.nodes_inserted
            + self.nodes_moved
            + self.nodes_removed
            + self.attributes_set
            + self.attributes_removed
            + self.properties_set
            + self.properties_removed
            + self.text_writes
            + self.inner_html_writes
            + self.listeners_added
            + self.listeners_removed
    }
}

#[derive(Default)]
struct ElementData {
    namespace: String,
    tag: String,
    key: String,
    attributes: IndexMap<String, String>,
    properties: IndexMap<String, Value>,
    inner_html: Option<String>,
    listeners: IndexSet<String>,
    handlers: HandlerRegistry,
}

enum NodeKind {
    Text(String),
    Element(Box<ElementData>),
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct Slot {
    generation: u32,
    node: Option<NodeData>,
}

pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    document_element: NodeId,
    body: NodeId,
    stats: MutationStats,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document holding `<html><body></body></html>`.
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            document_element: NodeId::new(0, 0),
            body: NodeId::new(0, 0),
            stats: MutationStats::default(),
        };
        let html = doc.create_element(HTML_NAMESPACE, "html");
        let body = doc.create_element(HTML_NAMESPACE, "body");
        doc.append_child(html, body);
        doc.document_element = html;
        doc.body = body;
        doc.reset_stats();
        doc
    }

    pub fn into_shared(self) -> SharedDocument {
        Rc::new(RefCell::new(self))
    }

    pub fn document_element(&self) -> NodeId {
        self.document_element
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn stats(&self) -> MutationStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = MutationStats::default();
    }

    /// Number of nodes currently allocated, attached or not.
    pub fn live_nodes(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id)?.kind {
            NodeKind::Element(el) => Some(el.as_ref()),
            NodeKind::Text(_) => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(el) => Some(el.as_mut()),
            NodeKind::Text(_) => None,
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let node = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        };
        self.stats.nodes_created += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId::new(index, slot.generation);
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId::new(index, 0)
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(slot) = self
                .slots
                .get_mut(current.index())
                .filter(|slot| slot.generation == current.generation())
            else {
                continue;
            };
            if let Some(node) = slot.node.take() {
                pending.extend(node.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index() as u32);
            }
        }
    }

    /// Unlinks `id` from its parent's child list. Returns the old parent.
    fn unlink(&mut self, id: NodeId) -> Option<NodeId> {
        let parent = self.node_mut(id)?.parent.take()?;
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.retain(|child| *child != id);
        }
        Some(parent)
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut cursor = Some(of);
        while let Some(current) = cursor {
            if current == candidate {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(NodeKind::Text(content.to_string()))
    }

    /// An empty namespace means HTML.
    pub fn create_element(&mut self, namespace: &str, tag: &str) -> NodeId {
        let namespace = if namespace.is_empty() {
            HTML_NAMESPACE
        } else {
            namespace
        };
        self.alloc(NodeKind::Element(Box::new(ElementData {
            namespace: namespace.to_string(),
            tag: tag.to_string(),
            ..ElementData::default()
        })))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let position = siblings.iter().position(|sibling| *sibling == id)?;
        siblings.get(position + 1).copied()
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.kind {
            NodeKind::Text(content) => Some(content),
            NodeKind::Element(_) => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, content: &str) {
        if let Some(NodeKind::Text(current)) = self.node_mut(id).map(|node| &mut node.kind) {
            *current = content.to_string();
            self.stats.text_writes += 1;
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn namespace(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.namespace.as_str())
    }

    /// True when `id` is an element that a vnode with this namespace and tag can reuse.
    pub fn is_element_with(&self, id: NodeId, namespace: &str, tag: &str) -> bool {
        let namespace = if namespace.is_empty() {
            HTML_NAMESPACE
        } else {
            namespace
        };
        self.element(id)
            .is_some_and(|el| el.tag == tag && el.namespace == namespace)
    }

    /// Identity key of the element; empty when unkeyed.
    pub fn key(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.key.as_str())
    }

    pub fn set_key(&mut self, id: NodeId, key: &str) {
        if let Some(el) = self.element_mut(id) {
            el.key = key.to_string();
            self.stats.attributes_set += 1;
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attributes.get(name).map(String::as_str)
    }

    pub fn attribute_names(&self, id: NodeId) -> Vec<String> {
        self.element(id)
            .map(|el| el.attributes.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attributes.insert(name.to_string(), value.to_string());
            self.stats.attributes_set += 1;
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        let removed = self
            .element_mut(id)
            .and_then(|el| el.attributes.shift_remove(name))
            .is_some();
        if removed {
            self.stats.attributes_removed += 1;
        }
        removed
    }

    pub fn property(&self, id: NodeId, name: &str) -> Option<&Value> {
        self.element(id)?.properties.get(name)
    }

    pub fn property_names(&self, id: NodeId) -> Vec<String> {
        self.element(id)
            .map(|el| el.properties.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn set_property(&mut self, id: NodeId, name: &str, value: Value) {
        if let Some(el) = self.element_mut(id) {
            el.properties.insert(name.to_string(), value);
            self.stats.properties_set += 1;
        }
    }

    pub fn remove_property(&mut self, id: NodeId, name: &str) -> bool {
        let removed = self
            .element_mut(id)
            .and_then(|el| el.properties.shift_remove(name))
            .is_some();
        if removed {
            self.stats.properties_removed += 1;
        }
        removed
    }

    pub fn inner_html(&self, id: NodeId) -> Option<&str> {
        self.element(id)?.inner_html.as_deref()
    }

    /// Replaces the element's children with raw markup. The markup is opaque:
    /// it is serialized verbatim and never parsed into nodes.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let NodeKind::Element(el) = &mut node.kind else {
            return;
        };
        el.inner_html = Some(html.to_string());
        let children = std::mem::take(&mut node.children);
        self.stats.inner_html_writes += 1;
        for child in children {
            self.stats.nodes_removed += 1;
            self.free_subtree(child);
        }
    }

    pub fn clear_inner_html(&mut self, id: NodeId) {
        if let Some(el) = self.element_mut(id) {
            if el.inner_html.take().is_some() {
                self.stats.inner_html_writes += 1;
            }
        }
    }

    /// Appends `child` to `parent`, moving it if it is already attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Inserts `child` before `anchor`, or appends when `anchor` is `None`.
    /// An anchor that is not a child of `parent` makes this a no-op.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, anchor: Option<NodeId>) {
        if !self.is_element(parent)
            || !self.is_alive(child)
            || self.is_ancestor_or_self(child, parent)
        {
            return;
        }
        if let Some(anchor) = anchor {
            if anchor == child || self.parent(anchor) != Some(parent) {
                return;
            }
        }
        let was_sibling = self.parent(child) == Some(parent);
        self.unlink(child);
        let Some(parent_node) = self.node_mut(parent) else {
            return;
        };
        let position = anchor
            .and_then(|anchor| parent_node.children.iter().position(|c| *c == anchor))
            .unwrap_or(parent_node.children.len());
        parent_node.children.insert(position, child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if was_sibling {
            self.stats.nodes_moved += 1;
        } else {
            self.stats.nodes_inserted += 1;
        }
    }

    /// Puts `new` where `old` is and frees `old` with its subtree.
    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) {
        if new == old || self.parent(old) != Some(parent) {
            return;
        }
        self.insert_before(parent, new, Some(old));
        self.remove_child(parent, old);
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.parent(child) != Some(parent) {
            return;
        }
        self.remove(child);
    }

    /// Detaches `id` from its parent (if any) and frees its subtree.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        self.unlink(id);
        self.free_subtree(id);
        self.stats.nodes_removed += 1;
    }

    pub fn has_event_listener(&self, id: NodeId, event_type: &str) -> bool {
        self.element(id)
            .is_some_and(|el| el.listeners.contains(event_type))
    }

    /// Installs the native listener for `event_type`. Returns false when one was already present.
    pub fn add_event_listener(&mut self, id: NodeId, event_type: &str) -> bool {
        let added = self
            .element_mut(id)
            .is_some_and(|el| el.listeners.insert(event_type.to_string()));
        if added {
            self.stats.listeners_added += 1;
        }
        added
    }

    pub fn remove_event_listener(&mut self, id: NodeId, event_type: &str) -> bool {
        let removed = self
            .element_mut(id)
            .is_some_and(|el| el.listeners.shift_remove(event_type));
        if removed {
            self.stats.listeners_removed += 1;
        }
        removed
    }

    pub fn listener_types(&self, id: NodeId) -> Vec<String> {
        self.element(id)
            .map(|el| el.listeners.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn handler(&self, id: NodeId, event_type: &str) -> Option<Handler> {
        self.element(id)?.handlers.get(event_type)
    }

    pub fn handler_types(&self, id: NodeId) -> Vec<String> {
        self.element(id)
            .map(|el| el.handlers.event_types())
            .unwrap_or_default()
    }

    pub fn set_handler(&mut self, id: NodeId, event_type: &str, handler: Handler) {
        if let Some(el) = self.element_mut(id) {
            el.handlers.insert(event_type, handler);
        }
    }

    pub fn remove_handler(&mut self, id: NodeId, event_type: &str) {
        if let Some(el) = self.element_mut(id) {
            el.handlers.remove(event_type);
        }
    }

    /// Finds the first element in document order matching `#id`, `.class` or a tag name.
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }
        let mut pending = vec![self.document_element];
        while let Some(current) = pending.pop() {
            if self.matches(current, selector) {
                return Some(current);
            }
            pending.extend(self.children(current).iter().rev());
        }
        None
    }

    fn matches(&self, id: NodeId, selector: &str) -> bool {
        let Some(el) = self.element(id) else {
            return false;
        };
        if let Some(wanted) = selector.strip_prefix('#') {
            el.attributes.get("id").is_some_and(|value| value == wanted)
        } else if let Some(wanted) = selector.strip_prefix('.') {
            el.attributes
                .get("class")
                .is_some_and(|value| value.split_whitespace().any(|c| c == wanted))
        } else {
            el.tag.eq_ignore_ascii_case(selector)
        }
    }

    /// Serializes the node and its subtree as HTML.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(content) => out.push_str(&escape(content, false)),
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape(value, true));
                    out.push('"');
                }
                out.push('>');
                if el.namespace == HTML_NAMESPACE && is_void_tag(&el.tag) {
                    return;
                }
                match &el.inner_html {
                    Some(html) => out.push_str(html),
                    None => {
                        for child in &node.children {
                            self.write_html(*child, out);
                        }
                    }
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }
}

fn escape(raw: &str, in_attribute: bool) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if in_attribute => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}
