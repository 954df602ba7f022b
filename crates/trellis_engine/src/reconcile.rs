//! In-place reconciliation of a document subtree against a vnode tree.
//!
//! `morph` walks the new tree with an explicit work queue instead of
//! recursion. Structural edits to an element's child list (placeholders,
//! moves, removals) happen when the element is visited; each child is then
//! visited later from the queue and only ever replaces its own slot.

use std::collections::{HashMap, HashSet, VecDeque};

use engine_logging::engine_warn;
use serde_json::Value;
use trellis_core::{Attribute, Dispatcher, Element, NodeId, VNode, RAW_HTML_ATTRIBUTE};

use crate::dom::Document;
use crate::events::handler_for;

struct Work<Msg> {
    prev: Option<NodeId>,
    next: VNode<Msg>,
    parent: Option<NodeId>,
}

type Queue<Msg> = VecDeque<Work<Msg>>;

enum Forced<Msg> {
    Text(String),
    Element(Element<Msg>),
}

fn force<Msg>(mut node: VNode<Msg>) -> Forced<Msg> {
    loop {
        match node {
            VNode::Text(content) => return Forced::Text(content),
            VNode::Element(el) => return Forced::Element(el),
            VNode::Lazy(thunk) => node = thunk.force(),
        }
    }
}

/// Mutates `prev` (and its subtree) to match `next` and returns the node now
/// standing in its place.
///
/// With `prev == None` a fresh detached subtree is built. When `prev` cannot
/// be reused it is replaced inside its parent and freed.
pub fn morph<Msg: 'static>(
    doc: &mut Document,
    prev: Option<NodeId>,
    next: VNode<Msg>,
    dispatcher: &Dispatcher<Msg>,
) -> NodeId {
    let parent = prev.and_then(|node| doc.parent(node));
    let mut queue = VecDeque::new();
    let root = visit(
        doc,
        Work { prev, next, parent },
        dispatcher,
        &mut queue,
    );
    while let Some(work) = queue.pop_front() {
        visit(doc, work, dispatcher, &mut queue);
    }
    root
}

fn visit<Msg: 'static>(
    doc: &mut Document,
    work: Work<Msg>,
    dispatcher: &Dispatcher<Msg>,
    queue: &mut Queue<Msg>,
) -> NodeId {
    let Work { prev, next, parent } = work;
    match force(next) {
        Forced::Text(content) => {
            if let Some(existing) = prev {
                if let Some(current) = doc.text(existing) {
                    if current != content {
                        doc.set_text(existing, &content);
                    }
                    return existing;
                }
            }
            let created = doc.create_text(&content);
            place(doc, prev, parent, created);
            created
        }
        Forced::Element(el) => {
            let node = morph_element(doc, prev, el, dispatcher, queue);
            place(doc, prev, parent, node);
            node
        }
    }
}

/// Puts `node` into the slot `prev` occupied, or appends it when the slot was empty.
fn place(doc: &mut Document, prev: Option<NodeId>, parent: Option<NodeId>, node: NodeId) {
    match (prev, parent) {
        (Some(old), _) if old == node => {}
        (Some(old), Some(parent)) => doc.replace_child(parent, node, old),
        (Some(old), None) => doc.remove(old),
        (None, Some(parent)) => doc.append_child(parent, node),
        (None, None) => {}
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn set_attribute_if_changed(doc: &mut Document, node: NodeId, name: &str, value: &str) {
    if doc.attribute(node, name) != Some(value) {
        doc.set_attribute(node, name, value);
    }
}

fn set_property_if_changed(doc: &mut Document, node: NodeId, name: &str, value: Value) {
    if doc.property(node, name) != Some(&value) {
        doc.set_property(node, name, value);
    }
}

fn morph_element<Msg: 'static>(
    doc: &mut Document,
    prev: Option<NodeId>,
    el: Element<Msg>,
    dispatcher: &Dispatcher<Msg>,
    queue: &mut Queue<Msg>,
) -> NodeId {
    let reused = prev.filter(|&node| doc.is_element_with(node, &el.namespace, &el.tag));
    let can_morph = reused.is_some();
    let node = reused.unwrap_or_else(|| doc.create_element(&el.namespace, &el.tag));

    let mut stale_attributes: HashSet<String> = HashSet::new();
    let mut stale_properties: HashSet<String> = HashSet::new();
    let mut stale_handlers: HashSet<String> = HashSet::new();
    if can_morph {
        stale_attributes.extend(doc.attribute_names(node));
        stale_properties.extend(doc.property_names(node));
        stale_handlers.extend(doc.handler_types(node));
    }

    let mut class_name: Option<String> = None;
    let mut style: Option<String> = None;
    let mut inner_html: Option<String> = None;

    for attr in el.attrs {
        match attr {
            Attribute::Attr {
                name,
                value,
                as_property: true,
            } => {
                set_property_if_changed(doc, node, &name, value);
                stale_properties.remove(&name);
            }
            Attribute::Event { name, decoder } => {
                if !doc.has_event_listener(node, &name) {
                    doc.add_event_listener(node, &name);
                }
                doc.set_handler(node, &name, handler_for(decoder, dispatcher));
                stale_handlers.remove(&name);
            }
            Attribute::Attr { name, value, .. } => match name.as_str() {
                "class" => {
                    let value = value_text(&value);
                    class_name = Some(match class_name {
                        Some(existing) => format!("{existing} {value}"),
                        None => value,
                    });
                }
                "style" => {
                    let value = value_text(&value);
                    style = Some(match style {
                        Some(existing) => existing + &value,
                        None => value,
                    });
                }
                RAW_HTML_ATTRIBUTE => inner_html = Some(value_text(&value)),
                _ => {
                    if let Value::String(text) = &value {
                        set_attribute_if_changed(doc, node, &name, text);
                    }
                    if name == "value" || name == "selected" {
                        set_property_if_changed(doc, node, &name, value);
                        stale_properties.remove(&name);
                    }
                    stale_attributes.remove(&name);
                }
            },
        }
    }

    if let Some(class_name) = class_name {
        set_attribute_if_changed(doc, node, "class", &class_name);
        stale_attributes.remove("class");
    }
    if let Some(style) = style {
        set_attribute_if_changed(doc, node, "style", &style);
        stale_attributes.remove("style");
    }

    for name in stale_attributes {
        doc.remove_attribute(node, &name);
    }
    for name in stale_properties {
        doc.remove_property(node, &name);
    }
    for event_type in stale_handlers {
        doc.remove_handler(node, &event_type);
        doc.remove_event_listener(node, &event_type);
    }

    if doc.key(node) != Some(el.key.as_str()) {
        doc.set_key(node, &el.key);
    }

    if let Some(html) = inner_html {
        if doc.inner_html(node) != Some(html.as_str()) {
            doc.set_inner_html(node, &html);
        }
        return node;
    }
    doc.clear_inner_html(node);

    let mut cursor = if can_morph { doc.first_child(node) } else { None };
    let keyed = can_morph && el.children.first().is_some_and(VNode::is_keyed);
    if keyed {
        cursor = diff_keyed_children(doc, node, cursor, el.children, queue);
    } else {
        for child in el.children {
            queue.push_back(Work {
                prev: cursor,
                next: child,
                parent: Some(node),
            });
            cursor = cursor.and_then(|current| doc.next_sibling(current));
        }
    }

    while let Some(stale) = cursor {
        cursor = doc.next_sibling(stale);
        doc.remove_child(node, stale);
    }
    node
}

/// Inserts an empty text node before `cursor` to reserve a slot for a new child.
fn reserve_slot(doc: &mut Document, parent: NodeId, cursor: Option<NodeId>) -> NodeId {
    let placeholder = doc.create_text("");
    doc.insert_before(parent, placeholder, cursor);
    placeholder
}

/// Lines up the existing children of `parent` with `children` by key and
/// returns the first existing child that was not claimed.
///
/// Everything before the returned cursor is in its final order.
fn diff_keyed_children<Msg>(
    doc: &mut Document,
    parent: NodeId,
    mut cursor: Option<NodeId>,
    children: Vec<VNode<Msg>>,
    queue: &mut Queue<Msg>,
) -> Option<NodeId> {
    let mut existing: HashMap<String, NodeId> = HashMap::new();
    for &child in doc.children(parent) {
        if let Some(key) = doc.key(child).filter(|key| !key.is_empty()) {
            existing.entry(key.to_string()).or_insert(child);
        }
    }
    let incoming: HashSet<String> = children
        .iter()
        .filter(|child| child.is_keyed())
        .map(|child| child.key().to_string())
        .collect();
    let mut seen: HashSet<String> = HashSet::new();

    for child in children {
        while let Some(current) = cursor {
            if doc.key(current).is_some_and(|key| incoming.contains(key)) {
                break;
            }
            cursor = doc.next_sibling(current);
            doc.remove_child(parent, current);
        }

        let key = child.key().to_string();
        let matched = if key.is_empty() {
            None
        } else if !seen.insert(key.clone()) {
            engine_warn!(
                "duplicate key `{}` among children of {}; rendering it as a new node",
                key,
                parent
            );
            None
        } else {
            existing.get(&key).copied()
        };

        let prev = match matched {
            Some(node) if Some(node) == cursor => {
                cursor = doc.next_sibling(node);
                node
            }
            Some(node) => {
                doc.insert_before(parent, node, cursor);
                node
            }
            None => reserve_slot(doc, parent, cursor),
        };
        queue.push_back(Work {
            prev: Some(prev),
            next: child,
            parent: Some(parent),
        });
    }
    cursor
}
