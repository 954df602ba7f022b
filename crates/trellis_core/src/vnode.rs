use std::fmt;
use std::rc::Rc;

use crate::Attribute;

/// HTML elements that never have children or an end tag.
pub const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// Immutable description of a desired UI node.
pub enum VNode<Msg> {
    Text(String),
    Element(Element<Msg>),
    Lazy(Lazy<Msg>),
}

pub struct Element<Msg> {
    /// Empty means unkeyed.
    pub key: String,
    /// Empty means the HTML namespace.
    pub namespace: String,
    pub tag: String,
    pub attrs: Vec<Attribute<Msg>>,
    pub children: Vec<VNode<Msg>>,
    pub self_closing: bool,
    pub is_void: bool,
}

/// A subtree computed only when the reconciler reaches its slot.
pub struct Lazy<Msg> {
    thunk: Box<dyn FnOnce() -> VNode<Msg>>,
}

impl<Msg> Lazy<Msg> {
    pub fn new(thunk: impl FnOnce() -> VNode<Msg> + 'static) -> Self {
        Self {
            thunk: Box::new(thunk),
        }
    }

    pub fn force(self) -> VNode<Msg> {
        (self.thunk)()
    }
}

impl<Msg> VNode<Msg> {
    /// Identity key of the node; text and lazy nodes are always unkeyed.
    pub fn key(&self) -> &str {
        match self {
            VNode::Element(el) => &el.key,
            VNode::Text(_) | VNode::Lazy(_) => "",
        }
    }

    pub fn is_keyed(&self) -> bool {
        !self.key().is_empty()
    }

    /// Rewrites the messages produced by every event binding in the tree.
    pub fn map<Other: 'static>(self, f: impl Fn(Msg) -> Other + 'static) -> VNode<Other>
    where
        Msg: 'static,
    {
        self.map_with(Rc::new(f))
    }

    fn map_with<Other: 'static>(self, f: Rc<dyn Fn(Msg) -> Other>) -> VNode<Other>
    where
        Msg: 'static,
    {
        match self {
            VNode::Text(content) => VNode::Text(content),
            VNode::Element(el) => VNode::Element(Element {
                key: el.key,
                namespace: el.namespace,
                tag: el.tag,
                attrs: el
                    .attrs
                    .into_iter()
                    .map(|attr| attr.map(Rc::clone(&f)))
                    .collect(),
                children: el
                    .children
                    .into_iter()
                    .map(|child| child.map_with(Rc::clone(&f)))
                    .collect(),
                self_closing: el.self_closing,
                is_void: el.is_void,
            }),
            VNode::Lazy(lazy) => VNode::Lazy(Lazy::new(move || lazy.force().map_with(f))),
        }
    }
}

impl<Msg> fmt::Debug for VNode<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VNode::Text(content) => f.debug_tuple("Text").field(content).finish(),
            VNode::Element(el) => f
                .debug_struct("Element")
                .field("key", &el.key)
                .field("namespace", &el.namespace)
                .field("tag", &el.tag)
                .field("attrs", &el.attrs)
                .field("children", &el.children)
                .finish(),
            VNode::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// Builds an HTML element. Void tags drop their children.
pub fn element<Msg>(
    tag: impl Into<String>,
    attrs: Vec<Attribute<Msg>>,
    children: Vec<VNode<Msg>>,
) -> VNode<Msg> {
    let tag = tag.into();
    let is_void = is_void_tag(&tag);
    VNode::Element(Element {
        key: String::new(),
        namespace: String::new(),
        tag,
        attrs,
        children: if is_void { Vec::new() } else { children },
        self_closing: false,
        is_void,
    })
}

pub fn namespaced<Msg>(
    namespace: impl Into<String>,
    tag: impl Into<String>,
    attrs: Vec<Attribute<Msg>>,
    children: Vec<VNode<Msg>>,
) -> VNode<Msg> {
    VNode::Element(Element {
        key: String::new(),
        namespace: namespace.into(),
        tag: tag.into(),
        attrs,
        children,
        self_closing: false,
        is_void: false,
    })
}

/// Tags an element with a stable identity key. Non-element nodes are returned unchanged.
pub fn keyed<Msg>(key: impl Into<String>, node: VNode<Msg>) -> VNode<Msg> {
    match node {
        VNode::Element(mut el) => {
            el.key = key.into();
            VNode::Element(el)
        }
        other => other,
    }
}

pub fn text<Msg>(content: impl Into<String>) -> VNode<Msg> {
    VNode::Text(content.into())
}

/// Renders nothing visible (an empty text node).
pub fn none<Msg>() -> VNode<Msg> {
    VNode::Text(String::new())
}

pub fn lazy<Msg>(thunk: impl FnOnce() -> VNode<Msg> + 'static) -> VNode<Msg> {
    VNode::Lazy(Lazy::new(thunk))
}
