use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use trellis_core::{
    element, on, on_click, on_custom, on_input, text, DecodeError, Dispatcher, NodeId, VNode,
};
use trellis_engine::{dispatch_event, morph, Document, SharedDocument};

#[derive(Debug, Clone, PartialEq)]
enum Msg {
    First,
    Second,
    Typed(String),
    Seen { target: NodeId, current: NodeId },
    Named(String),
}

fn init_logging() {
    engine_logging::initialize_for_tests();
}

struct Harness {
    doc: SharedDocument,
    dispatcher: Dispatcher<Msg>,
    received: Rc<RefCell<Vec<(Msg, bool)>>>,
    root: Option<NodeId>,
}

impl Harness {
    fn new() -> Self {
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&received);
        Self {
            doc: Document::new().into_shared(),
            dispatcher: Dispatcher::new(move |msg, immediate| {
                sink.borrow_mut().push((msg, immediate));
            }),
            received,
            root: None,
        }
    }

    fn render(&mut self, view: VNode<Msg>) -> NodeId {
        let mut doc = self.doc.borrow_mut();
        let root = morph(&mut doc, self.root, view, &self.dispatcher);
        if self.root.is_none() {
            let body = doc.body();
            doc.append_child(body, root);
        }
        self.root = Some(root);
        root
    }

    fn messages(&self) -> Vec<Msg> {
        self.received.borrow().iter().map(|(msg, _)| msg.clone()).collect()
    }
}

fn button(msg: Msg) -> VNode<Msg> {
    element("button", vec![on_click(msg)], vec![text("go")])
}

#[test]
fn rebinding_replaces_handler_without_new_listener() {
    init_logging();
    let mut harness = Harness::new();
    let node = harness.render(button(Msg::First));
    harness.render(button(Msg::Second));

    {
        let doc = harness.doc.borrow();
        assert_eq!(doc.stats().listeners_added, 1);
        assert_eq!(doc.stats().listeners_removed, 0);
        assert_eq!(doc.listener_types(node), vec!["click".to_string()]);
    }

    let invoked = dispatch_event(&harness.doc, node, "click", Value::Null);

    assert_eq!(invoked, 1);
    assert_eq!(*harness.received.borrow(), vec![(Msg::Second, true)]);
}

#[test]
fn failed_decode_drops_the_event() {
    init_logging();
    let mut harness = Harness::new();
    let input = harness.render(element("input", vec![on_input(Msg::Typed)], vec![]));

    assert_eq!(dispatch_event(&harness.doc, input, "input", Value::Null), 1);
    assert!(harness.messages().is_empty());

    harness
        .doc
        .borrow_mut()
        .set_property(input, "value", json!("hello"));
    dispatch_event(&harness.doc, input, "input", Value::Null);
    assert_eq!(harness.messages(), vec![Msg::Typed("hello".into())]);
}

#[test]
fn dropping_a_binding_removes_the_listener() {
    init_logging();
    let mut harness = Harness::new();
    let node = harness.render(button(Msg::First));
    harness.render(element("button", vec![], vec![text("go")]));

    {
        let doc = harness.doc.borrow();
        assert!(!doc.has_event_listener(node, "click"));
        assert!(doc.handler(node, "click").is_none());
        assert_eq!(doc.stats().listeners_removed, 1);
    }
    assert_eq!(dispatch_event(&harness.doc, node, "click", Value::Null), 0);
    assert!(harness.messages().is_empty());
}

#[test]
fn events_bubble_to_ancestor_handlers() {
    init_logging();
    let mut harness = Harness::new();
    let root = harness.render(element(
        "div",
        vec![on("click", |event| {
            Ok(Msg::Seen {
                target: event.target,
                current: event.current_target,
            })
        })],
        vec![element("span", vec![], vec![text("inner")])],
    ));
    let span = harness.doc.borrow().children(root)[0];

    assert_eq!(dispatch_event(&harness.doc, span, "click", Value::Null), 1);
    assert_eq!(
        harness.messages(),
        vec![Msg::Seen {
            target: span,
            current: root,
        }]
    );
}

#[test]
fn custom_events_carry_detail() {
    init_logging();
    let mut harness = Harness::new();
    let root = harness.render(element(
        "section",
        vec![on_custom("renamed", |detail| {
            detail
                .get("name")
                .and_then(Value::as_str)
                .map(|name| Msg::Named(name.to_string()))
                .ok_or_else(|| DecodeError::Rejected("no name".into()))
        })],
        vec![],
    ));

    dispatch_event(&harness.doc, root, "renamed", json!({ "other": 1 }));
    dispatch_event(&harness.doc, root, "renamed", json!({ "name": "Ada" }));

    assert_eq!(harness.messages(), vec![Msg::Named("Ada".into())]);
}

#[test]
fn removed_nodes_take_their_handlers_with_them() {
    init_logging();
    let mut harness = Harness::new();
    let root = harness.render(element("div", vec![], vec![button(Msg::First)]));
    let old_button = harness.doc.borrow().children(root)[0];

    harness.render(element("div", vec![], vec![]));

    assert!(!harness.doc.borrow().is_alive(old_button));
    assert_eq!(
        dispatch_event(&harness.doc, old_button, "click", Value::Null),
        0
    );
    assert!(harness.messages().is_empty());
}
