use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use trellis_core::{
    attribute, class, disabled, element, keyed, lazy, namespaced, on_click, on_input, raw_html,
    style, text, Attribute, DecodeError, NodeId, RawEvent, VNode, RAW_HTML_ATTRIBUTE,
};

#[derive(Debug, Clone, PartialEq)]
enum Msg {
    Clicked,
    Typed(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Outer {
    Inner(Msg),
}

fn as_element<Msg>(node: &VNode<Msg>) -> &trellis_core::Element<Msg> {
    match node {
        VNode::Element(el) => el,
        other => panic!("expected element, got {other:?}"),
    }
}

fn decode<Msg>(attr: &Attribute<Msg>, event: &RawEvent) -> Result<Msg, DecodeError> {
    match attr {
        Attribute::Event { decoder, .. } => decoder(event),
        other => panic!("expected event binding, got {other:?}"),
    }
}

#[test]
fn void_elements_drop_children() {
    let node: VNode<Msg> = element("input", vec![attribute("name", "q")], vec![text("ignored")]);
    let el = as_element(&node);
    assert!(el.is_void);
    assert!(el.children.is_empty());

    let node: VNode<Msg> = element("div", vec![], vec![text("kept")]);
    let el = as_element(&node);
    assert!(!el.is_void);
    assert_eq!(el.children.len(), 1);
}

#[test]
fn keys_only_apply_to_elements() {
    let node: VNode<Msg> = keyed("k1", element("li", vec![], vec![]));
    assert_eq!(node.key(), "k1");
    assert!(node.is_keyed());

    let node: VNode<Msg> = keyed("k2", text("plain"));
    assert_eq!(node.key(), "");

    let node: VNode<Msg> = namespaced("http://www.w3.org/2000/svg", "svg", vec![], vec![]);
    assert_eq!(as_element(&node).namespace, "http://www.w3.org/2000/svg");
}

#[test]
fn lazy_is_not_forced_at_construction() {
    let forced = Rc::new(Cell::new(0));
    let counter = Rc::clone(&forced);
    let node: VNode<Msg> = lazy(move || {
        counter.set(counter.get() + 1);
        text("late")
    });
    assert_eq!(forced.get(), 0);

    match node {
        VNode::Lazy(thunk) => match thunk.force() {
            VNode::Text(content) => assert_eq!(content, "late"),
            other => panic!("unexpected {other:?}"),
        },
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(forced.get(), 1);
}

#[test]
fn attribute_helpers_build_expected_values() {
    let attr: Attribute<Msg> = style(&[("color", "red"), ("margin", "0")]);
    match attr {
        Attribute::Attr {
            name,
            value,
            as_property,
        } => {
            assert_eq!(name, "style");
            assert_eq!(value, Value::String("color:red;margin:0;".into()));
            assert!(!as_property);
        }
        other => panic!("unexpected {other:?}"),
    }

    match disabled::<Msg>(true) {
        Attribute::Attr {
            value, as_property, ..
        } => {
            assert_eq!(value, json!(true));
            assert!(as_property);
        }
        other => panic!("unexpected {other:?}"),
    }

    assert_eq!(raw_html::<Msg>("<b>x</b>").name(), RAW_HTML_ATTRIBUTE);
    assert_eq!(class::<Msg>("a").name(), "class");
}

#[test]
fn input_decoder_requires_target_value() {
    let attr = on_input(Msg::Typed);
    let mut event = RawEvent::new("input", NodeId::new(3, 0));
    assert_eq!(
        decode(&attr, &event),
        Err(DecodeError::MissingField {
            kind: "input".into(),
            field: "target.value".into(),
        })
    );

    event.target_value = Some("hello".into());
    assert_eq!(decode(&attr, &event), Ok(Msg::Typed("hello".into())));
}

#[test]
fn map_rewrites_nested_event_messages() {
    let node: VNode<Msg> = element(
        "div",
        vec![on_click(Msg::Clicked)],
        vec![lazy(|| element("input", vec![on_input(Msg::Typed)], vec![]))],
    );
    let mapped: VNode<Outer> = node.map(Outer::Inner);

    let el = match mapped {
        VNode::Element(el) => el,
        other => panic!("expected element, got {other:?}"),
    };
    let click = RawEvent::new("click", NodeId::new(1, 0));
    assert_eq!(decode(&el.attrs[0], &click), Ok(Outer::Inner(Msg::Clicked)));

    let inner = match el.children.into_iter().next() {
        Some(VNode::Lazy(thunk)) => thunk.force(),
        other => panic!("unexpected {other:?}"),
    };
    let mut typed = RawEvent::new("input", NodeId::new(2, 0));
    typed.target_value = Some("x".into());
    assert_eq!(
        decode(&as_element(&inner).attrs[0], &typed),
        Ok(Outer::Inner(Msg::Typed("x".into())))
    );
}
