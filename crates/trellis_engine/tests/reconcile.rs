use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::json;
use trellis_core::{
    attribute, class, disabled, element, id, keyed, lazy, namespaced, on_click, property,
    raw_html, style, text, value, Dispatcher, NodeId, VNode,
};
use trellis_engine::{morph, Document, MutationStats};

#[derive(Debug, Clone, PartialEq)]
enum Msg {
    Clicked,
}

fn init_logging() {
    engine_logging::initialize_for_tests();
}

fn recording_dispatcher() -> (Dispatcher<Msg>, Rc<RefCell<Vec<Msg>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let dispatcher = Dispatcher::new(move |msg, _immediate| sink.borrow_mut().push(msg));
    (dispatcher, log)
}

fn keyed_list(keys: &[&str]) -> VNode<Msg> {
    element(
        "ul",
        vec![],
        keys.iter()
            .map(|key| keyed(*key, element("li", vec![], vec![text(*key)])))
            .collect(),
    )
}

/// Renders `first` into the body, then resets the mutation counters.
fn mount(doc: &mut Document, first: VNode<Msg>, dispatcher: &Dispatcher<Msg>) -> NodeId {
    let body = doc.body();
    let root = morph(doc, None, first, dispatcher);
    doc.append_child(body, root);
    doc.reset_stats();
    root
}

fn page(items: &[&str]) -> VNode<Msg> {
    element(
        "div",
        vec![
            id("page"),
            class("card"),
            class("wide"),
            style(&[("color", "red")]),
            disabled(false),
            value("typed"),
            on_click(Msg::Clicked),
        ],
        vec![
            keyed_list(items),
            element("p", vec![], vec![text("hello")]),
            lazy(|| element("span", vec![], vec![text("later")])),
        ],
    )
}

#[test]
fn second_identical_render_mutates_nothing() {
    init_logging();
    let (dispatcher, _) = recording_dispatcher();
    let mut doc = Document::new();
    let root = mount(&mut doc, page(&["a", "b", "c"]), &dispatcher);

    let again = morph(&mut doc, Some(root), page(&["a", "b", "c"]), &dispatcher);

    assert_eq!(again, root);
    assert_eq!(doc.stats(), MutationStats::default());
    assert_eq!(doc.attribute(root, "class"), Some("card wide"));
    assert_eq!(doc.attribute(root, "style"), Some("color:red;"));
}

#[test]
fn keyed_rotation_reuses_every_node() {
    init_logging();
    let (dispatcher, _) = recording_dispatcher();
    let mut doc = Document::new();
    let list = mount(&mut doc, keyed_list(&["A", "B", "C"]), &dispatcher);
    let before = doc.children(list).to_vec();

    morph(&mut doc, Some(list), keyed_list(&["C", "A", "B"]), &dispatcher);

    let stats = doc.stats();
    assert_eq!(stats.nodes_created, 0);
    assert_eq!(stats.nodes_removed, 0);
    assert!(stats.nodes_moved <= 2, "moved {} nodes", stats.nodes_moved);
    assert_eq!(doc.children(list), &[before[2], before[0], before[1]]);
    assert_eq!(
        doc.outer_html(list),
        "<ul><li>C</li><li>A</li><li>B</li></ul>"
    );
}

#[test]
fn keyed_swap_from_scratch_moves_once() {
    init_logging();
    let (dispatcher, _) = recording_dispatcher();
    let mut doc = Document::new();

    let list = morph(&mut doc, None, keyed_list(&["k1", "k2"]), &dispatcher);
    assert_eq!(doc.tag(list), Some("ul"));
    assert_eq!(doc.parent(list), None);
    let first = doc.children(list).to_vec();
    assert_eq!(first.len(), 2);
    assert_eq!(doc.key(first[0]), Some("k1"));
    assert_eq!(doc.key(first[1]), Some("k2"));

    doc.reset_stats();
    let again = morph(&mut doc, Some(list), keyed_list(&["k2", "k1"]), &dispatcher);

    assert_eq!(again, list);
    assert_eq!(doc.children(list), &[first[1], first[0]]);
    assert_eq!(doc.stats().nodes_moved, 1);
    assert_eq!(doc.stats().nodes_created, 0);
}

#[test]
fn keyed_insert_and_remove_keep_survivors() {
    init_logging();
    let (dispatcher, _) = recording_dispatcher();
    let mut doc = Document::new();
    let list = mount(&mut doc, keyed_list(&["A", "B", "C"]), &dispatcher);
    let before = doc.children(list).to_vec();

    morph(&mut doc, Some(list), keyed_list(&["B", "D", "C"]), &dispatcher);

    let after = doc.children(list).to_vec();
    assert_eq!(after.len(), 3);
    assert_eq!(after[0], before[1]);
    assert_eq!(after[2], before[2]);
    assert!(!doc.is_alive(before[0]));
    assert_eq!(
        doc.outer_html(list),
        "<ul><li>B</li><li>D</li><li>C</li></ul>"
    );
}

#[test]
fn duplicate_keys_degrade_without_losing_children() {
    init_logging();
    let (dispatcher, _) = recording_dispatcher();
    let mut doc = Document::new();
    let list = mount(&mut doc, keyed_list(&["A", "B"]), &dispatcher);

    morph(&mut doc, Some(list), keyed_list(&["A", "A", "B"]), &dispatcher);

    assert_eq!(
        doc.outer_html(list),
        "<ul><li>A</li><li>A</li><li>B</li></ul>"
    );
}

#[test]
fn unkeyed_children_pair_by_position() {
    init_logging();
    let (dispatcher, _) = recording_dispatcher();
    let mut doc = Document::new();
    let view = |items: &[&str]| -> VNode<Msg> {
        element(
            "ol",
            vec![],
            items
                .iter()
                .map(|item| element("li", vec![], vec![text(*item)]))
                .collect(),
        )
    };
    let list = mount(&mut doc, view(&["a", "b", "c"]), &dispatcher);
    let before = doc.children(list).to_vec();

    morph(&mut doc, Some(list), view(&["x"]), &dispatcher);
    assert_eq!(doc.children(list), &[before[0]]);
    assert_eq!(doc.outer_html(list), "<ol><li>x</li></ol>");
    assert_eq!(doc.stats().nodes_removed, 2);
    assert_eq!(doc.stats().text_writes, 1);

    morph(&mut doc, Some(list), view(&["x", "y"]), &dispatcher);
    assert_eq!(doc.children(list)[0], before[0]);
    assert_eq!(doc.outer_html(list), "<ol><li>x</li><li>y</li></ol>");
}

#[test]
fn mismatched_nodes_are_replaced_in_place() {
    init_logging();
    let (dispatcher, _) = recording_dispatcher();
    let mut doc = Document::new();
    let view = |second: VNode<Msg>| -> VNode<Msg> {
        element("div", vec![], vec![text("start"), second, text("end")])
    };
    let root = mount(
        &mut doc,
        view(element("b", vec![], vec![text("bold")])),
        &dispatcher,
    );
    let old = doc.children(root)[1];

    morph(&mut doc, Some(root), view(text("plain")), &dispatcher);
    assert!(!doc.is_alive(old));
    assert_eq!(doc.outer_html(root), "<div>startplainend</div>");

    morph(
        &mut doc,
        Some(root),
        view(element("i", vec![], vec![text("it")])),
        &dispatcher,
    );
    assert_eq!(doc.outer_html(root), "<div>start<i>it</i>end</div>");
}

#[test]
fn namespace_change_forces_a_new_element() {
    init_logging();
    let (dispatcher, _) = recording_dispatcher();
    let mut doc = Document::new();
    let root = mount(&mut doc, element("a", vec![], vec![]), &dispatcher);

    let next = morph(
        &mut doc,
        Some(root),
        namespaced("http://www.w3.org/2000/svg", "a", vec![], vec![]),
        &dispatcher,
    );

    assert_ne!(next, root);
    assert!(!doc.is_alive(root));
    assert_eq!(doc.namespace(next), Some("http://www.w3.org/2000/svg"));
    assert_eq!(doc.parent(next), Some(doc.body()));
}

#[test]
fn raw_html_skips_children_until_removed() {
    init_logging();
    let (dispatcher, _) = recording_dispatcher();
    let mut doc = Document::new();
    let root = mount(
        &mut doc,
        element(
            "article",
            vec![raw_html("<em>trusted</em>")],
            vec![text("ignored")],
        ),
        &dispatcher,
    );
    assert!(doc.children(root).is_empty());
    assert_eq!(doc.outer_html(root), "<article><em>trusted</em></article>");

    morph(
        &mut doc,
        Some(root),
        element("article", vec![], vec![text("plain")]),
        &dispatcher,
    );
    assert_eq!(doc.inner_html(root), None);
    assert_eq!(doc.outer_html(root), "<article>plain</article>");
}

#[test]
fn stale_attributes_and_properties_are_removed() {
    init_logging();
    let (dispatcher, _) = recording_dispatcher();
    let mut doc = Document::new();
    let root = mount(
        &mut doc,
        element(
            "input",
            vec![attribute("title", "one"), attribute("data-x", "1"), disabled(true)],
            vec![],
        ),
        &dispatcher,
    );

    morph(
        &mut doc,
        Some(root),
        element("input", vec![attribute("title", "two")], vec![]),
        &dispatcher,
    );

    assert_eq!(doc.attribute_names(root), vec!["title".to_string()]);
    assert_eq!(doc.attribute(root, "title"), Some("two"));
    assert_eq!(doc.property(root, "disabled"), None);
}

#[test]
fn attribute_switched_to_property_is_removed() {
    init_logging();
    let (dispatcher, _) = recording_dispatcher();
    let mut doc = Document::new();
    let root = mount(
        &mut doc,
        element("div", vec![attribute("hidden", "")], vec![]),
        &dispatcher,
    );

    morph(
        &mut doc,
        Some(root),
        element("div", vec![property("hidden", true)], vec![]),
        &dispatcher,
    );

    assert!(doc.attribute_names(root).is_empty());
    assert_eq!(doc.property_names(root), vec!["hidden".to_string()]);
    assert_eq!(doc.property(root, "hidden"), Some(&json!(true)));
}

#[test]
fn value_and_selected_are_mirrored_as_properties() {
    init_logging();
    let (dispatcher, _) = recording_dispatcher();
    let mut doc = Document::new();
    let option = |val: &str, selected: Option<&str>| -> VNode<Msg> {
        let mut attrs = vec![value(val)];
        if let Some(flag) = selected {
            attrs.push(attribute("selected", flag));
        }
        element("option", attrs, vec![])
    };
    let root = mount(&mut doc, option("typed", Some("selected")), &dispatcher);

    assert_eq!(doc.attribute(root, "value"), Some("typed"));
    assert_eq!(doc.property(root, "value"), Some(&json!("typed")));
    assert_eq!(doc.property(root, "selected"), Some(&json!("selected")));

    morph(&mut doc, Some(root), option("edited", Some("selected")), &dispatcher);
    assert_eq!(doc.attribute(root, "value"), Some("edited"));
    assert_eq!(doc.property(root, "value"), Some(&json!("edited")));
    assert_eq!(doc.stats().properties_set, 1);

    morph(&mut doc, Some(root), option("edited", None), &dispatcher);
    assert_eq!(doc.attribute(root, "selected"), None);
    assert_eq!(doc.property(root, "selected"), None);
    assert_eq!(doc.property(root, "value"), Some(&json!("edited")));

    morph(&mut doc, Some(root), element("option", vec![], vec![]), &dispatcher);
    assert!(doc.attribute_names(root).is_empty());
    assert!(doc.property_names(root).is_empty());
}

#[test]
fn lazy_subtrees_are_forced_once_per_visit() {
    init_logging();
    let (dispatcher, _) = recording_dispatcher();
    let mut doc = Document::new();
    let forced = Rc::new(Cell::new(0));
    let view = |forced: &Rc<Cell<usize>>| -> VNode<Msg> {
        let forced = Rc::clone(forced);
        element(
            "section",
            vec![],
            vec![lazy(move || {
                forced.set(forced.get() + 1);
                lazy(|| text("deep"))
            })],
        )
    };

    let built = view(&forced);
    assert_eq!(forced.get(), 0);
    let root = mount(&mut doc, built, &dispatcher);
    assert_eq!(forced.get(), 1);

    morph(&mut doc, Some(root), view(&forced), &dispatcher);
    assert_eq!(forced.get(), 2);
    assert_eq!(doc.outer_html(root), "<section>deep</section>");
}

#[test]
fn deep_trees_do_not_recurse() {
    init_logging();
    let (dispatcher, _) = recording_dispatcher();
    let mut doc = Document::new();
    let mut tree: VNode<Msg> = text("leaf");
    for _ in 0..5_000 {
        tree = element("div", vec![], vec![tree]);
    }

    let root = morph(&mut doc, None, tree, &dispatcher);

    let mut depth = 0;
    let mut cursor = Some(root);
    while let Some(node) = cursor {
        depth += 1;
        cursor = doc.first_child(node);
    }
    assert_eq!(depth, 5_001);
    doc.remove(root);
    assert_eq!(doc.live_nodes(), 2);
}
