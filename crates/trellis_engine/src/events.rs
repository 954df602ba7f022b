//! Event delegation.
//!
//! Every element gets at most one native listener per event type. The
//! listener does not capture the application's handler; it looks the handler
//! up in the element's [`HandlerRegistry`] when the event fires, so a
//! re-render swaps the registry entry and leaves the listener alone.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use engine_logging::engine_trace;
use serde_json::Value;
use trellis_core::{Decoder, Dispatcher, NodeId, RawEvent};

use crate::dom::SharedDocument;

pub type Handler = Rc<dyn Fn(&RawEvent)>;

/// Current handler per event type for one element.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Handler>,
}

impl HandlerRegistry {
    pub fn get(&self, event_type: &str) -> Option<Handler> {
        self.handlers.get(event_type).cloned()
    }

    /// Stores `handler`, returning the one it replaced.
    pub fn insert(&mut self, event_type: &str, handler: Handler) -> Option<Handler> {
        self.handlers.insert(event_type.to_string(), handler)
    }

    pub fn remove(&mut self, event_type: &str) -> Option<Handler> {
        self.handlers.remove(event_type)
    }

    pub fn event_types(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

/// Wraps a decoder into a registry handler. Decode failures drop the event.
pub fn handler_for<Msg: 'static>(decoder: Decoder<Msg>, dispatcher: &Dispatcher<Msg>) -> Handler {
    let dispatcher = dispatcher.clone();
    Rc::new(move |event: &RawEvent| match decoder(event) {
        Ok(msg) => dispatcher.dispatch_now(msg),
        Err(err) => engine_trace!(
            "dropped `{}` event on {}: {}",
            event.kind,
            event.current_target,
            err
        ),
    })
}

/// Fires `kind` at `target` and bubbles it to the document root.
///
/// Each node on the path with a native listener for `kind` runs the handler
/// currently stored in its registry. The document is not borrowed while a
/// handler runs, so handlers may trigger a synchronous re-render. Returns the
/// number of handlers invoked.
pub fn dispatch_event(doc: &SharedDocument, target: NodeId, kind: &str, detail: Value) -> usize {
    let (path, mut event) = {
        let doc = doc.borrow();
        if !doc.is_alive(target) {
            return 0;
        }
        let mut path = vec![target];
        let mut cursor = doc.parent(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = doc.parent(node);
        }

        let mut event = RawEvent::new(kind, target).with_detail(detail);
        event.target_value = doc
            .property(target, "value")
            .and_then(|value| value.as_str().map(str::to_string))
            .or_else(|| doc.attribute(target, "value").map(str::to_string));
        event.target_checked = doc.property(target, "checked").and_then(Value::as_bool);
        (path, event)
    };

    let mut invoked = 0;
    for node in path {
        let handler = {
            let mut doc = doc.borrow_mut();
            if !doc.has_event_listener(node, kind) {
                continue;
            }
            match doc.handler(node, kind) {
                Some(handler) => handler,
                None => {
                    doc.remove_event_listener(node, kind);
                    continue;
                }
            }
        };
        event.current_target = node;
        handler(&event);
        invoked += 1;
    }
    invoked
}
