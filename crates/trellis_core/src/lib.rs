//! Trellis core: value types for the view runtime.
//!
//! Nothing in here touches a document. Virtual nodes, effects and actions
//! are plain data that the engine consumes.
mod action;
mod app;
mod attribute;
mod effect;
mod event;
mod handle;
mod vnode;

pub use action::{Action, DebugAction};
pub use app::{App, InitFn, UpdateFn, ViewFn};
pub use attribute::{
    attribute, checked, class, disabled, for_, href, id, on, on_check, on_click, on_custom,
    on_input, on_submit, placeholder, property, raw_html, style, type_, value, Attribute, Decoder,
    RAW_HTML_ATTRIBUTE,
};
pub use effect::{Dispatcher, Effect, Emitter, Task, TaskContext};
pub use event::{DecodeError, RawEvent};
pub use handle::NodeId;
pub use vnode::{
    element, is_void_tag, keyed, lazy, namespaced, none, text, Element, Lazy, VNode, VOID_TAGS,
};
