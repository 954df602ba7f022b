use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::{DecodeError, RawEvent};

/// Attribute name that replaces an element's children with raw markup.
pub const RAW_HTML_ATTRIBUTE: &str = "dangerous-unescaped-html";

/// Turns a native event into an application message.
pub type Decoder<Msg> = Rc<dyn Fn(&RawEvent) -> Result<Msg, DecodeError>>;

pub enum Attribute<Msg> {
    /// A named value written as an attribute, or as a property when `as_property` is set.
    Attr {
        name: String,
        value: Value,
        as_property: bool,
    },
    /// Event binding. `name` is the event type without any `on` prefix.
    Event { name: String, decoder: Decoder<Msg> },
}

impl<Msg> Attribute<Msg> {
    pub fn name(&self) -> &str {
        match self {
            Attribute::Attr { name, .. } | Attribute::Event { name, .. } => name,
        }
    }

    /// Rewrites the message type produced by an event binding.
    pub fn map<Other: 'static>(self, f: Rc<dyn Fn(Msg) -> Other>) -> Attribute<Other>
    where
        Msg: 'static,
    {
        match self {
            Attribute::Attr {
                name,
                value,
                as_property,
            } => Attribute::Attr {
                name,
                value,
                as_property,
            },
            Attribute::Event { name, decoder } => Attribute::Event {
                name,
                decoder: Rc::new(move |event| decoder(event).map(|msg| f(msg))),
            },
        }
    }
}

impl<Msg> Clone for Attribute<Msg> {
    fn clone(&self) -> Self {
        match self {
            Attribute::Attr {
                name,
                value,
                as_property,
            } => Attribute::Attr {
                name: name.clone(),
                value: value.clone(),
                as_property: *as_property,
            },
            Attribute::Event { name, decoder } => Attribute::Event {
                name: name.clone(),
                decoder: Rc::clone(decoder),
            },
        }
    }
}

impl<Msg> fmt::Debug for Attribute<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Attr {
                name,
                value,
                as_property,
            } => f
                .debug_struct("Attr")
                .field("name", name)
                .field("value", value)
                .field("as_property", as_property)
                .finish(),
            Attribute::Event { name, .. } => f.debug_struct("Event").field("name", name).finish(),
        }
    }
}

pub fn attribute<Msg>(name: impl Into<String>, value: impl Into<String>) -> Attribute<Msg> {
    Attribute::Attr {
        name: name.into(),
        value: Value::String(value.into()),
        as_property: false,
    }
}

pub fn property<Msg>(name: impl Into<String>, value: impl Into<Value>) -> Attribute<Msg> {
    Attribute::Attr {
        name: name.into(),
        value: value.into(),
        as_property: true,
    }
}

pub fn on<Msg>(
    event_name: impl Into<String>,
    decoder: impl Fn(&RawEvent) -> Result<Msg, DecodeError> + 'static,
) -> Attribute<Msg> {
    Attribute::Event {
        name: event_name.into(),
        decoder: Rc::new(decoder),
    }
}

pub fn class<Msg>(name: impl Into<String>) -> Attribute<Msg> {
    attribute("class", name)
}

pub fn id<Msg>(name: impl Into<String>) -> Attribute<Msg> {
    attribute("id", name)
}

/// Inline style from `(property, value)` pairs, each terminated with `;`.
pub fn style<Msg>(pairs: &[(&str, &str)]) -> Attribute<Msg> {
    let css: String = pairs
        .iter()
        .map(|(name, value)| format!("{name}:{value};"))
        .collect();
    attribute("style", css)
}

pub fn value<Msg>(val: impl Into<String>) -> Attribute<Msg> {
    attribute("value", val)
}

pub fn href<Msg>(uri: impl Into<String>) -> Attribute<Msg> {
    attribute("href", uri)
}

pub fn placeholder<Msg>(text: impl Into<String>) -> Attribute<Msg> {
    attribute("placeholder", text)
}

pub fn type_<Msg>(name: impl Into<String>) -> Attribute<Msg> {
    attribute("type", name)
}

pub fn for_<Msg>(id: impl Into<String>) -> Attribute<Msg> {
    attribute("for", id)
}

pub fn disabled<Msg>(is_disabled: bool) -> Attribute<Msg> {
    property("disabled", is_disabled)
}

pub fn checked<Msg>(is_checked: bool) -> Attribute<Msg> {
    property("checked", is_checked)
}

/// Sets the element's inner HTML verbatim; its children are not reconciled.
pub fn raw_html<Msg>(html: impl Into<String>) -> Attribute<Msg> {
    attribute(RAW_HTML_ATTRIBUTE, html)
}

pub fn on_click<Msg: Clone + 'static>(msg: Msg) -> Attribute<Msg> {
    on("click", move |_| Ok(msg.clone()))
}

pub fn on_submit<Msg: Clone + 'static>(msg: Msg) -> Attribute<Msg> {
    on("submit", move |_| Ok(msg.clone()))
}

pub fn on_input<Msg: 'static>(to_msg: impl Fn(String) -> Msg + 'static) -> Attribute<Msg> {
    on("input", move |event| {
        event
            .target_value
            .clone()
            .map(&to_msg)
            .ok_or_else(|| DecodeError::missing(event, "target.value"))
    })
}

pub fn on_check<Msg: 'static>(to_msg: impl Fn(bool) -> Msg + 'static) -> Attribute<Msg> {
    on("change", move |event| {
        event
            .target_checked
            .map(&to_msg)
            .ok_or_else(|| DecodeError::missing(event, "target.checked"))
    })
}

/// Binds a custom event, decoding its `detail` payload.
pub fn on_custom<Msg: 'static>(
    event_name: impl Into<String>,
    decode: impl Fn(&Value) -> Result<Msg, DecodeError> + 'static,
) -> Attribute<Msg> {
    on(event_name, move |event| decode(&event.detail))
}
