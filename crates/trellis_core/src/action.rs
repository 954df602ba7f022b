use serde_json::Value;

/// The only inputs a running application accepts.
#[derive(Debug)]
pub enum Action<Model, Msg> {
    /// Queue a message. `immediate` processes it synchronously instead of on the next tick.
    Dispatch { msg: Msg, immediate: bool },
    /// Fire a custom event on the root node.
    Emit { name: String, data: Value },
    /// Tear the runtime down; later actions are ignored.
    Shutdown,
    Debug(DebugAction<Model>),
}

#[derive(Debug)]
pub enum DebugAction<Model> {
    /// Replace the model without going through `update` and re-render.
    ForceModel(Model),
}

impl<Model, Msg> Action<Model, Msg> {
    pub fn dispatch(msg: Msg) -> Self {
        Action::Dispatch {
            msg,
            immediate: false,
        }
    }

    pub fn dispatch_now(msg: Msg) -> Self {
        Action::Dispatch {
            msg,
            immediate: true,
        }
    }

    pub fn emit(name: impl Into<String>, data: Value) -> Self {
        Action::Emit {
            name: name.into(),
            data,
        }
    }

    pub fn force_model(model: Model) -> Self {
        Action::Debug(DebugAction::ForceModel(model))
    }
}
