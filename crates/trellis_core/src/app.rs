use std::rc::Rc;

use crate::{Effect, VNode};

pub type InitFn<Flags, Model, Msg> = Box<dyn FnOnce(Flags) -> (Model, Effect<Msg>)>;
pub type UpdateFn<Model, Msg> = Rc<dyn Fn(Model, Msg) -> (Model, Effect<Msg>)>;
pub type ViewFn<Model, Msg> = Rc<dyn Fn(&Model) -> VNode<Msg>>;

/// An application: how to start, how to react to a message, how to draw a model.
pub struct App<Flags, Model, Msg> {
    init: InitFn<Flags, Model, Msg>,
    update: UpdateFn<Model, Msg>,
    view: ViewFn<Model, Msg>,
}

impl<Flags, Model, Msg> App<Flags, Model, Msg> {
    pub fn new(
        init: impl FnOnce(Flags) -> (Model, Effect<Msg>) + 'static,
        update: impl Fn(Model, Msg) -> (Model, Effect<Msg>) + 'static,
        view: impl Fn(&Model) -> VNode<Msg> + 'static,
    ) -> Self {
        Self {
            init: Box::new(init),
            update: Rc::new(update),
            view: Rc::new(view),
        }
    }

    pub fn into_parts(
        self,
    ) -> (
        InitFn<Flags, Model, Msg>,
        UpdateFn<Model, Msg>,
        ViewFn<Model, Msg>,
    ) {
        (self.init, self.update, self.view)
    }
}
