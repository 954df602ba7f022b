//! Model-update-view loop.
//!
//! The scheduler owns the model and both queues. Messages are applied in
//! the order they were queued, effects run after the messages that produced
//! them, and a tick renders exactly once after everything has settled.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use engine_logging::{engine_debug, engine_info, engine_trace, engine_warn};
use serde_json::Value;
use trellis_core::{
    Action, DebugAction, Dispatcher, Effect, Emitter, NodeId, Task, TaskContext, UpdateFn, ViewFn,
};

use crate::config::RuntimeConfig;
use crate::dom::SharedDocument;
use crate::events::dispatch_event;
use crate::host::{Host, TimerHandle};
use crate::reconcile::morph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    TickScheduled,
    Ticking,
    Stopped,
}

struct Logic<Model, Msg> {
    update: UpdateFn<Model, Msg>,
    view: ViewFn<Model, Msg>,
}

impl<Model, Msg> Clone for Logic<Model, Msg> {
    fn clone(&self) -> Self {
        Self {
            update: Rc::clone(&self.update),
            view: Rc::clone(&self.view),
        }
    }
}

struct RuntimeState<Model, Msg> {
    phase: Phase,
    model: Option<Model>,
    message_queue: VecDeque<Msg>,
    effect_queue: VecDeque<Task<Msg>>,
    tick_handle: Option<TimerHandle>,
    root_dom: Option<NodeId>,
    logic: Option<Logic<Model, Msg>>,
}

/// What to do once the state borrow is released.
enum AfterDispatch {
    Nothing,
    ArmTimer,
    TickNow(Option<TimerHandle>),
}

pub(crate) struct Scheduler<Model, Msg> {
    this: Weak<Self>,
    host: Rc<dyn Host>,
    document: SharedDocument,
    config: RuntimeConfig,
    state: RefCell<RuntimeState<Model, Msg>>,
}

impl<Model: 'static, Msg: 'static> Scheduler<Model, Msg> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        host: Rc<dyn Host>,
        document: SharedDocument,
        root: NodeId,
        config: RuntimeConfig,
        model: Model,
        effects: Effect<Msg>,
        update: UpdateFn<Model, Msg>,
        view: ViewFn<Model, Msg>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            host,
            document,
            config,
            state: RefCell::new(RuntimeState {
                phase: Phase::Idle,
                model: Some(model),
                message_queue: VecDeque::new(),
                effect_queue: effects.into_tasks().into(),
                tick_handle: None,
                root_dom: Some(root),
                logic: Some(Logic { update, view }),
            }),
        })
    }

    pub(crate) fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    pub(crate) fn send(&self, action: Action<Model, Msg>) {
        match action {
            Action::Dispatch { msg, immediate } => self.dispatch(msg, immediate),
            Action::Emit { name, data } => self.emit(&name, data),
            Action::Shutdown => self.shutdown(),
            Action::Debug(DebugAction::ForceModel(model)) => self.force_model(model),
        }
    }

    /// A dispatcher that holds the scheduler weakly, so late calls after
    /// teardown fall through silently.
    pub(crate) fn dispatcher(&self) -> Dispatcher<Msg> {
        let this = self.this.clone();
        Dispatcher::new(move |msg, immediate| {
            if let Some(scheduler) = this.upgrade() {
                scheduler.dispatch(msg, immediate);
            }
        })
    }

    fn emitter(&self) -> Emitter {
        let this = self.this.clone();
        Emitter::new(move |name, data| {
            if let Some(scheduler) = this.upgrade() {
                scheduler.emit(name, data);
            }
        })
    }

    fn dispatch(&self, msg: Msg, immediate: bool) {
        let next = {
            let mut state = self.state.borrow_mut();
            match state.phase {
                Phase::Stopped => {
                    engine_trace!("message dropped: runtime is shut down");
                    return;
                }
                Phase::Ticking => {
                    state.message_queue.push_back(msg);
                    AfterDispatch::Nothing
                }
                Phase::Idle | Phase::TickScheduled if immediate => {
                    state.message_queue.push_back(msg);
                    AfterDispatch::TickNow(state.tick_handle.take())
                }
                Phase::Idle => {
                    state.message_queue.push_back(msg);
                    AfterDispatch::ArmTimer
                }
                Phase::TickScheduled => {
                    state.message_queue.push_back(msg);
                    AfterDispatch::Nothing
                }
            }
        };
        match next {
            AfterDispatch::Nothing => {}
            AfterDispatch::ArmTimer => self.arm_timer(),
            AfterDispatch::TickNow(pending) => {
                if let Some(handle) = pending {
                    self.host.cancel_tick(handle);
                }
                self.tick();
            }
        }
    }

    pub(crate) fn arm_timer(&self) {
        let this = self.this.clone();
        let handle = self.host.request_tick(Box::new(move || {
            if let Some(scheduler) = this.upgrade() {
                scheduler.on_timer();
            }
        }));
        let stale = {
            let mut state = self.state.borrow_mut();
            match state.phase {
                Phase::Idle | Phase::TickScheduled => {
                    state.phase = Phase::TickScheduled;
                    state.tick_handle.replace(handle)
                }
                Phase::Ticking | Phase::Stopped => Some(handle),
            }
        };
        if let Some(stale) = stale {
            self.host.cancel_tick(stale);
        }
    }

    fn on_timer(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.phase != Phase::TickScheduled {
                return;
            }
            state.tick_handle = None;
        }
        self.tick();
    }

    fn tick(&self) {
        let logic = {
            let mut state = self.state.borrow_mut();
            let Some(logic) = state.logic.clone() else {
                return;
            };
            state.phase = Phase::Ticking;
            logic
        };
        engine_debug!("tick started");

        let settled = self.settle(&logic.update);
        if self.phase() == Phase::Stopped {
            return;
        }
        let committed = self.render(&logic.view);

        self.state.borrow_mut().phase = Phase::Idle;
        if !settled {
            engine_warn!(
                "effects kept dispatching after {} rounds; continuing next frame",
                self.config.max_settle_rounds
            );
            self.arm_timer();
        } else if !committed {
            self.arm_timer();
        }
    }

    /// Drains messages and runs effects until both queues are empty.
    /// Returns false when the round limit was hit with work left over.
    fn settle(&self, update: &UpdateFn<Model, Msg>) -> bool {
        for _ in 0..=self.config.max_settle_rounds {
            self.drain_messages(update);

            let tasks = std::mem::take(&mut self.state.borrow_mut().effect_queue);
            for task in tasks {
                if self.phase() == Phase::Stopped {
                    return true;
                }
                self.run_task(task);
            }

            let state = self.state.borrow();
            if state.phase == Phase::Stopped
                || (state.message_queue.is_empty() && state.effect_queue.is_empty())
            {
                return true;
            }
        }
        false
    }

    fn drain_messages(&self, update: &UpdateFn<Model, Msg>) {
        loop {
            let (msg, model) = {
                let mut state = self.state.borrow_mut();
                let Some(msg) = state.message_queue.pop_front() else {
                    return;
                };
                let Some(model) = state.model.take() else {
                    return;
                };
                (msg, model)
            };

            let (model, effects) = update(model, msg);

            let mut state = self.state.borrow_mut();
            if state.phase == Phase::Stopped {
                return;
            }
            if state.model.is_some() {
                engine_debug!("update result discarded: model was forced while it ran");
                continue;
            }
            state.model = Some(model);
            state.effect_queue.extend(effects.into_tasks());
        }
    }

    fn run_task(&self, task: Task<Msg>) {
        let root = self.state.borrow().root_dom;
        let ctx = TaskContext::new(self.dispatcher(), self.emitter(), root);
        task(&ctx);
    }

    /// Renders the current model. Returns false when the model was forced
    /// while `view` ran; the forced model is kept and still needs a render.
    fn render(&self, view: &ViewFn<Model, Msg>) -> bool {
        let Some(model) = self.state.borrow_mut().model.take() else {
            return true;
        };
        let vnode = view(&model);
        let (root, current) = {
            let mut state = self.state.borrow_mut();
            if state.phase == Phase::Stopped {
                return true;
            }
            let current = state.model.is_none();
            if current {
                state.model = Some(model);
            }
            (state.root_dom, current)
        };

        let dispatcher = self.dispatcher();
        let root = {
            let mut doc = self.document.borrow_mut();
            morph(&mut doc, root, vnode, &dispatcher)
        };
        self.state.borrow_mut().root_dom = Some(root);
        let pass = engine_logging::advance_render_pass();
        engine_debug!("render pass {} committed at {}", pass, root);
        current
    }

    fn emit(&self, name: &str, data: Value) {
        let root = {
            let state = self.state.borrow();
            if state.phase == Phase::Stopped {
                return;
            }
            state.root_dom
        };
        if let Some(root) = root {
            dispatch_event(&self.document, root, name, data);
        }
    }

    fn shutdown(&self) {
        let (pending, root, dropped) = {
            let mut state = self.state.borrow_mut();
            if state.phase == Phase::Stopped {
                return;
            }
            state.phase = Phase::Stopped;
            let dropped = (
                state.model.take(),
                state.logic.take(),
                std::mem::take(&mut state.message_queue),
                std::mem::take(&mut state.effect_queue),
            );
            (state.tick_handle.take(), state.root_dom.take(), dropped)
        };
        drop(dropped);

        if let Some(handle) = pending {
            self.host.cancel_tick(handle);
        }
        if let Some(root) = root {
            self.document.borrow_mut().remove(root);
        }
        engine_info!("runtime shut down");
    }

    fn force_model(&self, model: Model) {
        let (phase, pending, view, dropped) = {
            let mut state = self.state.borrow_mut();
            if state.phase == Phase::Stopped {
                return;
            }
            let Some(logic) = state.logic.clone() else {
                return;
            };
            let replaced = state.model.replace(model);
            let dropped = (
                replaced,
                std::mem::take(&mut state.message_queue),
                std::mem::take(&mut state.effect_queue),
            );
            let phase = state.phase;
            if phase != Phase::Ticking {
                state.phase = Phase::Ticking;
            }
            (phase, state.tick_handle.take(), logic.view, dropped)
        };
        drop(dropped);
        engine_debug!("model forced by debugger");

        if let Some(handle) = pending {
            self.host.cancel_tick(handle);
        }
        if phase == Phase::Ticking {
            // The tick in progress renders the forced model when it finishes.
            return;
        }
        let committed = self.render(&view);
        {
            let mut state = self.state.borrow_mut();
            if state.phase == Phase::Ticking {
                state.phase = Phase::Idle;
            }
        }
        if !committed {
            self.arm_timer();
        }
    }
}
