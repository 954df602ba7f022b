use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::NodeId;

/// Cloneable entry point that feeds messages back into the runtime.
///
/// The sink receives the message and whether it should be applied
/// immediately instead of on the next scheduled tick.
pub struct Dispatcher<Msg> {
    sink: Rc<dyn Fn(Msg, bool)>,
}

impl<Msg> Dispatcher<Msg> {
    pub fn new(sink: impl Fn(Msg, bool) + 'static) -> Self {
        Self {
            sink: Rc::new(sink),
        }
    }

    /// Queues the message for the next tick.
    pub fn dispatch(&self, msg: Msg) {
        (self.sink)(msg, false);
    }

    /// Queues the message and processes it right away.
    pub fn dispatch_now(&self, msg: Msg) {
        (self.sink)(msg, true);
    }

    pub fn map<Child: 'static>(&self, f: impl Fn(Child) -> Msg + 'static) -> Dispatcher<Child>
    where
        Msg: 'static,
    {
        let sink = Rc::clone(&self.sink);
        Dispatcher::new(move |msg, immediate| sink(f(msg), immediate))
    }
}

impl<Msg> Clone for Dispatcher<Msg> {
    fn clone(&self) -> Self {
        Self {
            sink: Rc::clone(&self.sink),
        }
    }
}

impl<Msg> fmt::Debug for Dispatcher<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dispatcher")
    }
}

/// Fires custom events on the runtime's root node.
#[derive(Clone)]
pub struct Emitter {
    sink: Rc<dyn Fn(&str, Value)>,
}

impl Emitter {
    pub fn new(sink: impl Fn(&str, Value) + 'static) -> Self {
        Self {
            sink: Rc::new(sink),
        }
    }

    pub fn emit(&self, name: &str, data: Value) {
        (self.sink)(name, data);
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Emitter")
    }
}

/// What a task may touch while it runs.
#[derive(Debug)]
pub struct TaskContext<Msg> {
    dispatcher: Dispatcher<Msg>,
    emitter: Emitter,
    root: Option<NodeId>,
}

impl<Msg> TaskContext<Msg> {
    pub fn new(dispatcher: Dispatcher<Msg>, emitter: Emitter, root: Option<NodeId>) -> Self {
        Self {
            dispatcher,
            emitter,
            root,
        }
    }

    pub fn dispatch(&self, msg: Msg) {
        self.dispatcher.dispatch(msg);
    }

    pub fn dispatch_now(&self, msg: Msg) {
        self.dispatcher.dispatch_now(msg);
    }

    pub fn emit(&self, name: &str, data: Value) {
        self.emitter.emit(name, data);
    }

    /// Handle for tasks that complete later and dispatch from a callback.
    pub fn dispatcher(&self) -> Dispatcher<Msg> {
        self.dispatcher.clone()
    }

    pub fn emitter(&self) -> Emitter {
        self.emitter.clone()
    }

    /// Root node the runtime renders into, if it is still mounted.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }
}

/// A unit of side-effecting work. It must return promptly; long-running
/// work keeps a [`Dispatcher`] and reports back through messages.
pub type Task<Msg> = Box<dyn FnOnce(&TaskContext<Msg>)>;

/// Ordered bag of tasks produced by `init` and `update`.
pub struct Effect<Msg> {
    tasks: Vec<Task<Msg>>,
}

impl<Msg> Effect<Msg> {
    pub fn none() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn from_fn(task: impl FnOnce(&TaskContext<Msg>) + 'static) -> Self {
        Self {
            tasks: vec![Box::new(task)],
        }
    }

    /// Concatenates the tasks of every effect, preserving order.
    pub fn batch(effects: impl IntoIterator<Item = Effect<Msg>>) -> Self {
        let tasks = effects.into_iter().flat_map(|effect| effect.tasks).collect();
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn into_tasks(self) -> Vec<Task<Msg>> {
        self.tasks
    }

    /// Lifts the effect into a parent message type.
    pub fn map<Other: 'static>(self, f: impl Fn(Msg) -> Other + 'static) -> Effect<Other>
    where
        Msg: 'static,
    {
        let f: Rc<dyn Fn(Msg) -> Other> = Rc::new(f);
        let tasks = self
            .tasks
            .into_iter()
            .map(|task| {
                let f = Rc::clone(&f);
                let mapped: Task<Other> = Box::new(move |ctx: &TaskContext<Other>| {
                    let inner = TaskContext::new(
                        ctx.dispatcher().map(move |msg| f(msg)),
                        ctx.emitter(),
                        ctx.root(),
                    );
                    task(&inner);
                });
                mapped
            })
            .collect();
        Effect { tasks }
    }
}

impl<Msg> Default for Effect<Msg> {
    fn default() -> Self {
        Self::none()
    }
}

impl<Msg> fmt::Debug for Effect<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("tasks", &self.tasks.len())
            .finish()
    }
}
