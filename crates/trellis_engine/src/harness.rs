//! Mounting an application and the handle used to drive it.

use std::rc::Rc;

use engine_logging::engine_info;
use trellis_core::{Action, App};

use crate::config::RuntimeConfig;
use crate::error::StartupError;
use crate::host::Host;
use crate::scheduler::{Phase, Scheduler};

/// The single entry point into a running application.
///
/// The runtime lives as long as at least one handle does; event handlers and
/// effect dispatchers only hold it weakly.
pub struct RuntimeHandle<Model, Msg> {
    scheduler: Rc<Scheduler<Model, Msg>>,
}

impl<Model, Msg> Clone for RuntimeHandle<Model, Msg> {
    fn clone(&self) -> Self {
        Self {
            scheduler: Rc::clone(&self.scheduler),
        }
    }
}

impl<Model: 'static, Msg: 'static> RuntimeHandle<Model, Msg> {
    pub fn send(&self, action: Action<Model, Msg>) {
        self.scheduler.send(action);
    }

    pub fn phase(&self) -> Phase {
        self.scheduler.phase()
    }
}

/// Mounts `app` on the first element matching `selector` with the default configuration.
pub fn start<Flags, Model: 'static, Msg: 'static>(
    app: App<Flags, Model, Msg>,
    host: Rc<dyn Host>,
    selector: &str,
    flags: Flags,
) -> Result<RuntimeHandle<Model, Msg>, StartupError> {
    start_with_config(app, host, selector, flags, RuntimeConfig::default())
}

/// Mounts `app` and schedules its first tick.
///
/// Nothing is rendered until that tick runs; the mount element is then
/// morphed into the top node of the first view.
pub fn start_with_config<Flags, Model: 'static, Msg: 'static>(
    app: App<Flags, Model, Msg>,
    host: Rc<dyn Host>,
    selector: &str,
    flags: Flags,
    config: RuntimeConfig,
) -> Result<RuntimeHandle<Model, Msg>, StartupError> {
    let document = host.document().ok_or(StartupError::NotABrowserHost)?;
    let root = document
        .borrow()
        .query_selector(selector)
        .ok_or_else(|| StartupError::MountPointNotFound(selector.to_string()))?;

    let (init, update, view) = app.into_parts();
    let (model, effects) = init(flags);
    let scheduler = Scheduler::new(host, document, root, config, model, effects, update, view);
    scheduler.arm_timer();
    engine_info!("application mounted on `{}` ({})", selector, root);

    Ok(RuntimeHandle { scheduler })
}
