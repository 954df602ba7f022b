//! Trellis engine: document, reconciler, event delegation and the
//! model-update-view scheduler.
mod config;
mod dom;
mod error;
mod events;
mod harness;
mod host;
mod reconcile;
mod scheduler;

pub use config::RuntimeConfig;
pub use dom::{Document, MutationStats, SharedDocument, HTML_NAMESPACE};
pub use error::StartupError;
pub use events::{dispatch_event, handler_for, Handler, HandlerRegistry};
pub use harness::{start, start_with_config, RuntimeHandle};
pub use host::{Host, LocalHost, TickCallback, TimerHandle};
pub use reconcile::morph;
pub use scheduler::Phase;
