#![deny(missing_docs)]
//! Logging facade shared by the trellis runtime crates.
//!
//! Every runtime crate logs through the `engine_*` macros so the sink can be
//! swapped in one place. The crate also tracks the render pass of the runtime
//! driving the current thread, which log lines can quote to correlate
//! messages with the frame they belong to.

use std::cell::Cell;

thread_local! {
    static RENDER_PASS: Cell<u64> = const { Cell::new(0) };
}

/// Records that the runtime on this thread finished another render pass and
/// returns the new pass number.
pub fn advance_render_pass() -> u64 {
    RENDER_PASS.with(|pass| {
        let next = pass.get().wrapping_add(1);
        pass.set(next);
        next
    })
}

/// Returns the render pass count for the current thread (0 before the first render).
pub fn render_pass() -> u64 {
    RENDER_PASS.with(|pass| pass.get())
}

/// Logs a trace-level message, prefixed with the current render pass.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("[pass {}] {}", $crate::render_pass(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message, prefixed with the current render pass.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("[pass {}] {}", $crate::render_pass(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Initializes a terminal logger for integration tests.
///
/// Safe to call from every test: a second initialization is ignored.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let _ = TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_pass_counts_per_thread() {
        let start = render_pass();
        assert_eq!(advance_render_pass(), start + 1);
        assert_eq!(render_pass(), start + 1);

        let other = std::thread::spawn(render_pass).join().unwrap();
        assert_eq!(other, 0);
    }
}
