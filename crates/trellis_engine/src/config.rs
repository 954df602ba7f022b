use serde::{Deserialize, Serialize};

/// Tuning knobs for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// How many times one tick re-drains messages dispatched synchronously by
    /// effects before it renders and defers the rest to the next frame.
    pub max_settle_rounds: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_settle_rounds: 5,
        }
    }
}
