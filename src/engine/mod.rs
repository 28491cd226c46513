mod bootstrap;
mod controller;
mod error;
mod orchestrator;
#[cfg(test)]
pub(crate) mod test_support;

pub use bootstrap::ensure_connected;
pub use controller::{SweepController, SweepHandle};
pub use error::{SweepError, SweepResult};
pub use orchestrator::{Clock, SweepEngine};
