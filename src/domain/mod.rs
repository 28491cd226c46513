// Domain types and value objects
mod probe;
mod signal;

// Re-export commonly used types to the world
pub use probe::{Probe, build_grid};
pub use signal::SignalResponse;
