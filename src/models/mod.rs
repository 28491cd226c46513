mod probe_result;
mod run;

pub use probe_result::{ERROR_LABEL, ProbeResult, SignalSource};
pub use run::{DiagnosticRun, HealthStatus, RunProgress, RunSummary, SweepSnapshot};
