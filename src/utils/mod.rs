mod perf;
pub mod time_utils;

pub use time_utils::{TimeUtils, calendar_date_utc, format_duration, to_iso};
