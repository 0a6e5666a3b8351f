pub(crate) mod date;
pub(crate) mod logging;
pub(crate) mod progress;

pub(crate) use date::{DateFilter, parse_date};
pub(crate) use logging::init_logging;
pub(crate) use progress::progress_bar;
