//! Global logging system.

use std::{
    env,
    io,
    panic,
    time::Instant,
};
use anyhow::*;
use backtrace::Backtrace;
use tracing_subscriber::{
    fmt::{
        self,
        format::Writer,
        time::FormatTime,
    },
    prelude::*,
    Registry,
    EnvFilter,
};


/// Default logging environment filter. Our crates are info, everything else
/// is warn.
const DEFAULT_FILTER: &'static str = "warn,region_data=info,schematic=info,schematic_tool=info";

/// Timer which formats as seconds since logging was initialized.
#[derive(Debug, Clone)]
struct MsUptime(Instant);

impl MsUptime {
    fn new() -> Self {
        MsUptime(Instant::now())
    }
}

impl FormatTime for MsUptime {
    fn format_time(&self, w: &mut Writer) -> std::fmt::Result {
        let elapsed = self.0.elapsed();
        write!(w, "{:.3}s", elapsed.as_millis() as f32 / 1000.0)
    }
}

/// Build the filter string: the default filter, then anything in `RUST_LOG`,
/// which wins where they overlap.
fn filter_string(env_filter: Option<&str>) -> String {
    let mut filter = DEFAULT_FILTER.to_owned();
    if let Some(env_filter) = env_filter.filter(|s| !s.is_empty()) {
        filter.push(',');
        filter.push_str(env_filter);
    }
    filter
}

/// Initializes a `tracing` logging backend which outputs to stderr, leaving
/// stdout for command output. Accepts ecosystem-standard `RUST_LOG` env
/// filters.
pub fn init_logging() -> Result<()> {
    let format = fmt::format()
        .compact()
        .with_timer(MsUptime::new())
        .with_line_number(true);
    let stderr_log = fmt::layer()
        .event_format(format)
        .with_writer(io::stderr);

    let env_filter = env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = filter_string(env_filter.as_deref());

    let subscriber = Registry::default()
        .with(EnvFilter::try_new(&filter).context("invalid log filter")?)
        .with(stderr_log);
    tracing::subscriber::set_global_default(subscriber)
        .context("unable to install log subscriber")?;
    debug!("starting program");

    // make panic messages and backtrace go through logging system
    panic::set_hook(Box::new(|info| {
        error!("{}", info);
        if env::var("RUST_BACKTRACE").map(|val| val == "1").unwrap_or(true) {
            error!("{:?}", Backtrace::new());
        }
    }));
    trace!("installed custom panic hook");
    Ok(())
}


#[test]
fn test_filter_string() {
    assert_eq!(filter_string(None), DEFAULT_FILTER);
    assert_eq!(filter_string(Some("")), DEFAULT_FILTER);
    assert_eq!(
        filter_string(Some("schematic=trace")),
        format!("{},schematic=trace", DEFAULT_FILTER),
    );
    assert!(EnvFilter::try_new(filter_string(Some("schematic=trace"))).is_ok());
}
