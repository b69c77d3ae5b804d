use chrono::Local;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Log line format: `LEVEL [time] thread: message`
///
/// The thread name matters here since lifecycle context is per thread.
pub struct LifecycleFormatter;

impl<S, N> FormatEvent<S, N> for LifecycleFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let level = event.metadata().level();
        let timestamp = Local::now().format("%H:%M:%S%.3f");
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("unnamed");

        write!(writer, "{:>5} [{}] {}: ", level, timestamp, thread_name)?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber used by the binary
///
/// `RUST_LOG` takes precedence over `default_level`.
pub fn init(default_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .event_format(LifecycleFormatter)
        .try_init();
}
