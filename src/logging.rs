use miette::{Context, IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use time::{
    format_description::{self, FormatItem},
    OffsetDateTime, UtcOffset,
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{format, FmtContext, FormatEvent, FormatFields},
    registry::LookupSpan,
    FmtSubscriber,
};

/// Log level from the `-v`/`-q` command line flags
pub fn level_from_flags(verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::WARN,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    }
}

/// Initialize the logging system, writing on `stderr`
pub fn init_logging(level: Level) -> Result<()> {
    // Not available everywhere (e.g. multi-threaded unix programs)
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let my_pretty_logger = MyPrettyLogger::new(local_offset)?;

    let subscriber = FmtSubscriber::builder()
        .event_format(my_pretty_logger)
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .into_diagnostic()
        .wrap_err("Setting default subscriber failed")
}

/// Custom logger as the default ones are not as customizable as I want
struct MyPrettyLogger {
    offset: UtcOffset,
    time_format: Vec<FormatItem<'static>>,
}

impl MyPrettyLogger {
    fn new(offset: UtcOffset) -> Result<Self> {
        Ok(Self {
            offset,
            time_format: format_description::parse("[hour]:[minute]:[second]")
                .into_diagnostic()?,
        })
    }
}

impl<S, N> FormatEvent<S, N> for MyPrettyLogger
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();

        let now = OffsetDateTime::now_utc().to_offset(self.offset).time();
        let now = now.format(&self.time_format).map_err(|_| std::fmt::Error)?;
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("worker");

        if writer.has_ansi_escapes() {
            let level = match *metadata.level() {
                Level::ERROR => metadata.level().red().to_string(),
                Level::WARN => metadata.level().yellow().to_string(),
                Level::DEBUG => metadata.level().blue().to_string(),
                Level::TRACE => metadata.level().purple().to_string(),
                _ => metadata.level().green().to_string(),
            };

            write!(&mut writer, "{now} {level:>5} {} ", thread_name.yellow())?;
        } else {
            write!(
                &mut writer,
                "{now} {:>5} {thread_name} ",
                metadata.level()
            )?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}
