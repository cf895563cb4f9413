use std::fmt;

use tracing::{Event, Subscriber};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    fmt::{
        format::Writer,
        time::{FormatTime, SystemTime},
        FmtContext, FormatEvent, FormatFields,
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::{
    config::LogRotation,
    constants::{LOGS_DIR, LOG_FILE_PREFIX, LOG_FILE_SUFFIX},
};

/// Renders an event as its message, optionally prefixed with `"<timestamp> - "`.
struct LineFormat {
    timestamp: bool,
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        if self.timestamp {
            SystemTime.format_time(&mut writer)?;
            write!(writer, " - ")?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Never => Rotation::NEVER,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
        }
    }
}

/// Installs the console and `logs/autosender.log` layers and the panic hook.
///
/// The returned guard flushes the file writer when dropped, so it has to live until the process exits.
pub fn init_default_logger(rotation: LogRotation) -> eyre::Result<WorkerGuard> {
    std::fs::create_dir_all(LOGS_DIR)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(rotation.into())
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(LOGS_DIR)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .event_format(LineFormat { timestamp: false })
        .with_writer(std::io::stdout);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .event_format(LineFormat { timestamp: true })
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    std::panic::set_hook(Box::new(|info| {
        tracing::error!("Uncaught panic: {info}");
    }));

    Ok(guard)
}
