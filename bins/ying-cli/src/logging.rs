//! 日志初始化.
//!
//! 控制台输出到 stderr (彩色), 文件输出到 `{dir}/{prefix}.{date}.log` (无色, 按天滚动).
//! 文件级别由 `-v` 次数决定, `YING_LOG` 环境变量优先.

use chrono::{Datelike, Local, Timelike};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, FormatEvent, FormatFields, format::Writer},
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};
use ying_core::YingResult;

/// 文件日志级别的环境变量覆盖
pub const LOG_ENV: &str = "YING_LOG";

static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub prefix: String,
    pub dir: PathBuf,
    pub verbosity: u8,
    /// 控制台只输出 warn 及以上
    pub quiet: bool,
}

impl LogConfig {
    pub fn new(prefix: &str, verbosity: u8) -> Self {
        Self {
            prefix: prefix.to_string(),
            dir: PathBuf::from("logs"),
            verbosity,
            quiet: false,
        }
    }

    fn console_directive(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else {
            level_directive(self.verbosity)
        }
    }
}

/// `-v` 次数到过滤指令: 0=info, 1=debug, 2+=trace
pub fn level_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

pub fn init(config: &LogConfig) -> YingResult<()> {
    std::fs::create_dir_all(&config.dir)?;

    let appender = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix(&config.prefix)
        .filename_suffix("log")
        .build(&config.dir)
        .map_err(std::io::Error::other)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    FILE_GUARD.set(guard).ok();

    let console = fmt::Layer::default()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .event_format(LineFormat { colored: true })
        .with_filter(EnvFilter::new(config.console_directive()));

    let file_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(level_directive(config.verbosity)));
    let file = fmt::Layer::default()
        .with_writer(writer)
        .with_ansi(false)
        .event_format(LineFormat { colored: false })
        .with_filter(file_filter);

    Registry::default().with(console).with(file).init();
    Ok(())
}

fn level_color(level: Level) -> &'static str {
    match level {
        Level::ERROR => "\x1b[31m",
        Level::WARN => "\x1b[33m",
        Level::INFO => "\x1b[32m",
        Level::DEBUG => "\x1b[34m",
        _ => "\x1b[35m",
    }
}

/// `[MM-DD hh:mm:ss.mmm] LEVEL target > message`
struct LineFormat {
    colored: bool,
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = Local::now();
        write!(
            writer,
            "[{:02}-{:02} {:02}:{:02}:{:02}.{:03}] ",
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            now.timestamp_subsec_millis(),
        )?;
        let meta = event.metadata();
        if self.colored {
            write!(writer, "{}{:5}\x1b[0m ", level_color(*meta.level()), meta.level())?;
        } else {
            write!(writer, "{:5} ", meta.level())?;
        }
        write!(writer, "{} > ", meta.target())?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
