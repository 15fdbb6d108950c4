use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use keeper_core::constants::logging::{DEFAULT_LOG_LEVEL, LOG_FILE_ENV};

/// # Save Keeper 日志系统使用说明
///
/// 1. **库代码只使用 `tracing` 宏**：`info!()`, `warn!()`, `error!()`, `debug!()`
/// 2. **应用入口控制日志配置**：在 `main.rs` 中调用 `setup_logging()`
///
/// ## 配置
/// - `-v, --verbose`：启用详细日志模式（DEBUG 级别）
/// - `RUST_LOG`：标准的 Rust 日志级别控制（如 `debug`, `info`, `warn`, `error`）
/// - `KEEPER_LOG_FILE`：日志文件路径，设置后日志输出到文件而非终端
///
/// ```bash
/// KEEPER_LOG_FILE=keeper.log keeper backup --candidate 2024-01-02
/// RUST_LOG=keeper_core::archive=debug keeper unpack server.zip
/// ```
///
/// 终端输出为简洁格式；文件输出包含模块路径和行号。
pub fn setup_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // 根据verbose参数和环境变量确定日志级别
    let default_level = if verbose { "debug" } else { DEFAULT_LOG_LEVEL };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Ok(log_file) = std::env::var(LOG_FILE_ENV) {
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
        {
            Ok(file) => {
                fmt()
                    .with_env_filter(env_filter)
                    .with_writer(file)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .init();
                return;
            }
            Err(e) => eprintln!("无法打开日志文件 {log_file}: {e}，改为输出到终端"),
        }
    }

    // 输出到终端 - 使用简洁格式，用户友好
    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_line_number(false)
        .without_time()
        .compact()
        .init();
}

/// 解析命令行中的候选版本时间
///
/// 支持 RFC 3339，以及本地时间 `YYYY-MM-DD`、`YYYY-MM-DDTHH:MM[:SS]`、`YYYY-MM-DD HH:MM[:SS]`。
pub fn parse_candidate_time(value: &str) -> Result<DateTime<Local>, String> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Local));
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    let naive = FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| format!("无法解析时间 '{value}'，示例: 2024-01-02 或 2024-01-02T10:00"))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("本地时区中不存在该时间: {value}"))
}
