use crate::error::KeeperError;
use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;
use tracing::warn;

/// 时间比较精度
///
/// 比较前先把候选时间和本地文件时间都截断到该精度（本地时区），
/// 同时决定备份目录的命名格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimestampPrecision {
    #[default]
    Day,
    Hour,
    Minute,
    Second,
}

impl TimestampPrecision {
    /// 截断到当前精度，返回本地时区下的时间
    pub fn truncate<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> NaiveDateTime {
        self.truncate_naive(instant.with_timezone(&Local).naive_local())
    }

    /// 截断文件系统时间（如 mtime）
    pub fn truncate_system_time(&self, time: SystemTime) -> NaiveDateTime {
        self.truncate(&DateTime::<Local>::from(time))
    }

    pub fn truncate_naive(&self, local: NaiveDateTime) -> NaiveDateTime {
        let (h, m, s) = match self {
            Self::Day => (0, 0, 0),
            Self::Hour => (local.hour(), 0, 0),
            Self::Minute => (local.hour(), local.minute(), 0),
            Self::Second => (local.hour(), local.minute(), local.second()),
        };
        let time = NaiveTime::from_hms_opt(h, m, s).unwrap_or(NaiveTime::MIN);
        local.date().and_time(time)
    }

    /// 备份目录名使用的 strftime 格式
    pub fn dir_format(&self) -> &'static str {
        match self {
            Self::Day => "%Y-%m-%d",
            Self::Hour => "%Y-%m-%d_%H",
            Self::Minute => "%Y-%m-%d_%H-%M",
            Self::Second => "%Y-%m-%d_%H-%M-%S",
        }
    }

    /// 由已截断的本地时间生成备份目录名
    pub fn dir_name(&self, truncated: &NaiveDateTime) -> String {
        truncated.format(self.dir_format()).to_string()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
        }
    }

    /// 兼容旧配置中的日期格式串（如 `yyyy-MM-dd`），按其中最细的字段确定精度。
    /// 格式串本身不再用于命名，`dd.MM.yyyy` 的备份目录同样是 `2024-01-01`。
    fn from_date_pattern(pattern: &str) -> Option<Self> {
        let is_pattern = pattern.contains("yy")
            && pattern
                .chars()
                .all(|c| "yMdHhmsS".contains(c) || "-_:. ".contains(c));
        if !is_pattern {
            return None;
        }

        if pattern.contains("ss") {
            Some(Self::Second)
        } else if pattern.contains("mm") {
            Some(Self::Minute)
        } else if pattern.contains('H') || pattern.contains('h') {
            Some(Self::Hour)
        } else if pattern.contains('d') {
            Some(Self::Day)
        } else {
            None
        }
    }
}

impl fmt::Display for TimestampPrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimestampPrecision {
    type Err = KeeperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "day" => return Ok(Self::Day),
            "hour" => return Ok(Self::Hour),
            "minute" => return Ok(Self::Minute),
            "second" => return Ok(Self::Second),
            _ => {}
        }

        let precision = Self::from_date_pattern(trimmed).ok_or_else(|| {
            KeeperError::config_invalid(
                "precision",
                format!("无法识别的时间精度 '{trimmed}'，可选值: day, hour, minute, second"),
            )
        })?;
        warn!(
            "旧日期格式 '{}' 只用于确定精度 ({})，备份目录按 {} 命名",
            trimmed,
            precision,
            precision.dir_format()
        );
        Ok(precision)
    }
}

impl TryFrom<String> for TimestampPrecision {
    type Error = KeeperError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimestampPrecision> for String {
    fn from(value: TimestampPrecision) -> Self {
        value.as_str().to_string()
    }
}
