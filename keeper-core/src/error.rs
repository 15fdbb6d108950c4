use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KeeperError>;

#[derive(Error, Debug)]
pub enum KeeperError {
    #[error("配置文件无法读取: {path}: {source}")]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("配置项 '{key}' 无效: {reason}")]
    ConfigInvalid { key: String, reason: String },

    #[error("配置解析错误: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("待处理的文件列表为空")]
    InvalidBatch,

    #[error("本地文件 {file} 比待替换的版本更新 (本地: {local}, 候选: {candidate})，操作中止")]
    StaleCandidate {
        file: String,
        local: NaiveDateTime,
        candidate: NaiveDateTime,
    },

    #[error("本地文件 {file} 与待替换的版本时间相同 ({local})，无需替换")]
    NoChange { file: String, local: NaiveDateTime },

    #[error("备份文件 {file} 失败: {reason}")]
    BackupFailed { file: String, reason: String },

    #[error("输出压缩包路径为空")]
    InvalidOutputPath,

    #[error("无法确定输入文件的文件名: {0}")]
    InvalidInputFile(PathBuf),

    #[error("压缩完成但输出文件不存在: {0}")]
    WriteVerificationFailed(PathBuf),

    #[error("压缩包不存在: {0}")]
    ContainerNotFound(PathBuf),

    #[error("压缩包条目位于目标目录之外: {entry}")]
    PathTraversal { entry: String },

    #[error("创建目录失败: {path}: {source}")]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP 文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl KeeperError {
    pub fn config_invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn backup_failed(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BackupFailed {
            file: file.into(),
            reason: reason.into(),
        }
    }

    pub fn directory_create_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreateFailed {
            path: path.into(),
            source,
        }
    }
}
