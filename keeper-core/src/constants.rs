/// 备份相关常量
pub mod backup {
    use std::path::{Path, PathBuf};

    /// 服务端文件目录名
    pub const SERVER_DIR_NAME: &str = "server";

    /// 备份目录名
    pub const BACKUP_DIR_NAME: &str = "backups";

    /// 默认跟踪的服务端文件（逗号分隔）
    pub const DEFAULT_SERVER_FILES: &str = "world.sav";

    /// 覆盖旧备份前暂存文件的后缀，批次成功后删除，失败时用于恢复
    pub const STASH_SUFFIX: &str = ".keeper-old";

    /// 获取默认服务端文件目录（跨平台）
    pub fn get_default_server_dir() -> PathBuf {
        Path::new(".").join(SERVER_DIR_NAME)
    }

    /// 获取默认备份存储目录（跨平台）
    pub fn get_default_storage_dir() -> PathBuf {
        Path::new(".").join(BACKUP_DIR_NAME)
    }
}

/// 压缩包相关常量
pub mod archive {
    /// ZIP文件扩展名
    pub const ZIP_EXTENSION: &str = ".zip";

    /// 默认压缩级别（偏向速度，而非最大压缩率）
    pub const DEFAULT_COMPRESSION_LEVEL: i64 = 4;

    /// deflate 允许的压缩级别范围
    pub const MIN_COMPRESSION_LEVEL: i64 = 1;
    pub const MAX_COMPRESSION_LEVEL: i64 = 9;
}

/// 应用配置相关常量
pub mod config {
    /// 按优先级查找的配置文件名
    pub const CONFIG_FILE_NAMES: [&str; 3] = ["keeper.toml", "config.toml", "keeper.properties"];

    /// 默认配置文件名（init 命令生成）
    pub const DEFAULT_CONFIG_FILE_NAME: &str = "keeper.toml";

    /// TOML配置文件扩展名
    pub const TOML_EXTENSION: &str = "toml";

    /// .properties 格式的配置键
    pub mod properties_keys {
        pub const SERVER_SAVE_DIR: &str = "serverSaveDir";
        pub const BACKUP_DIR: &str = "backupDir";
        pub const DATE_FORMAT: &str = "dateFormat";
        pub const ZIP_LEVEL: &str = "zipLevel";
        pub const SERVER_FILES: &str = "serverFiles";
    }
}

/// 日志相关常量
pub mod logging {
    /// 默认日志级别
    pub const DEFAULT_LOG_LEVEL: &str = "info";

    /// 设置后日志输出到该文件
    pub const LOG_FILE_ENV: &str = "KEEPER_LOG_FILE";
}
