use crate::constants::{archive, backup, config};
use crate::error::{KeeperError, Result};
use crate::precision::TimestampPrecision;
use crate::properties::{Properties, split_multi_value};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 应用配置结构
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub backup: BackupConfig,
    pub archive: ArchiveConfig,
}

/// 路径相关配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PathsConfig {
    pub server_save_dir: String,
    pub backup_dir: String,
}

/// 备份相关配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BackupConfig {
    pub precision: TimestampPrecision,
    /// 逗号分隔的文件名列表
    pub server_files: String,
}

/// 压缩相关配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ArchiveConfig {
    pub compression_level: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                server_save_dir: backup::get_default_server_dir()
                    .to_string_lossy()
                    .to_string(),
                backup_dir: backup::get_default_storage_dir()
                    .to_string_lossy()
                    .to_string(),
            },
            backup: BackupConfig {
                precision: TimestampPrecision::default(),
                server_files: backup::DEFAULT_SERVER_FILES.to_string(),
            },
            archive: ArchiveConfig {
                compression_level: archive::DEFAULT_COMPRESSION_LEVEL,
            },
        }
    }
}

impl AppConfig {
    /// 智能查找并加载配置文件
    /// 按优先级查找：keeper.toml -> config.toml -> keeper.properties
    pub fn find_and_load_config() -> Result<Self> {
        for config_file in &config::CONFIG_FILE_NAMES {
            if Path::new(config_file).exists() {
                tracing::info!("找到配置文件: {}", config_file);
                return Self::load_from_file(config_file);
            }
        }

        Err(KeeperError::ConfigUnreadable {
            path: PathBuf::from(config::DEFAULT_CONFIG_FILE_NAME),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("未找到任何配置文件: {}", config::CONFIG_FILE_NAMES.join(", ")),
            ),
        })
    }

    /// 从指定文件加载配置并校验
    ///
    /// `.toml` 按 TOML 解析，其他扩展名按 `.properties` 格式解析。
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(config::TOML_EXTENSION));

        let config = if is_toml {
            let content =
                fs::read_to_string(path).map_err(|source| KeeperError::ConfigUnreadable {
                    path: path.to_path_buf(),
                    source,
                })?;
            toml::from_str::<AppConfig>(&content)?
        } else {
            Self::from_properties(&Properties::load_from_file(path)?)?
        };

        config.validate()?;
        tracing::debug!("配置加载完成: {:?}", config);
        Ok(config)
    }

    /// 由 `.properties` 键值构建配置
    pub fn from_properties(props: &Properties) -> Result<Self> {
        use config::properties_keys as keys;

        let precision = props.require(keys::DATE_FORMAT)?.parse()?;
        let level_raw = props.require(keys::ZIP_LEVEL)?;
        let compression_level = level_raw.parse::<i64>().map_err(|e| {
            KeeperError::config_invalid(keys::ZIP_LEVEL, format!("'{level_raw}' 不是整数: {e}"))
        })?;

        Ok(Self {
            paths: PathsConfig {
                server_save_dir: props.require(keys::SERVER_SAVE_DIR)?.to_string(),
                backup_dir: props.require(keys::BACKUP_DIR)?.to_string(),
            },
            backup: BackupConfig {
                precision,
                server_files: props.get_multi(keys::SERVER_FILES)?.join(","),
            },
            archive: ArchiveConfig { compression_level },
        })
    }

    /// 启动时一次性校验，任何组件运行前发现问题即失败
    pub fn validate(&self) -> Result<()> {
        if self.paths.server_save_dir.trim().is_empty() {
            return Err(KeeperError::config_invalid("paths.server_save_dir", "值为空"));
        }
        if self.paths.backup_dir.trim().is_empty() {
            return Err(KeeperError::config_invalid("paths.backup_dir", "值为空"));
        }
        if self.server_files().is_empty() {
            return Err(KeeperError::config_invalid(
                "backup.server_files",
                "至少需要一个文件名",
            ));
        }

        let level = self.archive.compression_level;
        if !(archive::MIN_COMPRESSION_LEVEL..=archive::MAX_COMPRESSION_LEVEL).contains(&level) {
            return Err(KeeperError::config_invalid(
                "archive.compression_level",
                format!(
                    "{level} 超出范围 {}-{}",
                    archive::MIN_COMPRESSION_LEVEL,
                    archive::MAX_COMPRESSION_LEVEL
                ),
            ));
        }

        Ok(())
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml_with_comments();
        fs::write(&path, content)?;
        Ok(())
    }

    /// 生成带注释的TOML配置
    fn to_toml_with_comments(&self) -> String {
        const TEMPLATE: &str = include_str!("../templates/keeper.toml.template");

        TEMPLATE
            .replace("{server_save_dir}", &self.paths.server_save_dir)
            .replace("{backup_dir}", &self.paths.backup_dir)
            .replace("{precision}", self.backup.precision.as_str())
            .replace("{server_files}", &self.backup.server_files)
            .replace(
                "{compression_level}",
                &self.archive.compression_level.to_string(),
            )
    }

    /// 确保服务端目录和备份目录存在
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.get_server_dir(), self.get_backup_dir()] {
            fs::create_dir_all(&dir)
                .map_err(|source| KeeperError::directory_create_failed(dir, source))?;
        }
        Ok(())
    }

    /// 被跟踪的文件名列表
    pub fn server_files(&self) -> Vec<String> {
        split_multi_value(&self.backup.server_files)
    }

    /// 获取服务端文件目录路径
    pub fn get_server_dir(&self) -> PathBuf {
        PathBuf::from(&self.paths.server_save_dir)
    }

    /// 获取备份目录路径
    pub fn get_backup_dir(&self) -> PathBuf {
        PathBuf::from(&self.paths.backup_dir)
    }

    /// 被跟踪文件在服务端目录下的完整路径
    pub fn server_file_paths(&self) -> Vec<PathBuf> {
        let dir = self.get_server_dir();
        self.server_files().iter().map(|name| dir.join(name)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_roundtrips_through_template() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("keeper.toml");

        let config = AppConfig::default();
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.archive.compression_level, 4);
        assert_eq!(loaded.backup.precision, TimestampPrecision::Day);
    }

    #[test]
    fn test_load_toml() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("keeper.toml");
        fs::write(
            &path,
            r#"
[paths]
server_save_dir = "/srv/game/save"
backup_dir = "/srv/game/backups"

[backup]
precision = "hour"
server_files = "world.sav, players.dat,"

[archive]
compression_level = 6
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.backup.precision, TimestampPrecision::Hour);
        assert_eq!(config.server_files(), vec!["world.sav", "players.dat"]);
        assert_eq!(
            config.server_file_paths()[1],
            PathBuf::from("/srv/game/save").join("players.dat")
        );
        assert_eq!(config.archive.compression_level, 6);
    }

    #[test]
    fn test_load_properties() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("keeper.properties");
        fs::write(
            &path,
            "serverSaveDir=/srv/save\nbackupDir = /srv/bk\ndateFormat=yyyy-MM-dd\nzipLevel=4\nserverFiles=a.txt,b.txt\n",
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.paths.server_save_dir, "/srv/save");
        assert_eq!(config.paths.backup_dir, "/srv/bk");
        assert_eq!(config.backup.precision, TimestampPrecision::Day);
        assert_eq!(config.server_files(), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_properties_missing_key_fails_fast() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("keeper.properties");
        fs::write(&path, "serverSaveDir=/srv/save\nbackupDir=/srv/bk\n").unwrap();

        let err = AppConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, KeeperError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = AppConfig::default();
        config.archive.compression_level = 12;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.backup.server_files = " , ".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.paths.backup_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_precision_in_toml() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("keeper.toml");
        fs::write(
            &path,
            "[paths]\nserver_save_dir = \"a\"\nbackup_dir = \"b\"\n[backup]\nprecision = \"weekly\"\nserver_files = \"x\"\n[archive]\ncompression_level = 4\n",
        )
        .unwrap();

        let err = AppConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, KeeperError::TomlParse(_)));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let temp_dir = tempdir().unwrap();
        let err = AppConfig::load_from_file(temp_dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, KeeperError::ConfigUnreadable { .. }));
    }
}
