use anyhow::{Context, Result};
use keeper_core::{AppConfig, ArchiveEngine, BackupGuard};
use std::path::Path;

use crate::cli::Commands;
use crate::commands;

#[derive(Debug, Clone)]
pub struct CliApp {
    pub config: AppConfig,
    pub backup_guard: BackupGuard,
    pub archive_engine: ArchiveEngine,
}

impl CliApp {
    /// 加载配置并初始化各组件，配置有问题时在任何操作之前失败
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => AppConfig::load_from_file(path)
                .with_context(|| format!("加载配置文件失败: {}", path.display()))?,
            None => AppConfig::find_and_load_config().context("加载配置文件失败")?,
        };

        Ok(Self::from_config(config))
    }

    pub fn from_config(config: AppConfig) -> Self {
        let backup_guard = BackupGuard::new(
            config.get_server_dir(),
            config.get_backup_dir(),
            config.backup.precision,
        );
        let archive_engine = ArchiveEngine::from_config(&config);

        Self {
            config,
            backup_guard,
            archive_engine,
        }
    }

    /// 运行应用命令
    pub fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Init { .. } => unreachable!(), // 已经在 main.rs 中处理
            Commands::Status => commands::run_status(self),
            Commands::Check { candidate } => commands::run_check(self, &candidate),
            Commands::Backup { candidate, files } => {
                commands::run_backup(self, &candidate, files).map(|_| ())
            }
            Commands::Pack { output, files } => commands::run_pack(self, &output, files),
            Commands::Unpack {
                archive,
                dest,
                no_timestamp,
            } => commands::run_unpack(self, &archive, dest.as_deref(), !no_timestamp),
            Commands::Verify { archive } => commands::run_verify(self, &archive),
            Commands::Replace { archive } => commands::run_replace(self, &archive),
        }
    }
}
