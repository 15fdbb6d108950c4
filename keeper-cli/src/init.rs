use anyhow::{Context, Result};
use keeper_core::{AppConfig, constants::config};
use std::path::Path;
use tracing::{info, warn};

/// 创建默认配置文件和目录结构
pub fn run_init(config_path: Option<&Path>, force: bool) -> Result<()> {
    info!("🗄️  Save Keeper 初始化");
    info!("======================");

    let config_path = config_path.unwrap_or(Path::new(config::DEFAULT_CONFIG_FILE_NAME));

    // 检查是否已经初始化过
    if !force && config_path.exists() {
        warn!("⚠️  配置文件已存在: {}", config_path.display());
        info!("如果您要重新初始化，请使用 --force 参数");
        info!("示例: keeper init --force");
        return Ok(());
    }

    let config = AppConfig::default();
    config
        .save_to_file(config_path)
        .with_context(|| format!("写入配置文件失败: {}", config_path.display()))?;
    info!("   ✅ 创建配置文件: {}", config_path.display());

    config.ensure_dirs()?;
    info!("   ✅ 创建目录结构:");
    info!("      - {}  (服务端文件目录)", config.paths.server_save_dir);
    info!("      - {}  (备份存储目录)", config.paths.backup_dir);

    info!("🎉 初始化完成，可编辑 {} 调整跟踪的文件列表", config_path.display());
    Ok(())
}
