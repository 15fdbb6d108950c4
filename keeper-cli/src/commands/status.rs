use crate::app::CliApp;
use crate::project_info::get_version_string;
use anyhow::Result;
use chrono::{DateTime, Local};
use tracing::info;

/// 显示配置和被跟踪文件的状态
pub fn run_status(app: &CliApp) -> Result<()> {
    info!("🗄️  {}", get_version_string());
    info!("==================");
    info!("📋 配置:");
    info!("   服务端目录: {}", app.config.paths.server_save_dir);
    info!("   备份目录: {}", app.config.paths.backup_dir);
    info!("   时间精度: {}", app.config.backup.precision);
    info!("   压缩级别: {}", app.archive_engine.compression_level());

    info!("📁 跟踪的文件:");
    for (name, path) in app
        .config
        .server_files()
        .iter()
        .zip(app.config.server_file_paths())
    {
        match std::fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(modified) => {
                let modified = DateTime::<Local>::from(modified);
                let truncated = app.config.backup.precision.truncate(&modified);
                info!(
                    "   ✅ {} (修改时间: {}, 比较基准: {})",
                    name,
                    modified.format("%Y-%m-%d %H:%M:%S"),
                    truncated
                );
            }
            Err(_) => info!("   ❌ {} (不存在)", name),
        }
    }

    Ok(())
}
