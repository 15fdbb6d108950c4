use crate::app::CliApp;
use crate::commands::backup::run_backup;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::Path;
use tracing::info;

/// 用新的压缩包替换服务端文件
///
/// 1. 校验压缩包完整性
/// 2. 以压缩包的修改时间作为候选版本时间，备份旧文件
/// 3. 解压到服务端目录，并把压缩包时间写到解压出的文件上
pub fn run_replace(app: &CliApp, archive: &Path) -> Result<()> {
    info!("🔄 替换服务端文件: {}", archive.display());

    info!("📋 步骤 1: 校验压缩包");
    app.archive_engine
        .verify_archive(archive)
        .with_context(|| format!("压缩包校验失败: {}", archive.display()))?;

    info!("📋 步骤 2: 备份旧文件");
    let modified = std::fs::metadata(archive)?.modified()?;
    let candidate = DateTime::<Local>::from(modified);
    run_backup(app, &candidate, Vec::new())?;

    info!("📋 步骤 3: 解压新文件");
    let server_dir = app.config.get_server_dir();
    let report = app
        .archive_engine
        .extract_archive(archive, Some(&server_dir), true)
        .with_context(|| format!("解压到 {} 失败", server_dir.display()))?;

    info!(
        "🎉 替换完成: {} 个文件已更新到 {}",
        report.files.len(),
        report.destination.display()
    );
    Ok(())
}
