use crate::app::CliApp;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 打包文件；未指定文件时打包配置中存在的服务端文件
///
/// 配置中跟踪但本地不存在的文件会被跳过（记录警告），一个都不存在时报错。
/// 显式指定的文件不存在时直接失败。
pub fn run_pack(app: &CliApp, output: &Path, files: Vec<PathBuf>) -> Result<()> {
    let files = if files.is_empty() {
        let tracked: Vec<PathBuf> = app
            .config
            .server_file_paths()
            .into_iter()
            .filter(|path| {
                let exists = path.is_file();
                if !exists {
                    warn!("⚠️  跳过不存在的文件: {}", path.display());
                }
                exists
            })
            .collect();
        if tracked.is_empty() {
            anyhow::bail!("没有可打包的服务端文件");
        }
        tracked
    } else {
        files
    };

    info!("📦 打包 {} 个文件", files.len());
    let created = app
        .archive_engine
        .create_archive(output, &files)
        .with_context(|| format!("打包失败: {}", output.display()))?;

    info!("✅ 已生成: {} ({} 个条目)", created.path.display(), created.entry_count);
    Ok(())
}

pub fn run_unpack(
    app: &CliApp,
    archive: &Path,
    dest: Option<&Path>,
    propagate_timestamp: bool,
) -> Result<()> {
    info!("📤 解压 {}", archive.display());
    let report = app
        .archive_engine
        .extract_archive(archive, dest, propagate_timestamp)
        .with_context(|| format!("解压失败: {}", archive.display()))?;

    for file in &report.files {
        info!("   📄 {}", file.display());
    }
    info!(
        "✅ 解压完成: {} 个文件 -> {}",
        report.files.len(),
        report.destination.display()
    );
    Ok(())
}

pub fn run_verify(app: &CliApp, archive: &Path) -> Result<()> {
    let count = app
        .archive_engine
        .verify_archive(archive)
        .with_context(|| format!("压缩包校验失败: {}", archive.display()))?;
    info!("✅ {} 完整，共 {} 个条目", archive.display(), count);
    Ok(())
}
