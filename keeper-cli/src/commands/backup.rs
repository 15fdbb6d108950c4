use crate::app::CliApp;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use keeper_core::{BackupReport, FileState, backup::PlanEntry};
use tracing::{info, warn};

/// 只校验，不移动文件
pub fn run_check(app: &CliApp, candidate: &DateTime<Local>) -> Result<()> {
    info!("🔍 校验候选版本时间: {}", candidate.format("%Y-%m-%d %H:%M:%S"));

    let files = app.config.server_files();
    let plan = app
        .backup_guard
        .check(candidate, &files)
        .context("候选版本校验未通过")?;

    for entry in &plan.entries {
        match entry {
            PlanEntry::Missing { name, .. } => info!("   ⏭️  {} (本地不存在，跳过)", name),
            PlanEntry::Move(planned) => info!(
                "   ✅ {} (本地: {}) -> {}",
                planned.name,
                planned.local_time,
                planned.target.display()
            ),
        }
    }

    match &plan.backup_dir {
        Some(dir) => info!("✅ 校验通过，备份目录将为: {}", dir.display()),
        None => warn!("⚠️  没有需要备份的文件"),
    }
    Ok(())
}

/// 校验并备份；`files` 为空时使用配置中的文件列表
pub fn run_backup(
    app: &CliApp,
    candidate: &DateTime<Local>,
    files: Vec<String>,
) -> Result<BackupReport> {
    let files = if files.is_empty() {
        app.config.server_files()
    } else {
        files
    };

    info!("💾 备份服务端文件");
    info!("===============");
    info!("候选版本时间: {}", candidate.format("%Y-%m-%d %H:%M:%S"));

    let report = app
        .backup_guard
        .validate_and_backup(candidate, &files)
        .context("备份失败")?;

    log_report(&report);
    Ok(report)
}

fn log_report(report: &BackupReport) {
    for outcome in &report.outcomes {
        match (outcome.state, &outcome.backup_path) {
            (FileState::BackedUp, Some(path)) => {
                info!("   ✅ {} -> {}", outcome.name, path.display())
            }
            _ => info!("   ⏭️  {} (本地不存在，跳过)", outcome.name),
        }
    }

    match &report.backup_dir {
        Some(dir) => info!(
            "🎉 备份完成: {} 个文件 -> {}",
            report.backed_up_count(),
            dir.display()
        ),
        None => info!("没有需要备份的文件"),
    }
}
