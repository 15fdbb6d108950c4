use crate::constants::backup::STASH_SUFFIX;
use crate::{KeeperError, Result, precision::TimestampPrecision};
use chrono::{DateTime, NaiveDateTime, TimeZone};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, info, warn};

/// 服务端文件备份守卫
///
/// 在新版本替换本地文件之前，确认候选版本比本地文件新，
/// 然后把本地文件移动到以时间命名的备份目录中。
#[derive(Debug, Clone)]
pub struct BackupGuard {
    server_save_dir: PathBuf,
    backup_dir: PathBuf,
    precision: TimestampPrecision,
}

/// 单个文件的最终状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// 本地不存在，已跳过
    Missing,
    /// 已移动到备份目录
    BackedUp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub name: String,
    pub state: FileState,
    pub backup_path: Option<PathBuf>,
}

/// 计划中的一次移动
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub name: String,
    pub source: PathBuf,
    pub target: PathBuf,
    /// 截断后的本地修改时间
    pub local_time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanEntry {
    Missing { name: String, path: PathBuf },
    Move(PlannedMove),
}

/// 校验阶段的结果，尚未对文件系统做任何修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPlan {
    /// 整个批次共用的备份目录，由第一个需要备份的文件决定
    pub backup_dir: Option<PathBuf>,
    pub entries: Vec<PlanEntry>,
}

impl BackupPlan {
    pub fn moves(&self) -> impl Iterator<Item = &PlannedMove> {
        self.entries.iter().filter_map(|entry| match entry {
            PlanEntry::Move(planned) => Some(planned),
            PlanEntry::Missing { .. } => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub backup_dir: Option<PathBuf>,
    pub outcomes: Vec<FileOutcome>,
}

impl BackupReport {
    pub fn backed_up_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == FileState::BackedUp)
            .count()
    }
}

impl BackupGuard {
    pub fn new(
        server_save_dir: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
        precision: TimestampPrecision,
    ) -> Self {
        Self {
            server_save_dir: server_save_dir.into(),
            backup_dir: backup_dir.into(),
            precision,
        }
    }

    pub fn server_save_dir(&self) -> &Path {
        &self.server_save_dir
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn precision(&self) -> TimestampPrecision {
        self.precision
    }

    /// 校验候选版本并备份本地文件
    ///
    /// 先校验整个批次，任何文件不满足"候选版本严格更新"都会直接返回错误，
    /// 此时不会创建目录也不会移动文件。校验通过后才开始移动；
    /// 移动中途失败时，本批次已移动的文件会被移回原处。
    pub fn validate_and_backup<Tz, S>(
        &self,
        candidate: &DateTime<Tz>,
        file_names: &[S],
    ) -> Result<BackupReport>
    where
        Tz: TimeZone,
        S: AsRef<str>,
    {
        let plan = self.check(candidate, file_names)?;
        self.relocate(plan)
    }

    /// 只做校验，生成备份计划（不修改文件系统）
    pub fn check<Tz, S>(&self, candidate: &DateTime<Tz>, file_names: &[S]) -> Result<BackupPlan>
    where
        Tz: TimeZone,
        S: AsRef<str>,
    {
        if file_names.is_empty() {
            return Err(KeeperError::InvalidBatch);
        }

        let candidate_time = self.precision.truncate(candidate);
        let mut batch_dir: Option<(PathBuf, NaiveDateTime)> = None;
        let mut entries = Vec::with_capacity(file_names.len());
        let mut seen = HashSet::new();

        for name in file_names {
            let name = name.as_ref();
            validate_file_name(name)?;
            if !seen.insert(name) {
                debug!("批次中重复的文件名，忽略: {}", name);
                continue;
            }

            let source = self.server_save_dir.join(name);
            let metadata = match fs::metadata(&source) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    info!("没有需要备份的文件: {}", source.display());
                    entries.push(PlanEntry::Missing {
                        name: name.to_string(),
                        path: source,
                    });
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let local_time = self.precision.truncate_system_time(metadata.modified()?);
            match candidate_time.cmp(&local_time) {
                Ordering::Less => {
                    return Err(KeeperError::StaleCandidate {
                        file: name.to_string(),
                        local: local_time,
                        candidate: candidate_time,
                    });
                }
                Ordering::Equal => {
                    return Err(KeeperError::NoChange {
                        file: name.to_string(),
                        local: local_time,
                    });
                }
                Ordering::Greater => {}
            }

            let dir = match &batch_dir {
                Some((dir, first_time)) => {
                    if *first_time != local_time {
                        warn!(
                            "文件 {} 的时间 ({}) 与批次首个文件 ({}) 不同，仍备份到 {}",
                            name,
                            local_time,
                            first_time,
                            dir.display()
                        );
                    }
                    dir.clone()
                }
                None => {
                    let dir = self.backup_dir.join(self.precision.dir_name(&local_time));
                    batch_dir = Some((dir.clone(), local_time));
                    dir
                }
            };

            entries.push(PlanEntry::Move(PlannedMove {
                name: name.to_string(),
                target: dir.join(name),
                source,
                local_time,
            }));
        }

        Ok(BackupPlan {
            backup_dir: batch_dir.map(|(dir, _)| dir),
            entries,
        })
    }

    /// 执行备份计划
    fn relocate(&self, plan: BackupPlan) -> Result<BackupReport> {
        let created_dir = match &plan.backup_dir {
            Some(dir) => ensure_backup_dir(dir)?,
            None => false,
        };

        let mut moved: Vec<MovedFile<'_>> = Vec::new();
        let mut outcomes = Vec::with_capacity(plan.entries.len());

        for entry in &plan.entries {
            match entry {
                PlanEntry::Missing { name, .. } => outcomes.push(FileOutcome {
                    name: name.clone(),
                    state: FileState::Missing,
                    backup_path: None,
                }),
                PlanEntry::Move(planned) => {
                    info!(
                        "备份旧的服务端文件 ({})\n\t从: {}\n\t到: {}",
                        planned.name,
                        planned.source.display(),
                        planned.target.display()
                    );

                    let result = stash_existing(&planned.target).and_then(|stash| {
                        match move_file(&planned.source, &planned.target) {
                            Ok(()) => Ok(stash),
                            Err(e) => {
                                if let Some(stash) = &stash {
                                    restore_stash(stash, &planned.target);
                                }
                                Err(e)
                            }
                        }
                    });

                    let stash = match result {
                        Ok(stash) => stash,
                        Err(e) => {
                            error!("备份 {} 失败: {}", planned.name, e);
                            rollback(&moved);
                            if created_dir {
                                remove_dir_if_empty(plan.backup_dir.as_deref());
                            }
                            return Err(KeeperError::backup_failed(&planned.name, e.to_string()));
                        }
                    };

                    info!("备份 {} 完成", planned.name);
                    moved.push(MovedFile { planned, stash });
                    outcomes.push(FileOutcome {
                        name: planned.name.clone(),
                        state: FileState::BackedUp,
                        backup_path: Some(planned.target.clone()),
                    });
                }
            }
        }

        for stash in moved.iter().filter_map(|m| m.stash.as_deref()) {
            if let Err(e) = fs::remove_file(stash) {
                warn!("清理旧备份的暂存文件失败 {}: {}", stash.display(), e);
            }
        }

        Ok(BackupReport {
            backup_dir: plan.backup_dir,
            outcomes,
        })
    }
}

/// 已完成的移动；`stash` 是被覆盖的旧备份暂存的位置
struct MovedFile<'a> {
    planned: &'a PlannedMove,
    stash: Option<PathBuf>,
}

/// 文件名必须是服务端目录下的相对路径
fn validate_file_name(name: &str) -> Result<()> {
    let path = Path::new(name);
    let is_plain = !name.trim().is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if !is_plain {
        return Err(KeeperError::config_invalid(
            "server_files",
            format!("文件名 '{name}' 必须是相对路径，且不能包含 '..'"),
        ));
    }
    Ok(())
}

/// 返回是否新建了目录
fn ensure_backup_dir(dir: &Path) -> Result<bool> {
    if dir.is_dir() {
        info!("该批次的备份目录已存在，继续使用: {}", dir.display());
        return Ok(false);
    }

    fs::create_dir_all(dir).map_err(|source| KeeperError::directory_create_failed(dir, source))?;
    info!("创建备份目录: {}", dir.display());
    Ok(true)
}

/// 覆盖式移动；跨文件系统时退化为复制后删除
fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    match fs::rename(source, target) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!("跨文件系统移动，改为复制后删除: {}", source.display());
            copy_then_remove(source, target)?;
        }
        Err(e) => return Err(e),
    }

    if !target.exists() || source.exists() {
        return Err(io::Error::other(format!(
            "移动结束后目标文件不存在或源文件仍然存在: {}",
            target.display()
        )));
    }
    Ok(())
}

fn copy_then_remove(source: &Path, target: &Path) -> io::Result<()> {
    let modified = fs::metadata(source)?.modified()?;
    fs::copy(source, target)?;
    fs::File::options()
        .write(true)
        .open(target)?
        .set_modified(modified)?;
    fs::remove_file(source)
}

/// 目标位置已有旧备份文件时，先把它改名到同目录下的暂存文件，返回暂存路径
fn stash_existing(target: &Path) -> io::Result<Option<PathBuf>> {
    match fs::symlink_metadata(target) {
        Ok(metadata) if metadata.is_file() => {
            let mut stash_name = OsString::from(".");
            stash_name.push(target.file_name().unwrap_or_default());
            stash_name.push(STASH_SUFFIX);
            let stash = target.with_file_name(stash_name);
            fs::rename(target, &stash)?;
            debug!("暂存旧备份 {} -> {}", target.display(), stash.display());
            Ok(Some(stash))
        }
        Ok(_) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn restore_stash(stash: &Path, target: &Path) {
    if let Err(e) = fs::rename(stash, target) {
        error!(
            "恢复旧备份 {} 失败，文件仍在 {}: {}",
            target.display(),
            stash.display(),
            e
        );
    }
}

/// 尽力把已移动的文件移回原处，并恢复被覆盖的旧备份，失败只记录日志
fn rollback(moved: &[MovedFile<'_>]) {
    for MovedFile { planned, stash } in moved.iter().rev() {
        match move_file(&planned.target, &planned.source) {
            Ok(()) => {
                warn!("已回滚 {} 到 {}", planned.name, planned.source.display());
                if let Some(stash) = stash {
                    restore_stash(stash, &planned.target);
                }
            }
            Err(e) => error!(
                "回滚 {} 失败，文件仍在 {}: {}",
                planned.name,
                planned.target.display(),
                e
            ),
        }
    }
}

fn remove_dir_if_empty(dir: Option<&Path>) {
    let Some(dir) = dir else { return };
    let is_empty = fs::read_dir(dir).map(|mut entries| entries.next().is_none());
    if matches!(is_empty, Ok(true)) {
        if let Err(e) = fs::remove_dir(dir) {
            warn!("清理空备份目录失败 {}: {}", dir.display(), e);
        }
    }
}
