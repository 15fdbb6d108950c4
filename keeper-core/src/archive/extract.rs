use super::ArchiveEngine;
use super::path_guard::resolve_entry_path;
use crate::{KeeperError, Result};
use std::fs::{self, File, FileTimes};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};
use zip::ZipArchive;

/// 解压结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    /// 规范化后的目标目录
    pub destination: PathBuf,
    pub files: Vec<PathBuf>,
    pub directories: usize,
}

impl ArchiveEngine {
    /// 把压缩包解压到目标目录
    ///
    /// - `destination` 为空时解压到压缩包所在目录
    /// - 每个条目都会做路径检查，任何条目落在目标目录之外都会中止整个解压，
    ///   之前已写出的文件保留在磁盘上
    /// - `propagate_timestamp` 为 true 时，所有解压出的文件使用压缩包自身的修改时间
    pub fn extract_archive(
        &self,
        container: &Path,
        destination: Option<&Path>,
        propagate_timestamp: bool,
    ) -> Result<ExtractReport> {
        info!("开始解压服务端文件: {}", container.display());
        if !container.exists() {
            return Err(KeeperError::ContainerNotFound(container.to_path_buf()));
        }

        let destination = resolve_destination(container, destination);
        if !destination.is_dir() {
            fs::create_dir_all(&destination)
                .map_err(|source| KeeperError::directory_create_failed(&destination, source))?;
        }
        let dest_root = fs::canonicalize(&destination)?;

        let container_time = fs::metadata(container)?.modified()?;

        let mut archive = ZipArchive::new(BufReader::new(File::open(container)?))?;
        let mut report = ExtractReport {
            destination: dest_root.clone(),
            files: Vec::with_capacity(archive.len()),
            directories: 0,
        };

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let out_path = resolve_entry_path(&dest_root, entry.name())?;
            debug!("准备文件 {}", out_path.display());

            if entry.is_dir() {
                if !out_path.is_dir() {
                    fs::create_dir_all(&out_path)
                        .map_err(|source| KeeperError::directory_create_failed(&out_path, source))?;
                }
                report.directories += 1;
                continue;
            }

            // Windows 打包的压缩包可能没有单独的目录条目
            if let Some(parent) = out_path.parent() {
                if !parent.is_dir() {
                    fs::create_dir_all(parent)
                        .map_err(|source| KeeperError::directory_create_failed(parent, source))?;
                }
            }

            let mut out_file = File::create(&out_path)?;
            io::copy(&mut entry, &mut out_file)?;
            if propagate_timestamp {
                apply_container_time(&out_file, container_time)?;
            }
            report.files.push(out_path);
        }

        info!(
            "解压完成: {} 个文件, {} 个目录 -> {}",
            report.files.len(),
            report.directories,
            report.destination.display()
        );
        Ok(report)
    }
}

fn resolve_destination(container: &Path, destination: Option<&Path>) -> PathBuf {
    match destination {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => container
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

/// 通过已打开的句柄设置时间，不会跟随符号链接。
/// 创建时间只在支持设置的平台上写入。
fn apply_container_time(file: &File, time: SystemTime) -> io::Result<()> {
    let times = FileTimes::new().set_modified(time);

    #[cfg(windows)]
    let times = {
        use std::os::windows::fs::FileTimesExt;
        times.set_created(time)
    };

    #[cfg(target_os = "macos")]
    let times = {
        use std::os::macos::fs::FileTimesExt;
        times.set_created(time)
    };

    file.set_times(times)
}
