mod extract;
mod path_guard;

#[cfg(test)]
mod tests;

pub use extract::ExtractReport;

use crate::config::AppConfig;
use crate::constants::archive::{
    DEFAULT_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL, MIN_COMPRESSION_LEVEL, ZIP_EXTENSION,
};
use crate::{KeeperError, Result};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// ZIP 打包/解压引擎
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveEngine {
    compression_level: i64,
}

/// 打包结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedArchive {
    pub path: PathBuf,
    pub entry_count: usize,
}

impl Default for ArchiveEngine {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl ArchiveEngine {
    /// 压缩级别超出 deflate 支持范围时会被截断到边界
    pub fn new(compression_level: i64) -> Self {
        let clamped = compression_level.clamp(MIN_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL);
        if clamped != compression_level {
            warn!(
                "压缩级别 {} 超出范围 {}-{}，使用 {}",
                compression_level, MIN_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL, clamped
            );
        }
        Self {
            compression_level: clamped,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.archive.compression_level)
    }

    pub fn compression_level(&self) -> i64 {
        self.compression_level
    }

    /// 把输入文件打包成一个 ZIP
    ///
    /// 条目只保留文件名（目录结构被展平）。输出路径缺少 `.zip` 后缀时自动补上。
    /// 写入失败时会删除不完整的输出文件。
    pub fn create_archive<P: AsRef<Path>>(
        &self,
        output_path: &Path,
        input_files: &[P],
    ) -> Result<CreatedArchive> {
        let output = normalize_output_path(output_path)?;
        info!("开始压缩服务端文件到 {}", output.display());

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                fs::create_dir_all(parent)
                    .map_err(|source| KeeperError::directory_create_failed(parent, source))?;
            }
        }

        if let Err(e) = self.write_entries(&output, input_files) {
            if let Err(remove_err) = fs::remove_file(&output) {
                if remove_err.kind() != io::ErrorKind::NotFound {
                    warn!("清理不完整的压缩包失败 {}: {}", output.display(), remove_err);
                }
            }
            return Err(e);
        }

        if !output.exists() {
            return Err(KeeperError::WriteVerificationFailed(output));
        }

        info!("压缩完成: {} ({} 个文件)", output.display(), input_files.len());
        Ok(CreatedArchive {
            path: output,
            entry_count: input_files.len(),
        })
    }

    fn write_entries<P: AsRef<Path>>(&self, output: &Path, input_files: &[P]) -> Result<()> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.compression_level));

        let mut writer = ZipWriter::new(File::create(output)?);

        for input in input_files {
            let input = input.as_ref();
            let name = input
                .file_name()
                .ok_or_else(|| KeeperError::InvalidInputFile(input.to_path_buf()))?
                .to_string_lossy()
                .to_string();

            info!("\t压缩 {}", input.display());
            let mut source = File::open(input)?;
            writer.start_file(name, options)?;
            io::copy(&mut source, &mut writer)?;
        }

        writer.finish()?;
        Ok(())
    }

    /// 校验压缩包完整性：读取每个条目（读取到末尾时会校验 CRC），返回条目数
    pub fn verify_archive(&self, container: &Path) -> Result<usize> {
        if !container.exists() {
            return Err(KeeperError::ContainerNotFound(container.to_path_buf()));
        }

        let mut archive = ZipArchive::new(BufReader::new(File::open(container)?))?;
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            io::copy(&mut entry, &mut io::sink())?;
        }

        info!("压缩包校验通过: {} ({} 个条目)", container.display(), archive.len());
        Ok(archive.len())
    }
}

/// 输出路径为空时报错；不以 `.zip` 结尾（忽略大小写）时追加后缀
pub fn normalize_output_path(output_path: &Path) -> Result<PathBuf> {
    let raw = output_path.as_os_str();
    let lossy = raw.to_string_lossy();
    if lossy.trim().is_empty() {
        return Err(KeeperError::InvalidOutputPath);
    }

    if lossy.to_lowercase().ends_with(ZIP_EXTENSION) {
        return Ok(output_path.to_path_buf());
    }

    let mut with_extension = raw.to_os_string();
    with_extension.push(ZIP_EXTENSION);
    Ok(PathBuf::from(with_extension))
}
