use crate::{KeeperError, Result};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// 解析条目在目标目录下的真实路径
///
/// `dest_root` 必须是已规范化的目录。绝对路径条目一律拒绝，即使它指向目标目录内部。
/// 结果必须是 `dest_root` 的严格子路径（按路径组件比较，`/dest-evil` 不算 `/dest`
/// 的子路径），否则返回 `PathTraversal`。
pub(crate) fn resolve_entry_path(dest_root: &Path, entry_name: &str) -> Result<PathBuf> {
    let traversal = || KeeperError::PathTraversal {
        entry: entry_name.to_string(),
    };

    let is_rooted = Path::new(entry_name)
        .components()
        .any(|c| matches!(c, Component::RootDir | Component::Prefix(_)));
    if is_rooted {
        return Err(traversal());
    }

    let candidate = lexical_join(dest_root, Path::new(entry_name));
    let resolved = canonicalize_existing_prefix(&candidate)?.ok_or_else(traversal)?;

    if resolved == dest_root || !resolved.starts_with(dest_root) {
        return Err(traversal());
    }
    Ok(resolved)
}

/// 词法拼接：`..` 向上弹出，绝对路径替换基准目录
fn lexical_join(base: &Path, entry: &Path) -> PathBuf {
    let mut out = base.to_path_buf();
    for component in entry.components() {
        match component {
            Component::Prefix(prefix) => out = PathBuf::from(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

/// 规范化已存在的最深祖先目录，再拼回尚不存在的部分，符号链接因此会被解析。
///
/// 祖先中有普通文件挡住路径（`NotADirectory`）时按不存在处理，交给后续的
/// 目录创建去报错。遇到无法解析的悬空符号链接时返回 `None`。
fn canonicalize_existing_prefix(path: &Path) -> Result<Option<PathBuf>> {
    let mut existing = path;
    let mut pending: Vec<OsString> = Vec::new();

    loop {
        match fs::canonicalize(existing) {
            Ok(mut real) => {
                for name in pending.iter().rev() {
                    real.push(name);
                }
                return Ok(Some(real));
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                if fs::symlink_metadata(existing).is_ok() {
                    return Ok(None);
                }
                match (existing.parent(), existing.file_name()) {
                    (Some(parent), Some(name)) => {
                        pending.push(name.to_os_string());
                        existing = parent;
                    }
                    _ => return Ok(Some(path.to_path_buf())),
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}
