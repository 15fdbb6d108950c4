use crate::error::{KeeperError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// `.properties` 风格的键值配置
///
/// 每行先去除首尾空白；`#`/`!` 开头为注释；键值以第一个 `=` 或 `:` 分隔。
/// 反斜杠按字面保留，Windows 路径可以直接写。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// 从文件读取，文件不存在或不可读时返回 `ConfigUnreadable`
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| KeeperError::ConfigUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let mut entries = BTreeMap::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let (key, value) = match line.find(['=', ':']) {
                Some(pos) => (&line[..pos], &line[pos + 1..]),
                None => (line, ""),
            };
            entries.insert(key.trim().to_string(), value.trim().to_string());
        }

        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// 必填项，缺失或为空时返回 `ConfigInvalid`
    pub fn require(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            Some(_) => Err(KeeperError::config_invalid(key, "值为空")),
            None => Err(KeeperError::config_invalid(key, "缺少该配置项")),
        }
    }

    /// 读取逗号分隔的多值配置项，至少要有一个非空值
    pub fn get_multi(&self, key: &str) -> Result<Vec<String>> {
        let values = split_multi_value(self.require(key)?);
        if values.is_empty() {
            return Err(KeeperError::config_invalid(key, "至少需要一个值"));
        }
        Ok(values)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 按逗号拆分，去除首尾空白并丢弃空值
pub fn split_multi_value(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
