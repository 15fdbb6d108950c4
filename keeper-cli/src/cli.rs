use crate::project_info::{metadata, version_info};
use crate::utils::parse_candidate_time;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Save Keeper CLI - 服务端存档备份与打包工具
#[derive(Parser, Debug)]
#[command(name = "keeper")]
#[command(about = metadata::PROJECT_DESCRIPTION)]
#[command(version = version_info::CLI_VERSION)]
#[command(long_about = metadata::display::DESCRIPTION_LONG)]
#[command(author = metadata::PROJECT_AUTHORS)]
pub struct Cli {
    /// 配置文件路径（不指定时依次查找 keeper.toml、config.toml、keeper.properties）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 详细输出
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 创建默认配置文件和目录
    Init {
        /// 如果配置文件已存在，强制覆盖
        #[arg(long)]
        force: bool,
    },
    /// 显示配置和被跟踪文件的状态
    Status,
    /// 只校验候选版本是否比本地文件新，不移动任何文件
    Check {
        /// 候选版本的时间，例如 2024-01-02 或 2024-01-02T10:00
        #[arg(long, value_parser = parse_candidate_time)]
        candidate: DateTime<Local>,
    },
    /// 校验并把本地文件移动到备份目录
    Backup {
        /// 候选版本的时间，例如 2024-01-02 或 2024-01-02T10:00
        #[arg(long, value_parser = parse_candidate_time)]
        candidate: DateTime<Local>,
        /// 覆盖配置中的文件列表（逗号分隔）
        #[arg(long, value_delimiter = ',')]
        files: Vec<String>,
    },
    /// 把文件打包成 ZIP
    Pack {
        /// 输出文件路径，缺少 .zip 后缀时自动补上
        #[arg(short, long)]
        output: PathBuf,
        /// 要打包的文件（不指定时打包配置中跟踪的服务端文件，其中不存在的文件会被跳过并给出警告）
        files: Vec<PathBuf>,
    },
    /// 安全解压 ZIP
    Unpack {
        /// ZIP 文件路径
        archive: PathBuf,
        /// 解压目录（默认为 ZIP 所在目录）
        #[arg(long)]
        dest: Option<PathBuf>,
        /// 不把压缩包的修改时间写到解压出的文件上
        #[arg(long)]
        no_timestamp: bool,
    },
    /// 校验 ZIP 完整性
    Verify {
        /// ZIP 文件路径
        archive: PathBuf,
    },
    /// 用新的 ZIP 替换服务端文件：校验时间、备份旧文件、解压新文件
    Replace {
        /// 新版本的 ZIP 文件，其修改时间作为候选版本时间
        archive: PathBuf,
    },
}
