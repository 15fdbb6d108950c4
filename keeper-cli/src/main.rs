use clap::Parser;
use keeper_cli::{Cli, CliApp, Commands, run_init, setup_logging};
use keeper_core::KeeperError;
use tracing::error;

fn main() {
    // 解析命令行参数
    let cli = Cli::parse();

    // 设置日志记录
    setup_logging(cli.verbose);

    // `init` 命令是特例，它不需要预先加载配置
    if let Commands::Init { force } = cli.command {
        if let Err(e) = run_init(cli.config.as_deref(), force) {
            error!("❌ 初始化失败: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    let app = match CliApp::new(cli.config.as_deref()) {
        Ok(app) => app,
        Err(e) => {
            let config_missing = e.chain().any(|cause| {
                matches!(
                    cause.downcast_ref::<KeeperError>(),
                    Some(KeeperError::ConfigUnreadable { .. })
                )
            });

            error!("❌ 应用初始化失败: {:#}", e);
            if config_missing {
                error!("👉 请先运行 'keeper init' 命令来创建配置文件。");
            }
            std::process::exit(1);
        }
    };

    if let Err(e) = app.run(cli.command) {
        error!("❌ 操作失败: {:#}", e);
        std::process::exit(1);
    }
}
