use anyhow::Result;
use clap::Parser;

use cipc_automation::cli::{Cli, Commands};
use cipc_automation::utils::logging;
use cipc_automation::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 参数不足时 clap 打印用法并以非零状态退出
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref())?;

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging);

    let mut app = App::new(config);
    match cli.command {
        Commands::Run {
            service_type,
            client_data,
        } => {
            let result = app.run_filing(&service_type, &client_data).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Serve { port } => app.serve(port).await?,
        Commands::Otp { timeout_secs } => {
            let token = app.wait_for_otp(timeout_secs).await?;
            println!("{}", token);
        }
    }

    Ok(())
}
