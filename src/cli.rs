use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// 命令行参数
#[derive(Debug, Parser)]
#[command(
    name = "cipc-agent",
    about = "CIPC filing automation and OTP retrieval",
    version
)]
pub struct Cli {
    /// TOML 配置文件路径
    #[arg(long, global = true, env = "CIPC_CONFIG")]
    pub config: Option<PathBuf>,

    /// 显示详细日志
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// File a return and print the JSON result
    #[command(
        after_help = "Example: cipc-agent run annual_return '{\"company_name\": \"Test Co\", \"reg_number\": \"123456789\"}'"
    )]
    Run {
        /// annual_return | beneficial_ownership
        service_type: String,
        /// Client data as a JSON object
        client_data: String,
    },
    /// Start the SMS webhook server
    Serve {
        /// Listen port (defaults to the configured webhook port)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Wait for an OTP from the mailbox
    Otp {
        /// Give up after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}
