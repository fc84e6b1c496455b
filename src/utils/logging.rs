/// 日志工具模块
///
/// 日志统一写到 stderr，stdout 只留给 JSON 结果
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::FilingResult;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。
/// 重复初始化（例如测试中）会被忽略。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `mode`: 运行模式（run / serve / otp）
/// - `demo_mode`: 是否为演示模式
pub fn log_startup(mode: &str, demo_mode: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {} 模式", mode);
    if demo_mode {
        info!("🧪 演示模式：使用占位账号");
    }
    info!("{}", "=".repeat(60));
}

/// 打印申报结果摘要
pub fn log_filing_result(result: &FilingResult) {
    info!("\n{}", "─".repeat(60));
    match (result.reference_number(), result.error()) {
        (Some(reference), _) => info!("✅ 申报成功: {} | 回执: {}", result.service_type, reference),
        (_, Some(error)) => info!(
            "❌ 申报失败: {} | 原因: {}",
            result.service_type,
            truncate_text(error, 120)
        ),
        (None, None) => {}
    }
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
