/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use anyhow::Result;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::{QueuePosition, SplitManagerResponse};
use crate::services::ResolutionSummary;

/// 初始化日志订阅器
///
/// `RUST_LOG` 优先；否则默认 info，详细模式下为 debug
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化（例如测试中）时忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化通知日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `project_id`: 项目ID
pub fn init_log_file(log_file_path: &str, project_id: &str) -> Result<()> {
    let log_header = format!(
        "{}\n拆分决策日志 - 项目 {} - {}\n{}\n\n",
        "=".repeat(60),
        project_id,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(project_id: &str, poll_interval_secs: u64, threshold_percent: u32) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 拆分决策审核模式");
    info!("📁 项目: {}", project_id);
    info!(
        "⏱️ 轮询间隔: {} 秒, 自动拆分阈值: {}%",
        poll_interval_secs, threshold_percent
    );
    info!("{}", "=".repeat(60));
}

/// 记录文件开始处理
pub fn log_file_start(position: &QueuePosition) {
    info!("\n{}", "─".repeat(60));
    info!(
        "📄 文件 {}/{}: {}",
        position.index + 1,
        position.total,
        position.name
    );
    info!("{}", "─".repeat(60));
}

/// 输出分析结果概览
pub fn log_analysis(result: &SplitManagerResponse) {
    info!("🔗 文件地址: {}", truncate_text(&result.file_url, 80));
    for sheet in &result.sheets {
        info!("  工作表 {}: {} 个候选列", sheet.sheet_name, sheet.questions.len());
        for q in &sheet.questions {
            info!(
                "    - [{}] 列 {} 置信度 {}%",
                q.question_id,
                q.range.left_letter,
                q.decision.confidence_percent()
            );
        }
    }
}

/// 输出自动补全摘要
pub fn log_resolution(summary: &ResolutionSummary) {
    for line in summary.to_string().lines() {
        info!("{}", line);
    }
}

/// 打印最终统计信息
///
/// # 参数
/// - `submitted`: 提交成功数量
/// - `skipped`: 跳过数量
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(submitted: usize, skipped: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已提交: {}", submitted);
    info!("⏭️ 跳过: {}", skipped);
    info!("{}", "=".repeat(60));
    info!("\n通知已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("库存明细表", 3), "库存明...");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
