use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use split_decision::orchestrator::SubmitOutcome;
use split_decision::services::ResolutionSummary;
use split_decision::utils::logging;
use split_decision::{
    Config, NoticeWriter, SheetFilter, SplitApiClient, SplitChoice, SplitSession,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

type Input = Lines<BufReader<Stdin>>;

/// 审核统计
#[derive(Debug, Default)]
struct ReviewStats {
    submitted: usize,
    skipped: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::init_log_file(&config.notice_log_file, &config.project_id)?;
    logging::log_startup(
        &config.project_id,
        config.poll_interval_secs,
        config.split_threshold_percent,
    );

    let client = Arc::new(SplitApiClient::new(&config)?);
    let notifier = Arc::new(NoticeWriter::with_path(config.notice_log_file.clone()));
    let mut session = SplitSession::new(&config, client, notifier);

    if session.open().await? == 0 {
        return Ok(());
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut stats = ReviewStats::default();

    while !session.is_finished() {
        if let Some(position) = session.position() {
            logging::log_file_start(&position);
        }

        let snapshot = session.wait_for_analysis().await;
        let Some(result) = snapshot.result else {
            let status = snapshot
                .status
                .map(|s| format!("{} - {}", s.label(), s.description()))
                .unwrap_or_else(|| "未知".to_string());
            warn!("⚠️ 当前文件没有可用的分析结果 ({})", status);
            match prompt(&mut input, "[r]重新轮询 / [n]下一个 / [p]上一个 / [q]退出").await?.as_str() {
                "r" => session.refresh(),
                "n" => {
                    if session.select_next() {
                        stats.skipped += 1;
                    } else {
                        info!("已经是最后一个文件");
                    }
                }
                "p" => {
                    session.select_previous();
                }
                "q" => break,
                _ => {}
            }
            continue;
        };

        logging::log_analysis(&result);

        let answer = prompt(
            &mut input,
            "[s]提交（未回答的按置信度补全） / [y]全部拆分 / [x]全部不拆分 / [n]下一个 / [p]上一个 / [q]退出",
        )
        .await?;

        match answer.as_str() {
            "s" => {}
            "y" => {
                session.mark_all(&SheetFilter::All, SplitChoice::Split)?;
            }
            "x" => {
                session.mark_all(&SheetFilter::All, SplitChoice::NoSplit)?;
            }
            "n" => {
                if session.select_next() {
                    stats.skipped += 1;
                } else {
                    info!("已经是最后一个文件");
                }
                continue;
            }
            "p" => {
                session.select_previous();
                continue;
            }
            "q" => break,
            _ => continue,
        }

        let outcome = match session.submit(&SheetFilter::All).await {
            Ok(outcome) => outcome,
            // 决策保留，可以重试
            Err(e) => {
                warn!("⚠️ 提交未完成: {}", e);
                continue;
            }
        };

        let outcome = match outcome {
            SubmitOutcome::AwaitingConfirmation(summary) => {
                match confirm(&mut input, &summary).await? {
                    true => match session.confirm().await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            warn!("⚠️ 提交未完成: {}", e);
                            continue;
                        }
                    },
                    false => {
                        session.cancel_confirmation();
                        continue;
                    }
                }
            }
            other => other,
        };

        stats.submitted += 1;
        if let SubmitOutcome::Advanced(next) = outcome {
            info!("➡️ 下一个文件: {}", next.name);
        }
    }

    session.close();
    logging::print_final_stats(stats.submitted, stats.skipped, &config.notice_log_file);

    Ok(())
}

/// 展示自动补全摘要并等待确认
async fn confirm(input: &mut Input, summary: &ResolutionSummary) -> Result<bool> {
    logging::log_resolution(summary);
    let answer = prompt(input, "确认按以上结果提交? [y/N]").await?;
    Ok(answer == "y")
}

async fn prompt(input: &mut Input, message: &str) -> Result<String> {
    print!("{} > ", message);
    std::io::stdout().flush()?;
    // 输入流结束视为退出
    let line = input.next_line().await?.unwrap_or_else(|| "q".to_string());
    Ok(line.trim().to_lowercase())
}
