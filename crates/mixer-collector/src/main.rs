//! 환율 갱신 CLI.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use mixer_collector::{RefreshOutcome, Refresher};
use mixer_core::{init_logging, AppConfig, LogConfig, PairUniverse, QueryEngine, RateStore};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "mixer-collector")]
#[command(about = "Mixer FX rate collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 경로
    #[arg(long, default_value = mixer_core::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// 로그 레벨 (trace, debug, info, warn, error). 생략하면 설정 파일 값 사용
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 추적 대상 정규 통화쌍 출력
    Pairs,

    /// 갱신 주기를 한 번 실행하고 최신 환율 출력
    RefreshOnce,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("설정 로드 실패: {}", cli.config.display()))?;

    let mut log_config = LogConfig::from(&config.logging);
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    let universe = Arc::new(PairUniverse::from_codes(&config.currency.currencies)?);

    match cli.command {
        Commands::Pairs => {
            for pair in universe.pairs() {
                println!("{}", pair);
            }
            tracing::info!(
                currencies = universe.currencies().len(),
                pairs = universe.pairs().len(),
                "통화쌍 목록 출력 완료"
            );
        }
        Commands::RefreshOnce => {
            tracing::info!("Mixer Collector 단발 갱신 시작");

            let provider = mixer_upstream::create_provider(
                &config.currency,
                config.refresh.fetch_timeout(),
            )
            .context("환율 제공자 구성 실패")?;
            let store = Arc::new(RateStore::new());
            let refresher = Refresher::new(
                Arc::clone(&universe),
                Arc::clone(&store),
                provider,
                config.refresh.clone(),
            );

            match refresher.refresh_all().await {
                RefreshOutcome::Completed(stats) => {
                    let latest =
                        QueryEngine::new(store).latest_rates(universe.pairs(), Utc::now());
                    for (base, targets) in &latest {
                        for (target, rate) in targets {
                            println!("{}/{}\t{}", base, target, rate);
                        }
                    }
                    if stats.success == 0 && stats.total > 0 {
                        anyhow::bail!("모든 통화쌍 갱신에 실패했습니다 ({}건)", stats.errors);
                    }
                }
                RefreshOutcome::AlreadyRunning => {
                    tracing::warn!("갱신 주기가 이미 진행 중입니다");
                }
            }

            tracing::info!("Mixer Collector 종료");
        }
    }

    Ok(())
}
