//! 주기적 환율 갱신.
//!
//! 상태는 Idle/Refreshing 두 가지이며 한 번에 하나의 갱신 주기만 실행됩니다.
//! 통화쌍 하나의 실패는 해당 쌍의 기존 캐시를 그대로 두고 다음 쌍으로 넘어갑니다.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use mixer_core::{CurrencyPair, PairUniverse, ProviderError, RateProvider, RateStore, RefreshConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::stats::RefreshStats;

/// 갱신 주기 실행 결과.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// 주기 완료
    Completed(RefreshStats),
    /// 다른 주기가 진행 중이어서 시작하지 않음
    AlreadyRunning,
}

/// 통화쌍 하나의 처리 결과.
#[derive(Debug)]
enum PairOutcome {
    Updated { observations: usize },
    Failed { timed_out: bool },
}

/// 실행 중 플래그를 잡고 drop 시 해제합니다.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// 환율 캐시 갱신기.
pub struct Refresher {
    universe: Arc<PairUniverse>,
    store: Arc<RateStore>,
    provider: Arc<dyn RateProvider>,
    config: RefreshConfig,
    running: AtomicBool,
    last_stats: RwLock<Option<RefreshStats>>,
}

impl Refresher {
    pub fn new(
        universe: Arc<PairUniverse>,
        store: Arc<RateStore>,
        provider: Arc<dyn RateProvider>,
        config: RefreshConfig,
    ) -> Self {
        Self {
            universe,
            store,
            provider,
            config,
            running: AtomicBool::new(false),
            last_stats: RwLock::new(None),
        }
    }

    /// 갱신 주기가 진행 중인지 확인합니다.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// 마지막으로 완료된 주기의 통계.
    pub fn last_stats(&self) -> Option<RefreshStats> {
        match self.last_stats.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// 모든 정규 통화쌍을 한 번 갱신합니다.
    ///
    /// 다른 주기가 진행 중이면 아무것도 하지 않고 `AlreadyRunning`을 반환합니다.
    pub async fn refresh_all(&self) -> RefreshOutcome {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            warn!("이전 갱신 주기가 진행 중이므로 이번 주기를 건너뜁니다");
            return RefreshOutcome::AlreadyRunning;
        };

        let started = Instant::now();
        let pairs = self.universe.pairs().to_vec();
        info!(
            pairs = pairs.len(),
            mode = %self.config.mode,
            provider = self.provider.name(),
            "환율 갱신 시작"
        );

        let outcomes: Vec<PairOutcome> = stream::iter(pairs)
            .map(|pair| self.refresh_pair(pair))
            .buffer_unordered(self.config.concurrency())
            .collect()
            .await;

        let mut stats = RefreshStats::new();
        stats.total = outcomes.len();
        for outcome in &outcomes {
            match outcome {
                PairOutcome::Updated { observations } => {
                    stats.success += 1;
                    stats.observations += observations;
                }
                PairOutcome::Failed { timed_out } => {
                    stats.errors += 1;
                    if *timed_out {
                        stats.timeouts += 1;
                    }
                }
            }
        }
        stats.elapsed = started.elapsed();
        stats.finished_at = Some(Utc::now());
        stats.log_summary("환율 갱신");

        match self.last_stats.write() {
            Ok(mut guard) => *guard = Some(stats.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(stats.clone()),
        }

        RefreshOutcome::Completed(stats)
    }

    /// 통화쌍 하나를 조회하여 저장합니다.
    ///
    /// 재시도 가능한 에러만 `max_retries`까지 재시도합니다.
    async fn refresh_pair(&self, pair: CurrencyPair) -> PairOutcome {
        let timeout = self.config.fetch_timeout();
        let mut attempt: u32 = 0;

        loop {
            let result = match tokio::time::timeout(
                timeout,
                self.provider.fetch(&pair, self.config.mode),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(timeout)),
            };

            match result {
                Ok(series) => {
                    let observations = series.len();
                    self.store.put(pair, series);
                    debug!(pair = %pair, observations, "통화쌍 갱신 완료");
                    return PairOutcome::Updated { observations };
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        pair = %pair,
                        attempt,
                        max_retries = self.config.max_retries,
                        error = %e,
                        "환율 조회 실패, 재시도"
                    );
                    tokio::time::sleep(self.config.retry_delay()).await;
                }
                Err(e) => {
                    error!(pair = %pair, error = %e, "환율 조회 실패, 기존 캐시 유지");
                    return PairOutcome::Failed {
                        timed_out: matches!(e, ProviderError::Timeout(_)),
                    };
                }
            }
        }
    }

    /// 종료 신호를 받을 때까지 주기적으로 갱신합니다.
    ///
    /// `initial_delay` 후 첫 주기를 실행하고 이후 `interval`마다 반복합니다.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        info!(
            interval_secs = self.config.interval().as_secs(),
            initial_delay_ms = self.config.initial_delay().as_millis() as u64,
            "환율 갱신 작업 시작"
        );

        tokio::select! {
            _ = tokio::time::sleep(self.config.initial_delay()) => {}
            _ = shutdown.cancelled() => {
                info!("환율 갱신 작업 종료 (시작 전)");
                return;
            }
        }

        let mut ticker = tokio::time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh_all().await;
                }
                _ = shutdown.cancelled() => {
                    info!("환율 갱신 작업 종료");
                    break;
                }
            }
        }
    }
}
