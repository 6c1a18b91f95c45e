//! 갱신 주기 통계 구조체.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 갱신 주기 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshStats {
    /// 대상 통화쌍 수
    pub total: usize,
    /// 저장 성공
    pub success: usize,
    /// 실패 (타임아웃 포함)
    pub errors: usize,
    /// 타임아웃으로 실패
    pub timeouts: usize,
    /// 저장된 총 관측값 수 (정방향 기준)
    pub observations: usize,
    /// 완료 시각
    pub finished_at: Option<DateTime<Utc>>,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RefreshStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            timeouts = self.timeouts,
            observations = self.observations,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "갱신 완료"
        );
    }
}
