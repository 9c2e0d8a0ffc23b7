//! 스크리닝 오케스트레이터.
//!
//! 종목마다 (정제 → 수정주가 → 지표 → 신호 → 백테스트)를 독립적으로 실행하고
//! 결과를 하나의 리포트로 병합합니다. 종목 사이에 공유되는 가변 상태는 없으며,
//! 종목 단위로 `rayon` 스레드 풀에서 병렬 처리됩니다.
//!
//! 한 종목의 실패는 (패닉 포함) 그 종목의 스킵으로만 기록되고 배치는 계속됩니다.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use trader_analytics::adjustment::{adjust, AdjustmentMode};
use trader_analytics::backtest::{
    BacktestConfig, BacktestError, BacktestReport, BacktestSimulator, InstrumentBacktest,
};
use trader_core::{screening_span, Bar, BarSeries, CorporateAction, SignalEvent, TraderError};

use crate::config::{ConfigError, StrategyConfigOverrides};
use crate::engine::SignalEngine;
use crate::registry::StrategyRegistry;

/// 스크리닝 에러. 배치 시작 전에만 발생합니다.
#[derive(Debug, Error)]
pub enum ScreeningError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backtest(#[from] BacktestError),

    #[error("작업 스레드 풀 생성 실패: {0}")]
    ThreadPool(String),
}

/// 종목을 건너뛴 이유.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// 최소 봉 수 미달
    InsufficientData { required: usize, provided: usize },
    /// 정제 후 남은 봉 없음
    NoValidBars,
    /// 시간 예산 초과로 시작하지 않음
    Cancelled,
    /// 그 밖의 종목 단위 실패
    Failed { message: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::InsufficientData { required, provided } => {
                write!(f, "데이터 부족 (필요 {required}, 제공 {provided})")
            }
            SkipReason::NoValidBars => write!(f, "유효한 봉 없음"),
            SkipReason::Cancelled => write!(f, "시간 예산 초과"),
            SkipReason::Failed { message } => write!(f, "실패: {message}"),
        }
    }
}

/// 건너뛴 종목.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedInstrument {
    /// 종목 코드
    pub code: String,
    /// 이유
    pub reason: SkipReason,
}

/// 종목 입력 (원시 일봉 + 배당/분할 이벤트).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentData {
    /// 종목 코드
    pub code: String,
    /// 원시 일봉 (정렬 전제, 위반 봉은 정제 단계에서 제거)
    pub bars: Vec<Bar>,
    /// 배당/분할 이벤트
    #[serde(default)]
    pub actions: Vec<CorporateAction>,
}

impl InstrumentData {
    /// 새 입력을 생성합니다.
    pub fn new(code: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            code: code.into(),
            bars,
            actions: Vec::new(),
        }
    }

    /// 배당/분할 이벤트를 설정합니다.
    pub fn with_actions(mut self, actions: Vec<CorporateAction>) -> Self {
        self.actions = actions;
        self
    }
}

/// 스크리닝 옵션.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningOptions {
    /// 전략 ID
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// 수정주가 방식
    #[serde(default)]
    pub adjust: AdjustmentMode,
    /// 배치 전체 시간 예산 (밀리초)
    #[serde(default)]
    pub time_budget_ms: Option<u64>,
    /// 작업 스레드 수 (없으면 rayon 기본값)
    #[serde(default)]
    pub workers: Option<usize>,
}

fn default_strategy() -> String {
    "macd_zero_axis".to_string()
}

impl Default for ScreeningOptions {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            adjust: AdjustmentMode::default(),
            time_budget_ms: None,
            workers: None,
        }
    }
}

impl ScreeningOptions {
    /// 전략 ID 설정
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = strategy.into();
        self
    }

    /// 수정주가 방식 설정
    pub fn with_adjust(mut self, mode: AdjustmentMode) -> Self {
        self.adjust = mode;
        self
    }

    /// 시간 예산 설정. 1ms 미만의 나머지는 올림합니다.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        let millis = budget.as_nanos().div_ceil(1_000_000);
        self.time_budget_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    /// 작업 스레드 수 설정
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }
}

/// 종목 하나의 처리 결과.
#[derive(Debug, Clone)]
pub enum InstrumentOutcome {
    /// 평가 완료
    Screened {
        signals: Vec<SignalEvent>,
        backtest: InstrumentBacktest,
        dropped_bars: usize,
    },
    /// 건너뜀
    Skipped {
        skipped: SkippedInstrument,
        dropped_bars: usize,
    },
}

/// 스크리닝 리포트.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningReport {
    /// 사용한 전략
    pub strategy_id: String,
    /// 평가 완료 종목 수
    pub processed: usize,
    /// 정제 단계에서 제거된 봉 수
    pub dropped_bars: usize,
    /// 전체 신호 (종목, 날짜 순)
    pub signals: Vec<SignalEvent>,
    /// 건너뛴 종목 (코드 순)
    pub skipped: Vec<SkippedInstrument>,
    /// 백테스트 리포트
    pub backtest: BacktestReport,
}

impl ScreeningReport {
    /// 리포트 요약 문자열
    pub fn summary(&self) -> String {
        format!(
            "스크리닝 결과 ({})\n\
             ═══════════════════════════════════════\n\
             평가 종목: {}\n\
             건너뛴 종목: {}\n\
             제거된 봉: {}\n\
             신호: {}\n\
             {}",
            self.strategy_id,
            self.processed,
            self.skipped.len(),
            self.dropped_bars,
            self.signals.len(),
            self.backtest.summary(),
        )
    }
}

/// 스크리너.
#[derive(Debug, Clone)]
pub struct Screener {
    engine: SignalEngine,
    simulator: BacktestSimulator,
    options: ScreeningOptions,
}

impl Screener {
    /// 설정을 확정하고 스크리너를 생성합니다.
    pub fn new(
        registry: &StrategyRegistry,
        options: ScreeningOptions,
        overrides: &StrategyConfigOverrides,
        backtest: BacktestConfig,
    ) -> Result<Self, ScreeningError> {
        let engine = SignalEngine::from_registry(registry, &options.strategy, overrides)?;
        let simulator = BacktestSimulator::new(backtest)?;
        Ok(Self {
            engine,
            simulator,
            options,
        })
    }

    /// 신호 엔진 참조
    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    /// 종목 하나를 처리합니다.
    pub fn screen_instrument(&self, input: &InstrumentData) -> InstrumentOutcome {
        let span = screening_span!("screen_instrument", input.code, self.engine.strategy().id());
        let _guard = span.enter();

        let (raw, sanitized) = BarSeries::sanitize(input.code.clone(), input.bars.clone());
        let dropped_bars = sanitized.dropped;
        if sanitized.has_drops() {
            debug!(dropped = dropped_bars, "잘못된 봉 제거 후 계속");
        }
        let skip = |reason: SkipReason| InstrumentOutcome::Skipped {
            skipped: SkippedInstrument {
                code: input.code.clone(),
                reason,
            },
            dropped_bars,
        };

        if raw.is_empty() {
            warn!("유효한 봉이 없어 종목을 건너뜀");
            return skip(SkipReason::NoValidBars);
        }

        let series = adjust(&raw, &input.actions, self.options.adjust);

        let outcome = match self.engine.evaluate(&series) {
            Ok(outcome) => outcome,
            Err(TraderError::InsufficientData { required, provided }) => {
                info!(required, provided, "데이터 부족으로 종목을 건너뜀");
                return skip(SkipReason::InsufficientData { required, provided });
            }
            Err(err) => {
                warn!(error = %err, "종목 평가 실패");
                return skip(SkipReason::Failed {
                    message: err.to_string(),
                });
            }
        };

        let backtest = self.simulator.run(
            &series,
            &outcome.events,
            self.engine.strategy().entry_kinds(),
        );

        InstrumentOutcome::Screened {
            signals: outcome.events,
            backtest,
            dropped_bars,
        }
    }

    /// 배치를 실행합니다.
    ///
    /// 시간 예산이 있으면, 마감 이후 시작하려는 종목은 `Cancelled`로 건너뜁니다.
    /// 결과는 처리 순서와 무관하게 정렬된 상태로 반환됩니다.
    pub fn run(&self, instruments: &[InstrumentData]) -> Result<ScreeningReport, ScreeningError> {
        let started = Instant::now();
        let deadline = self
            .options
            .time_budget_ms
            .map(|ms| started + Duration::from_millis(ms));

        info!(
            strategy = self.engine.strategy().id(),
            instruments = instruments.len(),
            "스크리닝 시작"
        );

        let process = || -> Vec<InstrumentOutcome> {
            instruments
                .par_iter()
                .map(|input| {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        return InstrumentOutcome::Skipped {
                            skipped: SkippedInstrument {
                                code: input.code.clone(),
                                reason: SkipReason::Cancelled,
                            },
                            dropped_bars: 0,
                        };
                    }
                    isolate_panic(&input.code, || self.screen_instrument(input))
                })
                .collect()
        };

        let outcomes = match self.options.workers {
            Some(workers) => rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| ScreeningError::ThreadPool(e.to_string()))?
                .install(process),
            None => process(),
        };

        let report = self.merge(outcomes);

        info!(
            processed = report.processed,
            skipped = report.skipped.len(),
            signals = report.signals.len(),
            trades = report.backtest.stats.total_trades,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "스크리닝 완료"
        );

        Ok(report)
    }

    fn merge(&self, outcomes: Vec<InstrumentOutcome>) -> ScreeningReport {
        let mut signals = Vec::new();
        let mut skipped = Vec::new();
        let mut backtests = Vec::new();
        let mut dropped_total = 0;

        for outcome in outcomes {
            match outcome {
                InstrumentOutcome::Screened {
                    signals: s,
                    backtest,
                    dropped_bars,
                } => {
                    signals.extend(s);
                    backtests.push(backtest);
                    dropped_total += dropped_bars;
                }
                InstrumentOutcome::Skipped {
                    skipped: s,
                    dropped_bars,
                } => {
                    skipped.push(s);
                    dropped_total += dropped_bars;
                }
            }
        }

        signals.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        skipped.sort_by(|a, b| a.code.cmp(&b.code));

        ScreeningReport {
            strategy_id: self.engine.strategy().id().to_string(),
            processed: backtests.len(),
            dropped_bars: dropped_total,
            signals,
            skipped,
            backtest: BacktestReport::from_instruments(backtests),
        }
    }
}

/// 종목 처리 중 발생한 패닉을 그 종목의 `Failed` 스킵으로 바꿉니다.
fn isolate_panic(code: &str, work: impl FnOnce() -> InstrumentOutcome) -> InstrumentOutcome {
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "알 수 없는 패닉".to_string());
            error!(code, %message, "종목 처리 중 패닉, 건너뜀");
            InstrumentOutcome::Skipped {
                skipped: SkippedInstrument {
                    code: code.to_string(),
                    reason: SkipReason::Failed {
                        message: format!("panic: {message}"),
                    },
                },
                dropped_bars: 0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::fixtures;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn screener(options: ScreeningOptions) -> Screener {
        let overrides =
            StrategyConfigOverrides::from_json_str(r#"{"macd": {"zero_axis_range": "0.12"}}"#).unwrap();
        Screener::new(
            &StrategyRegistry::with_builtin(),
            options,
            &overrides,
            BacktestConfig::default(),
        )
        .unwrap()
    }

    fn v_shape(code: &str) -> InstrumentData {
        let series = fixtures::series(&fixtures::v_shape());
        InstrumentData::new(code, series.bars().to_vec())
    }

    #[test]
    fn test_screen_instrument_produces_trades() {
        let screener = screener(ScreeningOptions::default());
        match screener.screen_instrument(&v_shape("000001")) {
            InstrumentOutcome::Screened {
                signals, backtest, ..
            } => {
                assert_eq!(signals.len(), 4);
                // MID, POST 두 건이 진입
                assert_eq!(backtest.trades.len(), 2);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_skip_reasons() {
        let screener = screener(ScreeningOptions::default());
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let broken = InstrumentData::new(
            "BROKEN",
            vec![Bar::new(day, dec!(10), dec!(9), dec!(11), dec!(10), dec!(1))],
        );
        let short = InstrumentData::new(
            "SHORT",
            fixtures::series(&[dec!(10); 10]).bars().to_vec(),
        );

        let report = screener.run(&[broken, short, v_shape("000001")]).unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.dropped_bars, 1);
        assert_eq!(
            report.skipped,
            vec![
                SkippedInstrument {
                    code: "BROKEN".to_string(),
                    reason: SkipReason::NoValidBars,
                },
                SkippedInstrument {
                    code: "SHORT".to_string(),
                    reason: SkipReason::InsufficientData {
                        required: 40,
                        provided: 10,
                    },
                },
            ]
        );
        assert!(report.summary().contains("건너뛴 종목: 2"));
    }

    #[test]
    fn test_zero_budget_cancels_everything() {
        let screener = screener(ScreeningOptions::default().with_time_budget(Duration::ZERO));
        let report = screener.run(&[v_shape("000001"), v_shape("000002")]).unwrap();

        assert_eq!(report.processed, 0);
        assert!(report.skipped.iter().all(|s| s.reason == SkipReason::Cancelled));
    }

    #[test]
    fn test_sub_second_budget_is_kept() {
        let options = ScreeningOptions::default().with_time_budget(Duration::from_millis(900));
        assert_eq!(options.time_budget_ms, Some(900));
        assert_eq!(
            ScreeningOptions::default()
                .with_time_budget(Duration::from_micros(1))
                .time_budget_ms,
            Some(1)
        );

        let report = screener(options).run(&[v_shape("000001"), v_shape("000002")]).unwrap();
        assert_eq!(report.processed, 2);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_panic_becomes_failed_skip() {
        let outcome = isolate_panic("000009", || panic!("Multiplication overflowed"));
        match outcome {
            InstrumentOutcome::Skipped { skipped, .. } => {
                assert_eq!(skipped.code, "000009");
                assert_eq!(
                    skipped.reason,
                    SkipReason::Failed {
                        message: "panic: Multiplication overflowed".to_string()
                    }
                );
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let screener = screener(ScreeningOptions::default());
        let passthrough = isolate_panic("000001", || screener.screen_instrument(&v_shape("000001")));
        assert!(matches!(passthrough, InstrumentOutcome::Screened { .. }));
    }

    #[test]
    fn test_options_defaults_from_json() {
        let options: ScreeningOptions = serde_json::from_str(r#"{"adjust": "backward"}"#).unwrap();
        assert_eq!(options.strategy, "macd_zero_axis");
        assert_eq!(options.adjust, AdjustmentMode::Backward);
        assert_eq!(options.workers, None);
        assert_eq!(options.time_budget_ms, None);

        let options: ScreeningOptions = serde_json::from_str(r#"{"time_budget_ms": 250}"#).unwrap();
        assert_eq!(options.time_budget_ms, Some(250));
    }

    #[test]
    fn test_unknown_strategy_fails_fast() {
        let err = Screener::new(
            &StrategyRegistry::with_builtin(),
            ScreeningOptions::default().with_strategy("unknown"),
            &StrategyConfigOverrides::default(),
            BacktestConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ScreeningError::Config(ConfigError::UnknownStrategy(_))));
    }
}
