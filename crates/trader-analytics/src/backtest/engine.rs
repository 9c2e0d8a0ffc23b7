//! 백테스트 시뮬레이터
//!
//! 신호 발생일 종가에 진입하고, 이후 봉을 따라가며 경쟁하는 청산 정책 중
//! 가장 먼저 발동한 정책으로 청산합니다.
//!
//! 종목 하나의 결과는 그 종목의 일봉과 신호에만 의존하므로
//! 종목 단위로 병렬 실행할 수 있습니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use trader_core::{BarSeries, SignalEvent, SignalKind, Trade};

use super::exit::{ExitDecision, ExitEvaluator, ExitPolicy};
use super::report::{PolicyStats, ScoreParams};

/// 백테스트 에러 타입
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("백테스트 설정 오류: {0}")]
    Config(String),
}

pub type BacktestResult<T> = Result<T, BacktestError>;

/// 백테스트 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// 최대 보유 봉 수 (항상 적용되는 상한)
    #[serde(default = "default_max_holding_days")]
    pub max_holding_days: usize,
    /// 기간 만료 청산 봉 수
    #[serde(default = "default_time_exit_days")]
    pub time_exit_days: Option<usize>,
    /// 손절 비율 (0.08 = 진입가 대비 -8%)
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: Option<Decimal>,
    /// 익절 비율 (0.15 = +15%)
    #[serde(default = "default_take_profit_pct")]
    pub take_profit_pct: Option<Decimal>,
    /// 익절 ATR 배수 (진입가 + m × ATR)
    #[serde(default)]
    pub take_profit_atr_multiple: Option<Decimal>,
    /// 추적 손절 ATR 배수 (최고가 − k × ATR)
    #[serde(default = "default_trailing_atr_multiple")]
    pub trailing_atr_multiple: Option<Decimal>,
    /// ATR 기간
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,
    /// 지표 청산 사용 여부
    #[serde(default = "default_true")]
    pub indicator_exit: bool,
    /// 지표 청산 이동평균 기간
    #[serde(default = "default_exit_ma_period")]
    pub exit_ma_period: usize,
    /// 이동평균 이탈 허용폭 (0.02 = 2%)
    #[serde(default = "default_exit_ma_tolerance")]
    pub exit_ma_tolerance: Decimal,
    /// 지표 청산 RSI 기간
    #[serde(default = "default_exit_rsi_period")]
    pub exit_rsi_period: usize,
    /// RSI 과매수 기준
    #[serde(default = "default_exit_rsi_overbought")]
    pub exit_rsi_overbought: Decimal,
    /// 점수 계산: 장기 보유 기준 봉 수
    #[serde(default = "default_long_hold_threshold")]
    pub long_hold_threshold: usize,
    /// 점수 계산: 큰 손실 기준 수익률
    #[serde(default = "default_loss_threshold")]
    pub loss_threshold: Decimal,
    /// 점수 계산: 위험 감점
    #[serde(default = "default_risk_penalty")]
    pub risk_penalty: Decimal,
}

fn default_max_holding_days() -> usize {
    20
}
fn default_time_exit_days() -> Option<usize> {
    Some(10)
}
fn default_stop_loss_pct() -> Option<Decimal> {
    Some(dec!(0.08))
}
fn default_take_profit_pct() -> Option<Decimal> {
    Some(dec!(0.15))
}
fn default_trailing_atr_multiple() -> Option<Decimal> {
    Some(dec!(2))
}
fn default_atr_period() -> usize {
    14
}
fn default_true() -> bool {
    true
}
fn default_exit_ma_period() -> usize {
    5
}
fn default_exit_ma_tolerance() -> Decimal {
    dec!(0.02)
}
fn default_exit_rsi_period() -> usize {
    6
}
fn default_exit_rsi_overbought() -> Decimal {
    dec!(80)
}
fn default_long_hold_threshold() -> usize {
    15
}
fn default_loss_threshold() -> Decimal {
    dec!(-0.10)
}
fn default_risk_penalty() -> Decimal {
    dec!(0.5)
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            max_holding_days: default_max_holding_days(),
            time_exit_days: default_time_exit_days(),
            stop_loss_pct: default_stop_loss_pct(),
            take_profit_pct: default_take_profit_pct(),
            take_profit_atr_multiple: None,
            trailing_atr_multiple: default_trailing_atr_multiple(),
            atr_period: default_atr_period(),
            indicator_exit: true,
            exit_ma_period: default_exit_ma_period(),
            exit_ma_tolerance: default_exit_ma_tolerance(),
            exit_rsi_period: default_exit_rsi_period(),
            exit_rsi_overbought: default_exit_rsi_overbought(),
            long_hold_threshold: default_long_hold_threshold(),
            loss_threshold: default_loss_threshold(),
            risk_penalty: default_risk_penalty(),
        }
    }
}

impl BacktestConfig {
    /// 최대 보유 봉 수 설정
    pub fn with_max_holding_days(mut self, days: usize) -> Self {
        self.max_holding_days = days;
        self
    }

    /// 기간 만료 청산 설정 (`None`이면 비활성)
    pub fn with_time_exit_days(mut self, days: Option<usize>) -> Self {
        self.time_exit_days = days;
        self
    }

    /// 손절 비율 설정
    pub fn with_stop_loss_pct(mut self, pct: Option<Decimal>) -> Self {
        self.stop_loss_pct = pct;
        self
    }

    /// 익절 비율 설정
    pub fn with_take_profit_pct(mut self, pct: Option<Decimal>) -> Self {
        self.take_profit_pct = pct;
        self
    }

    /// 익절 ATR 배수 설정
    pub fn with_take_profit_atr_multiple(mut self, multiple: Option<Decimal>) -> Self {
        self.take_profit_atr_multiple = multiple;
        self
    }

    /// 추적 손절 ATR 배수 설정
    pub fn with_trailing_atr_multiple(mut self, multiple: Option<Decimal>) -> Self {
        self.trailing_atr_multiple = multiple;
        self
    }

    /// ATR 기간 설정
    pub fn with_atr_period(mut self, period: usize) -> Self {
        self.atr_period = period;
        self
    }

    /// 지표 청산 사용 여부 설정
    pub fn with_indicator_exit(mut self, enabled: bool) -> Self {
        self.indicator_exit = enabled;
        self
    }

    /// 활성화된 청산 정책 (우선순위 순).
    pub fn policies(&self) -> Vec<ExitPolicy> {
        ExitPolicy::ALL
            .into_iter()
            .filter(|p| match p {
                ExitPolicy::StopLoss => self.stop_loss_pct.is_some(),
                ExitPolicy::TakeProfit => {
                    self.take_profit_pct.is_some() || self.take_profit_atr_multiple.is_some()
                }
                ExitPolicy::TrailingStop => self.trailing_atr_multiple.is_some(),
                ExitPolicy::IndicatorExit => self.indicator_exit,
                ExitPolicy::TimeExit => self.time_exit_days.is_some(),
            })
            .collect()
    }

    /// 점수 계산 파라미터.
    pub fn score_params(&self) -> ScoreParams {
        ScoreParams {
            loss_threshold: self.loss_threshold,
            long_hold_threshold: self.long_hold_threshold,
            risk_penalty: self.risk_penalty,
        }
    }

    /// 설정 유효성 검사
    pub fn validate(&self) -> BacktestResult<()> {
        if self.max_holding_days == 0 {
            return Err(BacktestError::Config(
                "최대 보유기간은 0보다 커야 합니다".to_string(),
            ));
        }
        if self.time_exit_days == Some(0) {
            return Err(BacktestError::Config(
                "기간 만료 청산 봉 수는 0보다 커야 합니다".to_string(),
            ));
        }
        if let Some(pct) = self.stop_loss_pct {
            if pct <= Decimal::ZERO || pct >= Decimal::ONE {
                return Err(BacktestError::Config(
                    "손절 비율은 0과 1 사이여야 합니다".to_string(),
                ));
            }
        }
        if self.take_profit_pct.is_some_and(|p| p <= Decimal::ZERO) {
            return Err(BacktestError::Config(
                "익절 비율은 0보다 커야 합니다".to_string(),
            ));
        }
        let non_positive = |m: Option<Decimal>| m.is_some_and(|m| m <= Decimal::ZERO);
        if non_positive(self.take_profit_atr_multiple) || non_positive(self.trailing_atr_multiple) {
            return Err(BacktestError::Config(
                "ATR 배수는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.atr_period == 0 || self.exit_ma_period == 0 || self.exit_rsi_period == 0 {
            return Err(BacktestError::Config(
                "지표 기간은 0보다 커야 합니다".to_string(),
            ));
        }
        if self.exit_ma_tolerance < Decimal::ZERO || self.exit_ma_tolerance >= Decimal::ONE {
            return Err(BacktestError::Config(
                "이동평균 이탈 허용폭은 0 이상 1 미만이어야 합니다".to_string(),
            ));
        }
        if self.exit_rsi_overbought <= Decimal::ZERO || self.exit_rsi_overbought > dec!(100) {
            return Err(BacktestError::Config(
                "RSI 과매수 기준은 0 초과 100 이하여야 합니다".to_string(),
            ));
        }
        if self.loss_threshold > Decimal::ZERO {
            return Err(BacktestError::Config(
                "손실 기준 수익률은 0 이하여야 합니다".to_string(),
            ));
        }
        if self.risk_penalty < Decimal::ZERO || self.risk_penalty > Decimal::ONE {
            return Err(BacktestError::Config(
                "위험 감점은 0과 1 사이여야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

/// 종목 하나의 백테스트 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentBacktest {
    /// 종목 코드
    pub stock_code: String,
    /// 경쟁 청산으로 만들어진 거래
    pub trades: Vec<Trade>,
    /// 진입 이후 봉이 없어 건너뛴 신호 수
    pub insufficient_trailing_data: usize,
    /// 정책별 단독 재생 통계
    pub policy_stats: Vec<PolicyStats>,
    /// 평균 점수가 가장 높은 정책
    pub optimal_policy: Option<ExitPolicy>,
}

/// 백테스트 시뮬레이터
#[derive(Debug, Clone)]
pub struct BacktestSimulator {
    config: BacktestConfig,
}

impl BacktestSimulator {
    /// 설정을 검증하고 시뮬레이터를 생성합니다.
    pub fn new(config: BacktestConfig) -> BacktestResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 설정 참조
    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// 종목 하나의 신호를 재생합니다.
    ///
    /// # 인자
    /// * `series` - 신호 계산에 사용한 일봉
    /// * `signals` - 해당 종목의 신호
    /// * `entry_kinds` - 진입으로 취급할 신호 종류
    pub fn run(
        &self,
        series: &BarSeries,
        signals: &[SignalEvent],
        entry_kinds: &[SignalKind],
    ) -> InstrumentBacktest {
        let evaluator = ExitEvaluator::new(series, &self.config);
        let policies = self.config.policies();

        let entries: Vec<(usize, &SignalEvent)> = signals
            .iter()
            .filter(|s| entry_kinds.contains(&s.signal_kind))
            .filter_map(|s| match series.index_of(s.date) {
                Some(index) => Some((index, s)),
                None => {
                    debug!(code = series.code(), date = %s.date, "일봉에 없는 신호 날짜, 건너뜀");
                    None
                }
            })
            .collect();

        let mut trades = Vec::with_capacity(entries.len());
        let mut insufficient_trailing_data = 0;

        for &(index, signal) in &entries {
            match evaluator.simulate(index, &policies) {
                Some(decision) => trades.push(to_trade(series, index, decision, label(signal))),
                None => {
                    debug!(code = series.code(), date = %signal.date, "진입 이후 봉 없음");
                    insufficient_trailing_data += 1;
                }
            }
        }

        let score_params = self.config.score_params();
        let policy_stats: Vec<PolicyStats> = policies
            .iter()
            .map(|&policy| {
                let replayed: Vec<Trade> = entries
                    .iter()
                    .filter_map(|&(index, _)| {
                        evaluator
                            .simulate(index, &[policy])
                            .map(|d| to_trade(series, index, d, policy.to_string()))
                    })
                    .collect();
                PolicyStats::from_trades(policy, &replayed, &score_params)
            })
            .collect();

        InstrumentBacktest {
            stock_code: series.code().to_string(),
            trades,
            insufficient_trailing_data,
            optimal_policy: optimal_policy(&policy_stats),
            policy_stats,
        }
    }
}

/// 거래 라벨: `전략ID:신호종류`
fn label(signal: &SignalEvent) -> String {
    format!("{}:{}", signal.strategy_id, signal.signal_kind)
}

fn to_trade(
    series: &BarSeries,
    entry_index: usize,
    decision: ExitDecision,
    label: String,
) -> Trade {
    let bars = series.bars();
    let entry = &bars[entry_index];
    Trade::new(
        series.code(),
        entry.date,
        entry.close,
        bars[decision.index].date,
        decision.price,
        decision.index - entry_index,
        decision.reason,
        label,
    )
}

/// 평균 점수가 가장 높은 정책. 동점이면 우선순위가 높은 정책.
fn optimal_policy(stats: &[PolicyStats]) -> Option<ExitPolicy> {
    let mut best: Option<&PolicyStats> = None;
    for s in stats.iter().filter(|s| s.trades > 0) {
        if best.map_or(true, |b| s.avg_score > b.avg_score) {
            best = Some(s);
        }
    }
    best.map(|s| s.policy)
}
