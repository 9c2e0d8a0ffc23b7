//! 백테스트 리포트 및 점수 계산
//!
//! 점수 = 0.4 × 수익률 + 0.3 × (1 − 보유일/최대 관측 보유일) + 0.3 × 위험 항.
//! 위험 항은 큰 손실이나 장기 보유일 때 감점됩니다.
//!
//! 리포트 병합은 입력 순서와 무관합니다. 병합할 때마다 거래를 정렬하고
//! 통계를 다시 계산합니다.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trader_core::{DecimalExt, ExitReason, Trade, TradeStats};

use super::engine::InstrumentBacktest;
use super::exit::ExitPolicy;

const RETURN_WEIGHT: Decimal = dec!(0.4);
const HOLD_WEIGHT: Decimal = dec!(0.3);
const RISK_WEIGHT: Decimal = dec!(0.3);

/// 점수 계산 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreParams {
    /// 이 수익률보다 낮으면 감점
    pub loss_threshold: Decimal,
    /// 이 봉 수보다 오래 보유하면 감점
    pub long_hold_threshold: usize,
    /// 감점 크기
    pub risk_penalty: Decimal,
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self {
            loss_threshold: dec!(-0.10),
            long_hold_threshold: 15,
            risk_penalty: dec!(0.5),
        }
    }
}

/// 거래별 점수를 계산합니다.
///
/// 최대 관측 보유일은 `trades` 안에서 구하며, 0이면 보유 항은 1입니다.
pub fn score_trades(trades: &[Trade], params: &ScoreParams) -> Vec<Decimal> {
    let max_observed = trades.iter().map(|t| t.hold_days).max().unwrap_or(0);

    trades
        .iter()
        .map(|trade| {
            let hold_term = Decimal::from(trade.hold_days)
                .safe_div(Decimal::from(max_observed))
                .map_or(Decimal::ONE, |ratio| Decimal::ONE - ratio);
            let risky = trade.return_rate < params.loss_threshold
                || trade.hold_days > params.long_hold_threshold;
            let risk_term = if risky {
                Decimal::ONE - params.risk_penalty
            } else {
                Decimal::ONE
            };

            RETURN_WEIGHT * trade.return_rate + HOLD_WEIGHT * hold_term + RISK_WEIGHT * risk_term
        })
        .collect()
}

/// 청산 정책 하나를 단독으로 재생한 통계.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStats {
    /// 정책
    pub policy: ExitPolicy,
    /// 거래 수
    pub trades: usize,
    /// 승률
    pub win_rate: Decimal,
    /// 평균 수익률
    pub avg_return: Decimal,
    /// 평균 보유일
    pub avg_hold_days: Decimal,
    /// 평균 점수
    pub avg_score: Decimal,
}

impl PolicyStats {
    /// 거래가 없는 통계.
    pub fn empty(policy: ExitPolicy) -> Self {
        Self {
            policy,
            trades: 0,
            win_rate: Decimal::ZERO,
            avg_return: Decimal::ZERO,
            avg_hold_days: Decimal::ZERO,
            avg_score: Decimal::ZERO,
        }
    }

    /// 정책의 재생 거래로 통계를 계산합니다.
    pub fn from_trades(policy: ExitPolicy, trades: &[Trade], params: &ScoreParams) -> Self {
        if trades.is_empty() {
            return Self::empty(policy);
        }

        let stats = TradeStats::from_trades(trades);
        let scores = score_trades(trades, params);
        let avg_score = scores.iter().sum::<Decimal>() / Decimal::from(scores.len());

        Self {
            policy,
            trades: stats.total_trades,
            win_rate: stats.win_rate(),
            avg_return: stats.avg_return(),
            avg_hold_days: stats.avg_hold_days(),
            avg_score,
        }
    }
}

/// 리포트 요약 통계.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestSummary {
    /// 총 거래
    pub total_trades: usize,
    /// 수익 거래
    pub winning_trades: usize,
    /// 승률
    pub win_rate: Decimal,
    /// 평균 수익률
    pub avg_return: Decimal,
    /// 평균 보유일
    pub avg_hold_days: Decimal,
    /// 청산 사유별 거래 수
    pub exit_reasons: BTreeMap<ExitReason, usize>,
}

impl BacktestSummary {
    fn from_trades(trades: &[Trade]) -> Self {
        let stats = TradeStats::from_trades(trades);
        let mut exit_reasons = BTreeMap::new();
        for trade in trades {
            *exit_reasons.entry(trade.exit_reason).or_insert(0) += 1;
        }

        Self {
            total_trades: stats.total_trades,
            winning_trades: stats.winning_trades,
            win_rate: stats.win_rate(),
            avg_return: stats.avg_return(),
            avg_hold_days: stats.avg_hold_days(),
            exit_reasons,
        }
    }
}

/// 백테스트 리포트
///
/// 여러 종목의 거래와 요약 통계. 생성 후에는 읽기 전용입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// 정렬된 거래 목록
    pub trades: Vec<Trade>,
    /// 요약 통계
    pub stats: BacktestSummary,
    /// 진입 이후 봉이 없어 건너뛴 신호 수
    pub insufficient_trailing_data: usize,
    /// 종목별 최적 청산 정책
    pub optimal_policies: BTreeMap<String, ExitPolicy>,
}

impl BacktestReport {
    /// 거래 목록으로 리포트를 만듭니다.
    pub fn from_trades(trades: Vec<Trade>) -> Self {
        Self {
            trades,
            ..Self::default()
        }
        .finalize()
    }

    /// 종목 하나의 결과로 리포트를 만듭니다.
    pub fn from_instrument(result: InstrumentBacktest) -> Self {
        let mut optimal_policies = BTreeMap::new();
        if let Some(policy) = result.optimal_policy {
            optimal_policies.insert(result.stock_code, policy);
        }

        Self {
            trades: result.trades,
            stats: BacktestSummary::default(),
            insufficient_trailing_data: result.insufficient_trailing_data,
            optimal_policies,
        }
        .finalize()
    }

    /// 여러 종목 결과를 하나로 합칩니다. 순서와 무관하게 같은 결과입니다.
    pub fn from_instruments(results: impl IntoIterator<Item = InstrumentBacktest>) -> Self {
        results
            .into_iter()
            .map(Self::from_instrument)
            .fold(Self::default(), Self::merge)
    }

    /// 두 리포트를 병합합니다.
    pub fn merge(mut self, other: Self) -> Self {
        self.trades.extend(other.trades);
        self.insufficient_trailing_data += other.insufficient_trailing_data;
        for (code, policy) in other.optimal_policies {
            self.optimal_policies
                .entry(code)
                .and_modify(|p| *p = (*p).min(policy))
                .or_insert(policy);
        }
        self.finalize()
    }

    fn finalize(mut self) -> Self {
        self.trades.sort_by(|a, b| {
            a.sort_key()
                .cmp(&b.sort_key())
                .then_with(|| a.exit_reason.cmp(&b.exit_reason))
                .then_with(|| a.exit_price.cmp(&b.exit_price))
        });
        self.stats = BacktestSummary::from_trades(&self.trades);
        self
    }

    /// 리포트 요약 문자열
    pub fn summary(&self) -> String {
        let reasons = if self.stats.exit_reasons.is_empty() {
            "  (없음)".to_string()
        } else {
            self.stats
                .exit_reasons
                .iter()
                .map(|(reason, count)| format!("  {}: {}", reason, count))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "백테스트 결과 요약\n\
             ═══════════════════════════════════════\n\
             종목 수: {}\n\
             총 거래: {}\n\
             수익 거래: {}\n\
             승률: {}\n\
             평균 수익률: {}\n\
             평균 보유일: {:.2}\n\
             후행 데이터 부족: {}\n\
             ───────────────────────────────────────\n\
             청산 사유\n\
             {}\n\
             ═══════════════════════════════════════",
            self.instrument_count(),
            self.stats.total_trades,
            self.stats.winning_trades,
            self.stats.win_rate.to_percentage_string(),
            self.stats.avg_return.to_percentage_string(),
            self.stats.avg_hold_days,
            self.insufficient_trailing_data,
            reasons,
        )
    }

    /// 거래가 있는 종목 수
    pub fn instrument_count(&self) -> usize {
        let mut count = 0;
        let mut last: Option<&str> = None;
        for trade in &self.trades {
            if last != Some(trade.stock_code.as_str()) {
                count += 1;
                last = Some(trade.stock_code.as_str());
            }
        }
        count
    }
}
