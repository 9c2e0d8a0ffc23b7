//! 청산 정책
//!
//! 하나의 진입에 대해 여러 청산 정책을 동시에 평가하고,
//! 가장 먼저 발동한 정책을 선택합니다. 같은 봉에서 여러 정책이 발동하면
//! 손절 > 익절 > 추적 손절 > 지표 청산 > 기간 만료 순으로 우선합니다.
//!
//! 모든 판단은 해당 봉까지의 정보만 사용합니다 (추적 손절선은 직전 봉까지의
//! 최고가와 ATR로 계산).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trader_core::{Bar, BarSeries, ExitReason};

use super::engine::BacktestConfig;
use crate::indicators::{at, AtrParams, Column, IndicatorEngine, RsiParams, SmaParams};

/// 경쟁하는 청산 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitPolicy {
    /// 고정 비율 손절
    StopLoss,
    /// 목표가 익절 (비율 또는 ATR 배수)
    TakeProfit,
    /// ATR 추적 손절
    TrailingStop,
    /// 이동평균 이탈 / RSI 과매수
    IndicatorExit,
    /// 고정 보유기간
    TimeExit,
}

impl ExitPolicy {
    /// 우선순위 순서의 전체 목록.
    pub const ALL: [ExitPolicy; 5] = [
        ExitPolicy::StopLoss,
        ExitPolicy::TakeProfit,
        ExitPolicy::TrailingStop,
        ExitPolicy::IndicatorExit,
        ExitPolicy::TimeExit,
    ];

    /// 정책이 발동했을 때의 청산 사유.
    pub fn reason(&self) -> ExitReason {
        match self {
            ExitPolicy::StopLoss => ExitReason::StopLoss,
            ExitPolicy::TakeProfit => ExitReason::TakeProfit,
            ExitPolicy::TrailingStop => ExitReason::TrailingStop,
            ExitPolicy::IndicatorExit => ExitReason::IndicatorExit,
            ExitPolicy::TimeExit => ExitReason::TimeExit,
        }
    }
}

impl std::fmt::Display for ExitPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// 청산 결정.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitDecision {
    /// 청산 봉 인덱스
    pub index: usize,
    /// 청산 가격
    pub price: Decimal,
    /// 청산 사유
    pub reason: ExitReason,
}

/// 종목 하나에 대한 청산 평가기.
///
/// ATR, 청산용 이동평균, RSI를 한 번만 계산해 두고 진입마다 재사용합니다.
pub struct ExitEvaluator<'a> {
    bars: &'a [Bar],
    config: &'a BacktestConfig,
    atr: Column,
    ma: Column,
    rsi: Column,
}

impl<'a> ExitEvaluator<'a> {
    /// 새 평가기를 생성합니다.
    pub fn new(series: &'a BarSeries, config: &'a BacktestConfig) -> Self {
        let engine = IndicatorEngine::new();
        let closes = series.closes();
        let atr = engine.atr(
            series.bars(),
            AtrParams {
                period: config.atr_period,
            },
        );
        let ma = engine.sma(
            &closes,
            SmaParams {
                period: config.exit_ma_period,
            },
        );
        let rsi = engine.rsi(
            &closes,
            RsiParams {
                period: config.exit_rsi_period,
            },
        );

        Self {
            bars: series.bars(),
            config,
            atr,
            ma,
            rsi,
        }
    }

    /// `entry_index` 봉 종가에 진입한 거래의 청산을 시뮬레이션합니다.
    ///
    /// `policies`에 포함된 정책만 평가하며, 최대 보유기간과 데이터 끝은 항상 적용됩니다.
    ///
    /// # 반환
    /// 진입 이후 봉이 하나도 없으면 `None`
    pub fn simulate(&self, entry_index: usize, policies: &[ExitPolicy]) -> Option<ExitDecision> {
        let entry_bar = self.bars.get(entry_index)?;
        let last_index = self.bars.len().checked_sub(1)?;
        if entry_index >= last_index {
            return None;
        }

        let entry_price = entry_bar.close;
        let enabled = |p: ExitPolicy| policies.contains(&p);

        let stop_loss = self
            .config
            .stop_loss_pct
            .filter(|_| enabled(ExitPolicy::StopLoss))
            .map(|pct| entry_price * (Decimal::ONE - pct));
        let take_profit = if enabled(ExitPolicy::TakeProfit) {
            self.take_profit_target(entry_index, entry_price)
        } else {
            None
        };
        let trailing_multiple = self
            .config
            .trailing_atr_multiple
            .filter(|_| enabled(ExitPolicy::TrailingStop));

        let ceiling = (entry_index + self.config.max_holding_days).min(last_index);
        let mut highest = entry_price;
        let mut trailing_level: Option<Decimal> = None;

        for t in (entry_index + 1)..=ceiling {
            let bar = &self.bars[t];
            let held = t - entry_index;

            // 직전 봉까지의 정보로 추적 손절선 갱신 (상향만 허용)
            if let (Some(k), Some(atr)) = (trailing_multiple, at(&self.atr, t - 1)) {
                let candidate = highest - k * atr;
                trailing_level = Some(trailing_level.map_or(candidate, |l| l.max(candidate)));
            }

            if let Some(stop) = stop_loss {
                if bar.low <= stop {
                    return Some(exit(t, bar.open.min(stop), ExitReason::StopLoss));
                }
            }
            if let Some(target) = take_profit {
                if bar.high >= target {
                    return Some(exit(t, bar.open.max(target), ExitReason::TakeProfit));
                }
            }
            if let Some(level) = trailing_level {
                if bar.low <= level {
                    return Some(exit(t, bar.open.min(level), ExitReason::TrailingStop));
                }
            }
            if enabled(ExitPolicy::IndicatorExit) && self.indicator_triggered(t) {
                return Some(exit(t, bar.close, ExitReason::IndicatorExit));
            }
            if let Some(n) = self.config.time_exit_days.filter(|_| enabled(ExitPolicy::TimeExit)) {
                if held >= n {
                    return Some(exit(t, bar.close, ExitReason::TimeExit));
                }
            }
            if held >= self.config.max_holding_days {
                return Some(exit(t, bar.close, ExitReason::MaxHolding));
            }

            highest = highest.max(bar.high);
        }

        Some(exit(
            ceiling,
            self.bars[ceiling].close,
            ExitReason::DataExhausted,
        ))
    }

    /// 익절 목표가. 비율 목표와 ATR 목표가 모두 있으면 더 가까운 쪽.
    fn take_profit_target(&self, entry_index: usize, entry_price: Decimal) -> Option<Decimal> {
        let pct_target = self
            .config
            .take_profit_pct
            .map(|pct| entry_price * (Decimal::ONE + pct));
        let atr_target = self
            .config
            .take_profit_atr_multiple
            .zip(at(&self.atr, entry_index))
            .map(|(m, atr)| entry_price + m * atr);

        match (pct_target, atr_target) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// 종가가 이동평균을 허용폭 이상 하회하거나 RSI가 과매수 구간이면 발동.
    /// 정의되지 않은 지표는 발동시키지 않습니다.
    fn indicator_triggered(&self, t: usize) -> bool {
        let close = self.bars[t].close;
        let below_ma = at(&self.ma, t)
            .is_some_and(|ma| close < ma * (Decimal::ONE - self.config.exit_ma_tolerance));
        let overbought = at(&self.rsi, t).is_some_and(|rsi| rsi > self.config.exit_rsi_overbought);
        below_ma || overbought
    }
}

fn exit(index: usize, price: Decimal, reason: ExitReason) -> ExitDecision {
    ExitDecision {
        index,
        price,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use rust_decimal_macros::dec;

    fn series(rows: &[(Decimal, Decimal, Decimal, Decimal)]) -> BarSeries {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let bars = rows
            .iter()
            .enumerate()
            .map(|(i, &(o, h, l, c))| Bar::new(start + Days::new(i as u64), o, h, l, c, dec!(100)))
            .collect();
        BarSeries::new("000001", bars).unwrap()
    }

    fn flat(n: usize) -> Vec<(Decimal, Decimal, Decimal, Decimal)> {
        vec![(dec!(10), dec!(10.1), dec!(9.9), dec!(10)); n]
    }

    #[test]
    fn test_no_trailing_bar_returns_none() {
        let s = series(&flat(3));
        let config = BacktestConfig::default();
        let eval = ExitEvaluator::new(&s, &config);
        assert!(eval.simulate(2, &ExitPolicy::ALL).is_none());
        assert!(eval.simulate(5, &ExitPolicy::ALL).is_none());
        assert!(eval.simulate(1, &ExitPolicy::ALL).is_some());
    }

    #[test]
    fn test_stop_loss_gap_fills_at_open() {
        let mut rows = flat(5);
        rows[2] = (dec!(8.5), dec!(8.6), dec!(8.4), dec!(8.5));
        let s = series(&rows);
        let config = BacktestConfig::default().with_stop_loss_pct(Some(dec!(0.05)));
        let eval = ExitEvaluator::new(&s, &config);

        let decision = eval.simulate(0, &[ExitPolicy::StopLoss]).unwrap();
        assert_eq!(decision.index, 2);
        assert_eq!(decision.reason, ExitReason::StopLoss);
        assert_eq!(decision.price, dec!(8.5));
    }

    #[test]
    fn test_take_profit_fills_at_target() {
        let mut rows = flat(5);
        rows[3] = (dec!(10.2), dec!(11.5), dec!(10.1), dec!(11));
        let s = series(&rows);
        let config = BacktestConfig::default().with_take_profit_pct(Some(dec!(0.1)));
        let eval = ExitEvaluator::new(&s, &config);

        let decision = eval.simulate(0, &[ExitPolicy::TakeProfit]).unwrap();
        assert_eq!(decision.index, 3);
        assert_eq!(decision.price, dec!(11.0));
        assert_eq!(decision.reason, ExitReason::TakeProfit);
    }

    #[test]
    fn test_nearer_atr_target_wins() {
        let mut rows = flat(5);
        rows[3] = (dec!(10.2), dec!(10.8), dec!(10.1), dec!(10.7));
        let s = series(&rows);
        // ATR[1] = 0.2 → ATR 목표 10.6, 비율 목표 11.5
        let config = BacktestConfig::default()
            .with_atr_period(2)
            .with_take_profit_pct(Some(dec!(0.15)))
            .with_take_profit_atr_multiple(Some(dec!(3)))
            .with_indicator_exit(false);
        assert!(!config.policies().contains(&ExitPolicy::IndicatorExit));
        let eval = ExitEvaluator::new(&s, &config);

        let decision = eval.simulate(1, &config.policies()).unwrap();
        assert_eq!(decision.index, 3);
        assert_eq!(decision.price, dec!(10.6));
        assert_eq!(decision.reason, ExitReason::TakeProfit);
    }

    #[test]
    fn test_stop_loss_beats_take_profit_on_same_bar() {
        let mut rows = flat(4);
        // 하루에 두 조건 모두 충족하는 장대 봉
        rows[1] = (dec!(10), dec!(12), dec!(8), dec!(10));
        let s = series(&rows);
        let config = BacktestConfig::default()
            .with_stop_loss_pct(Some(dec!(0.05)))
            .with_take_profit_pct(Some(dec!(0.05)));
        let eval = ExitEvaluator::new(&s, &config);

        let decision = eval.simulate(0, &ExitPolicy::ALL).unwrap();
        assert_eq!(decision.reason, ExitReason::StopLoss);
        assert_eq!(decision.price, dec!(9.5));
    }

    #[test]
    fn test_trailing_stop_ratchets_up() {
        // ATR 기간 2, 배수 3. 봉 3은 고점 갱신 없이 범위만 커져 ATR이 1.05 → 1.925로 확대
        let rows = vec![
            (dec!(10), dec!(10.5), dec!(9.5), dec!(10)),
            (dec!(10), dec!(12), dec!(10), dec!(12)),
            (dec!(12), dec!(12.4), dec!(11.8), dec!(12.2)),
            (dec!(12.2), dec!(12.4), dec!(9.6), dec!(10)),
            (dec!(10), dec!(10.2), dec!(9.0), dec!(9.1)),
        ];
        let config = BacktestConfig::default()
            .with_atr_period(2)
            .with_trailing_atr_multiple(Some(dec!(3)));

        let s = series(&rows);
        let eval = ExitEvaluator::new(&s, &config);
        let decision = eval.simulate(0, &[ExitPolicy::TrailingStop]).unwrap();

        // 봉 3 손절선 12.4 - 3 × 1.05 = 9.25, 저가 9.6이라 유지.
        // 봉 4 후보 12.4 - 3 × 1.925 = 6.625는 버리고 9.25 유지 → 저가 9.0에서 발동
        assert_eq!(decision.index, 4);
        assert_eq!(decision.reason, ExitReason::TrailingStop);
        assert_eq!(decision.price, dec!(9.25));

        // 손절선 아래로 갭 하락하면 시가 체결
        let mut gapped = rows.clone();
        gapped[4] = (dec!(9.0), dec!(9.2), dec!(8.8), dec!(9.1));
        let s = series(&gapped);
        let eval = ExitEvaluator::new(&s, &config);
        let decision = eval.simulate(0, &[ExitPolicy::TrailingStop]).unwrap();
        assert_eq!((decision.index, decision.price), (4, dec!(9.0)));
    }

    #[test]
    fn test_time_exit_and_ceiling() {
        let s = series(&flat(30));
        let config = BacktestConfig::default()
            .with_time_exit_days(Some(4))
            .with_max_holding_days(6);
        let eval = ExitEvaluator::new(&s, &config);

        let timed = eval.simulate(0, &[ExitPolicy::TimeExit]).unwrap();
        assert_eq!((timed.index, timed.reason), (4, ExitReason::TimeExit));

        let ceiling = eval.simulate(0, &[]).unwrap();
        assert_eq!((ceiling.index, ceiling.reason), (6, ExitReason::MaxHolding));
    }

    #[test]
    fn test_data_exhausted_exits_at_last_close() {
        let mut rows = flat(4);
        rows[3].3 = dec!(10.05);
        let s = series(&rows);
        let config = BacktestConfig::default().with_max_holding_days(20);
        let eval = ExitEvaluator::new(&s, &config);

        let decision = eval.simulate(1, &[]).unwrap();
        assert_eq!(decision.index, 3);
        assert_eq!(decision.price, dec!(10.05));
        assert_eq!(decision.reason, ExitReason::DataExhausted);
    }

    #[test]
    fn test_indicator_exit_below_ma() {
        let mut rows = flat(10);
        rows[8] = (dec!(10), dec!(10), dec!(9.3), dec!(9.4));
        let s = series(&rows);
        let config = BacktestConfig::default();
        let eval = ExitEvaluator::new(&s, &config);

        let decision = eval.simulate(5, &[ExitPolicy::IndicatorExit]).unwrap();
        assert_eq!(decision.index, 8);
        assert_eq!(decision.reason, ExitReason::IndicatorExit);
        assert_eq!(decision.price, dec!(9.4));
    }
}
