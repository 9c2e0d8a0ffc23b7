//! MACD 제로축 출발 전략.
//!
//! 히스토그램이 `±macd.zero_axis_range` 안에 있고 직전보다 상승한 봉을
//! MACD 골든크로스 기준으로 세 단계로 나눕니다.
//!
//! - `PRE`: DIF < DEA (크로스 전)
//! - `MID`: 이 봉에서 DIF가 DEA를 상향 돌파
//! - `POST`: 최근 골든크로스 이후 1 ~ `macd.post_cross_days` 봉, DIF > DEA 유지.
//!   데드크로스가 나오면 POST 구간이 끝납니다.
//!
//! 한 봉에는 많아야 하나의 단계만 붙습니다.

use trader_analytics::indicators::{at, crossed_above, crossed_below, rising, IndicatorFrame};
use trader_core::SignalKind;

use super::{classify_bars, Inputs};
use crate::config::StrategyConfig;
use crate::traits::{SignalColumn, Strategy};

/// MACD 제로축 전략.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacdZeroAxisStrategy;

impl MacdZeroAxisStrategy {
    /// 전략 ID
    pub const ID: &'static str = "macd_zero_axis";

    /// 새 전략 생성.
    pub fn new() -> Self {
        Self
    }
}

/// 최근 골든크로스 위치를 추적하는 분류기.
struct PhaseTracker<'c> {
    config: &'c StrategyConfig,
    last_cross: Option<usize>,
}

impl PhaseTracker<'_> {
    fn classify(&mut self, inputs: &Inputs<'_>, t: usize) -> Option<SignalKind> {
        let golden = crossed_above(inputs.dif, inputs.dea, t)?;
        if golden {
            self.last_cross = Some(t);
        } else if crossed_below(inputs.dif, inputs.dea, t)? {
            self.last_cross = None;
        }

        let histogram = at(inputs.histogram, t)?;
        let near_zero = histogram.abs() <= self.config.macd.zero_axis_range;
        if !(near_zero && rising(inputs.histogram, t)?) {
            return Some(SignalKind::NoSignal);
        }

        let (dif, dea) = (at(inputs.dif, t)?, at(inputs.dea, t)?);
        let since_cross = self.last_cross.map(|c| t - c);

        Some(if golden {
            SignalKind::Mid
        } else if dif < dea {
            SignalKind::Pre
        } else if dif > dea
            && since_cross.is_some_and(|n| n >= 1 && n <= self.config.macd.post_cross_days)
        {
            SignalKind::Post
        } else {
            SignalKind::NoSignal
        })
    }
}

impl Strategy for MacdZeroAxisStrategy {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn name(&self) -> &str {
        "MACD Zero-Axis Start"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn description(&self) -> &str {
        "0 근처에서 상승하는 MACD 히스토그램을 크로스 전/크로스 봉/크로스 후로 구분"
    }

    fn entry_kinds(&self) -> &'static [SignalKind] {
        &[SignalKind::Mid, SignalKind::Post]
    }

    fn evaluate(&self, frame: &IndicatorFrame, config: &StrategyConfig) -> SignalColumn {
        let mut tracker = PhaseTracker {
            config,
            last_cross: None,
        };
        classify_bars(frame, config, |inputs, t| tracker.classify(inputs, t))
    }
}

#[cfg(test)]
mod tests {
    use super::{MacdZeroAxisStrategy, PhaseTracker};
    use crate::config::StrategyConfig;
    use crate::strategies::fixtures;
    use crate::traits::Strategy as _;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use trader_analytics::indicators::crossed_above;
    use trader_core::SignalKind;

    fn config(range: Decimal) -> StrategyConfig {
        let mut config = StrategyConfig::default();
        config.macd.zero_axis_range = range;
        config
    }

    #[test]
    fn test_phases_on_v_shape() {
        let config = config(dec!(0.12));
        let frame = fixtures::frame(&fixtures::v_shape(), &config);
        let column = MacdZeroAxisStrategy::new().evaluate(&frame, &config);

        let labelled: Vec<(usize, SignalKind)> = column
            .iter()
            .enumerate()
            .filter(|(_, k)| k.is_signal())
            .map(|(t, k)| (t, *k))
            .collect();

        assert_eq!(
            labelled,
            vec![
                (30, SignalKind::Pre),
                (31, SignalKind::Pre),
                (32, SignalKind::Mid),
                (33, SignalKind::Post),
            ]
        );
    }

    #[test]
    fn test_zero_post_window_drops_post() {
        let mut config = config(dec!(0.12));
        config.macd.post_cross_days = 0;
        let frame = fixtures::frame(&fixtures::v_shape(), &config);
        let column = MacdZeroAxisStrategy::new().evaluate(&frame, &config);

        assert_eq!(column[32], SignalKind::Mid);
        assert_eq!(column[33], SignalKind::NoSignal);
    }

    #[test]
    fn test_cross_during_warmup_feeds_post() {
        use crate::strategies::{classify_inputs, Inputs};
        use trader_core::Cell;

        // 골든크로스가 워밍업 마지막 봉(25)에서 발생, 26에서 히스토그램 상승
        let dif: Vec<Cell> = (0..30)
            .map(|t| match t {
                0..=24 => Some(dec!(-0.05)),
                25 => Some(dec!(0.01)),
                26 => Some(dec!(0.03)),
                _ => Some(dec!(0.02)),
            })
            .collect();
        let dea: Vec<Cell> = vec![Some(Decimal::ZERO); 30];
        let filler: Vec<Cell> = vec![Some(dec!(50)); 30];
        let inputs = Inputs {
            dif: &dif,
            dea: &dea,
            histogram: &dif,
            k: &filler,
            d: &filler,
            j: &filler,
            rsi_short: &filler,
            rsi_long: &filler,
        };

        let config = config(dec!(0.1));
        let mut tracker = PhaseTracker {
            config: &config,
            last_cross: None,
        };
        let column = classify_inputs(&inputs, 30, config.macd.slow_period, |i, t| {
            tracker.classify(i, t)
        });

        assert!(column[..26].iter().all(|k| *k == SignalKind::NoSignal));
        assert_eq!(column[26], SignalKind::Post);
        assert_eq!(column[27], SignalKind::NoSignal);
    }

    #[test]
    fn test_j_exceeds_hundred_on_rebound() {
        // J는 [0, 100] 범위를 벗어날 수 있음
        let config = StrategyConfig::default();
        let frame = fixtures::frame(&fixtures::v_shape(), &config);
        assert!(frame.value("j", 33).unwrap() > dec!(100));
        assert!(frame.value("k", 33).unwrap() <= dec!(100));
    }

    fn closes() -> impl Strategy<Value = Vec<Decimal>> {
        prop::collection::vec(-40i64..40, 30..90).prop_map(|steps| {
            let mut price = dec!(50);
            steps
                .into_iter()
                .map(|s| {
                    price = (price + Decimal::new(s, 2)).max(dec!(1));
                    price
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn phases_are_single_labels(closes in closes(), range in 0i64..50) {
            let config = config(Decimal::new(range, 2));
            let frame = fixtures::frame(&closes, &config);
            let column = MacdZeroAxisStrategy::new().evaluate(&frame, &config);

            prop_assert_eq!(column.len(), closes.len());
            for (t, kind) in column.iter().enumerate() {
                prop_assert!(matches!(
                    kind,
                    SignalKind::NoSignal | SignalKind::Pre | SignalKind::Mid | SignalKind::Post
                ));
                if *kind == SignalKind::Mid {
                    prop_assert_eq!(
                        crossed_above(frame.column("dif").unwrap(), frame.column("dea").unwrap(), t),
                        Some(true)
                    );
                }
                if t < config.macd.slow_period {
                    prop_assert_eq!(*kind, SignalKind::NoSignal);
                }
            }
        }
    }
}
