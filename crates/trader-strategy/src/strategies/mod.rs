//! 내장 신호 전략.
//!
//! 이 모듈은 MACD/KDJ/RSI 조합 전략을 제공합니다:
//!
//! - **Pre-Cross**: 골든크로스 직전 (KDJ 정배열 + 히스토그램 상승 + RSI 상승). `PRE` 신호.
//! - **Triple Cross**: MACD, KDJ, RSI 단기/장기가 같은 봉에서 동시에 골든크로스. `BUY` 신호.
//! - **MACD Zero-Axis Start**: 히스토그램이 0 근처에서 상승하는 구간을
//!   크로스 전(`PRE`), 크로스 봉(`MID`), 크로스 후(`POST`)로 구분.
//!
//! 모든 전략은 MACD 장기 기간 이전 봉에서는 신호를 내지 않습니다.

pub mod macd_zero_axis;
pub mod pre_cross;
pub mod triple_cross;

pub use macd_zero_axis::MacdZeroAxisStrategy;
pub use pre_cross::PreCrossStrategy;
pub use triple_cross::TripleCrossStrategy;

use trader_analytics::indicators::{names, IndicatorFrame};
use trader_core::{Cell, SignalKind};

use crate::config::StrategyConfig;
use crate::traits::SignalColumn;

/// 전략이 읽는 지표 열 묶음.
pub(crate) struct Inputs<'a> {
    pub dif: &'a [Cell],
    pub dea: &'a [Cell],
    pub histogram: &'a [Cell],
    pub k: &'a [Cell],
    pub d: &'a [Cell],
    pub j: &'a [Cell],
    pub rsi_short: &'a [Cell],
    pub rsi_long: &'a [Cell],
}

impl<'a> Inputs<'a> {
    /// 프레임에서 필요한 열을 찾습니다. 하나라도 없으면 `None`.
    pub(crate) fn resolve(frame: &'a IndicatorFrame, config: &StrategyConfig) -> Option<Self> {
        Some(Self {
            dif: frame.column(names::DIF)?,
            dea: frame.column(names::DEA)?,
            histogram: frame.column(names::MACD_BAR)?,
            k: frame.column(names::K)?,
            d: frame.column(names::D)?,
            j: frame.column(names::J)?,
            rsi_short: frame.column(&names::rsi(config.rsi.short_period))?,
            rsi_long: frame.column(&names::rsi(config.rsi.long_period))?,
        })
    }
}

/// 봉 단위 분류 루프.
///
/// MACD 장기 기간 이전 봉과 `classify`가 `None`을 돌려준 봉은 `NoSignal`입니다.
pub(crate) fn classify_bars<F>(frame: &IndicatorFrame, config: &StrategyConfig, classify: F) -> SignalColumn
where
    F: FnMut(&Inputs<'_>, usize) -> Option<SignalKind>,
{
    match Inputs::resolve(frame, config) {
        Some(inputs) => classify_inputs(&inputs, frame.len(), config.macd.slow_period, classify),
        None => vec![SignalKind::NoSignal; frame.len()],
    }
}

/// `classify`는 워밍업 봉을 포함한 모든 봉에 시간 순서대로 호출되므로
/// 상태(예: 최근 교차 위치)를 누적할 수 있습니다. 워밍업 봉의 결과만 버립니다.
pub(crate) fn classify_inputs<F>(
    inputs: &Inputs<'_>,
    len: usize,
    warmup: usize,
    mut classify: F,
) -> SignalColumn
where
    F: FnMut(&Inputs<'_>, usize) -> Option<SignalKind>,
{
    (0..len)
        .map(|t| {
            let kind = classify(inputs, t);
            if t < warmup {
                SignalKind::NoSignal
            } else {
                kind.unwrap_or(SignalKind::NoSignal)
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! 전략 테스트용 일봉 시계열.

    use chrono::{Days, NaiveDate};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use trader_analytics::indicators::IndicatorFrame;
    use trader_core::{Bar, BarSeries};

    use crate::config::StrategyConfig;

    /// 종가 목록으로 고가/저가 = 종가 ± 0.05 인 시계열을 만듭니다.
    pub fn series(closes: &[Decimal]) -> BarSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Bar::new(
                    start + Days::new(i as u64),
                    c,
                    c + dec!(0.05),
                    c - dec!(0.05),
                    c,
                    dec!(10000),
                )
            })
            .collect();
        BarSeries::new("000001", bars).unwrap()
    }

    /// 30봉 하락 후 30봉 상승 (0.25 단위).
    pub fn v_shape() -> Vec<Decimal> {
        let step = dec!(0.25);
        let bottom = dec!(20) - step * Decimal::from(29);
        (0..30)
            .map(|i| dec!(20) - step * Decimal::from(i))
            .chain((0..30).map(|i| bottom + step * Decimal::from(i + 1)))
            .collect()
    }

    /// 인덱스 34에서 MACD/KDJ/RSI가 동시에 골든크로스하는 50봉.
    pub fn triple_cross() -> Vec<Decimal> {
        [
            "10.0", "10.2", "10.4", "10.1", "10.0", "9.7", "9.6", "9.4", "9.2", "9.1", "8.8", "8.9",
            "9.0", "9.2", "9.1", "9.2", "9.0", "8.9", "8.8", "9.0", "9.2", "8.9", "9.2", "9.4",
            "9.1", "8.9", "8.7", "8.8", "8.6", "8.8", "8.9", "8.7", "8.6", "8.5", "8.8", "8.9",
            "8.6", "8.8", "8.6", "8.9", "8.7", "8.9", "8.6", "8.9", "8.7", "9.0", "8.9", "8.6",
            "8.3", "8.0",
        ]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect()
    }

    /// 설정에 맞는 프레임.
    pub fn frame(closes: &[Decimal], config: &StrategyConfig) -> IndicatorFrame {
        IndicatorFrame::build(series(closes), &config.frame_spec())
    }
}
