//! 트리플 크로스 전략.
//!
//! MACD(DIF/DEA), KDJ(K/D), RSI(단기/장기)가 같은 봉에서 모두 골든크로스하고,
//! 그 봉의 DEA < `macd.dea_ceiling`, D < `kdj.d_ceiling`이면 `BUY`.

use trader_analytics::indicators::{at, crossed_above, IndicatorFrame};
use trader_core::SignalKind;

use super::{classify_bars, Inputs};
use crate::config::StrategyConfig;
use crate::traits::{SignalColumn, Strategy};

/// 트리플 크로스 전략.
#[derive(Debug, Clone, Copy, Default)]
pub struct TripleCrossStrategy;

impl TripleCrossStrategy {
    /// 전략 ID
    pub const ID: &'static str = "triple_cross";

    /// 새 전략 생성.
    pub fn new() -> Self {
        Self
    }

    fn classify(inputs: &Inputs<'_>, config: &StrategyConfig, t: usize) -> Option<SignalKind> {
        let macd_cross = crossed_above(inputs.dif, inputs.dea, t)?;
        let kdj_cross = crossed_above(inputs.k, inputs.d, t)?;
        let rsi_cross = crossed_above(inputs.rsi_short, inputs.rsi_long, t)?;
        let low_enough = at(inputs.dea, t)? < config.macd.dea_ceiling && at(inputs.d, t)? < config.kdj.d_ceiling;

        Some(if macd_cross && kdj_cross && rsi_cross && low_enough {
            SignalKind::Buy
        } else {
            SignalKind::NoSignal
        })
    }
}

impl Strategy for TripleCrossStrategy {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Triple Cross"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn description(&self) -> &str {
        "MACD, KDJ, RSI 단기/장기가 같은 봉에서 동시에 골든크로스"
    }

    fn entry_kinds(&self) -> &'static [SignalKind] {
        &[SignalKind::Buy]
    }

    fn evaluate(&self, frame: &IndicatorFrame, config: &StrategyConfig) -> SignalColumn {
        classify_bars(frame, config, |inputs, t| Self::classify(inputs, config, t))
    }
}
