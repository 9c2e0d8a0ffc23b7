//! 프리크로스 전략.
//!
//! MACD 골든크로스가 임박한 봉을 찾습니다. 세 조건이 같은 봉에서 모두 성립해야 합니다.
//!
//! 1. KDJ: J > K > D, K 상승, D < `kdj.d_low_threshold`
//! 2. MACD: 히스토그램 상승, DIF < DEA, DEA < `macd.dea_threshold`
//! 3. RSI: 단기 RSI 상승, 단기 RSI < `rsi.neutral_ceiling`

use trader_analytics::indicators::{at, rising, IndicatorFrame};
use trader_core::SignalKind;

use super::{classify_bars, Inputs};
use crate::config::StrategyConfig;
use crate::traits::{SignalColumn, Strategy};

/// 프리크로스 전략.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreCrossStrategy;

impl PreCrossStrategy {
    /// 전략 ID
    pub const ID: &'static str = "pre_cross";

    /// 새 전략 생성.
    pub fn new() -> Self {
        Self
    }

    fn classify(inputs: &Inputs<'_>, config: &StrategyConfig, t: usize) -> Option<SignalKind> {
        let (k, d, j) = (at(inputs.k, t)?, at(inputs.d, t)?, at(inputs.j, t)?);
        let kdj_ready = j > k && k > d && rising(inputs.k, t)? && d < config.kdj.d_low_threshold;

        let (dif, dea) = (at(inputs.dif, t)?, at(inputs.dea, t)?);
        let macd_ready = rising(inputs.histogram, t)? && dif < dea && dea < config.macd.dea_threshold;

        let rsi = at(inputs.rsi_short, t)?;
        let rsi_ready = rising(inputs.rsi_short, t)? && rsi < config.rsi.neutral_ceiling;

        Some(if kdj_ready && macd_ready && rsi_ready {
            SignalKind::Pre
        } else {
            SignalKind::NoSignal
        })
    }
}

impl Strategy for PreCrossStrategy {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Pre-Cross"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn description(&self) -> &str {
        "KDJ 정배열, MACD 히스토그램 상승, 단기 RSI 상승이 동시에 나타나는 골든크로스 직전 구간"
    }

    fn entry_kinds(&self) -> &'static [SignalKind] {
        &[SignalKind::Pre]
    }

    fn evaluate(&self, frame: &IndicatorFrame, config: &StrategyConfig) -> SignalColumn {
        classify_bars(frame, config, |inputs, t| Self::classify(inputs, config, t))
    }
}
