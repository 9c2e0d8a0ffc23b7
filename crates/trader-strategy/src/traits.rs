//! Strategy trait 정의.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use trader_analytics::indicators::{names, IndicatorFrame};
use trader_core::SignalKind;

use crate::config::StrategyConfig;

/// 봉마다 하나씩 대응하는 신호 분류.
pub type SignalColumn = Vec<SignalKind>;

/// 신호 전략을 구현하기 위한 Strategy trait.
///
/// 모든 전략은 레지스트리에 등록되기 위해 이 trait를 구현해야 합니다.
/// `evaluate`는 봉 `t`의 판정에 `t` 이후 데이터를 사용하지 않으며,
/// 판정에 필요한 지표가 하나라도 정의되지 않으면 `NoSignal`입니다.
pub trait Strategy: Send + Sync {
    /// 전략 ID (영문, snake_case).
    fn id(&self) -> &'static str;

    /// 전략 이름 반환.
    fn name(&self) -> &str;

    /// 전략 버전 반환.
    fn version(&self) -> &str;

    /// 전략 설명 반환.
    fn description(&self) -> &str;

    /// 진입으로 취급할 신호 종류.
    fn entry_kinds(&self) -> &'static [SignalKind];

    /// 평가에 필요한 최소 봉 수.
    ///
    /// 가장 느린 지표의 기간에 여유분을 더한 값입니다.
    fn required_minimum_bars(&self, config: &StrategyConfig) -> usize {
        let macd = config.macd.slow_period + config.macd.signal_period;
        let rsi = config.rsi.long_period + 1;
        macd.max(config.kdj.n).max(rsi) + WARMUP_BUFFER
    }

    /// 기본 설정.
    fn default_config(&self) -> StrategyConfig {
        StrategyConfig::default()
    }

    /// 프레임 전체를 봉 단위로 분류합니다.
    fn evaluate(&self, frame: &IndicatorFrame, config: &StrategyConfig) -> SignalColumn;

    /// 신호에 첨부할 지표 열.
    fn evidence_columns(&self, config: &StrategyConfig) -> Vec<String> {
        vec![
            names::DIF.to_string(),
            names::DEA.to_string(),
            names::MACD_BAR.to_string(),
            names::K.to_string(),
            names::D.to_string(),
            names::J.to_string(),
            names::rsi(config.rsi.short_period),
            names::rsi(config.rsi.long_period),
        ]
    }

    /// `t` 시점의 근거 지표 스냅샷. 정의되지 않은 값은 제외합니다.
    fn evidence(&self, frame: &IndicatorFrame, config: &StrategyConfig, t: usize) -> BTreeMap<String, Decimal> {
        self.evidence_columns(config)
            .into_iter()
            .filter_map(|name| frame.value(&name, t).map(|v| (name, v)))
            .collect()
    }

    /// 목록 표시용 메타데이터.
    fn metadata(&self) -> StrategyMetadata {
        StrategyMetadata {
            id: self.id().to_string(),
            name: self.name().to_string(),
            version: self.version().to_string(),
            description: self.description().to_string(),
            entry_kinds: self.entry_kinds().to_vec(),
            required_minimum_bars: self.required_minimum_bars(&self.default_config()),
        }
    }
}

/// 최소 봉 수 여유분.
pub const WARMUP_BUFFER: usize = 5;

/// 전략 메타데이터.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyMetadata {
    /// 전략 ID
    pub id: String,
    /// 전략 이름
    pub name: String,
    /// 전략 버전
    pub version: String,
    /// 전략 설명
    pub description: String,
    /// 진입 신호 종류
    pub entry_kinds: Vec<SignalKind>,
    /// 기본 설정 기준 최소 봉 수
    pub required_minimum_bars: usize,
}
