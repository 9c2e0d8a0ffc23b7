//! 신호 엔진.
//!
//! 전략 하나와 확정된 설정으로 종목별 지표 프레임을 만들고,
//! 봉 단위 분류 결과를 `SignalEvent` 목록으로 변환합니다.

use std::sync::Arc;

use tracing::debug;
use trader_analytics::indicators::IndicatorFrame;
use trader_core::{BarSeries, SignalEvent, TraderError, TraderResult};

use crate::config::{ConfigError, StrategyConfig, StrategyConfigBuilder, StrategyConfigOverrides};
use crate::registry::StrategyRegistry;
use crate::traits::{SignalColumn, Strategy};

/// 종목 하나의 평가 결과.
#[derive(Debug, Clone)]
pub struct SignalOutcome {
    /// 계산된 지표 프레임
    pub frame: IndicatorFrame,
    /// 봉별 분류
    pub column: SignalColumn,
    /// 신호가 있는 봉의 이벤트 (날짜순)
    pub events: Vec<SignalEvent>,
}

/// 신호 엔진.
#[derive(Clone)]
pub struct SignalEngine {
    strategy: Arc<dyn Strategy>,
    config: StrategyConfig,
}

impl std::fmt::Debug for SignalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalEngine")
            .field("strategy", &self.strategy.id())
            .field("config", &self.config)
            .finish()
    }
}

impl SignalEngine {
    /// 검증된 설정으로 엔진을 생성합니다.
    pub fn new(strategy: Arc<dyn Strategy>, config: StrategyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { strategy, config })
    }

    /// 레지스트리에서 전략을 찾고, 전략 기본 설정에 덮어쓰기를 병합합니다.
    pub fn from_registry(
        registry: &StrategyRegistry,
        strategy_id: &str,
        overrides: &StrategyConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let strategy = registry.resolve(strategy_id)?;
        let config = StrategyConfigBuilder::new(strategy.default_config())
            .apply(overrides)
            .build()?;
        Ok(Self { strategy, config })
    }

    /// 전략 참조
    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    /// 설정 참조
    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// 평가에 필요한 최소 봉 수
    pub fn required_minimum_bars(&self) -> usize {
        self.strategy.required_minimum_bars(&self.config)
    }

    /// 종목 하나를 평가합니다.
    ///
    /// # 반환
    /// 봉 수가 최소 요구량보다 적으면 `TraderError::InsufficientData`
    pub fn evaluate(&self, series: &BarSeries) -> TraderResult<SignalOutcome> {
        let required = self.required_minimum_bars();
        if series.len() < required {
            return Err(TraderError::InsufficientData {
                required,
                provided: series.len(),
            });
        }

        let frame = IndicatorFrame::build(series.clone(), &self.config.frame_spec());
        let column = self.strategy.evaluate(&frame, &self.config);
        let events = self.collect_events(&frame, &column);

        debug!(
            code = series.code(),
            strategy = self.strategy.id(),
            signals = events.len(),
            "종목 평가 완료"
        );

        Ok(SignalOutcome {
            frame,
            column,
            events,
        })
    }

    fn collect_events(&self, frame: &IndicatorFrame, column: &SignalColumn) -> Vec<SignalEvent> {
        column
            .iter()
            .enumerate()
            .filter(|(_, kind)| kind.is_signal())
            .filter_map(|(t, &kind)| {
                let bar = frame.bar(t)?;
                let mut event = SignalEvent::new(frame.code(), bar.date, kind, bar.close, self.strategy.id());
                event.detail = self.strategy.evidence(frame, &self.config, t);
                Some(event)
            })
            .collect()
    }
}
