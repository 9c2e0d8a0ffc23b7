//! 신호 전략, 전략 레지스트리, 배치 스크리닝.
//!
//! 이 크레이트가 제공하는 기능:
//! - 지표 프레임을 봉 단위 신호로 분류하는 `Strategy` trait
//! - 내장 전략 (크로스 전 조기 경보, 트리플 크로스, MACD 제로축 출발)
//! - 전략 설정과 부분 덮어쓰기
//! - 종목 단위 병렬 스크리닝 및 백테스트 리포트
//!
//! # 예제
//!
//! ```rust,ignore
//! use trader_analytics::backtest::BacktestConfig;
//! use trader_strategy::{InstrumentData, Screener, ScreeningOptions, StrategyConfigOverrides, StrategyRegistry};
//!
//! let registry = StrategyRegistry::with_builtin();
//! let screener = Screener::new(
//!     &registry,
//!     ScreeningOptions::default().with_strategy("triple_cross"),
//!     &StrategyConfigOverrides::default(),
//!     BacktestConfig::default(),
//! )?;
//!
//! let report = screener.run(&instruments)?;
//! println!("{}", report.summary());
//! ```

pub mod config;
pub mod engine;
pub mod registry;
pub mod screening;
pub mod strategies;
pub mod traits;

// 주요 타입 재내보내기
pub use config::{
    BollingerConfig, ConfigError, KdjConfig, MaConfig, MacdConfig, RsiConfig, StrategyConfig,
    StrategyConfigBuilder, StrategyConfigOverrides,
};
pub use engine::{SignalEngine, SignalOutcome};
pub use registry::StrategyRegistry;
pub use screening::{
    InstrumentData, InstrumentOutcome, Screener, ScreeningError, ScreeningOptions, ScreeningReport,
    SkipReason, SkippedInstrument,
};
pub use strategies::{MacdZeroAxisStrategy, PreCrossStrategy, TripleCrossStrategy};
pub use traits::{SignalColumn, Strategy, StrategyMetadata, WARMUP_BUFFER};
