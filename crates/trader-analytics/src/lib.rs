//! 분석 및 백테스팅 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 수정주가 계산 (배당/분할/배정)
//! - 기술적 지표와 지표 프레임
//! - 신호 백테스팅 (경쟁 청산 정책, 점수, 리포트)
//!
//! # Re-exports
//!
//! - [`adjustment`]: 수정주가 (AdjustmentMode, adjust)
//! - [`indicators`]: 기술적 지표 (IndicatorEngine, IndicatorFrame 등)
//! - [`backtest`]: 백테스트 (BacktestSimulator, BacktestReport 등)

pub mod adjustment;
pub mod backtest;
pub mod indicators;

// Adjustment 모듈 re-exports
pub use adjustment::{adjust, adjustment_factors, AdjustmentMode};

// Backtest 모듈 re-exports
pub use backtest::{
    BacktestConfig, BacktestError, BacktestReport, BacktestResult, BacktestSimulator, ExitPolicy,
    InstrumentBacktest, PolicyStats,
};

// Indicators 모듈 re-exports
pub use indicators::{
    // 변동성 지표
    AtrParams,
    BollingerBandsParams,
    BollingerBandsResult,
    Column,
    EmaParams,
    FrameSpec,
    IndicatorEngine,
    IndicatorFrame,
    // 모멘텀 지표
    KdjParams,
    KdjResult,
    // 추세 지표
    MacdParams,
    MacdResult,
    MomentumCalculator,
    RsiParams,
    SmaParams,
    TrendIndicators,
    VolatilityIndicators,
};
