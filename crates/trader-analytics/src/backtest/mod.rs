//! 백테스팅 모듈
//!
//! 신호 발생일부터 일봉을 재생해 모의 거래를 만들고 성과를 집계합니다.
//!
//! # 주요 구성요소
//!
//! - [`BacktestConfig`]: 백테스트 설정 (청산 정책, 보유기간 상한, 점수 파라미터)
//! - [`BacktestSimulator`]: 종목 단위 시뮬레이터
//! - [`ExitPolicy`]: 경쟁하는 청산 정책
//! - [`BacktestReport`]: 여러 종목의 거래와 요약 통계

pub mod engine;
pub mod exit;
pub mod report;

pub use engine::{
    BacktestConfig, BacktestError, BacktestResult, BacktestSimulator,
    InstrumentBacktest,
};
pub use exit::{ExitDecision, ExitEvaluator, ExitPolicy};
pub use report::{score_trades, BacktestReport, BacktestSummary, PolicyStats, ScoreParams};
