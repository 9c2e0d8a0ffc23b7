//! # Trader Core
//!
//! 신호 스크리닝 엔진의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 엔진 전반에서 사용되는 기본 타입을 제공합니다:
//! - 일봉 및 일봉 시계열
//! - 배당/분할 이벤트
//! - 매매 신호와 모의 거래 기록
//! - 구분별 가격 제수 설정
//! - 에러 분류
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
