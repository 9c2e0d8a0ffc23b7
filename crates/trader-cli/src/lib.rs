//! CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 일봉 데이터 디렉토리 스크리닝
//! - 전략 목록 조회
//! - 설정 관리 (TOML + 환경 변수)

pub mod commands;
pub mod settings;

pub use settings::AppSettings;
