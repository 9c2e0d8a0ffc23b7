//! 엔진 에러.
//!
//! 데이터 문제는 해당 종목만 건너뛰고, 설정 문제는 배치 시작 전에 실패합니다.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraderError {
    /// 데이터 부족 (컴포넌트 최소 요구 길이 미달)
    #[error("데이터 부족: 필요 {required}개, 제공 {provided}개")]
    InsufficientData { required: usize, provided: usize },

    /// 잘못된 입력 레코드 (OHLC 불변식 위반, 기준가 비양수 등)
    #[error("잘못된 입력: {0}")]
    MalformedInput(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),
}

/// 엔진 작업을 위한 Result 타입.
pub type TraderResult<T> = Result<T, TraderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TraderError::InsufficientData {
            required: 40,
            provided: 12,
        };
        assert_eq!(err.to_string(), "데이터 부족: 필요 40개, 제공 12개");

        let err = TraderError::Config("macd.fast_period must be > 0".to_string());
        assert_eq!(err.to_string(), "설정 에러: macd.fast_period must be > 0");
    }
}
