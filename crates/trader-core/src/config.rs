//! 설정 타입.
//!
//! 이 모듈은 여러 크레이트가 공유하는 설정 조각을 정의합니다:
//! - `LoggingConfig` - 로그 레벨/형식
//! - `SegmentConfig` / `PriceScale` - 시장 구분별 가격 제수

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::error::{TraderError, TraderResult};
use crate::logging::{LogConfig, LogFormat};

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// 종목별 span 시작/종료 기록
    #[serde(default)]
    pub span_events: bool,
    /// 작업 스레드 ID 출력
    #[serde(default)]
    pub thread_ids: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            span_events: false,
            thread_ids: false,
        }
    }
}

impl LoggingConfig {
    /// `LogConfig`로 변환합니다. 알 수 없는 형식은 설정 에러입니다.
    pub fn to_log_config(&self) -> TraderResult<LogConfig> {
        let format: LogFormat = self
            .format
            .parse()
            .map_err(|e| TraderError::Config(format!("logging.format: {e}")))?;
        Ok(LogConfig::new(self.level.clone())
            .with_format(format)
            .with_span_events(self.span_events)
            .with_thread_ids(self.thread_ids))
    }
}

/// 시장 구분(segment)별 가격 설정.
///
/// 원시 가격 아카이브는 구분에 따라 정수 스케일로 저장되는 경우가 있으므로
/// (예: 100배, 1000배), 로더는 이 제수로 나눠 실제 가격을 복원합니다.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SegmentConfig {
    /// 종목 코드 접두사 (예: "sh", "sz", "hk")
    pub prefix: String,
    /// 가격 제수
    #[serde(default = "default_divisor")]
    pub price_divisor: Decimal,
}

fn default_divisor() -> Decimal {
    Decimal::ONE
}

impl SegmentConfig {
    /// 새 구분 설정을 생성합니다.
    pub fn new(prefix: impl Into<String>, price_divisor: Decimal) -> Self {
        Self {
            prefix: prefix.into(),
            price_divisor,
        }
    }
}

/// 구분별 가격 제수 테이블.
///
/// 제수는 항상 설정에서 오며 코드 경로에서 추론하지 않습니다.
/// 여러 접두사가 일치하면 가장 긴 접두사가 우선합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PriceScale {
    segments: Vec<SegmentConfig>,
}

impl PriceScale {
    /// 구분 목록으로 테이블을 생성합니다.
    pub fn new(segments: Vec<SegmentConfig>) -> Self {
        Self { segments }
    }

    /// 구분을 추가합니다.
    pub fn with_segment(mut self, segment: SegmentConfig) -> Self {
        self.segments.push(segment);
        self
    }

    /// 등록된 구분 목록.
    pub fn segments(&self) -> &[SegmentConfig] {
        &self.segments
    }

    /// 제수가 모두 양수인지 검증합니다.
    pub fn validate(&self) -> TraderResult<()> {
        for segment in &self.segments {
            if segment.price_divisor <= Decimal::ZERO {
                return Err(TraderError::Config(format!(
                    "segment '{}' price_divisor must be > 0, got {}",
                    segment.prefix, segment.price_divisor
                )));
            }
        }
        Ok(())
    }

    /// 종목 코드에 적용할 제수를 반환합니다 (일치하는 구분이 없으면 1).
    pub fn divisor_for(&self, code: &str) -> Decimal {
        self.segments
            .iter()
            .filter(|s| code.starts_with(s.prefix.as_str()))
            .max_by_key(|s| s.prefix.len())
            .map(|s| s.price_divisor)
            .unwrap_or(Decimal::ONE)
    }

    /// 원시 봉을 종목 구분의 제수로 나눈 실제 가격 봉으로 변환합니다.
    pub fn scale_bar(&self, code: &str, raw: &Bar) -> Bar {
        raw.scaled(self.divisor_for(code))
    }
}
