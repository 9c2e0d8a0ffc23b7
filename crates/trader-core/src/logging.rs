//! tracing 기반 로깅 초기화.
//!
//! 스크리닝 결과 요약은 stdout으로 출력되므로 로그는 항상 stderr로 보냅니다.
//! 레벨 필터는 `RUST_LOG`가 설정되어 있으면 그 값을 우선합니다.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::ParseError,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter, Layer,
};

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 여러 줄, 색상 포함
    #[default]
    Pretty,
    /// 한 줄당 JSON 객체 하나
    Json,
    /// 한 줄 요약
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(format!("알 수 없는 로그 형식: {other} (pretty, json, compact)")),
        }
    }
}

/// 로깅 초기화 오류.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("잘못된 로그 필터: {0}")]
    Filter(#[from] ParseError),

    #[error("로깅이 이미 초기화됨: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// 로깅 설정.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// EnvFilter 지시문 (예: "info", "trader_strategy=debug")
    pub level: String,
    pub format: LogFormat,
    /// 종목별 스크리닝 span의 시작/종료 기록
    pub span_events: bool,
    /// rayon 작업 스레드 ID 출력
    pub thread_ids: bool,
    /// 소스 파일과 줄 번호 출력
    pub source_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            span_events: false,
            thread_ids: false,
            source_location: false,
        }
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    pub fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.thread_ids = enabled;
        self
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    /// `RUST_LOG`가 없거나 비어 있으면 `level`을 사용합니다.
    fn env_filter(&self) -> Result<EnvFilter, ParseError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.level),
        }
    }

    fn fmt_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(self.source_location)
            .with_line_number(self.source_location)
            .with_thread_ids(self.thread_ids)
            .with_span_events(self.span_events());

        match self.format {
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
        }
    }
}

/// 전역 subscriber를 설치합니다. 프로세스당 한 번만 성공합니다.
///
/// ```no_run
/// use trader_core::logging::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::new("debug").with_format(LogFormat::Json)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), LoggingError> {
    let filter = config.env_filter()?;

    tracing_subscriber::registry()
        .with(filter)
        .with(config.fmt_layer())
        .try_init()?;

    tracing::debug!(format = ?config.format, level = %config.level, "로깅 초기화");
    Ok(())
}

/// 종목 코드(와 전략 ID)가 포함된 span을 생성하는 매크로.
#[macro_export]
macro_rules! screening_span {
    ($name:expr, $code:expr) => {
        tracing::info_span!($name, code = %$code)
    };
    ($name:expr, $code:expr, $strategy:expr) => {
        tracing::info_span!($name, code = %$code, strategy = %$strategy)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(" Json ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("COMPACT".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        let err = "xml".parse::<LogFormat>().unwrap_err();
        assert!(err.contains("xml"));
    }

    #[test]
    fn test_log_config_deserialize_partial() {
        let config: LogConfig =
            serde_json::from_str(r#"{"format": "compact", "thread_ids": true}"#).unwrap();
        assert_eq!(
            config,
            LogConfig::new("info")
                .with_format(LogFormat::Compact)
                .with_thread_ids(true)
        );
    }

    #[test]
    fn test_span_events_toggle() {
        assert_eq!(LogConfig::default().span_events(), FmtSpan::NONE);
        assert_eq!(
            LogConfig::default().with_span_events(true).span_events(),
            FmtSpan::NEW | FmtSpan::CLOSE
        );
    }
}
