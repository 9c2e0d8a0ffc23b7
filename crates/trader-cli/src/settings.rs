//! 애플리케이션 설정.
//!
//! TOML 파일과 환경 변수(`TRADER__` 접두사, `__` 구분자)를 병합합니다.
//!
//! ```toml
//! [logging]
//! level = "debug"
//! thread_ids = true
//!
//! [screening]
//! strategy = "triple_cross"
//! adjust = "forward"
//! workers = 4
//!
//! [strategy.macd]
//! zero_axis_range = 0.12
//!
//! [backtest]
//! max_holding_days = 30
//!
//! [[segments]]
//! prefix = "sh"
//! price_divisor = 100
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use trader_analytics::backtest::BacktestConfig;
use trader_core::{LoggingConfig, PriceScale};
use trader_strategy::{ScreeningOptions, StrategyConfigOverrides};

/// 환경 변수 접두사
pub const ENV_PREFIX: &str = "TRADER";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSettings {
    /// 로깅
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 스크리닝 옵션
    #[serde(default)]
    pub screening: ScreeningOptions,
    /// 전략 설정 덮어쓰기
    #[serde(default)]
    pub strategy: StrategyConfigOverrides,
    /// 백테스트 설정
    #[serde(default)]
    pub backtest: BacktestConfig,
    /// 구분별 가격 제수
    #[serde(default)]
    pub segments: PriceScale,
}

impl AppSettings {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| match path {
                Some(p) => format!("설정 로드 실패: {}", p.display()),
                None => "설정 로드 실패".to_string(),
            })?;

        settings.validate()?;
        Ok(settings)
    }

    /// TOML 문자열에서 설정을 로드합니다 (환경 변수 미적용).
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let settings: Self = config::Config::builder()
            .add_source(config::File::from_str(s, config::FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .context("설정 파싱 실패")?;

        settings.validate()?;
        Ok(settings)
    }

    /// 로그 형식, 백테스트 설정과 가격 제수를 검증합니다.
    ///
    /// 전략 설정은 전략 기본값과 병합할 때 검증됩니다.
    pub fn validate(&self) -> Result<()> {
        self.logging
            .to_log_config()
            .context("logging 설정 오류")?;
        self.backtest
            .validate()
            .context("backtest 설정 오류")?;
        self.segments
            .validate()
            .context("segments 설정 오류")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use trader_analytics::adjustment::AdjustmentMode;

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = AppSettings::from_toml_str("").unwrap();
        assert_eq!(settings.screening, ScreeningOptions::default());
        assert!(settings.strategy.is_empty());
        assert_eq!(settings.backtest, BacktestConfig::default());
        assert!(settings.segments.segments().is_empty());
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_full_settings() {
        let settings = AppSettings::from_toml_str(
            r#"
            [logging]
            level = "debug"
            format = "json"

            [screening]
            strategy = "triple_cross"
            adjust = "forward"
            workers = 2

            [strategy.kdj]
            d_ceiling = 40

            [backtest]
            max_holding_days = 30

            [[segments]]
            prefix = "sh"
            price_divisor = 100
            "#,
        )
        .unwrap();

        assert_eq!(settings.logging.format, "json");
        assert_eq!(settings.screening.strategy, "triple_cross");
        assert_eq!(settings.screening.adjust, AdjustmentMode::Forward);
        assert_eq!(settings.screening.workers, Some(2));
        assert!(!settings.strategy.is_empty());
        assert_eq!(settings.backtest.max_holding_days, 30);
        assert_eq!(settings.segments.divisor_for("sh600000"), dec!(100));
        assert_eq!(settings.segments.divisor_for("sz000001"), dec!(1));
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        assert!(AppSettings::from_toml_str("[backtest]\nmax_holding_days = 0\n").is_err());
        assert!(AppSettings::from_toml_str("[[segments]]\nprefix = \"sh\"\nprice_divisor = 0\n").is_err());
        assert!(AppSettings::from_toml_str("[strategy.macd]\nfast = 5\n").is_err());
        assert!(AppSettings::from_toml_str("[logging]\nformat = \"xml\"\n").is_err());
    }
}
