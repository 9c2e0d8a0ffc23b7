//! 전략 설정.
//!
//! 지표 구간별로 나뉜 타입 있는 설정(`StrategyConfig`)과,
//! 사용자가 일부 필드만 덮어쓰는 `StrategyConfigOverrides`를 제공합니다.
//! 병합은 `StrategyConfigBuilder`가 필드 단위로 수행하며,
//! 선언되지 않은 키는 `ConfigError::UnknownKey`로 거부됩니다.
//!
//! ```
//! use trader_strategy::config::{StrategyConfig, StrategyConfigBuilder, StrategyConfigOverrides};
//!
//! let overrides = StrategyConfigOverrides::from_json_str(r#"{"macd": {"zero_axis_range": "0.12"}}"#).unwrap();
//! let config = StrategyConfigBuilder::new(StrategyConfig::default())
//!     .apply(&overrides)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.macd.slow_period, 26);
//! assert_eq!(config.macd.zero_axis_range.to_string(), "0.12");
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trader_analytics::indicators::{BollingerBandsParams, FrameSpec, KdjParams, MacdParams};
use trader_core::TraderError;

/// 설정 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 선언되지 않은 설정 키
    #[error("알 수 없는 설정 키: {0}")]
    UnknownKey(String),

    /// 값 범위 오류
    #[error("잘못된 설정 값 {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// 등록되지 않은 전략
    #[error("알 수 없는 전략: {0}")]
    UnknownStrategy(String),

    /// 파싱 실패
    #[error("설정 파싱 실패: {0}")]
    Parse(String),
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// serde 에러 메시지를 분류합니다.
    fn from_serde_message(message: String) -> Self {
        const MARKER: &str = "unknown field `";
        if let Some(start) = message.find(MARKER) {
            let rest = &message[start + MARKER.len()..];
            if let Some(end) = rest.find('`') {
                return Self::UnknownKey(rest[..end].to_string());
            }
        }
        Self::Parse(message)
    }
}

impl From<ConfigError> for TraderError {
    fn from(err: ConfigError) -> Self {
        TraderError::Config(err.to_string())
    }
}

// ================================================================================================
// 설정 구간
// ================================================================================================

/// MACD 구간.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdConfig {
    /// 단기 EMA 기간
    pub fast_period: usize,
    /// 장기 EMA 기간
    pub slow_period: usize,
    /// 시그널(DEA) 기간
    pub signal_period: usize,
    /// 프리크로스: DEA 상한
    pub dea_threshold: Decimal,
    /// 트리플 크로스: DEA 상한
    pub dea_ceiling: Decimal,
    /// 제로축: 히스토그램 허용 범위 (±)
    pub zero_axis_range: Decimal,
    /// 제로축: 골든크로스 이후 POST 유지 봉 수
    pub post_cross_days: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
            dea_threshold: Decimal::ZERO,
            dea_ceiling: Decimal::ZERO,
            zero_axis_range: dec!(0.1),
            post_cross_days: 3,
        }
    }
}

/// KDJ 구간.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdjConfig {
    /// RSV 기간
    pub n: usize,
    /// K 평활 기간
    pub k_period: usize,
    /// D 평활 기간
    pub d_period: usize,
    /// 프리크로스: D 상한
    pub d_low_threshold: Decimal,
    /// 트리플 크로스: D 상한
    pub d_ceiling: Decimal,
}

impl Default for KdjConfig {
    fn default() -> Self {
        Self {
            n: 9,
            k_period: 3,
            d_period: 3,
            d_low_threshold: dec!(30),
            d_ceiling: dec!(50),
        }
    }
}

/// RSI 구간.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsiConfig {
    /// 단기 RSI 기간
    pub short_period: usize,
    /// 장기 RSI 기간
    pub long_period: usize,
    /// 프리크로스: 단기 RSI 상한
    pub neutral_ceiling: Decimal,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            short_period: 6,
            long_period: 12,
            neutral_ceiling: dec!(50),
        }
    }
}

/// 볼린저 밴드 구간.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BollingerConfig {
    /// 기간
    pub period: usize,
    /// 표준편차 배수
    pub std_dev_multiplier: Decimal,
}

impl Default for BollingerConfig {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: dec!(2),
        }
    }
}

/// 이동평균 구간.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaConfig {
    /// 계산할 이동평균 기간
    pub periods: Vec<usize>,
}

impl Default for MaConfig {
    fn default() -> Self {
        Self {
            periods: vec![5, 10, 20, 60],
        }
    }
}

/// 전략 설정.
///
/// 한 번 만들어지면 실행 동안 바뀌지 않으며 모든 종목이 공유합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub macd: MacdConfig,
    pub kdj: KdjConfig,
    pub rsi: RsiConfig,
    pub bollinger: BollingerConfig,
    pub ma: MaConfig,
}

impl StrategyConfig {
    /// MACD 지표 파라미터
    pub fn macd_params(&self) -> MacdParams {
        MacdParams {
            fast_period: self.macd.fast_period,
            slow_period: self.macd.slow_period,
            signal_period: self.macd.signal_period,
        }
    }

    /// KDJ 지표 파라미터
    pub fn kdj_params(&self) -> KdjParams {
        KdjParams {
            n: self.kdj.n,
            k_period: self.kdj.k_period,
            d_period: self.kdj.d_period,
        }
    }

    /// 지표 프레임 구성
    pub fn frame_spec(&self) -> FrameSpec {
        FrameSpec::default()
            .with_ma_periods(self.ma.periods.clone())
            .with_rsi_periods(vec![self.rsi.short_period, self.rsi.long_period])
            .with_macd(self.macd_params())
            .with_kdj(self.kdj_params())
            .with_bollinger(BollingerBandsParams {
                period: self.bollinger.period,
                std_dev_multiplier: self.bollinger.std_dev_multiplier,
            })
    }

    /// 설정 유효성 검사
    pub fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("macd.fast_period", self.macd.fast_period),
            ("macd.slow_period", self.macd.slow_period),
            ("macd.signal_period", self.macd.signal_period),
            ("kdj.n", self.kdj.n),
            ("kdj.k_period", self.kdj.k_period),
            ("kdj.d_period", self.kdj.d_period),
            ("rsi.short_period", self.rsi.short_period),
            ("rsi.long_period", self.rsi.long_period),
            ("bollinger.period", self.bollinger.period),
        ];
        for (key, value) in periods {
            if value == 0 {
                return Err(ConfigError::invalid(key, "기간은 0보다 커야 합니다"));
            }
        }
        if self.ma.periods.iter().any(|&p| p == 0) {
            return Err(ConfigError::invalid("ma.periods", "기간은 0보다 커야 합니다"));
        }

        if self.macd.fast_period >= self.macd.slow_period {
            return Err(ConfigError::invalid(
                "macd.fast_period",
                "단기 기간은 장기 기간보다 작아야 합니다",
            ));
        }
        if self.rsi.short_period >= self.rsi.long_period {
            return Err(ConfigError::invalid(
                "rsi.short_period",
                "단기 기간은 장기 기간보다 작아야 합니다",
            ));
        }

        if self.macd.zero_axis_range < Decimal::ZERO {
            return Err(ConfigError::invalid("macd.zero_axis_range", "0 이상이어야 합니다"));
        }
        if self.bollinger.std_dev_multiplier < Decimal::ZERO {
            return Err(ConfigError::invalid(
                "bollinger.std_dev_multiplier",
                "0 이상이어야 합니다",
            ));
        }

        let percent_bounded = [
            ("kdj.d_low_threshold", self.kdj.d_low_threshold),
            ("kdj.d_ceiling", self.kdj.d_ceiling),
            ("rsi.neutral_ceiling", self.rsi.neutral_ceiling),
        ];
        for (key, value) in percent_bounded {
            if value < Decimal::ZERO || value > dec!(100) {
                return Err(ConfigError::invalid(key, "0과 100 사이여야 합니다"));
            }
        }

        Ok(())
    }
}

// ================================================================================================
// 덮어쓰기
// ================================================================================================

/// MACD 덮어쓰기.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MacdOverrides {
    pub fast_period: Option<usize>,
    pub slow_period: Option<usize>,
    pub signal_period: Option<usize>,
    pub dea_threshold: Option<Decimal>,
    pub dea_ceiling: Option<Decimal>,
    pub zero_axis_range: Option<Decimal>,
    pub post_cross_days: Option<usize>,
}

/// KDJ 덮어쓰기.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KdjOverrides {
    pub n: Option<usize>,
    pub k_period: Option<usize>,
    pub d_period: Option<usize>,
    pub d_low_threshold: Option<Decimal>,
    pub d_ceiling: Option<Decimal>,
}

/// RSI 덮어쓰기.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RsiOverrides {
    pub short_period: Option<usize>,
    pub long_period: Option<usize>,
    pub neutral_ceiling: Option<Decimal>,
}

/// 볼린저 밴드 덮어쓰기.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BollingerOverrides {
    pub period: Option<usize>,
    pub std_dev_multiplier: Option<Decimal>,
}

/// 이동평균 덮어쓰기.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaOverrides {
    pub periods: Option<Vec<usize>>,
}

/// 사용자 부분 설정. 모든 필드가 선택 사항입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyConfigOverrides {
    pub macd: Option<MacdOverrides>,
    pub kdj: Option<KdjOverrides>,
    pub rsi: Option<RsiOverrides>,
    pub bollinger: Option<BollingerOverrides>,
    pub ma: Option<MaOverrides>,
}

impl StrategyConfigOverrides {
    /// JSON 문자열에서 파싱합니다.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|e| ConfigError::from_serde_message(e.to_string()))
    }

    /// TOML 문자열에서 파싱합니다.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::from_serde_message(e.to_string()))
    }

    /// 덮어쓸 값이 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// 필드 단위 병합 빌더.
#[derive(Debug, Clone)]
pub struct StrategyConfigBuilder {
    config: StrategyConfig,
}

fn set<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

impl StrategyConfigBuilder {
    /// 기본값에서 시작합니다.
    pub fn new(defaults: StrategyConfig) -> Self {
        Self { config: defaults }
    }

    /// 덮어쓰기를 적용합니다. 지정되지 않은 필드는 기존 값을 유지합니다.
    pub fn apply(mut self, overrides: &StrategyConfigOverrides) -> Self {
        let c = &mut self.config;

        if let Some(o) = &overrides.macd {
            set(&mut c.macd.fast_period, &o.fast_period);
            set(&mut c.macd.slow_period, &o.slow_period);
            set(&mut c.macd.signal_period, &o.signal_period);
            set(&mut c.macd.dea_threshold, &o.dea_threshold);
            set(&mut c.macd.dea_ceiling, &o.dea_ceiling);
            set(&mut c.macd.zero_axis_range, &o.zero_axis_range);
            set(&mut c.macd.post_cross_days, &o.post_cross_days);
        }
        if let Some(o) = &overrides.kdj {
            set(&mut c.kdj.n, &o.n);
            set(&mut c.kdj.k_period, &o.k_period);
            set(&mut c.kdj.d_period, &o.d_period);
            set(&mut c.kdj.d_low_threshold, &o.d_low_threshold);
            set(&mut c.kdj.d_ceiling, &o.d_ceiling);
        }
        if let Some(o) = &overrides.rsi {
            set(&mut c.rsi.short_period, &o.short_period);
            set(&mut c.rsi.long_period, &o.long_period);
            set(&mut c.rsi.neutral_ceiling, &o.neutral_ceiling);
        }
        if let Some(o) = &overrides.bollinger {
            set(&mut c.bollinger.period, &o.period);
            set(&mut c.bollinger.std_dev_multiplier, &o.std_dev_multiplier);
        }
        if let Some(o) = &overrides.ma {
            set(&mut c.ma.periods, &o.periods);
        }

        self
    }

    /// 검증 후 설정을 반환합니다.
    pub fn build(self) -> Result<StrategyConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
