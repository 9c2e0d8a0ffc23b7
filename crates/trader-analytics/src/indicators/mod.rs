//! 기술적 지표 모듈.
//!
//! 이 모듈은 신호 전략에서 사용되는 기술적 지표를 제공합니다.
//! 모든 지표는 입력과 같은 길이의 열(`Column`)을 반환하며,
//! 워밍업 구간이나 데이터가 부족한 경우 해당 칸은 `None`입니다. 에러는 반환하지 않습니다.
//!
//! # 지원 지표
//!
//! ## 추세 지표 (Trend Indicators)
//! - **SMA**: 단순 이동평균 (Simple Moving Average)
//! - **EMA**: 지수 이동평균 (Exponential Moving Average)
//! - **MACD**: DIF / DEA / 히스토그램
//!
//! ## 모멘텀 지표 (Momentum Indicators)
//! - **RSI**: 상대강도지수 (Wilder 평활)
//! - **KDJ**: 스토캐스틱 계열 (K, D, J)
//!
//! ## 변동성 지표 (Volatility Indicators)
//! - **Bollinger Bands**: 볼린저 밴드
//! - **ATR**: 평균 실제 범위 (Average True Range)
//!
//! # 사용 예시
//!
//! ```
//! use rust_decimal_macros::dec;
//! use trader_analytics::indicators::{IndicatorEngine, RsiParams, SmaParams};
//!
//! let engine = IndicatorEngine::new();
//! let prices = vec![dec!(10), dec!(11), dec!(12), dec!(11), dec!(13)];
//!
//! let sma = engine.sma(&prices, SmaParams { period: 3 });
//! assert_eq!(sma[2], Some(dec!(11)));
//!
//! let rsi = engine.rsi(&prices, RsiParams { period: 3 });
//! assert!(rsi[3].is_some());
//! ```

pub mod frame;
pub mod momentum;
pub mod trend;
pub mod volatility;

use rust_decimal::Decimal;
use trader_core::Bar;

pub use frame::{names, FrameSpec, IndicatorFrame};
pub use momentum::{KdjParams, KdjResult, MomentumCalculator, RsiParams};
pub use trend::{EmaParams, MacdParams, MacdResult, SmaParams, TrendIndicators};
pub use volatility::{AtrParams, BollingerBandsParams, BollingerBandsResult, VolatilityIndicators};

/// 지표 열. 입력 시계열과 같은 길이이며 정의되지 않은 칸은 `None`.
pub type Column = Vec<Option<Decimal>>;

/// 전부 정의되지 않은 열.
pub fn undefined(len: usize) -> Column {
    vec![None; len]
}

/// `t` 시점 값.
pub fn at(column: &[Option<Decimal>], t: usize) -> Option<Decimal> {
    column.get(t).copied().flatten()
}

/// `t` 시점 값이 직전보다 큰지 확인합니다.
///
/// 두 값 중 하나라도 정의되지 않으면 `None`.
pub fn rising(column: &[Option<Decimal>], t: usize) -> Option<bool> {
    let prev = at(column, t.checked_sub(1)?)?;
    let curr = at(column, t)?;
    Some(curr > prev)
}

/// `t` 시점에 `fast`가 `slow`를 상향 돌파했는지 확인합니다.
///
/// 이전: fast ≤ slow, 현재: fast > slow.
/// 네 값 중 하나라도 정의되지 않으면 `None`.
pub fn crossed_above(
    fast: &[Option<Decimal>],
    slow: &[Option<Decimal>],
    t: usize,
) -> Option<bool> {
    let prev = t.checked_sub(1)?;
    let (pf, ps) = (at(fast, prev)?, at(slow, prev)?);
    let (cf, cs) = (at(fast, t)?, at(slow, t)?);
    Some(pf <= ps && cf > cs)
}

/// `t` 시점에 `fast`가 `slow`를 하향 돌파했는지 확인합니다.
///
/// 이전: fast ≥ slow, 현재: fast < slow.
pub fn crossed_below(
    fast: &[Option<Decimal>],
    slow: &[Option<Decimal>],
    t: usize,
) -> Option<bool> {
    let prev = t.checked_sub(1)?;
    let (pf, ps) = (at(fast, prev)?, at(slow, prev)?);
    let (cf, cs) = (at(fast, t)?, at(slow, t)?);
    Some(pf >= ps && cf < cs)
}

/// 추세/모멘텀/변동성 계산기를 묶은 진입점.
#[derive(Debug, Default)]
pub struct IndicatorEngine {
    trend: TrendIndicators,
    momentum: MomentumCalculator,
    volatility: VolatilityIndicators,
}

impl IndicatorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 처음 `period - 1`칸은 `None`.
    pub fn sma(&self, prices: &[Decimal], params: SmaParams) -> Column {
        self.trend.sma(prices, params)
    }

    pub fn ema(&self, prices: &[Decimal], params: EmaParams) -> Column {
        self.trend.ema(prices, params)
    }

    /// 칸마다 DIF, DEA, 히스토그램.
    pub fn macd(&self, prices: &[Decimal], params: MacdParams) -> Vec<MacdResult> {
        self.trend.macd(prices, params)
    }

    /// Wilder 평활 RSI, 0..=100.
    pub fn rsi(&self, prices: &[Decimal], params: RsiParams) -> Column {
        self.momentum.rsi(prices, params)
    }

    pub fn kdj(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: KdjParams,
    ) -> Vec<KdjResult> {
        self.momentum.kdj(high, low, close, params)
    }

    pub fn bollinger_bands(
        &self,
        prices: &[Decimal],
        params: BollingerBandsParams,
    ) -> Vec<BollingerBandsResult> {
        self.volatility.bollinger_bands(prices, params)
    }

    /// 첫 봉의 실제 범위는 고가 - 저가.
    pub fn atr(&self, bars: &[Bar], params: AtrParams) -> Column {
        self.volatility.atr(bars, params)
    }
}
