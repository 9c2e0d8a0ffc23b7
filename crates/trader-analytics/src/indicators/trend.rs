//! 추세 지표 (Trend Indicators).
//!
//! 이동평균 기반의 추세 지표들을 제공합니다.
//! - SMA (Simple Moving Average)
//! - EMA (Exponential Moving Average)
//! - MACD (DIF / DEA / 히스토그램)
//!
//! 교차 판정 헬퍼(`crossed_above`, `crossed_below`)는 상위 모듈에 있습니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{undefined, Column};

/// SMA 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmaParams {
    /// 이동평균 기간.
    pub period: usize,
}

impl Default for SmaParams {
    fn default() -> Self {
        Self { period: 20 }
    }
}

/// EMA 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmaParams {
    /// 이동평균 기간.
    pub period: usize,
}

impl Default for EmaParams {
    fn default() -> Self {
        Self { period: 12 }
    }
}

/// MACD 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    /// 단기 EMA 기간 (기본: 12).
    pub fast_period: usize,
    /// 장기 EMA 기간 (기본: 26).
    pub slow_period: usize,
    /// 시그널 라인 기간 (기본: 9).
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

/// MACD 결과 (봉 단위).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdResult {
    /// DIF (단기 EMA - 장기 EMA).
    pub dif: Option<Decimal>,
    /// DEA (DIF의 EMA).
    pub dea: Option<Decimal>,
    /// 히스토그램 (DIF - DEA).
    pub histogram: Option<Decimal>,
}

/// 추세 지표 계산기.
#[derive(Debug, Default)]
pub struct TrendIndicators;

impl TrendIndicators {
    /// 새로운 추세 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 단순 이동평균 (SMA) 계산.
    ///
    /// SMA = (P1 + P2 + ... + Pn) / n
    ///
    /// # 인자
    /// * `prices` - 가격 데이터
    /// * `params` - SMA 파라미터
    ///
    /// # 반환
    /// 각 시점의 SMA 값 (처음 period-1개는 None, 데이터가 부족하면 전부 None)
    pub fn sma(&self, prices: &[Decimal], params: SmaParams) -> Column {
        let period = params.period;
        if period == 0 || prices.len() < period {
            return undefined(prices.len());
        }

        let period_decimal = Decimal::from(period);
        let mut result = Vec::with_capacity(prices.len());
        let mut window_sum = Decimal::ZERO;

        for (i, price) in prices.iter().enumerate() {
            window_sum += *price;
            if i >= period {
                window_sum -= prices[i - period];
            }
            if i + 1 < period {
                result.push(None);
            } else {
                result.push(Some(window_sum / period_decimal));
            }
        }

        result
    }

    /// 지수 이동평균 (EMA) 계산.
    ///
    /// EMA[0] = P[0], EMA[t] = P[t] × α + EMA[t-1] × (1 - α), α = 2 / (period + 1)
    ///
    /// 첫 봉에서 바로 시작하므로 하드 워밍업은 없지만,
    /// 초반 값은 수치적으로 불안정하다는 점에 유의해야 합니다.
    pub fn ema(&self, prices: &[Decimal], params: EmaParams) -> Column {
        if params.period == 0 {
            return undefined(prices.len());
        }
        ema_values(prices, params.period)
            .into_iter()
            .map(Some)
            .collect()
    }

    /// MACD 계산.
    ///
    /// DIF = EMA(단기) - EMA(장기)
    /// DEA = EMA(DIF, 시그널), DIF[0]에서 시작
    /// 히스토그램 = DIF - DEA
    ///
    /// # 인자
    /// * `prices` - 가격 데이터
    /// * `params` - MACD 파라미터
    ///
    /// # 반환
    /// 각 시점의 DIF, DEA, 히스토그램 값.
    /// 장기 기간보다 데이터가 짧으면 전부 None.
    pub fn macd(&self, prices: &[Decimal], params: MacdParams) -> Vec<MacdResult> {
        let MacdParams {
            fast_period,
            slow_period,
            signal_period,
        } = params;

        if fast_period == 0
            || slow_period == 0
            || signal_period == 0
            || prices.len() < slow_period
        {
            return vec![MacdResult::default(); prices.len()];
        }

        let fast = ema_values(prices, fast_period);
        let slow = ema_values(prices, slow_period);
        let dif: Vec<Decimal> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let dea = ema_values(&dif, signal_period);

        dif.iter()
            .zip(&dea)
            .map(|(&d, &e)| MacdResult {
                dif: Some(d),
                dea: Some(e),
                histogram: Some(d - e),
            })
            .collect()
    }
}

/// 첫 값으로 시작하는 EMA.
pub(crate) fn ema_values(values: &[Decimal], period: usize) -> Vec<Decimal> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };
    let alpha = dec!(2) / Decimal::from(period + 1);
    let one_minus_alpha = Decimal::ONE - alpha;

    let mut result = Vec::with_capacity(values.len());
    let mut prev = first;
    result.push(prev);
    for value in &values[1..] {
        prev = *value * alpha + prev * one_minus_alpha;
        result.push(prev);
    }
    result
}
