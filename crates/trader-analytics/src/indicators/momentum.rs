//! 모멘텀 지표 (Momentum Indicators).
//!
//! 가격 모멘텀과 과매수/과매도 상태를 측정하는 지표들을 제공합니다.
//! - RSI (Relative Strength Index, Wilder 평활)
//! - KDJ (스토캐스틱 계열)

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{undefined, Column};

/// RSI 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsiParams {
    /// RSI 기간 (기본: 14).
    pub period: usize,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// KDJ 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdjParams {
    /// RSV 기간 (기본: 9).
    pub n: usize,
    /// K 평활 기간 (기본: 3).
    pub k_period: usize,
    /// D 평활 기간 (기본: 3).
    pub d_period: usize,
}

impl Default for KdjParams {
    fn default() -> Self {
        Self {
            n: 9,
            k_period: 3,
            d_period: 3,
        }
    }
}

/// KDJ 결과 (봉 단위).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdjResult {
    /// K (RSV의 평활, 0-100).
    pub k: Option<Decimal>,
    /// D (K의 평활, 0-100).
    pub d: Option<Decimal>,
    /// J = 3K - 2D (범위 제한 없음).
    pub j: Option<Decimal>,
}

/// 모멘텀 지표 계산기.
#[derive(Debug, Default)]
pub struct MomentumCalculator;

impl MomentumCalculator {
    /// 새로운 모멘텀 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// RSI (Relative Strength Index) 계산.
    ///
    /// RSI = 100 - (100 / (1 + RS)), RS = 평균 상승폭 / 평균 하락폭
    ///
    /// 첫 평균은 처음 `period`개 변화량의 단순 평균이고 이후는 Wilder 평활
    /// (`avg = (avg × (period - 1) + 현재) / period`)을 사용합니다.
    ///
    /// # 인자
    /// * `prices` - 가격 데이터 (종가)
    /// * `params` - RSI 파라미터
    ///
    /// # 반환
    /// 0-100 사이의 RSI 값들. 인덱스 `period`부터 정의됩니다.
    /// 평균 하락폭이 0이면 100, 상승·하락 모두 0이면 50입니다.
    pub fn rsi(&self, prices: &[Decimal], params: RsiParams) -> Column {
        let period = params.period;
        if period == 0 || prices.len() < period + 1 {
            return undefined(prices.len());
        }

        let (gains, losses): (Vec<Decimal>, Vec<Decimal>) = prices
            .windows(2)
            .map(|w| {
                let delta = w[1] - w[0];
                if delta > Decimal::ZERO {
                    (delta, Decimal::ZERO)
                } else {
                    (Decimal::ZERO, -delta)
                }
            })
            .unzip();

        let period_decimal = Decimal::from(period);
        let keep = period_decimal - Decimal::ONE;

        let mut result = undefined(prices.len());
        let mut avg_gain = gains[..period].iter().sum::<Decimal>() / period_decimal;
        let mut avg_loss = losses[..period].iter().sum::<Decimal>() / period_decimal;
        result[period] = Some(rsi_value(avg_gain, avg_loss));

        for i in (period + 1)..prices.len() {
            avg_gain = (avg_gain * keep + gains[i - 1]) / period_decimal;
            avg_loss = (avg_loss * keep + losses[i - 1]) / period_decimal;
            result[i] = Some(rsi_value(avg_gain, avg_loss));
        }

        result
    }

    /// KDJ 계산.
    ///
    /// RSV = (종가 - n일 최저가) / (n일 최고가 - n일 최저가) × 100, 범위가 0이면 50
    /// K = (RSV + (k_period - 1) × 이전 K) / k_period, 50에서 시작
    /// D = (K + (d_period - 1) × 이전 D) / d_period, 50에서 시작
    /// J = 3K - 2D
    ///
    /// # 반환
    /// 인덱스 `n - 1`부터 정의되는 K, D, J. J는 0-100을 벗어날 수 있습니다.
    pub fn kdj(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: KdjParams,
    ) -> Vec<KdjResult> {
        let len = high.len().min(low.len()).min(close.len());
        let KdjParams {
            n,
            k_period,
            d_period,
        } = params;

        let mut result = vec![KdjResult::default(); len];
        if n == 0 || k_period == 0 || d_period == 0 || len < n {
            return result;
        }

        let k_div = Decimal::from(k_period);
        let k_keep = k_div - Decimal::ONE;
        let d_div = Decimal::from(d_period);
        let d_keep = d_div - Decimal::ONE;

        let mut prev_k = dec!(50);
        let mut prev_d = dec!(50);

        for t in (n - 1)..len {
            let start = t + 1 - n;
            let highest = high[start..=t].iter().copied().fold(high[start], Decimal::max);
            let lowest = low[start..=t].iter().copied().fold(low[start], Decimal::min);

            let range = highest - lowest;
            let rsv = if range.is_zero() {
                dec!(50)
            } else {
                (close[t] - lowest) / range * dec!(100)
            };

            let k = (rsv + k_keep * prev_k) / k_div;
            let d = (k + d_keep * prev_d) / d_div;
            result[t] = KdjResult {
                k: Some(k),
                d: Some(d),
                j: Some(dec!(3) * k - dec!(2) * d),
            };
            prev_k = k;
            prev_d = d;
        }

        result
    }
}

fn rsi_value(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss.is_zero() {
        return if avg_gain.is_zero() { dec!(50) } else { dec!(100) };
    }
    let rs = avg_gain / avg_loss;
    dec!(100) - dec!(100) / (Decimal::ONE + rs)
}
