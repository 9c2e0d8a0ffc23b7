//! 변동성 지표 (Volatility Indicators).
//!
//! 가격 변동성을 측정하는 지표들을 제공합니다.
//! - Bollinger Bands (볼린저 밴드, 모표준편차)
//! - ATR (Average True Range, Wilder 평활)

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use trader_core::Bar;

use super::{undefined, Column};

/// 볼린저 밴드 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BollingerBandsParams {
    /// 이동평균 기간 (기본: 20).
    pub period: usize,
    /// 표준편차 배수 (기본: 2.0).
    pub std_dev_multiplier: Decimal,
}

impl Default for BollingerBandsParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: dec!(2.0),
        }
    }
}

/// 볼린저 밴드 결과 (봉 단위).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BollingerBandsResult {
    /// 상단 밴드 (MA + k × σ).
    pub upper: Option<Decimal>,
    /// 중간 밴드 (이동평균).
    pub middle: Option<Decimal>,
    /// 하단 밴드 (MA - k × σ).
    pub lower: Option<Decimal>,
}

/// ATR 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtrParams {
    /// ATR 기간 (기본: 14).
    pub period: usize,
}

impl Default for AtrParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// 구간 하나의 밴드. 중간 계산이 넘치면 `None`.
fn band_cell(window: &[Decimal], multiplier: Decimal) -> Option<BollingerBandsResult> {
    let n = Decimal::from(window.len());
    let ma = window
        .iter()
        .try_fold(Decimal::ZERO, |acc, &p| acc.checked_add(p))?
        .checked_div(n)?;

    let variance = window
        .iter()
        .try_fold(Decimal::ZERO, |acc, &p| {
            let diff = p.checked_sub(ma)?;
            acc.checked_add(diff.checked_mul(diff)?)
        })?
        .checked_div(n)?;

    let deviation = multiplier.checked_mul(variance.sqrt()?)?;
    Some(BollingerBandsResult {
        upper: Some(ma.checked_add(deviation)?),
        middle: Some(ma),
        lower: Some(ma.checked_sub(deviation)?),
    })
}

/// 변동성 지표 계산기.
#[derive(Debug, Default)]
pub struct VolatilityIndicators;

impl VolatilityIndicators {
    /// 새로운 변동성 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 볼린저 밴드 계산.
    ///
    /// 상단 밴드 = MA + (k × σ)
    /// 중간 밴드 = MA (이동평균)
    /// 하단 밴드 = MA - (k × σ)
    ///
    /// σ는 같은 구간의 모표준편차(분모 n)입니다. 가격이 너무 커서
    /// Decimal 범위를 넘는 구간은 `None`으로 남습니다.
    ///
    /// # 인자
    /// * `prices` - 가격 데이터 (종가)
    /// * `params` - 볼린저 밴드 파라미터
    ///
    /// # 반환
    /// 상단, 중간, 하단 밴드 값들
    pub fn bollinger_bands(
        &self,
        prices: &[Decimal],
        params: BollingerBandsParams,
    ) -> Vec<BollingerBandsResult> {
        let period = params.period;
        let mut result = vec![BollingerBandsResult::default(); prices.len()];
        if period == 0 || prices.len() < period {
            return result;
        }

        for i in (period - 1)..prices.len() {
            let window = &prices[i + 1 - period..=i];
            // 오버플로우 난 칸은 정의되지 않은 채로 둔다
            if let Some(bands) = band_cell(window, params.std_dev_multiplier) {
                result[i] = bands;
            }
        }

        result
    }

    /// ATR (Average True Range) 계산.
    ///
    /// True Range = max(고가 - 저가, |고가 - 전일종가|, |저가 - 전일종가|)
    /// 첫 ATR은 처음 `period`개 TR의 평균이고 이후는 Wilder 평활입니다.
    ///
    /// # 반환
    /// 인덱스 `period - 1`부터 정의되는 ATR 값들
    pub fn atr(&self, bars: &[Bar], params: AtrParams) -> Column {
        let len = bars.len();
        let period = params.period;
        if period == 0 || len < period {
            return undefined(len);
        }

        let true_ranges: Vec<Decimal> = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| bar.true_range(i.checked_sub(1).map(|p| bars[p].close)))
            .collect();

        let period_decimal = Decimal::from(period);
        let keep = period_decimal - Decimal::ONE;

        let mut result = undefined(len);
        let mut atr = true_ranges[..period].iter().sum::<Decimal>() / period_decimal;
        result[period - 1] = Some(atr);

        for i in period..len {
            atr = (atr * keep + true_ranges[i]) / period_decimal;
            result[i] = Some(atr);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn bar(high: Decimal, low: Decimal, close: Decimal) -> Bar {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        Bar::new(day, close, high, low, close, dec!(100))
    }

    #[test]
    fn test_bollinger_flat_series_collapses() {
        let calc = VolatilityIndicators::new();
        let flat = vec![dec!(12.5); 30];
        let bands = calc.bollinger_bands(&flat, BollingerBandsParams::default());

        assert!(bands[..19].iter().all(|b| b.middle.is_none()));
        for b in &bands[19..] {
            assert_eq!(b.middle, Some(dec!(12.5)));
            assert_eq!(b.upper, b.middle);
            assert_eq!(b.lower, b.middle);
        }
    }

    #[test]
    fn test_bollinger_population_stddev() {
        let calc = VolatilityIndicators::new();
        // 평균 5, 모분산 = (9 + 1 + 1 + 9) / 4 = 5
        let prices = vec![dec!(2), dec!(4), dec!(6), dec!(8)];
        let bands = calc.bollinger_bands(
            &prices,
            BollingerBandsParams {
                period: 4,
                std_dev_multiplier: dec!(1),
            },
        );

        let upper = bands[3].upper.unwrap();
        let expected = dec!(5) + dec!(5).sqrt().unwrap();
        assert_eq!(bands[3].middle, Some(dec!(5)));
        assert!((upper - expected).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_atr_wilder() {
        let calc = VolatilityIndicators::new();
        let bars = vec![
            bar(dec!(11), dec!(9), dec!(10)),
            bar(dec!(12), dec!(10), dec!(11)),
            bar(dec!(12), dec!(11), dec!(11.5)),
            bar(dec!(15), dec!(12), dec!(14)),
        ];

        let atr = calc.atr(&bars, AtrParams { period: 2 });

        // TR: 2, max(2, 2, 0) = 2, max(1, 1, 0) = 1, max(3, 3.5, 0.5) = 3.5
        assert_eq!(atr[0], None);
        assert_eq!(atr[1], Some(dec!(2)));
        assert_eq!(atr[2], Some(dec!(1.5)));
        assert_eq!(atr[3], Some(dec!(2.5)));
    }

    #[test]
    fn test_atr_short_input() {
        let calc = VolatilityIndicators::new();
        let bars = vec![bar(dec!(10), dec!(10), dec!(10)); 3];
        assert_eq!(calc.atr(&bars, AtrParams::default()), vec![None; 3]);
    }

    #[test]
    fn test_bollinger_overflow_leaves_cells_undefined() {
        let calc = VolatilityIndicators::new();
        // 편차 제곱이 Decimal 최대값(약 7.9e28)을 넘는다
        let (lo, hi) = (
            Decimal::from(1_000_000_000_000_000i64),
            Decimal::from(2_000_000_000_000_000i64),
        );
        let huge: Vec<Decimal> = (0..30).map(|i| if i % 2 == 0 { lo } else { hi }).collect();
        let bands = calc.bollinger_bands(&huge, BollingerBandsParams::default());

        assert_eq!(bands.len(), 30);
        assert!(bands.iter().all(|b| *b == BollingerBandsResult::default()));

        // 같은 구간 길이에서 작은 가격은 정상 계산
        let small: Vec<Decimal> = huge
            .iter()
            .map(|p| p / Decimal::from(1_000_000_000_000i64))
            .collect();
        let bands = calc.bollinger_bands(&small, BollingerBandsParams::default());
        assert_eq!(bands[29].middle, Some(dec!(1500)));
    }
}
