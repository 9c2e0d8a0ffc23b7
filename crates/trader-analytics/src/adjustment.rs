//! 수정주가 계산.
//!
//! 배당·분할·배정 이벤트의 영향을 제거해 지표 계산에 쓸 수 있는
//! 일관된 가격 시계열을 만듭니다.
//!
//! - `Backward`: 최근 가격을 보존하고 권리락일 이전 봉을 누적 계수로 축소
//! - `Forward`: 최초 가격을 보존하고 권리락일 이후 봉을 누적 계수로 나눔
//! - `None`: 입력 그대로
//!
//! 같은 입력에 대해 항상 같은 결과를 내는 순수 함수입니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use trader_core::{Bar, BarSeries, CorporateAction};

/// 수정주가 방식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentMode {
    /// 조정하지 않음
    #[default]
    None,
    /// 최초 가격 기준
    Forward,
    /// 최근 가격 기준
    Backward,
}

impl std::str::FromStr for AdjustmentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            _ => Err(format!("Unknown adjustment mode: {}", s)),
        }
    }
}

/// 이벤트 하나가 적용되는 위치와 계수.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResolvedAction {
    /// 권리락일 이상인 첫 봉의 인덱스
    first_index: usize,
    factor: Decimal,
}

/// 봉마다 가격에 곱할 누적 계수를 계산합니다.
///
/// `Backward`에서는 권리락일 이전 봉에 적용된 누적 계수,
/// `Forward`에서는 권리락일 이후 봉에 적용된 누적 계수의 역수입니다.
/// 조정 가격 ÷ 계수 = 원래 가격.
pub fn adjustment_factors(
    series: &BarSeries,
    actions: &[CorporateAction],
    mode: AdjustmentMode,
) -> Vec<Decimal> {
    let cumulative = cumulative_factors(series, actions, mode);
    match mode {
        AdjustmentMode::Forward => cumulative.into_iter().map(|c| Decimal::ONE / c).collect(),
        AdjustmentMode::Backward | AdjustmentMode::None => cumulative,
    }
}

/// 수정주가 시계열을 만듭니다.
///
/// `Backward`는 가격에 누적 계수를 곱하고 거래량을 나누며,
/// `Forward`는 가격을 누적 계수로 나누고 거래량에 곱합니다.
/// 거래대금은 유지합니다. 이벤트가 없거나 `None` 모드면 입력과 같습니다.
///
/// # 인자
/// * `series` - 원시 일봉
/// * `actions` - 배당/분할 이벤트 (정렬 불필요)
/// * `mode` - 조정 방식
pub fn adjust(series: &BarSeries, actions: &[CorporateAction], mode: AdjustmentMode) -> BarSeries {
    if mode == AdjustmentMode::None || actions.is_empty() {
        return series.clone();
    }

    let cumulative = cumulative_factors(series, actions, mode);
    let bars = series
        .bars()
        .iter()
        .zip(&cumulative)
        .map(|(bar, &c)| match mode {
            AdjustmentMode::Forward => scale_bar(bar, |p| p / c, |v| v * c),
            _ => scale_bar(bar, |p| p * c, |v| v / c),
        })
        .collect();

    BarSeries::from_validated(series.code(), bars)
}

/// 봉별 누적 계수 (모드별로 적용 구간이 다름).
fn cumulative_factors(
    series: &BarSeries,
    actions: &[CorporateAction],
    mode: AdjustmentMode,
) -> Vec<Decimal> {
    let mut factors = vec![Decimal::ONE; series.len()];
    if mode == AdjustmentMode::None || actions.is_empty() {
        return factors;
    }

    for action in resolve_actions(series, actions) {
        let range = match mode {
            AdjustmentMode::Backward => &mut factors[..action.first_index],
            _ => &mut factors[action.first_index..],
        };
        for f in range {
            *f *= action.factor;
        }
    }

    factors
}

fn scale_bar(bar: &Bar, price: impl Fn(Decimal) -> Decimal, volume: impl Fn(Decimal) -> Decimal) -> Bar {
    Bar {
        date: bar.date,
        open: price(bar.open),
        high: price(bar.high),
        low: price(bar.low),
        close: price(bar.close),
        volume: volume(bar.volume),
        amount: bar.amount,
    }
}

/// 이벤트를 날짜순으로 정렬하고 적용 가능한 것만 계수로 변환합니다.
///
/// 권리락일 이전 봉이 없거나, 이후 봉이 없거나, 기준가가 0 이하인 이벤트는 건너뜁니다.
fn resolve_actions(series: &BarSeries, actions: &[CorporateAction]) -> Vec<ResolvedAction> {
    let mut sorted: Vec<&CorporateAction> = actions.iter().collect();
    sorted.sort_by_key(|a| a.ex_date);

    let mut resolved = Vec::with_capacity(sorted.len());
    for action in sorted {
        let first_index = series.partition_point(action.ex_date);
        if first_index == 0 {
            debug!(code = series.code(), ex_date = %action.ex_date, "권리락일 이전 봉 없음, 이벤트 건너뜀");
            continue;
        }
        if first_index >= series.len() {
            debug!(code = series.code(), ex_date = %action.ex_date, "권리락일 이후 봉 없음, 이벤트 건너뜀");
            continue;
        }

        let prior_close = series.bars()[first_index - 1].close;
        match action.factor(prior_close) {
            Some(factor) => resolved.push(ResolvedAction {
                first_index,
                factor,
            }),
            None => warn!(
                code = series.code(),
                ex_date = %action.ex_date,
                prior_close = %prior_close,
                "조정 계수를 계산할 수 없는 이벤트 건너뜀"
            ),
        }
    }

    resolved
}
