//! 권리락/배당락 이벤트.
//!
//! 현금배당, 주식분할, 유상배정을 하나의 레코드로 표현하며,
//! 수정주가 계산에서만 사용됩니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 기업 행위 (배당·분할·배정).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorporateAction {
    /// 권리락/배당락일
    pub ex_date: NaiveDate,
    /// 주당 현금배당
    #[serde(default)]
    pub cash_dividend_per_share: Decimal,
    /// 분할 배수 (분할 후 주식 수 / 분할 전 주식 수, 1 = 분할 없음)
    #[serde(default = "default_split_ratio")]
    pub split_ratio: Decimal,
    /// 주당 배정 비율
    #[serde(default)]
    pub allotment_ratio: Decimal,
    /// 배정 가격
    #[serde(default)]
    pub allotment_price: Decimal,
}

fn default_split_ratio() -> Decimal {
    Decimal::ONE
}

impl CorporateAction {
    /// 아무 효과도 없는 이벤트를 생성합니다.
    pub fn new(ex_date: NaiveDate) -> Self {
        Self {
            ex_date,
            cash_dividend_per_share: Decimal::ZERO,
            split_ratio: Decimal::ONE,
            allotment_ratio: Decimal::ZERO,
            allotment_price: Decimal::ZERO,
        }
    }

    /// 현금배당 이벤트.
    pub fn dividend(ex_date: NaiveDate, per_share: Decimal) -> Self {
        Self::new(ex_date).with_dividend(per_share)
    }

    /// 주식분할 이벤트.
    pub fn split(ex_date: NaiveDate, ratio: Decimal) -> Self {
        Self::new(ex_date).with_split(ratio)
    }

    /// 현금배당을 설정합니다.
    pub fn with_dividend(mut self, per_share: Decimal) -> Self {
        self.cash_dividend_per_share = per_share;
        self
    }

    /// 분할 배수를 설정합니다.
    pub fn with_split(mut self, ratio: Decimal) -> Self {
        self.split_ratio = ratio;
        self
    }

    /// 배정 비율과 가격을 설정합니다.
    pub fn with_allotment(mut self, ratio: Decimal, price: Decimal) -> Self {
        self.allotment_ratio = ratio;
        self.allotment_price = price;
        self
    }

    /// 권리락 직전 종가 기준 조정 계수를 계산합니다.
    ///
    /// `(pc − 배당 + 배정비율·배정가) / ((분할배수 + 배정비율)·pc)`
    ///
    /// 배정이 없으면 `(1 − 배당/pc) / 분할배수`와 같습니다.
    ///
    /// # 반환
    ///
    /// 기준가가 0 이하이거나 분자/분모가 양수가 아니면 `None`
    pub fn factor(&self, prior_close: Decimal) -> Option<Decimal> {
        if prior_close <= Decimal::ZERO {
            return None;
        }
        let numerator = prior_close - self.cash_dividend_per_share
            + self.allotment_ratio * self.allotment_price;
        let denominator = (self.split_ratio + self.allotment_ratio) * prior_close;
        if numerator <= Decimal::ZERO || denominator <= Decimal::ZERO {
            return None;
        }
        numerator.checked_div(denominator)
    }
}
