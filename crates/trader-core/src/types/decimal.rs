//! 정밀한 금융 계산을 위한 Decimal 유틸리티.
//!
//! 이 모듈은 가격·지표 계산에 필요한 정밀 소수점 타입 및 유틸리티를 제공합니다.

use rust_decimal::Decimal;

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 지표 열의 한 칸. 워밍업 구간 등 정의되지 않은 값은 `None`입니다.
pub type Cell = Option<Decimal>;

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 퍼센트 문자열로 변환합니다 (예: "5.25%").
    fn to_percentage_string(&self) -> String;

    /// 분모가 0이면 `None`을 반환하는 나눗셈.
    fn safe_div(&self, denominator: Decimal) -> Option<Decimal>;
}

impl DecimalExt for Decimal {
    fn to_percentage_string(&self) -> String {
        let pct = *self * Decimal::ONE_HUNDRED;
        format!("{:.2}%", pct)
    }

    fn safe_div(&self, denominator: Decimal) -> Option<Decimal> {
        if denominator.is_zero() {
            None
        } else {
            self.checked_div(denominator)
        }
    }
}
