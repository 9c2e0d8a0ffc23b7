//! 전략의 매매 신호.
//!
//! 이 모듈은 전략이 생성하는 신호 관련 타입을 정의합니다:
//! - `SignalKind` - 봉 단위 신호 분류
//! - `SignalEvent` - 종목·날짜별 신호 레코드

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::Price;

/// 봉 단위 신호 분류.
///
/// 전략마다 사용하는 부분집합이 다르며 (예: BUY/HOLD/SELL 또는 PRE/MID/POST),
/// 지표가 정의되지 않은 봉은 항상 `NoSignal`입니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    /// 신호 없음
    #[default]
    NoSignal,
    /// 매수
    Buy,
    /// 보유
    Hold,
    /// 매도
    Sell,
    /// 교차 직전
    Pre,
    /// 교차 당일
    Mid,
    /// 교차 이후
    Post,
}

impl SignalKind {
    /// 신호가 있는지 확인합니다.
    pub fn is_signal(&self) -> bool {
        !matches!(self, SignalKind::NoSignal)
    }

    /// 대문자 라벨.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::NoSignal => "NO_SIGNAL",
            SignalKind::Buy => "BUY",
            SignalKind::Hold => "HOLD",
            SignalKind::Sell => "SELL",
            SignalKind::Pre => "PRE",
            SignalKind::Mid => "MID",
            SignalKind::Post => "POST",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 종목·날짜별 신호 레코드.
///
/// 모든 수치는 유한한 `Decimal`이므로 그대로 직렬화할 수 있습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalEvent {
    /// 종목 코드
    pub stock_code: String,
    /// 신호 발생일
    pub date: NaiveDate,
    /// 신호 분류
    pub signal_kind: SignalKind,
    /// 신호 발생일 종가
    pub price_at_signal: Price,
    /// 신호를 생성한 전략
    pub strategy_id: String,
    /// 판단 근거가 된 지표 값 (키 순서 고정)
    #[serde(default)]
    pub detail: BTreeMap<String, Decimal>,
}

impl SignalEvent {
    /// 새 신호를 생성합니다.
    pub fn new(
        stock_code: impl Into<String>,
        date: NaiveDate,
        signal_kind: SignalKind,
        price_at_signal: Price,
        strategy_id: impl Into<String>,
    ) -> Self {
        Self {
            stock_code: stock_code.into(),
            date,
            signal_kind,
            price_at_signal,
            strategy_id: strategy_id.into(),
            detail: BTreeMap::new(),
        }
    }

    /// 근거 값을 추가합니다.
    pub fn with_detail(mut self, key: impl Into<String>, value: Decimal) -> Self {
        self.detail.insert(key.into(), value);
        self
    }

    /// 병합 후 정렬에 쓰는 키.
    pub fn sort_key(&self) -> (&str, NaiveDate, &str, SignalKind) {
        (
            self.stock_code.as_str(),
            self.date,
            self.strategy_id.as_str(),
            self.signal_kind,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_signal_event_creation() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let event = SignalEvent::new("600519", date, SignalKind::Mid, dec!(1650.5), "macd_zero_axis")
            .with_detail("macd_bar", dec!(0.03))
            .with_detail("dif", dec!(-0.12));

        assert_eq!(event.strategy_id, "macd_zero_axis");
        assert!(event.signal_kind.is_signal());
        let keys: Vec<_> = event.detail.keys().cloned().collect();
        assert_eq!(keys, vec!["dif".to_string(), "macd_bar".to_string()]);
    }

    #[test]
    fn test_signal_kind_serde() {
        assert_eq!(serde_json::to_string(&SignalKind::NoSignal).unwrap(), "\"NO_SIGNAL\"");
        assert_eq!(serde_json::to_string(&SignalKind::Post).unwrap(), "\"POST\"");
        let kind: SignalKind = serde_json::from_str("\"BUY\"").unwrap();
        assert_eq!(kind, SignalKind::Buy);
        assert!(!SignalKind::default().is_signal());
    }

    #[test]
    fn test_display_matches_serde() {
        for kind in [SignalKind::NoSignal, SignalKind::Pre, SignalKind::Sell] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json.trim_matches('"'), kind.to_string());
        }
    }
}
