//! 모의 거래 기록.
//!
//! 이 모듈은 백테스트가 생성하는 거래 관련 타입을 정의합니다:
//! - `ExitReason` - 청산 사유
//! - `Trade` - 진입부터 청산까지의 단일 거래
//! - `TradeStats` - 거래 통계

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{DecimalExt, Price};

/// 청산 사유.
///
/// 같은 봉에서 여러 조건이 동시에 충족되면 선언 순서가 앞선 사유가 우선합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitReason {
    /// 손절
    StopLoss,
    /// 익절
    TakeProfit,
    /// 추적 손절
    TrailingStop,
    /// 지표 기반 청산
    IndicatorExit,
    /// 고정 보유기간 만료
    TimeExit,
    /// 최대 보유기간 도달
    MaxHolding,
    /// 데이터 끝 도달
    DataExhausted,
}

impl ExitReason {
    /// kebab-case 라벨.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop-loss",
            ExitReason::TakeProfit => "take-profit",
            ExitReason::TrailingStop => "trailing-stop",
            ExitReason::IndicatorExit => "indicator-exit",
            ExitReason::TimeExit => "time-exit",
            ExitReason::MaxHolding => "max-holding",
            ExitReason::DataExhausted => "data-exhausted",
        }
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 신호 하나에 대한 모의 거래.
///
/// 진입 1회, 청산 1회이며 `exit_reason`이 정해지면 종결됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// 종목 코드
    pub stock_code: String,
    /// 진입일
    pub entry_date: NaiveDate,
    /// 진입가
    pub entry_price: Price,
    /// 청산일
    pub exit_date: NaiveDate,
    /// 청산가
    pub exit_price: Price,
    /// 보유 봉 수 (청산 인덱스 − 진입 인덱스)
    pub hold_days: usize,
    /// 수익률 (0.05 = 5%)
    pub return_rate: Decimal,
    /// 청산 사유
    pub exit_reason: ExitReason,
    /// 거래 라벨 (전략/신호 분류)
    pub strategy_label: String,
}

impl Trade {
    /// 새 거래를 생성합니다. 수익률은 진입가와 청산가로 계산합니다.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stock_code: impl Into<String>,
        entry_date: NaiveDate,
        entry_price: Price,
        exit_date: NaiveDate,
        exit_price: Price,
        hold_days: usize,
        exit_reason: ExitReason,
        strategy_label: impl Into<String>,
    ) -> Self {
        let return_rate = (exit_price - entry_price)
            .safe_div(entry_price)
            .unwrap_or(Decimal::ZERO);
        Self {
            stock_code: stock_code.into(),
            entry_date,
            entry_price,
            exit_date,
            exit_price,
            hold_days,
            return_rate,
            exit_reason,
            strategy_label: strategy_label.into(),
        }
    }

    /// 수익 거래인지 확인합니다.
    pub fn is_win(&self) -> bool {
        self.return_rate > Decimal::ZERO
    }

    /// 병합 후 정렬에 쓰는 키.
    pub fn sort_key(&self) -> (&str, NaiveDate, &str, NaiveDate) {
        (
            self.stock_code.as_str(),
            self.entry_date,
            self.strategy_label.as_str(),
            self.exit_date,
        )
    }
}

/// 거래 통계.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeStats {
    /// 총 거래 횟수
    pub total_trades: usize,
    /// 수익 거래 횟수
    pub winning_trades: usize,
    /// 손실 거래 횟수
    pub losing_trades: usize,
    /// 수익률 합계
    pub total_return: Decimal,
    /// 보유일 합계
    pub total_hold_days: usize,
}

impl TradeStats {
    /// 거래 목록으로 통계를 계산합니다.
    pub fn from_trades<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> Self {
        let mut stats = Self::default();
        for trade in trades {
            stats.add_trade(trade);
        }
        stats
    }

    /// 거래를 통계에 추가합니다.
    pub fn add_trade(&mut self, trade: &Trade) {
        self.total_trades += 1;
        self.total_return += trade.return_rate;
        self.total_hold_days += trade.hold_days;

        if trade.is_win() {
            self.winning_trades += 1;
        } else if trade.return_rate < Decimal::ZERO {
            self.losing_trades += 1;
        }
    }

    /// 승률을 계산합니다.
    pub fn win_rate(&self) -> Decimal {
        self.per_trade(Decimal::from(self.winning_trades))
    }

    /// 평균 수익률을 계산합니다.
    pub fn avg_return(&self) -> Decimal {
        self.per_trade(self.total_return)
    }

    /// 평균 보유일을 계산합니다.
    pub fn avg_hold_days(&self) -> Decimal {
        self.per_trade(Decimal::from(self.total_hold_days))
    }

    /// 거래당 평균 (거래가 없으면 0).
    fn per_trade(&self, total: Decimal) -> Decimal {
        total
            .safe_div(Decimal::from(self.total_trades))
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_trade_creation() {
        let trade = Trade::new(
            "000001",
            day(2),
            dec!(10),
            day(5),
            dec!(11),
            3,
            ExitReason::TakeProfit,
            "pre_cross:PRE",
        );

        assert_eq!(trade.return_rate, dec!(0.1));
        assert!(trade.is_win());
    }

    #[test]
    fn test_exit_reason_serde() {
        assert_eq!(
            serde_json::to_string(&ExitReason::DataExhausted).unwrap(),
            "\"data-exhausted\""
        );
        assert_eq!(ExitReason::TrailingStop.to_string(), "trailing-stop");
    }

    #[test]
    fn test_trade_stats() {
        let trades = vec![
            Trade::new("A", day(2), dec!(10), day(4), dec!(12), 2, ExitReason::TakeProfit, "x"),
            Trade::new("A", day(5), dec!(10), day(9), dec!(9), 4, ExitReason::StopLoss, "x"),
            Trade::new("B", day(2), dec!(10), day(5), dec!(10), 3, ExitReason::TimeExit, "x"),
        ];
        let stats = TradeStats::from_trades(&trades);

        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.winning_trades, 1);
        assert_eq!(stats.losing_trades, 1);
        assert_eq!(stats.total_return, dec!(0.1));
        assert_eq!(stats.avg_hold_days(), dec!(3));
        assert_eq!(TradeStats::default().win_rate(), Decimal::ZERO);
    }
}
