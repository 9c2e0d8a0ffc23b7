//! 일봉 데이터 타입.
//!
//! 이 모듈은 가격 시계열의 기본 단위를 정의합니다:
//! - `Bar` - 하루치 OHLCV 레코드
//! - `BarSeries` - 날짜 오름차순으로 정렬된 종목별 일봉 시계열
//! - `SanitizeReport` - 입력 정제 결과

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::error::{TraderError, TraderResult};
use crate::types::Price;

/// 하루치 OHLCV 레코드.
///
/// 불변식: `low ≤ min(open, close) ≤ max(open, close) ≤ high`, `volume ≥ 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량 (주)
    pub volume: Decimal,
    /// 거래대금
    #[serde(default)]
    pub amount: Decimal,
}

/// 일봉 불변식 위반 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BarDefect {
    /// OHLC 순서 위반
    #[error("OHLC 순서 위반 (low ≤ open/close ≤ high)")]
    OhlcOrder,
    /// 0 이하 가격
    #[error("0 이하 가격")]
    NonPositivePrice,
    /// 음수 거래량
    #[error("음수 거래량")]
    NegativeVolume,
    /// 이전 봉보다 늦지 않은 날짜 (중복 또는 역순)
    #[error("날짜 순서 위반")]
    DateOrder,
}

impl Bar {
    /// 새 일봉을 생성합니다. 거래대금은 0으로 시작합니다.
    pub fn new(
        date: NaiveDate,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Decimal,
    ) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
            amount: Decimal::ZERO,
        }
    }

    /// 거래대금을 설정합니다.
    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    /// 단일 봉의 불변식을 검사합니다 (날짜 순서는 `BarSeries`가 검사).
    pub fn validate(&self) -> Result<(), BarDefect> {
        if self.low <= Decimal::ZERO {
            return Err(BarDefect::NonPositivePrice);
        }
        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);
        if self.low > body_low || body_high > self.high {
            return Err(BarDefect::OhlcOrder);
        }
        if self.volume < Decimal::ZERO {
            return Err(BarDefect::NegativeVolume);
        }
        Ok(())
    }

    /// True Range를 반환합니다.
    ///
    /// 전일 종가가 없으면 당일 범위와 같습니다.
    pub fn true_range(&self, prev_close: Option<Price>) -> Decimal {
        let range = self.high - self.low;
        match prev_close {
            Some(pc) => range.max((self.high - pc).abs()).max((self.low - pc).abs()),
            None => range,
        }
    }

    /// 가격 필드를 제수로 나눈 봉을 반환합니다 (거래량/거래대금은 유지).
    pub fn scaled(&self, divisor: Decimal) -> Self {
        if divisor.is_zero() || divisor == Decimal::ONE {
            return self.clone();
        }
        Self {
            open: self.open / divisor,
            high: self.high / divisor,
            low: self.low / divisor,
            close: self.close / divisor,
            ..self.clone()
        }
    }
}

/// 정제 결과.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeReport {
    /// 유지된 봉 수
    pub kept: usize,
    /// 제거된 봉 수
    pub dropped: usize,
}

impl SanitizeReport {
    /// 제거된 봉이 있는지 확인합니다.
    pub fn has_drops(&self) -> bool {
        self.dropped > 0
    }
}

/// 종목별 일봉 시계열.
///
/// 날짜가 엄격하게 증가하며 중복 날짜가 없습니다. 생성 후에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarSeries {
    code: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// 검증된 시계열을 생성합니다.
    ///
    /// 불변식을 위반하는 봉이 하나라도 있으면 `MalformedInput`을 반환합니다.
    pub fn new(code: impl Into<String>, bars: Vec<Bar>) -> TraderResult<Self> {
        let code = code.into();
        let mut prev: Option<NaiveDate> = None;
        for bar in &bars {
            if let Err(defect) = bar.validate() {
                return Err(TraderError::MalformedInput(format!(
                    "{} {}: {}",
                    code, bar.date, defect
                )));
            }
            if prev.is_some_and(|p| bar.date <= p) {
                return Err(TraderError::MalformedInput(format!(
                    "{} {}: {}",
                    code,
                    bar.date,
                    BarDefect::DateOrder
                )));
            }
            prev = Some(bar.date);
        }
        Ok(Self { code, bars })
    }

    /// 불변식을 위반하는 봉을 제거하고 시계열을 생성합니다.
    ///
    /// 날짜가 직전에 유지된 봉보다 늦지 않은 봉도 제거됩니다. 제거된 봉마다 경고를 남깁니다.
    pub fn sanitize(code: impl Into<String>, bars: Vec<Bar>) -> (Self, SanitizeReport) {
        let code = code.into();
        let mut kept: Vec<Bar> = Vec::with_capacity(bars.len());
        let mut report = SanitizeReport::default();

        for bar in bars {
            let defect = match bar.validate() {
                Err(defect) => Some(defect),
                Ok(()) if kept.last().is_some_and(|p| bar.date <= p.date) => {
                    Some(BarDefect::DateOrder)
                }
                Ok(()) => None,
            };

            match defect {
                Some(defect) => {
                    warn!(code = %code, date = %bar.date, %defect, "잘못된 일봉 제거");
                    report.dropped += 1;
                }
                None => kept.push(bar),
            }
        }

        report.kept = kept.len();
        (Self { code, bars: kept }, report)
    }

    /// 이미 정렬·검증된 봉으로 시계열을 생성합니다.
    ///
    /// 기존 시계열의 날짜를 그대로 유지하는 변환(수정주가 등)에서만 사용합니다.
    pub fn from_validated(code: impl Into<String>, bars: Vec<Bar>) -> Self {
        debug_assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
        Self {
            code: code.into(),
            bars,
        }
    }

    /// 종목 코드.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// 전체 봉.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// 봉 개수.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// 인덱스의 봉.
    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    /// 마지막 봉.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// 날짜에 해당하는 인덱스를 찾습니다.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }

    /// 주어진 날짜 이상인 첫 봉의 인덱스 (없으면 `len()`).
    pub fn partition_point(&self, date: NaiveDate) -> usize {
        self.bars.partition_point(|b| b.date < date)
    }

    /// 고가 열.
    pub fn highs(&self) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.high).collect()
    }

    /// 저가 열.
    pub fn lows(&self) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.low).collect()
    }

    /// 종가 열.
    pub fn closes(&self) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.close).collect()
    }
}
