//! 지표 프레임.
//!
//! 일봉 시계열과 날짜 정렬된 지표 열들을 하나로 묶습니다.
//! 각 칸은 같은 인덱스의 봉에 정확히 하나씩 대응합니다.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trader_core::{Bar, BarSeries};

use super::{
    at, AtrParams, BollingerBandsParams, Column, IndicatorEngine, KdjParams, MacdParams,
    RsiParams, SmaParams,
};

/// 열 이름.
pub mod names {
    /// DIF
    pub const DIF: &str = "dif";
    /// DEA
    pub const DEA: &str = "dea";
    /// MACD 히스토그램
    pub const MACD_BAR: &str = "macd_bar";
    /// K
    pub const K: &str = "k";
    /// D
    pub const D: &str = "d";
    /// J
    pub const J: &str = "j";
    /// 볼린저 상단
    pub const BB_UPPER: &str = "bb_upper";
    /// 볼린저 중간
    pub const BB_MID: &str = "bb_mid";
    /// 볼린저 하단
    pub const BB_LOWER: &str = "bb_lower";
    /// ATR
    pub const ATR: &str = "atr";

    /// 이동평균 열 이름 (예: `ma_5`).
    pub fn ma(period: usize) -> String {
        format!("ma_{period}")
    }

    /// RSI 열 이름 (예: `rsi_6`).
    pub fn rsi(period: usize) -> String {
        format!("rsi_{period}")
    }
}

/// 프레임에 계산할 지표 구성.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSpec {
    /// 이동평균 기간 목록
    pub ma_periods: Vec<usize>,
    /// MACD 파라미터
    pub macd: MacdParams,
    /// KDJ 파라미터
    pub kdj: KdjParams,
    /// RSI 기간 목록
    pub rsi_periods: Vec<usize>,
    /// 볼린저 밴드 파라미터
    pub bollinger: BollingerBandsParams,
    /// ATR 파라미터
    pub atr: AtrParams,
}

impl Default for FrameSpec {
    fn default() -> Self {
        Self {
            ma_periods: vec![5, 10, 20, 60],
            macd: MacdParams::default(),
            kdj: KdjParams::default(),
            rsi_periods: vec![6, 12, 24],
            bollinger: BollingerBandsParams::default(),
            atr: AtrParams::default(),
        }
    }
}

impl FrameSpec {
    /// 이동평균 기간 목록을 설정합니다.
    pub fn with_ma_periods(mut self, periods: Vec<usize>) -> Self {
        self.ma_periods = periods;
        self
    }

    /// RSI 기간 목록을 설정합니다.
    pub fn with_rsi_periods(mut self, periods: Vec<usize>) -> Self {
        self.rsi_periods = periods;
        self
    }

    /// MACD 파라미터를 설정합니다.
    pub fn with_macd(mut self, macd: MacdParams) -> Self {
        self.macd = macd;
        self
    }

    /// KDJ 파라미터를 설정합니다.
    pub fn with_kdj(mut self, kdj: KdjParams) -> Self {
        self.kdj = kdj;
        self
    }

    /// 볼린저 밴드 파라미터를 설정합니다.
    pub fn with_bollinger(mut self, bollinger: BollingerBandsParams) -> Self {
        self.bollinger = bollinger;
        self
    }
}

/// 일봉 시계열 + 정렬된 지표 열.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndicatorFrame {
    series: BarSeries,
    columns: BTreeMap<String, Column>,
}

impl IndicatorFrame {
    /// 시계열에서 지표를 계산해 프레임을 만듭니다.
    pub fn build(series: BarSeries, spec: &FrameSpec) -> Self {
        let engine = IndicatorEngine::new();
        let closes = series.closes();
        let highs = series.highs();
        let lows = series.lows();

        let mut columns = BTreeMap::new();

        for &period in &spec.ma_periods {
            columns.insert(names::ma(period), engine.sma(&closes, SmaParams { period }));
        }

        let macd = engine.macd(&closes, spec.macd);
        columns.insert(names::DIF.to_string(), macd.iter().map(|m| m.dif).collect());
        columns.insert(names::DEA.to_string(), macd.iter().map(|m| m.dea).collect());
        columns.insert(
            names::MACD_BAR.to_string(),
            macd.iter().map(|m| m.histogram).collect(),
        );

        let kdj = engine.kdj(&highs, &lows, &closes, spec.kdj);
        columns.insert(names::K.to_string(), kdj.iter().map(|r| r.k).collect());
        columns.insert(names::D.to_string(), kdj.iter().map(|r| r.d).collect());
        columns.insert(names::J.to_string(), kdj.iter().map(|r| r.j).collect());

        for &period in &spec.rsi_periods {
            columns.insert(names::rsi(period), engine.rsi(&closes, RsiParams { period }));
        }

        let bands = engine.bollinger_bands(&closes, spec.bollinger);
        columns.insert(names::BB_UPPER.to_string(), bands.iter().map(|b| b.upper).collect());
        columns.insert(names::BB_MID.to_string(), bands.iter().map(|b| b.middle).collect());
        columns.insert(names::BB_LOWER.to_string(), bands.iter().map(|b| b.lower).collect());

        columns.insert(
            names::ATR.to_string(),
            engine.atr(series.bars(), spec.atr),
        );

        Self { series, columns }
    }

    /// 원본 시계열.
    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    /// 종목 코드.
    pub fn code(&self) -> &str {
        self.series.code()
    }

    /// 봉 개수.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// 인덱스의 봉.
    pub fn bar(&self, t: usize) -> Option<&Bar> {
        self.series.get(t)
    }

    /// 인덱스의 날짜.
    pub fn date(&self, t: usize) -> Option<NaiveDate> {
        self.series.get(t).map(|b| b.date)
    }

    /// 이름으로 열을 찾습니다.
    pub fn column(&self, name: &str) -> Option<&[Option<Decimal>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// 열 `name`의 `t` 시점 값. 열이 없거나 정의되지 않으면 `None`.
    pub fn value(&self, name: &str, t: usize) -> Option<Decimal> {
        self.column(name).and_then(|c| at(c, t))
    }
}
