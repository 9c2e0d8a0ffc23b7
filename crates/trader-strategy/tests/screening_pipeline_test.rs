//! 스크리닝 파이프라인 통합 테스트.
//!
//! 공개 API만 사용합니다:
//! - StrategyRegistry / Screener 생성
//! - 배치 실행 결과의 결정성
//! - 수정주가 적용 후 신호
//! - 종목 단위 스킵과 극단적 가격

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trader_analytics::adjustment::AdjustmentMode;
use trader_analytics::backtest::BacktestConfig;
use trader_core::{Bar, CorporateAction, SignalKind};
use trader_strategy::{
    InstrumentData, Screener, ScreeningOptions, SkipReason, StrategyConfigOverrides,
    StrategyRegistry,
};

// ============================================================================
// 테스트 헬퍼 함수
// ============================================================================

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// 종가 목록으로 일봉 생성 (고가/저가 = 종가 ± 0.05).
fn bars(closes: &[Decimal]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            Bar::new(
                start() + Days::new(i as u64),
                c,
                c + dec!(0.05),
                c - dec!(0.05),
                c,
                dec!(10000),
            )
        })
        .collect()
}

/// 30봉 하락 후 30봉 상승.
fn v_shape(offset: Decimal) -> Vec<Decimal> {
    let step = dec!(0.25);
    let top = dec!(20) + offset;
    let bottom = top - step * Decimal::from(29);
    (0..30)
        .map(|i| top - step * Decimal::from(i))
        .chain((0..30).map(|i| bottom + step * Decimal::from(i + 1)))
        .collect()
}

fn screener(strategy: &str, options: ScreeningOptions) -> Screener {
    let overrides =
        StrategyConfigOverrides::from_toml_str("[macd]\nzero_axis_range = \"0.12\"\n").unwrap();
    Screener::new(
        &StrategyRegistry::with_builtin(),
        options.with_strategy(strategy),
        &overrides,
        BacktestConfig::default(),
    )
    .unwrap()
}

fn universe() -> Vec<InstrumentData> {
    (0..12)
        .map(|i| {
            let code = format!("{:06}", i + 1);
            InstrumentData::new(code, bars(&v_shape(Decimal::from(i))))
        })
        .collect()
}

// ============================================================================
// 결정성
// ============================================================================

#[test]
fn test_batch_is_deterministic_across_workers_and_order() {
    let instruments = universe();
    let mut reversed = instruments.clone();
    reversed.reverse();

    let single = screener("macd_zero_axis", ScreeningOptions::default().with_workers(1))
        .run(&instruments)
        .unwrap();
    let parallel = screener("macd_zero_axis", ScreeningOptions::default().with_workers(4))
        .run(&reversed)
        .unwrap();

    assert_eq!(single.processed, 12);
    assert!(!single.signals.is_empty());
    assert_eq!(
        serde_json::to_string(&single).unwrap(),
        serde_json::to_string(&parallel).unwrap()
    );
}

#[test]
fn test_signals_sorted_by_code_then_date() {
    let report = screener("pre_cross", ScreeningOptions::default())
        .run(&universe())
        .unwrap();

    let keys: Vec<_> = report.signals.iter().map(|s| s.sort_key()).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
    assert!(report.signals.iter().all(|s| s.signal_kind == SignalKind::Pre));
}

// ============================================================================
// 수정주가
// ============================================================================

#[test]
fn test_forward_adjustment_removes_split_gap() {
    let closes = v_shape(Decimal::ZERO);
    let split_at = 45;
    let raw: Vec<Decimal> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| if i >= split_at { c / dec!(2) } else { c })
        .collect();

    let mut split_bars = bars(&raw);
    for bar in &mut split_bars[split_at..] {
        bar.high = bar.close + dec!(0.025);
        bar.low = bar.close - dec!(0.025);
    }
    let split = InstrumentData::new("000001", split_bars).with_actions(vec![CorporateAction::split(
        start() + Days::new(split_at as u64),
        dec!(2),
    )]);
    let plain = InstrumentData::new("000001", bars(&closes));

    let options = ScreeningOptions::default().with_adjust(AdjustmentMode::Forward);
    let adjusted = screener("macd_zero_axis", options.clone()).run(&[split]).unwrap();
    let reference = screener("macd_zero_axis", options).run(&[plain]).unwrap();

    assert_eq!(adjusted.signals, reference.signals);
    assert_eq!(adjusted.backtest.trades, reference.backtest.trades);
}

// ============================================================================
// 스킵 처리
// ============================================================================

#[test]
fn test_failures_are_isolated_per_instrument() {
    let mut instruments = universe();

    // 고가 < 저가: 정제 단계에서 모두 제거
    let broken = bars(&[dec!(10); 3])
        .into_iter()
        .map(|mut b| {
            b.high = dec!(9);
            b.low = dec!(11);
            b
        })
        .collect();
    instruments.push(InstrumentData::new("BROKEN", broken));
    instruments.push(InstrumentData::new("SHORT", bars(&[dec!(10); 39])));

    // 일부 봉만 잘못된 종목은 남은 봉으로 평가
    let mut partial = bars(&v_shape(Decimal::ZERO));
    partial[5].close = dec!(-1);
    instruments.push(InstrumentData::new("PARTIAL", partial));

    let report = screener("triple_cross", ScreeningOptions::default())
        .run(&instruments)
        .unwrap();

    assert_eq!(report.processed, 13);
    assert_eq!(report.dropped_bars, 4);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.skipped[0].code, "BROKEN");
    assert_eq!(report.skipped[0].reason, SkipReason::NoValidBars);
    assert_eq!(
        report.skipped[1].reason,
        SkipReason::InsufficientData {
            required: 40,
            provided: 39
        }
    );
}

#[test]
fn test_extreme_prices_do_not_abort_batch() {
    let baseline = screener("macd_zero_axis", ScreeningOptions::default())
        .run(&universe())
        .unwrap();

    // 볼린저 편차 제곱이 Decimal 범위를 넘는 가격대
    let (lo, hi) = (
        Decimal::from(1_000_000_000_000_000i64),
        Decimal::from(2_000_000_000_000_000i64),
    );
    let huge: Vec<Decimal> = (0..60).map(|i| if i % 2 == 0 { lo } else { hi }).collect();

    let mut instruments = universe();
    instruments.push(InstrumentData::new("HUGE", bars(&huge)));

    let report = screener("macd_zero_axis", ScreeningOptions::default().with_workers(2))
        .run(&instruments)
        .unwrap();

    assert_eq!(report.processed, 13);
    assert!(report.skipped.is_empty());

    let others: Vec<_> = report
        .signals
        .iter()
        .filter(|s| s.stock_code != "HUGE")
        .cloned()
        .collect();
    assert_eq!(others, baseline.signals);
}
