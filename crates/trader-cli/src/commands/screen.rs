//! 스크리닝 명령어.
//!
//! 데이터 디렉토리의 `<code>.json` 일봉 파일(과 선택적인 `<code>.actions.json`
//! 배당/분할 파일)을 읽어 스크리닝을 실행하고 결과를 JSON으로 저장합니다.
//!
//! # 사용 예시
//!
//! ```bash
//! # 기본 설정 (MACD 제로축)
//! trader screen -d data/daily
//!
//! # 설정 파일과 전략 지정
//! trader screen -s config/screen.toml -d data/daily --strategy triple_cross -o signals.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use trader_core::{Bar, CorporateAction, PriceScale};
use trader_strategy::{InstrumentData, Screener, ScreeningReport, StrategyRegistry};

use crate::settings::AppSettings;

/// 배당/분할 파일 접미사
const ACTIONS_SUFFIX: &str = ".actions.json";

/// 스크리닝 CLI 설정
#[derive(Debug, Clone)]
pub struct ScreenCliConfig {
    /// 일봉 데이터 디렉토리
    pub data_dir: PathBuf,
    /// 결과 저장 경로
    pub output_path: PathBuf,
    /// 설정 파일의 전략 대신 사용할 전략 ID
    pub strategy: Option<String>,
}

/// 데이터 디렉토리에서 종목 입력을 로드합니다 (코드 순).
///
/// 가격은 종목 코드에 해당하는 구분의 제수로 나눕니다.
/// 읽을 수 없는 파일은 경고 후 건너뜁니다.
pub fn load_instruments(dir: &Path, scale: &PriceScale) -> Result<Vec<InstrumentData>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("데이터 디렉토리를 열 수 없음: {}", dir.display()))?;

    let mut codes: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.ends_with(ACTIONS_SUFFIX))
        .filter_map(|name| name.strip_suffix(".json").map(str::to_string))
        .collect();
    codes.sort();

    let mut instruments = Vec::with_capacity(codes.len());
    for code in codes {
        match load_instrument(dir, &code, scale) {
            Ok(instrument) => instruments.push(instrument),
            Err(e) => warn!(code = %code, error = %format!("{e:#}"), "종목 파일 로드 실패, 건너뜀"),
        }
    }

    info!(dir = %dir.display(), instruments = instruments.len(), "종목 데이터 로드 완료");
    Ok(instruments)
}

fn load_instrument(dir: &Path, code: &str, scale: &PriceScale) -> Result<InstrumentData> {
    let bars_path = dir.join(format!("{code}.json"));
    let raw: Vec<Bar> = read_json(&bars_path)?;

    let bars = raw.iter().map(|bar| scale.scale_bar(code, bar)).collect();

    let actions_path = dir.join(format!("{code}{ACTIONS_SUFFIX}"));
    let actions: Vec<CorporateAction> = if actions_path.exists() {
        read_json(&actions_path)?
    } else {
        Vec::new()
    };

    debug!(code, bars = raw.len(), actions = actions.len(), divisor = %scale.divisor_for(code), "종목 로드");
    Ok(InstrumentData::new(code, bars).with_actions(actions))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("파일 읽기 실패: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("JSON 파싱 실패: {}", path.display()))
}

/// 스크리닝 실행
pub fn run_screen(config: ScreenCliConfig, mut settings: AppSettings) -> Result<ScreeningReport> {
    if let Some(strategy) = config.strategy {
        settings.screening.strategy = strategy;
    }

    let registry = StrategyRegistry::with_builtin();
    let screener = Screener::new(
        &registry,
        settings.screening.clone(),
        &settings.strategy,
        settings.backtest.clone(),
    )?;

    let instruments = load_instruments(&config.data_dir, &settings.segments)?;
    let report = screener.run(&instruments)?;

    let json = serde_json::to_string_pretty(&report)?;
    fs::write(&config.output_path, json)
        .with_context(|| format!("결과 저장 실패: {}", config.output_path.display()))?;

    info!(output = %config.output_path.display(), "결과 저장 완료");
    Ok(report)
}
