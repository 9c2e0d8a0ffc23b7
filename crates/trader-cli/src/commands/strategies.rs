//! 전략 목록 명령어.

use anyhow::{anyhow, Result};
use trader_strategy::{StrategyMetadata, StrategyRegistry};

/// 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(anyhow!("Invalid format: {}. Use: table, json", s)),
        }
    }
}

/// 등록된 전략 목록을 문자열로 만듭니다.
pub fn list_strategies(registry: &StrategyRegistry, format: OutputFormat) -> Result<String> {
    let metadata = registry.metadata();
    match format {
        OutputFormat::Table => Ok(format_table(&metadata)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&metadata)?),
    }
}

/// 테이블 형식 출력.
fn format_table(strategies: &[StrategyMetadata]) -> String {
    let mut output = String::new();

    // 헤더
    output.push_str(&format!(
        "{:<16} {:<24} {:<8} {:<12} {:<6}\n",
        "ID", "NAME", "VERSION", "ENTRY", "BARS"
    ));
    output.push_str(&"-".repeat(70));
    output.push('\n');

    for s in strategies {
        let entry = s
            .entry_kinds
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(",");
        output.push_str(&format!(
            "{:<16} {:<24} {:<8} {:<12} {:<6}\n",
            s.id, s.name, s.version, entry, s.required_minimum_bars
        ));
        output.push_str(&format!("  {}\n", s.description));
    }

    output.push('\n');
    output.push_str(&format!("Total: {} strategies", strategies.len()));
    output
}
