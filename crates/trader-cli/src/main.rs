//! 신호 스크리닝 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 일봉 디렉토리 스크리닝 (기본 전략: macd_zero_axis)
//! trader screen -d data/daily
//!
//! # 설정 파일 + 전략 지정
//! trader screen -s config/screen.toml -d data/daily --strategy triple_cross -o out.json
//!
//! # 환경 변수로 덮어쓰기
//! TRADER__SCREENING__WORKERS=4 trader screen -d data/daily
//!
//! # 전략 목록
//! trader strategies
//! trader strategies -f json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use trader_cli::commands::screen::{run_screen, ScreenCliConfig};
use trader_cli::commands::strategies::{list_strategies, OutputFormat};
use trader_cli::AppSettings;
use trader_core::logging::init_logging;
use trader_strategy::StrategyRegistry;

#[derive(Parser)]
#[command(name = "trader")]
#[command(about = "Signal screening CLI - 일봉 기술적 지표 신호 스크리닝 및 백테스트", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 일봉 디렉토리를 스크리닝하고 신호/백테스트 결과를 저장
    Screen {
        /// 설정 파일 (TOML)
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// 일봉 데이터 디렉토리 (<code>.json, <code>.actions.json)
        #[arg(short, long)]
        data: PathBuf,

        /// 결과 저장 경로
        #[arg(short, long, default_value = "screening_report.json")]
        output: PathBuf,

        /// 전략 ID (설정 파일보다 우선)
        #[arg(long)]
        strategy: Option<String>,
    },

    /// 등록된 전략 목록 보기
    Strategies {
        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Screen {
            settings,
            data,
            output,
            strategy,
        } => {
            let app_settings = AppSettings::load(settings.as_deref())?;
            init_logging(app_settings.logging.to_log_config()?)?;

            let config = ScreenCliConfig {
                data_dir: data,
                output_path: output.clone(),
                strategy,
            };

            match run_screen(config, app_settings) {
                Ok(report) => {
                    info!("✅ Screening completed");
                    println!("\n{}", report.summary());
                    println!("\n📁 결과 저장됨: {}", output.display());
                }
                Err(e) => {
                    error!("Screening failed: {:#}", e);
                    return Err(e);
                }
            }
        }

        Commands::Strategies { format } => {
            let format = OutputFormat::parse(&format)?;
            println!("{}", list_strategies(&StrategyRegistry::with_builtin(), format)?);
        }
    }

    Ok(())
}
