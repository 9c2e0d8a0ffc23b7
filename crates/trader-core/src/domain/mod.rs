//! 스크리닝 엔진의 도메인 모델.

mod bar;
mod corporate_action;
mod signal;
mod trade;

pub use bar::*;
pub use corporate_action::*;
pub use signal::*;
pub use trade::*;
