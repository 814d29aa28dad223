#![allow(dead_code)]

pub mod core;
pub mod platform;
pub mod strategies;
pub mod utils;

// 选择性导出，避免命名冲突
pub use crate::core::{error::*, platform::TradingPlatform, types::*};
pub use platform::PaperPlatform;
pub use strategies::*;
pub use utils::*;
