// 核心策略模块
pub mod daily_interval;

// 策略trait定义
use crate::core::types::{Result, Ticker};
use async_trait::async_trait;

#[async_trait]
pub trait Strategy: Send + Sync {
    async fn name(&self) -> String;
    async fn on_tick(&self, ticker: Ticker) -> Result<()>;
    async fn get_status(&self) -> Result<String>;
}

// 导出策略类型
pub use daily_interval::{DailyIntervalConfig, DailyIntervalStrategy};
