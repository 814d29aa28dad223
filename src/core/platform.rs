use crate::core::types::{
    AccountSummary, Order, OrderRequest, Position, Result, SymbolInfo, Ticker,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 交易平台通用接口trait
///
/// 策略只依赖这一组能力：时钟、行情、资金、仓位枚举、开仓、平仓。
/// 具体实现由平台提供（模拟盘见 `platform::paper`）。
#[async_trait]
pub trait TradingPlatform: Send + Sync {
    /// 获取平台名称
    fn name(&self) -> &str;

    /// 获取服务器时间（经纪商时间，日切以此为准）
    async fn server_time(&self) -> Result<DateTime<Utc>>;

    /// 获取交易品种元信息
    async fn get_symbol_info(&self, symbol: &str) -> Result<SymbolInfo>;

    /// 获取行情信息
    async fn get_ticker(&self, symbol: &str) -> Result<Ticker>;

    /// 获取账户资金快照
    async fn get_account(&self) -> Result<AccountSummary>;

    /// 枚举持仓，symbol为None时返回全部
    async fn get_positions(&self, symbol: Option<&str>) -> Result<Vec<Position>>;

    /// 提交开仓订单
    async fn open_order(&self, request: OrderRequest) -> Result<Order>;

    /// 请求平掉指定仓位
    async fn close_position(&self, ticket: u64) -> Result<Order>;
}
