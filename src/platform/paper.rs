use crate::core::error::StrategyError;
use crate::core::platform::TradingPlatform;
use crate::core::types::{
    AccountSummary, Order, OrderRequest, OrderStatus, Position, Result, SymbolInfo, Ticker,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// 模拟盘平台
///
/// 买单按ask成交、卖单按bid成交；平仓把浮动盈亏计入余额。
/// 时钟与行情既可由随机游走推进（空跑模式），也可由测试显式注入。
pub struct PaperPlatform {
    symbol_info: SymbolInfo,
    /// 点差（价格单位）
    spread: f64,
    state: RwLock<PaperState>,
}

struct PaperState {
    clock: DateTime<Utc>,
    bid: f64,
    ask: f64,
    balance: f64,
    positions: HashMap<u64, Position>,
    next_ticket: u64,
    reject_next_order: bool,
    rng: StdRng,
}

impl PaperPlatform {
    pub fn new(
        symbol_info: SymbolInfo,
        initial_balance: f64,
        spread_points: f64,
        start_price: f64,
        start_time: DateTime<Utc>,
        seed: Option<u64>,
    ) -> Self {
        let spread = spread_points * symbol_info.point;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            symbol_info,
            spread,
            state: RwLock::new(PaperState {
                clock: start_time,
                bid: start_price,
                ask: start_price + spread,
                balance: initial_balance,
                positions: HashMap::new(),
                next_ticket: 1,
                reject_next_order: false,
                rng,
            }),
        }
    }

    /// 注入确定性行情（测试与回放使用）
    pub async fn set_market(&self, bid: f64, now: DateTime<Utc>) {
        let mut state = self.state.write().await;
        state.bid = bid;
        state.ask = bid + self.spread;
        state.clock = now;
        Self::revalue_positions(&mut state, &self.symbol_info);
    }

    /// 只推进时钟，不改变价格
    pub async fn advance(&self, duration: Duration) {
        let mut state = self.state.write().await;
        state.clock += duration;
    }

    /// 随机游走推进一步（空跑模式），步长不超过max_step_points个点
    pub async fn step(&self, duration: Duration, max_step_points: f64) {
        let mut state = self.state.write().await;
        state.clock += duration;

        let step = state.rng.gen_range(-max_step_points..=max_step_points) * self.symbol_info.point;
        let bid = (state.bid + step).max(self.symbol_info.point);
        state.bid = bid;
        state.ask = bid + self.spread;
        Self::revalue_positions(&mut state, &self.symbol_info);
    }

    /// 让下一笔订单被拒绝（测试错误路径）
    pub async fn fail_next_order(&self) {
        self.state.write().await.reject_next_order = true;
    }

    pub async fn balance(&self) -> f64 {
        self.state.read().await.balance
    }

    fn revalue_positions(state: &mut PaperState, info: &SymbolInfo) {
        let (bid, ask) = (state.bid, state.ask);
        for position in state.positions.values_mut() {
            let points = position.profit_points(bid, ask, info.point);
            position.profit = points * info.point * info.contract_size * position.lots;
        }
    }

    fn check_symbol(&self, symbol: &str) -> Result<()> {
        if symbol != self.symbol_info.symbol {
            return Err(StrategyError::SymbolNotFound(symbol.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TradingPlatform for PaperPlatform {
    fn name(&self) -> &str {
        "paper"
    }

    async fn server_time(&self) -> Result<DateTime<Utc>> {
        Ok(self.state.read().await.clock)
    }

    async fn get_symbol_info(&self, symbol: &str) -> Result<SymbolInfo> {
        self.check_symbol(symbol)?;
        Ok(self.symbol_info.clone())
    }

    async fn get_ticker(&self, symbol: &str) -> Result<Ticker> {
        self.check_symbol(symbol)?;
        let state = self.state.read().await;
        Ok(Ticker {
            symbol: symbol.to_string(),
            bid: state.bid,
            ask: state.ask,
            last: (state.bid + state.ask) / 2.0,
            timestamp: state.clock,
        })
    }

    async fn get_account(&self) -> Result<AccountSummary> {
        let state = self.state.read().await;
        let floating: f64 = state.positions.values().map(|p| p.profit).sum();
        Ok(AccountSummary {
            balance: state.balance,
            equity: state.balance + floating,
            timestamp: state.clock,
        })
    }

    async fn get_positions(&self, symbol: Option<&str>) -> Result<Vec<Position>> {
        let state = self.state.read().await;
        let mut positions: Vec<Position> = state
            .positions
            .values()
            .filter(|p| symbol.map_or(true, |s| p.symbol == s))
            .cloned()
            .collect();
        positions.sort_by_key(|p| p.ticket);
        Ok(positions)
    }

    async fn open_order(&self, request: OrderRequest) -> Result<Order> {
        self.check_symbol(&request.symbol)?;
        if request.lots <= 0.0 {
            return Err(StrategyError::OrderError(format!(
                "手数必须为正: {}",
                request.lots
            )));
        }

        let mut state = self.state.write().await;
        if state.reject_next_order {
            state.reject_next_order = false;
            return Err(StrategyError::OrderRejected {
                symbol: request.symbol,
                side: request.side.to_string(),
                lots: request.lots,
                reason: "模拟拒单".to_string(),
            });
        }

        let fill_price = match request.side {
            crate::core::types::OrderSide::Buy => state.ask,
            crate::core::types::OrderSide::Sell => state.bid,
        };

        let ticket = state.next_ticket;
        state.next_ticket += 1;

        let position = Position {
            ticket,
            symbol: request.symbol.clone(),
            side: request.side,
            lots: request.lots,
            open_time: state.clock,
            open_price: fill_price,
            profit: 0.0,
        };
        state.positions.insert(ticket, position);
        Self::revalue_positions(&mut state, &self.symbol_info);

        Ok(Order {
            ticket,
            symbol: request.symbol,
            side: request.side,
            lots: request.lots,
            price: fill_price,
            status: OrderStatus::Filled,
            timestamp: state.clock,
        })
    }

    async fn close_position(&self, ticket: u64) -> Result<Order> {
        let mut state = self.state.write().await;
        let position = state
            .positions
            .remove(&ticket)
            .ok_or(StrategyError::PositionNotFound(ticket))?;

        let close_price = match position.side {
            crate::core::types::OrderSide::Buy => state.bid,
            crate::core::types::OrderSide::Sell => state.ask,
        };
        state.balance += position.profit;

        Ok(Order {
            ticket,
            symbol: position.symbol,
            side: position.side.opposite(),
            lots: position.lots,
            price: close_price,
            status: OrderStatus::Filled,
            timestamp: state.clock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::OrderSide;
    use chrono::TimeZone;

    fn eurusd() -> SymbolInfo {
        SymbolInfo {
            symbol: "EURUSD".to_string(),
            point: 0.0001,
            digits: 5,
            contract_size: 100_000.0,
            lot_step: 0.01,
        }
    }

    fn platform() -> PaperPlatform {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 6, 0, 0).unwrap();
        PaperPlatform::new(eurusd(), 10_000.0, 2.0, 1.1000, start, Some(7))
    }

    #[tokio::test]
    async fn test_buy_fills_at_ask() {
        let platform = platform();
        let order = platform
            .open_order(OrderRequest::market("EURUSD".to_string(), OrderSide::Buy, 0.1))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert!((order.price - 1.1002).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_equity_tracks_floating_profit() {
        let platform = platform();
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 6, 0, 0).unwrap();
        platform
            .open_order(OrderRequest::market("EURUSD".to_string(), OrderSide::Buy, 0.1))
            .await
            .unwrap();

        // bid上涨100点，0.1手 × 100000 × 0.0001 × (100 - 2点点差成本)
        platform
            .set_market(1.1102, start + Duration::minutes(1))
            .await;

        let account = platform.get_account().await.unwrap();
        let expected_profit = (1.1102 - 1.1002) * 100_000.0 * 0.1;
        assert!((account.equity - (10_000.0 + expected_profit)).abs() < 1e-6);
        assert!((account.balance - 10_000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_close_realizes_profit_into_balance() {
        let platform = platform();
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 6, 0, 0).unwrap();
        let order = platform
            .open_order(OrderRequest::market("EURUSD".to_string(), OrderSide::Sell, 0.1))
            .await
            .unwrap();

        // bid下跌50点，空头盈利
        platform
            .set_market(1.0950, start + Duration::minutes(1))
            .await;
        platform.close_position(order.ticket).await.unwrap();

        let account = platform.get_account().await.unwrap();
        assert!(account.balance > 10_000.0);
        assert!((account.balance - account.equity).abs() < 1e-9);
        assert!(platform.get_positions(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_forced_rejection() {
        let platform = platform();
        platform.fail_next_order().await;

        let result = platform
            .open_order(OrderRequest::market("EURUSD".to_string(), OrderSide::Buy, 0.1))
            .await;
        assert!(matches!(result, Err(StrategyError::OrderRejected { .. })));

        // 只拒绝一次
        assert!(platform
            .open_order(OrderRequest::market("EURUSD".to_string(), OrderSide::Buy, 0.1))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_unknown_symbol_rejected() {
        let platform = platform();
        assert!(matches!(
            platform.get_ticker("XAUUSD").await,
            Err(StrategyError::SymbolNotFound(_))
        ));
    }
}
