use chrono::{DateTime, Utc};
/// 统一的类型定义模块
/// 策略与交易平台之间共享的数据结构
use serde::{Deserialize, Serialize};

// ============= 基础类型定义 =============

/// 结果类型别名
pub type Result<T> = std::result::Result<T, crate::core::error::StrategyError>;

// ============= 基础交易数据 =============

/// 交易品种元信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    /// 最小报价增量（点）
    pub point: f64,
    /// 报价小数位数
    pub digits: u32,
    /// 每手合约规模
    pub contract_size: f64,
    /// 最小手数步长
    pub lot_step: f64,
}

impl SymbolInfo {
    /// 把价格差换算为点数
    pub fn price_to_points(&self, price_diff: f64) -> f64 {
        if self.point <= 0.0 {
            return 0.0;
        }
        price_diff / self.point
    }
}

/// 行情数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub timestamp: DateTime<Utc>,
}

impl Ticker {
    /// 中间价
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    /// 行情是否可用于评估（买卖价为正且未过期）
    pub fn is_usable(&self, now: DateTime<Utc>, max_age_secs: i64) -> bool {
        if self.bid <= 0.0 || self.ask <= 0.0 {
            return false;
        }
        let age = now.signed_duration_since(self.timestamp).num_seconds();
        age.abs() <= max_age_secs
    }
}

/// 账户资金快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    /// 已实现余额
    pub balance: f64,
    /// 余额 + 浮动盈亏
    pub equity: f64,
    pub timestamp: DateTime<Utc>,
}

// ============= 订单相关 =============

/// 订单方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn opposite(&self) -> OrderSide {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 订单类型
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

/// 订单状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderStatus {
    Filled,
    Rejected,
    Canceled,
}

/// 订单请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub lots: f64,
    pub price: Option<f64>,
    #[serde(default)]
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    /// 创建一个市价单请求
    pub fn market(symbol: String, side: OrderSide, lots: f64) -> Self {
        Self {
            symbol,
            side,
            order_type: OrderType::Market,
            lots,
            price: None,
            client_order_id: None,
        }
    }
}

/// 订单回执
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub ticket: u64,
    pub symbol: String,
    pub side: OrderSide,
    pub lots: f64,
    /// 成交价
    pub price: f64,
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
}

// ============= 仓位相关 =============

/// 持仓（平台持有的只读视图，策略只读取并请求平仓）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub ticket: u64,
    pub symbol: String,
    pub side: OrderSide,
    pub lots: f64,
    pub open_time: DateTime<Utc>,
    pub open_price: f64,
    /// 浮动盈亏（账户货币）
    pub profit: f64,
}

impl Position {
    /// 以点数计算的浮动盈亏
    ///
    /// 多头按bid、空头按ask对照开仓价换算。
    pub fn profit_points(&self, bid: f64, ask: f64, point: f64) -> f64 {
        if point <= 0.0 {
            return 0.0;
        }
        match self.side {
            OrderSide::Buy => (bid - self.open_price) / point,
            OrderSide::Sell => (self.open_price - ask) / point,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_position(side: OrderSide, open_price: f64) -> Position {
        Position {
            ticket: 1,
            symbol: "EURUSD".to_string(),
            side,
            lots: 0.1,
            open_time: Utc::now(),
            open_price,
            profit: 0.0,
        }
    }

    #[test]
    fn test_profit_points_buy() {
        let pos = sample_position(OrderSide::Buy, 1.1000);
        let pts = pos.profit_points(1.1042, 1.1044, 0.0001);
        assert!((pts - 42.0).abs() < 1e-6);
    }

    #[test]
    fn test_profit_points_sell() {
        let pos = sample_position(OrderSide::Sell, 1.1000);
        let pts = pos.profit_points(1.0956, 1.0958, 0.0001);
        assert!((pts - 42.0).abs() < 1e-6);
    }

    #[test]
    fn test_ticker_usable() {
        let now = Utc::now();
        let ticker = Ticker {
            symbol: "EURUSD".to_string(),
            bid: 1.1000,
            ask: 1.1002,
            last: 1.1001,
            timestamp: now,
        };
        assert!(ticker.is_usable(now, 30));
        assert!(!ticker.is_usable(now + chrono::Duration::seconds(31), 30));

        let bad = Ticker {
            bid: 0.0,
            ..ticker.clone()
        };
        assert!(!bad.is_usable(now, 30));
    }

    #[test]
    fn test_price_to_points() {
        let info = SymbolInfo {
            symbol: "EURUSD".to_string(),
            point: 0.0001,
            digits: 5,
            contract_size: 100_000.0,
            lot_step: 0.01,
        };
        assert!((info.price_to_points(0.0042) - 42.0).abs() < 1e-6);
    }
}
