use crate::core::error::StrategyError;
use crate::core::types::Result;
use crate::utils::session::TradingSession;
use serde::{Deserialize, Serialize};

/// 定时交易策略总体配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyIntervalConfig {
    pub strategy: StrategyConfig,
    pub trading: TradingConfig,
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub entry_filter: EntryFilterConfig,
    #[serde(default)]
    pub exit: ExitConfig,
    pub equity_guard: EquityGuardConfig,
    pub platform: PlatformConfig,
}

impl DailyIntervalConfig {
    /// 启动时校验配置，非法配置直接拒绝
    pub fn validate(&self) -> Result<()> {
        // 时间格式在这里统一校验
        self.schedule.session()?;

        if self.trading.lot_size <= 0.0 {
            return Err(invalid("trading.lot_size", "手数必须为正"));
        }
        if self.trading.max_trades_per_day == 0 {
            return Err(invalid("trading.max_trades_per_day", "每日交易上限至少为1"));
        }
        if self.trading.profit_threshold_points < 0.0 {
            return Err(invalid("trading.profit_threshold_points", "盈亏点数阈值不能为负"));
        }

        if self.schedule.interval_minutes < 1 {
            return Err(invalid("schedule.interval_minutes", "交易间隔至少为1分钟"));
        }
        if self.schedule.max_tick_age_secs < 1 {
            return Err(invalid("schedule.max_tick_age_secs", "行情过期容忍至少为1秒"));
        }

        if self.entry_filter.adx_enabled {
            if self.entry_filter.adx_period < 2 {
                return Err(invalid("entry_filter.adx_period", "ADX周期至少为2"));
            }
            if !(0.0..=100.0).contains(&self.entry_filter.adx_min) {
                return Err(invalid("entry_filter.adx_min", "ADX阈值必须在0-100之间"));
            }
        }

        if self.exit.take_profit_points < 0.0 {
            return Err(invalid("exit.take_profit_points", "止盈点数不能为负"));
        }
        if self.exit.stop_loss_points < 0.0 {
            return Err(invalid("exit.stop_loss_points", "止损点数不能为负"));
        }
        if self.exit.trailing_enabled {
            if self.exit.atr_period < 2 {
                return Err(invalid("exit.atr_period", "ATR周期至少为2"));
            }
            if self.exit.atr_multiplier <= 0.0 {
                return Err(invalid("exit.atr_multiplier", "ATR倍数必须为正"));
            }
        }

        if self.equity_guard.target_percent <= 0.0 {
            return Err(invalid("equity_guard.target_percent", "净值目标百分比必须为正"));
        }
        if self.equity_guard.trailing_percent <= 0.0 || self.equity_guard.trailing_percent > 100.0 {
            return Err(invalid(
                "equity_guard.trailing_percent",
                "净值回撤百分比必须在(0, 100]之间",
            ));
        }

        if self.platform.initial_balance <= 0.0 {
            return Err(invalid("platform.initial_balance", "初始资金必须为正"));
        }
        if self.platform.point <= 0.0 {
            return Err(invalid("platform.point", "点值必须为正"));
        }
        if self.platform.start_price <= 0.0 {
            return Err(invalid("platform.start_price", "起始价格必须为正"));
        }
        if self.platform.spread_points < 0.0 {
            return Err(invalid("platform.spread_points", "点差不能为负"));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> StrategyError {
    StrategyError::ValidationError {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// 策略相关元信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

/// 开仓方向策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionPolicy {
    /// 固定做多
    Buy,
    /// 固定做空
    Sell,
    /// 50/50随机
    Random,
}

/// 交易参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// 交易品种
    pub symbol: String,
    /// 固定手数
    pub lot_size: f64,
    /// 开仓方向策略
    #[serde(default = "default_direction")]
    pub direction: DirectionPolicy,
    /// 随机方向的种子，缺省时从系统熵初始化
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// 每日最大开仓次数
    #[serde(default = "default_max_trades_per_day")]
    pub max_trades_per_day: u32,
    /// 上一笔仓位盈亏点数达到该阈值才允许再次开仓
    #[serde(default = "default_profit_threshold_points")]
    pub profit_threshold_points: f64,
}

fn default_direction() -> DirectionPolicy {
    DirectionPolicy::Random
}

fn default_max_trades_per_day() -> u32 {
    4
}

fn default_profit_threshold_points() -> f64 {
    42.0
}

/// 交易时段与节奏
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// 时段开始 HH:MM
    pub session_start: String,
    /// 时段结束 HH:MM，早于开始时表示跨午夜
    pub session_end: String,
    /// 两次开仓之间的最小间隔（分钟）
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: i64,
    /// 行情轮询间隔（毫秒）
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// 行情过期容忍（秒），超过则跳过本次评估
    #[serde(default = "default_max_tick_age_secs")]
    pub max_tick_age_secs: i64,
}

impl ScheduleConfig {
    pub fn session(&self) -> Result<TradingSession> {
        TradingSession::parse(&self.session_start, &self.session_end)
    }
}

fn default_interval_minutes() -> i64 {
    240
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_max_tick_age_secs() -> i64 {
    30
}

/// 入场过滤配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryFilterConfig {
    /// 是否启用ADX趋势过滤
    #[serde(default)]
    pub adx_enabled: bool,
    #[serde(default = "default_adx_period")]
    pub adx_period: usize,
    /// ADX低于该值时跳过开仓
    #[serde(default = "default_adx_min")]
    pub adx_min: f64,
}

impl Default for EntryFilterConfig {
    fn default() -> Self {
        Self {
            adx_enabled: false,
            adx_period: default_adx_period(),
            adx_min: default_adx_min(),
        }
    }
}

fn default_adx_period() -> usize {
    14
}

fn default_adx_min() -> f64 {
    25.0
}

/// 离场配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitConfig {
    /// 止盈点数，0表示不启用
    #[serde(default)]
    pub take_profit_points: f64,
    /// 止损点数，0表示不启用
    #[serde(default)]
    pub stop_loss_points: f64,
    /// 是否启用ATR移动止损
    #[serde(default)]
    pub trailing_enabled: bool,
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,
    #[serde(default = "default_atr_multiplier")]
    pub atr_multiplier: f64,
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            take_profit_points: 0.0,
            stop_loss_points: 0.0,
            trailing_enabled: false,
            atr_period: default_atr_period(),
            atr_multiplier: default_atr_multiplier(),
        }
    }
}

fn default_atr_period() -> usize {
    14
}

fn default_atr_multiplier() -> f64 {
    2.0
}

/// 净值保护配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityGuardConfig {
    /// 相对初始净值的目标涨幅（百分比），达到后启动保护
    #[serde(default = "default_target_percent")]
    pub target_percent: f64,
    /// 允许从峰值回吐的利润比例（百分比）
    #[serde(default = "default_trailing_percent")]
    pub trailing_percent: f64,
}

fn default_target_percent() -> f64 {
    5.0
}

fn default_trailing_percent() -> f64 {
    50.0
}

/// 平台配置（模拟盘）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "default_mode")]
    pub mode: String,
    pub initial_balance: f64,
    /// 最小报价增量
    pub point: f64,
    #[serde(default = "default_digits")]
    pub digits: u32,
    #[serde(default = "default_contract_size")]
    pub contract_size: f64,
    #[serde(default = "default_lot_step")]
    pub lot_step: f64,
    #[serde(default = "default_spread_points")]
    pub spread_points: f64,
    pub start_price: f64,
    /// 空跑模式下每次轮询推进的模拟时间（秒）
    #[serde(default = "default_sim_step_secs")]
    pub sim_step_secs: i64,
    /// 空跑模式下随机游走的最大步长（点）
    #[serde(default = "default_sim_step_max_points")]
    pub sim_step_max_points: f64,
}

fn default_mode() -> String {
    "paper".to_string()
}

fn default_digits() -> u32 {
    5
}

fn default_contract_size() -> f64 {
    100_000.0
}

fn default_lot_step() -> f64 {
    0.01
}

fn default_spread_points() -> f64 {
    2.0
}

fn default_sim_step_secs() -> i64 {
    60
}

fn default_sim_step_max_points() -> f64 {
    15.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
strategy:
  name: daily_interval
  log_level: INFO
trading:
  symbol: EURUSD
  lot_size: 0.1
  direction: random
  random_seed: 42
  max_trades_per_day: 4
  profit_threshold_points: 42.0
schedule:
  session_start: "06:00"
  session_end: "18:00"
  interval_minutes: 240
equity_guard:
  target_percent: 5.0
  trailing_percent: 50.0
platform:
  initial_balance: 10000.0
  point: 0.0001
  start_price: 1.1000
"#
    }

    #[test]
    fn test_parse_sample_config() {
        let config: DailyIntervalConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.trading.direction, DirectionPolicy::Random);
        assert_eq!(config.trading.max_trades_per_day, 4);
        assert_eq!(config.schedule.interval_minutes, 240);
        // 未出现的块取默认值
        assert!(!config.entry_filter.adx_enabled);
        assert!(!config.exit.trailing_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_time() {
        let mut config: DailyIntervalConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        config.schedule.session_start = "6点".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config: DailyIntervalConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        config.equity_guard.trailing_percent = 150.0;
        assert!(config.validate().is_err());

        let mut config: DailyIntervalConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        config.trading.lot_size = 0.0;
        assert!(config.validate().is_err());

        let mut config: DailyIntervalConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        config.trading.max_trades_per_day = 0;
        assert!(config.validate().is_err());
    }
}
