use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// 调度状态
///
/// 每个tick至多被调度检查修改一次，日切时重置。
#[derive(Debug, Clone, Default)]
pub struct ScheduleState {
    /// 下一次允许开仓的时刻，None表示时段开始即可开仓
    pub next_trade_time: Option<DateTime<Utc>>,
    /// 当前日历日（经纪商时间），用于日切判定
    pub current_date: Option<NaiveDate>,
    /// 今日已开仓次数
    pub daily_position_count: u32,
}

impl ScheduleState {
    /// 日切重置
    ///
    /// 每次日历日变化恰好执行一次。
    pub fn reset_daily(&mut self, today: NaiveDate) {
        self.current_date = Some(today);
        self.daily_position_count = 0;
        self.next_trade_time = None;
    }

    /// 成功开仓后推进调度
    pub fn record_open(&mut self, now: DateTime<Utc>, interval: chrono::Duration) {
        self.daily_position_count += 1;
        self.next_trade_time = Some(now + interval);
    }
}

/// 净值保护状态
#[derive(Debug, Clone)]
pub struct EquityGuardState {
    /// 基准净值，触发后重置为平仓后净值
    pub initial_equity: f64,
    /// 运行峰值净值，除触发重置外单调不减
    pub highest_equity: f64,
    /// 是否已达到目标涨幅并武装了回撤线
    pub protection_activated: bool,
    /// 是否已触发（当日剩余时间冻结交易）
    pub protection_triggered: bool,
    /// 触发日期，日切时清除
    pub protection_date: Option<NaiveDate>,
}

impl EquityGuardState {
    /// 启动时从当前账户净值初始化
    pub fn new(initial_equity: f64) -> Self {
        Self {
            initial_equity,
            highest_equity: initial_equity,
            protection_activated: false,
            protection_triggered: false,
            protection_date: None,
        }
    }
}

/// 当前持仓的离场簿记
#[derive(Debug, Clone, Default)]
pub struct ExitState {
    pub ticket: Option<u64>,
    /// ATR移动止损位，只朝盈利方向收紧
    pub trailing_stop: Option<f64>,
}

impl ExitState {
    /// 与当前持仓对齐，仓位变化时丢弃旧的移动止损
    pub fn sync(&mut self, ticket: Option<u64>) {
        if self.ticket != ticket {
            self.ticket = ticket;
            self.trailing_stop = None;
        }
    }
}

/// 状态快照（用于状态上报与日志）
#[derive(Debug, Clone, Serialize)]
pub struct StrategySnapshot {
    pub name: String,
    pub symbol: String,
    pub equity: f64,
    pub balance: f64,
    pub daily_position_count: u32,
    pub open_positions: usize,
    pub next_trade_time: Option<DateTime<Utc>>,
    pub guard_initial_equity: f64,
    pub guard_highest_equity: f64,
    pub guard_activated: bool,
    pub guard_triggered: bool,
    pub updated_at: DateTime<Utc>,
}
