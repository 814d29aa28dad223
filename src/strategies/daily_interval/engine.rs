//! 入场调度核心逻辑
//!
//! 纯函数实现，状态显式传入传出，不持有锁。

use super::config::{DirectionPolicy, TradingConfig};
use super::state::ScheduleState;
use crate::core::types::OrderSide;
use crate::utils::session::TradingSession;
use chrono::{DateTime, Utc};
use rand::Rng;

/// 入场评估所需的上下文快照
#[derive(Debug, Clone, Copy)]
pub struct EntryContext {
    pub now: DateTime<Utc>,
    /// 净值保护是否冻结了交易
    pub frozen: bool,
    /// 现有仓位的盈亏点数，无仓位时为None
    pub last_position_points: Option<f64>,
    /// 入场过滤结论（未启用过滤时恒为true）
    pub filter_pass: bool,
}

/// 入场评估结论
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryDecision {
    Open(OrderSide),
    Skip(SkipReason),
}

/// 跳过开仓的原因
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    /// 净值保护冻结中
    Frozen,
    /// 不在交易时段内
    OutsideSession,
    /// 未到下一次开仓时刻
    NotDue,
    /// 今日开仓次数已达上限
    DailyLimitReached,
    /// 现有仓位盈亏点数未达阈值
    ThresholdNotMet { points: f64 },
    /// 入场过滤未通过
    FilterRejected,
}

/// 评估是否开仓
///
/// 固定顺序：冻结 → 时段 → 到点 → 日上限 → 点数阈值 → 过滤 → 方向。
pub fn evaluate_entry<R: Rng>(
    config: &TradingConfig,
    session: &TradingSession,
    state: &ScheduleState,
    ctx: EntryContext,
    rng: &mut R,
) -> EntryDecision {
    if ctx.frozen {
        return EntryDecision::Skip(SkipReason::Frozen);
    }

    if !session.contains(ctx.now.time()) {
        return EntryDecision::Skip(SkipReason::OutsideSession);
    }

    if let Some(next) = state.next_trade_time {
        if ctx.now < next {
            return EntryDecision::Skip(SkipReason::NotDue);
        }
    }

    if state.daily_position_count >= config.max_trades_per_day {
        return EntryDecision::Skip(SkipReason::DailyLimitReached);
    }

    if let Some(points) = ctx.last_position_points {
        if points.abs() < config.profit_threshold_points {
            return EntryDecision::Skip(SkipReason::ThresholdNotMet { points });
        }
    }

    if !ctx.filter_pass {
        return EntryDecision::Skip(SkipReason::FilterRejected);
    }

    EntryDecision::Open(choose_direction(config.direction, rng))
}

/// 按配置的方向策略选取开仓方向
pub fn choose_direction<R: Rng>(policy: DirectionPolicy, rng: &mut R) -> OrderSide {
    match policy {
        DirectionPolicy::Buy => OrderSide::Buy,
        DirectionPolicy::Sell => OrderSide::Sell,
        DirectionPolicy::Random => {
            if rng.gen_bool(0.5) {
                OrderSide::Buy
            } else {
                OrderSide::Sell
            }
        }
    }
}
