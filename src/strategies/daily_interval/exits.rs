//! 离场管理模块
//!
//! 点数止盈/止损与ATR移动止损。移动止损只朝盈利方向收紧，从不放宽。

use super::config::ExitConfig;
use super::state::ExitState;
use crate::core::types::{OrderSide, Position, Ticker};

/// 离场评估结论
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExitDecision {
    Hold,
    Close(CloseReason),
}

/// 平仓原因
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CloseReason {
    TakeProfit { points: f64 },
    StopLoss { points: f64 },
    TrailingStop { level: f64 },
}

/// 评估当前持仓是否应当离场
///
/// atr为None时（未启用或未预热）只做点数止盈止损。
pub fn evaluate(
    config: &ExitConfig,
    position: &Position,
    ticker: &Ticker,
    point: f64,
    atr: Option<f64>,
    exit_state: &mut ExitState,
) -> ExitDecision {
    exit_state.sync(Some(position.ticket));

    let points = position.profit_points(ticker.bid, ticker.ask, point);

    if config.take_profit_points > 0.0 && points >= config.take_profit_points {
        return ExitDecision::Close(CloseReason::TakeProfit { points });
    }

    if config.stop_loss_points > 0.0 && points <= -config.stop_loss_points {
        return ExitDecision::Close(CloseReason::StopLoss { points });
    }

    if config.trailing_enabled {
        if let Some(atr) = atr {
            let distance = atr * config.atr_multiplier;
            match position.side {
                OrderSide::Buy => {
                    let candidate = ticker.bid - distance;
                    let stop = match exit_state.trailing_stop {
                        Some(stop) => stop.max(candidate),
                        None => candidate,
                    };
                    exit_state.trailing_stop = Some(stop);
                    if ticker.bid <= stop {
                        return ExitDecision::Close(CloseReason::TrailingStop { level: stop });
                    }
                }
                OrderSide::Sell => {
                    let candidate = ticker.ask + distance;
                    let stop = match exit_state.trailing_stop {
                        Some(stop) => stop.min(candidate),
                        None => candidate,
                    };
                    exit_state.trailing_stop = Some(stop);
                    if ticker.ask >= stop {
                        return ExitDecision::Close(CloseReason::TrailingStop { level: stop });
                    }
                }
            }
        }
    }

    ExitDecision::Hold
}
