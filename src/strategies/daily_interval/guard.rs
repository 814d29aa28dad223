//! 净值保护模块
//!
//! 跟踪净值峰值，涨幅达标后武装回撤线，跌破回撤线即触发：
//! 平掉全部仓位、冻结当日剩余时间、并把基准重置为平仓后净值。

use super::config::EquityGuardConfig;
use super::state::EquityGuardState;
use chrono::NaiveDate;

/// 单次净值检查的结论
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuardEvent {
    /// 无动作
    None,
    /// 本tick刚达到目标涨幅，回撤线已武装
    Armed { close_level: f64 },
    /// 净值跌破回撤线，需要平掉全部仓位并冻结当日交易
    Triggered { close_level: f64, equity: f64 },
}

/// 当前回撤线
///
/// 恒有 close_level <= highest_equity：武装的前提是峰值高于基准，
/// 回吐比例落在(0, 100]。
pub fn close_level(state: &EquityGuardState, config: &EquityGuardConfig) -> f64 {
    state.highest_equity
        - (state.highest_equity - state.initial_equity) * config.trailing_percent / 100.0
}

/// 每tick的净值检查
///
/// 峰值跟踪 → 武装判定 → 触发判定，触发时就地置位冻结标记。
pub fn evaluate(
    state: &mut EquityGuardState,
    config: &EquityGuardConfig,
    equity: f64,
    today: NaiveDate,
) -> GuardEvent {
    // 已触发则当日不再评估
    if state.protection_triggered {
        return GuardEvent::None;
    }

    if equity > state.highest_equity {
        state.highest_equity = equity;
    }

    let mut armed_this_tick = false;
    if !state.protection_activated {
        let gain_pct = if state.initial_equity > 0.0 {
            (equity - state.initial_equity) / state.initial_equity * 100.0
        } else {
            0.0
        };
        if gain_pct >= config.target_percent {
            state.protection_activated = true;
            armed_this_tick = true;
        } else {
            return GuardEvent::None;
        }
    }

    let level = close_level(state, config);
    if equity <= level {
        state.protection_triggered = true;
        state.protection_date = Some(today);
        return GuardEvent::Triggered {
            close_level: level,
            equity,
        };
    }

    if armed_this_tick {
        GuardEvent::Armed { close_level: level }
    } else {
        GuardEvent::None
    }
}

/// 平仓完成后重置基准
///
/// 按源脚本行为，基准取平仓后净值而非账户余额。
pub fn reset_baseline(state: &mut EquityGuardState, post_close_equity: f64) {
    state.initial_equity = post_close_equity;
    state.highest_equity = post_close_equity;
    state.protection_activated = false;
}

/// 日切处理：清除触发日期，解除冻结
pub fn on_day_rollover(state: &mut EquityGuardState, today: NaiveDate) {
    if state.protection_date != Some(today) {
        state.protection_date = None;
        state.protection_triggered = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EquityGuardConfig {
        EquityGuardConfig {
            target_percent: 5.0,
            trailing_percent: 50.0,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_peak_is_monotonic_before_trigger() {
        let mut state = EquityGuardState::new(10_000.0);
        let cfg = config();

        for equity in [10_100.0, 10_050.0, 10_200.0, 10_150.0] {
            evaluate(&mut state, &cfg, equity, day(4));
            assert!(state.highest_equity >= equity);
        }
        assert!((state.highest_equity - 10_200.0).abs() < 1e-9);
    }

    #[test]
    fn test_arming_at_target_gain() {
        let mut state = EquityGuardState::new(10_000.0);
        let cfg = config();

        // 涨幅4.99%不武装
        assert_eq!(evaluate(&mut state, &cfg, 10_499.0, day(4)), GuardEvent::None);
        assert!(!state.protection_activated);

        // 达到5%武装，回撤线 = 10500 - 500*50% = 10250
        match evaluate(&mut state, &cfg, 10_500.0, day(4)) {
            GuardEvent::Armed { close_level } => assert!((close_level - 10_250.0).abs() < 1e-9),
            other => panic!("expected Armed, got {:?}", other),
        }
    }

    #[test]
    fn test_close_level_follows_peak_and_never_exceeds_it() {
        let mut state = EquityGuardState::new(10_000.0);
        let cfg = config();
        evaluate(&mut state, &cfg, 10_500.0, day(4));

        let mut prev_level = close_level(&state, &cfg);
        for equity in [10_600.0, 10_800.0, 11_000.0] {
            evaluate(&mut state, &cfg, equity, day(4));
            let level = close_level(&state, &cfg);
            assert!(level <= state.highest_equity);
            assert!(level >= prev_level, "回撤线必须跟随峰值单调上移");
            prev_level = level;
        }
        // 峰值11000：回撤线 = 11000 - 1000*50% = 10500
        assert!((prev_level - 10_500.0).abs() < 1e-9);
    }

    #[test]
    fn test_trigger_and_baseline_reset() {
        let mut state = EquityGuardState::new(10_000.0);
        let cfg = config();
        evaluate(&mut state, &cfg, 10_600.0, day(4));

        // 跌到回撤线(10300)即触发
        match evaluate(&mut state, &cfg, 10_300.0, day(4)) {
            GuardEvent::Triggered { close_level, .. } => {
                assert!((close_level - 10_300.0).abs() < 1e-9)
            }
            other => panic!("expected Triggered, got {:?}", other),
        }
        assert!(state.protection_triggered);
        assert_eq!(state.protection_date, Some(day(4)));

        // 平仓后按平仓后净值重置基准
        reset_baseline(&mut state, 10_295.0);
        assert!((state.initial_equity - 10_295.0).abs() < 1e-9);
        assert!((state.highest_equity - 10_295.0).abs() < 1e-9);
        assert!(!state.protection_activated);

        // 当日剩余时间保持冻结
        assert_eq!(evaluate(&mut state, &cfg, 11_000.0, day(4)), GuardEvent::None);
        assert!(state.protection_triggered);
    }

    #[test]
    fn test_rollover_unfreezes_next_day() {
        let mut state = EquityGuardState::new(10_000.0);
        let cfg = config();
        evaluate(&mut state, &cfg, 10_600.0, day(4));
        evaluate(&mut state, &cfg, 10_200.0, day(4));
        assert!(state.protection_triggered);

        // 同日的日切检查不解除
        on_day_rollover(&mut state, day(4));
        assert!(state.protection_triggered);

        on_day_rollover(&mut state, day(5));
        assert!(!state.protection_triggered);
        assert!(state.protection_date.is_none());
    }

    #[test]
    fn test_spike_then_collapse_same_tick_arming() {
        let mut state = EquityGuardState::new(10_000.0);
        let cfg = config();

        // 武装tick本身也做触发判定：峰值先于净值出现时不留空窗
        state.highest_equity = 10_800.0;
        match evaluate(&mut state, &cfg, 10_500.0, day(4)) {
            GuardEvent::Triggered { close_level, .. } => {
                // 回撤线 = 10800 - 800*50% = 10400 < 10500，不应触发
                panic!("unexpected trigger at {}", close_level);
            }
            GuardEvent::Armed { close_level } => assert!((close_level - 10_400.0).abs() < 1e-9),
            GuardEvent::None => panic!("expected Armed"),
        }
    }
}
