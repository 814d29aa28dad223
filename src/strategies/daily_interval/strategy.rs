use super::config::DailyIntervalConfig;
use super::engine::{self, EntryContext, EntryDecision, SkipReason};
use super::exits::{self, CloseReason, ExitDecision};
use super::guard::{self, GuardEvent};
use super::state::{EquityGuardState, ExitState, ScheduleState, StrategySnapshot};
use crate::core::platform::TradingPlatform;
use crate::core::types::{OrderRequest, Position, Result, SymbolInfo, Ticker};
use crate::strategies::Strategy;
use crate::utils::indicators::{Adx, Atr, MinuteBarAggregator};
use crate::utils::logger::StrategyLogger;
use crate::utils::session::TradingSession;
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// 定时交易 + 净值保护策略
///
/// 每个tick按固定顺序执行：净值保护检查 → 日切检查 → 离场管理 → 入场调度。
#[derive(Clone)]
pub struct DailyIntervalStrategy {
    config: DailyIntervalConfig,
    session: TradingSession,
    symbol_info: SymbolInfo,
    platform: Arc<dyn TradingPlatform>,
    shared: Arc<RwLock<SharedState>>,
    rng: Arc<Mutex<StdRng>>,
    logger: Arc<StrategyLogger>,
    running: Arc<AtomicBool>,
}

struct SharedState {
    schedule: ScheduleState,
    guard: EquityGuardState,
    exit_states: HashMap<u64, ExitState>,
    bars: MinuteBarAggregator,
    adx: Adx,
    atr: Atr,
    last_equity: f64,
    last_balance: f64,
    updated_at: chrono::DateTime<Utc>,
}

impl DailyIntervalStrategy {
    pub async fn new(
        config: DailyIntervalConfig,
        platform: Arc<dyn TradingPlatform>,
    ) -> Result<Self> {
        config.validate()?;
        let session = config.schedule.session()?;

        let symbol_info = platform.get_symbol_info(&config.trading.symbol).await?;
        let account = platform.get_account().await?;

        let rng = match config.trading.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let logger = StrategyLogger::new(&config.strategy.name, 10);

        info!(
            "策略初始化: {} 品种={} 时段={}-{} 间隔={}分钟 初始净值={:.2}",
            config.strategy.name,
            symbol_info.symbol,
            config.schedule.session_start,
            config.schedule.session_end,
            config.schedule.interval_minutes,
            account.equity
        );

        let shared = SharedState {
            schedule: ScheduleState::default(),
            guard: EquityGuardState::new(account.equity),
            exit_states: HashMap::new(),
            bars: MinuteBarAggregator::new(),
            adx: Adx::new(config.entry_filter.adx_period),
            atr: Atr::new(config.exit.atr_period),
            last_equity: account.equity,
            last_balance: account.balance,
            updated_at: account.timestamp,
        };

        Ok(Self {
            config,
            session,
            symbol_info,
            platform,
            shared: Arc::new(RwLock::new(shared)),
            rng: Arc::new(Mutex::new(rng)),
            logger: Arc::new(logger),
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// 启动行情轮询循环
    pub async fn start(&self) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);
        let strategy = self.clone();
        let interval = self.config.schedule.tick_interval_ms;

        tokio::spawn(async move {
            info!("策略 {} 开始运行", strategy.config.strategy.name);
            while strategy.running.load(Ordering::SeqCst) {
                match strategy
                    .platform
                    .get_ticker(&strategy.config.trading.symbol)
                    .await
                {
                    Ok(ticker) => {
                        if let Err(e) = strategy.on_tick(ticker).await {
                            warn!("tick处理失败: {}，下一个tick继续", e);
                        }
                    }
                    Err(e) => warn!("获取行情失败: {}", e),
                }
                tokio::time::sleep(tokio::time::Duration::from_millis(interval)).await;
            }
            info!("策略 {} 轮询循环退出", strategy.config.strategy.name);
        });

        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        info!("策略 {} 已停止", self.config.strategy.name);
        Ok(())
    }

    /// 单个tick的完整处理
    pub async fn on_tick(&self, ticker: Ticker) -> Result<()> {
        // 行情缺失或过期则跳过本次评估
        let server_now = self.platform.server_time().await?;
        if !ticker.is_usable(server_now, self.config.schedule.max_tick_age_secs) {
            debug!("行情不可用，跳过评估: {:?}", ticker);
            return Ok(());
        }

        let now = ticker.timestamp;
        let today = now.date_naive();
        let account = self.platform.get_account().await?;
        let positions = self
            .platform
            .get_positions(Some(&self.config.trading.symbol))
            .await?;

        let mut shared = self.shared.write().await;
        shared.last_equity = account.equity;
        shared.last_balance = account.balance;
        shared.updated_at = now;

        // 指标更新（分钟K线收盘时）
        if let Some(bar) = shared.bars.update(now, ticker.mid()) {
            if self.config.entry_filter.adx_enabled {
                shared.adx.update(&bar);
            }
            if self.config.exit.trailing_enabled {
                shared.atr.update(&bar);
            }
        }

        // 1. 净值保护检查
        match guard::evaluate(
            &mut shared.guard,
            &self.config.equity_guard,
            account.equity,
            today,
        ) {
            GuardEvent::Armed { close_level } => {
                info!(
                    "净值保护已武装: 净值={:.2} 峰值={:.2} 回撤线={:.2}",
                    account.equity, shared.guard.highest_equity, close_level
                );
                self.logger.info(&format!(
                    "净值保护武装 equity={:.2} close_level={:.2}",
                    account.equity, close_level
                ));
            }
            GuardEvent::Triggered {
                close_level,
                equity,
            } => {
                warn!(
                    "净值保护触发: 净值={:.2} <= 回撤线={:.2}，平掉全部仓位并冻结当日交易",
                    equity, close_level
                );
                self.close_all(&positions).await;

                // 按源脚本行为：基准重置为平仓后净值
                let post = self.platform.get_account().await?;
                guard::reset_baseline(&mut shared.guard, post.equity);
                shared.exit_states.clear();
                shared.last_equity = post.equity;
                shared.last_balance = post.balance;

                self.logger.warn(&format!(
                    "净值保护触发 equity={:.2} close_level={:.2} 重置基准={:.2}",
                    equity, close_level, post.equity
                ));
                return Ok(());
            }
            GuardEvent::None => {}
        }

        // 2. 日切检查
        if shared.schedule.current_date != Some(today) {
            let first_day = shared.schedule.current_date.is_none();
            shared.schedule.reset_daily(today);
            guard::on_day_rollover(&mut shared.guard, today);
            if !first_day {
                info!("日切: {}，重置每日计数", today);
            }
        }

        // 3. 离场管理
        shared
            .exit_states
            .retain(|ticket, _| positions.iter().any(|p| p.ticket == *ticket));
        let atr = if self.config.exit.trailing_enabled {
            shared.atr.current()
        } else {
            None
        };
        for position in &positions {
            let exit_state = shared
                .exit_states
                .entry(position.ticket)
                .or_insert_with(ExitState::default);
            let decision = exits::evaluate(
                &self.config.exit,
                position,
                &ticker,
                self.symbol_info.point,
                atr,
                exit_state,
            );
            if let ExitDecision::Close(reason) = decision {
                self.close_for_reason(position, reason).await;
                // 本tick只处理离场，入场留到下一个tick
                return Ok(());
            }
        }

        // 4. 入场调度
        let last_position_points = positions
            .last()
            .map(|p| p.profit_points(ticker.bid, ticker.ask, self.symbol_info.point));
        let filter_pass = if self.config.entry_filter.adx_enabled {
            // 未预热视为不通过
            shared
                .adx
                .current()
                .map_or(false, |adx| adx >= self.config.entry_filter.adx_min)
        } else {
            true
        };

        let context = EntryContext {
            now,
            frozen: shared.guard.protection_triggered,
            last_position_points,
            filter_pass,
        };

        let decision = {
            let mut rng = self.rng.lock().await;
            engine::evaluate_entry(
                &self.config.trading,
                &self.session,
                &shared.schedule,
                context,
                &mut *rng,
            )
        };

        match decision {
            EntryDecision::Open(side) => {
                let request = OrderRequest::market(
                    self.config.trading.symbol.clone(),
                    side,
                    self.config.trading.lot_size,
                );
                match self.platform.open_order(request).await {
                    Ok(order) => {
                        shared.schedule.record_open(
                            now,
                            chrono::Duration::minutes(self.config.schedule.interval_minutes),
                        );
                        info!(
                            "开仓成功: ticket={} {} {}手 @ {:.prec$} 今日第{}笔",
                            order.ticket,
                            order.side,
                            order.lots,
                            order.price,
                            shared.schedule.daily_position_count,
                            prec = self.symbol_info.digits as usize
                        );
                        self.logger.info(&format!(
                            "开仓 ticket={} side={} lots={} price={:.5}",
                            order.ticket, order.side, order.lots, order.price
                        ));
                    }
                    Err(e) => {
                        // 不重试，调度状态保持不变，下一个tick重新评估
                        warn!("订单提交失败: {}，跳过本次开仓", e);
                        self.logger.warn(&format!("订单提交失败: {}", e));
                    }
                }
            }
            EntryDecision::Skip(reason) => match reason {
                SkipReason::ThresholdNotMet { points } => {
                    debug!(
                        "开仓条件未满足: 上一仓位盈亏{:.1}点 < 阈值{:.1}点",
                        points, self.config.trading.profit_threshold_points
                    );
                }
                SkipReason::FilterRejected => {
                    debug!("入场过滤未通过，跳过开仓");
                }
                _ => {}
            },
        }

        Ok(())
    }

    async fn close_all(&self, positions: &[Position]) {
        for position in positions {
            match self.platform.close_position(position.ticket).await {
                Ok(order) => info!(
                    "平仓: ticket={} {} @ {:.prec$}",
                    order.ticket,
                    order.side,
                    order.price,
                    prec = self.symbol_info.digits as usize
                ),
                Err(e) => warn!("平仓失败: ticket={} {}", position.ticket, e),
            }
        }
    }

    async fn close_for_reason(&self, position: &Position, reason: CloseReason) {
        let label = match reason {
            CloseReason::TakeProfit { points } => format!("止盈({:.1}点)", points),
            CloseReason::StopLoss { points } => format!("止损({:.1}点)", points),
            CloseReason::TrailingStop { level } => format!("移动止损(@{:.5})", level),
        };
        match self.platform.close_position(position.ticket).await {
            Ok(order) => {
                info!("{}平仓: ticket={} @ {:.5}", label, order.ticket, order.price);
                self.logger
                    .info(&format!("{} ticket={} price={:.5}", label, order.ticket, order.price));
            }
            Err(e) => warn!("{}平仓失败: ticket={} {}", label, position.ticket, e),
        }
    }

    /// 当前状态快照
    pub async fn snapshot(&self) -> StrategySnapshot {
        let shared = self.shared.read().await;
        StrategySnapshot {
            name: self.config.strategy.name.clone(),
            symbol: self.symbol_info.symbol.clone(),
            equity: shared.last_equity,
            balance: shared.last_balance,
            daily_position_count: shared.schedule.daily_position_count,
            open_positions: shared.exit_states.len(),
            next_trade_time: shared.schedule.next_trade_time,
            guard_initial_equity: shared.guard.initial_equity,
            guard_highest_equity: shared.guard.highest_equity,
            guard_activated: shared.guard.protection_activated,
            guard_triggered: shared.guard.protection_triggered,
            updated_at: shared.updated_at,
        }
    }
}

#[async_trait]
impl Strategy for DailyIntervalStrategy {
    async fn name(&self) -> String {
        self.config.strategy.name.clone()
    }

    async fn on_tick(&self, ticker: Ticker) -> Result<()> {
        DailyIntervalStrategy::on_tick(self, ticker).await
    }

    async fn get_status(&self) -> Result<String> {
        let snapshot = self.snapshot().await;
        Ok(serde_json::to_string(&snapshot)?)
    }
}
