use chrono::{DateTime, DurationRound, Utc};
/// 技术指标模块
/// 入场过滤与移动止损所需的流式指标，由tick聚合的分钟K线驱动
use std::collections::VecDeque;

/// 分钟K线
#[derive(Debug, Clone, Copy)]
pub struct Bar {
    pub time: DateTime<Utc>,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// tick到分钟K线的聚合器
///
/// 只持有当前未收盘的一根，分钟切换时返回已完成的K线。
#[derive(Debug, Clone, Default)]
pub struct MinuteBarAggregator {
    current: Option<Bar>,
}

impl MinuteBarAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 喂入一个tick，若分钟已切换则返回上一根完成的K线
    pub fn update(&mut self, timestamp: DateTime<Utc>, price: f64) -> Option<Bar> {
        let minute = timestamp
            .duration_trunc(chrono::Duration::minutes(1))
            .unwrap_or(timestamp);

        match self.current.as_mut() {
            None => {
                self.current = Some(Bar {
                    time: minute,
                    high: price,
                    low: price,
                    close: price,
                });
                None
            }
            Some(bar) if bar.time == minute => {
                bar.high = bar.high.max(price);
                bar.low = bar.low.min(price);
                bar.close = price;
                None
            }
            Some(bar) => {
                let completed = *bar;
                self.current = Some(Bar {
                    time: minute,
                    high: price,
                    low: price,
                    close: price,
                });
                Some(completed)
            }
        }
    }
}

/// 流式指数移动平均
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: f64,
    value: Option<f64>,
    count: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            multiplier: 2.0 / (period as f64 + 1.0),
            value: None,
            count: 0,
        }
    }

    pub fn update(&mut self, sample: f64) -> Option<f64> {
        self.count += 1;
        self.value = match self.value {
            None => Some(sample),
            Some(prev) => Some((sample - prev) * self.multiplier + prev),
        };

        if self.count >= self.period {
            self.value
        } else {
            None
        }
    }

    pub fn current(&self) -> Option<f64> {
        if self.count >= self.period {
            self.value
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.value = None;
        self.count = 0;
    }
}

/// 流式ATR指标（Wilder平滑）
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    warmup: VecDeque<f64>,
    prev_close: Option<f64>,
    atr: Option<f64>,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            warmup: VecDeque::with_capacity(period),
            prev_close: None,
            atr: None,
        }
    }

    pub fn update(&mut self, bar: &Bar) -> Option<f64> {
        let tr = match self.prev_close {
            Some(prev) => {
                let hl = bar.high - bar.low;
                let hc = (bar.high - prev).abs();
                let lc = (bar.low - prev).abs();
                hl.max(hc).max(lc)
            }
            None => bar.high - bar.low,
        };
        self.prev_close = Some(bar.close);

        match self.atr {
            Some(prev_atr) => {
                self.atr = Some((prev_atr * (self.period - 1) as f64 + tr) / self.period as f64);
            }
            None => {
                self.warmup.push_back(tr);
                if self.warmup.len() >= self.period {
                    let sum: f64 = self.warmup.iter().sum();
                    self.atr = Some(sum / self.period as f64);
                    self.warmup.clear();
                }
            }
        }

        self.atr
    }

    pub fn current(&self) -> Option<f64> {
        self.atr
    }

    pub fn reset(&mut self) {
        self.warmup.clear();
        self.prev_close = None;
        self.atr = None;
    }
}

/// 流式ADX指标
#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    plus_dm: Ema,
    minus_dm: Ema,
    tr: Ema,
    dx_window: VecDeque<f64>,
    prev: Option<Bar>,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            plus_dm: Ema::new(period),
            minus_dm: Ema::new(period),
            tr: Ema::new(period),
            dx_window: VecDeque::with_capacity(period),
            prev: None,
        }
    }

    pub fn update(&mut self, bar: &Bar) -> Option<f64> {
        let prev = match self.prev.replace(*bar) {
            Some(prev) => prev,
            None => return None,
        };

        let up_move = bar.high - prev.high;
        let down_move = prev.low - bar.low;
        let plus = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        let minus = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };

        let hl = bar.high - bar.low;
        let hc = (bar.high - prev.close).abs();
        let lc = (bar.low - prev.close).abs();
        let tr = hl.max(hc).max(lc);

        let smooth_plus = self.plus_dm.update(plus)?;
        let smooth_minus = self.minus_dm.update(minus)?;
        let smooth_tr = self.tr.update(tr)?;

        if smooth_tr <= 0.0 {
            return self.current();
        }

        let plus_di = 100.0 * smooth_plus / smooth_tr;
        let minus_di = 100.0 * smooth_minus / smooth_tr;
        let di_sum = plus_di + minus_di;
        if di_sum <= 0.0 {
            return self.current();
        }

        let dx = 100.0 * (plus_di - minus_di).abs() / di_sum;
        if self.dx_window.len() >= self.period {
            self.dx_window.pop_front();
        }
        self.dx_window.push_back(dx);

        self.current()
    }

    pub fn current(&self) -> Option<f64> {
        if self.dx_window.len() < self.period {
            return None;
        }
        Some(self.dx_window.iter().sum::<f64>() / self.dx_window.len() as f64)
    }

    pub fn reset(&mut self) {
        self.plus_dm.reset();
        self.minus_dm.reset();
        self.tr.reset();
        self.dx_window.clear();
        self.prev = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(minute: i64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            time: Utc.with_ymd_and_hms(2024, 3, 4, 6, 0, 0).unwrap()
                + chrono::Duration::minutes(minute),
            high,
            low,
            close,
        }
    }

    #[test]
    fn test_minute_aggregation() {
        let mut agg = MinuteBarAggregator::new();
        let t0 = Utc.with_ymd_and_hms(2024, 3, 4, 6, 0, 10).unwrap();

        assert!(agg.update(t0, 1.1000).is_none());
        assert!(agg
            .update(t0 + chrono::Duration::seconds(20), 1.1010)
            .is_none());
        assert!(agg
            .update(t0 + chrono::Duration::seconds(30), 1.0995)
            .is_none());

        // 下一分钟的首个tick返回上一根K线
        let completed = agg
            .update(t0 + chrono::Duration::seconds(60), 1.1005)
            .unwrap();
        assert!((completed.high - 1.1010).abs() < 1e-9);
        assert!((completed.low - 1.0995).abs() < 1e-9);
        assert!((completed.close - 1.0995).abs() < 1e-9);
    }

    #[test]
    fn test_atr_warmup_and_value() {
        let mut atr = Atr::new(3);
        assert!(atr.update(&bar(0, 1.2, 1.0, 1.1)).is_none());
        assert!(atr.update(&bar(1, 1.3, 1.1, 1.2)).is_none());
        let value = atr.update(&bar(2, 1.4, 1.2, 1.3));
        assert!(value.is_some());
        assert!(value.unwrap() > 0.0);

        // Wilder平滑后仍为正
        let next = atr.update(&bar(3, 1.45, 1.25, 1.35)).unwrap();
        assert!(next > 0.0);
    }

    #[test]
    fn test_adx_trending_market() {
        let mut adx = Adx::new(5);
        let mut last = None;
        for i in 0..30 {
            let base = 1.1 + i as f64 * 0.002;
            last = adx.update(&bar(i, base + 0.001, base - 0.001, base));
        }
        // 单边趋势下ADX应当较高
        let value = last.expect("ADX应完成预热");
        assert!(value > 50.0, "trending ADX = {}", value);
        assert!(value <= 100.0);
    }

    #[test]
    fn test_adx_needs_warmup() {
        let mut adx = Adx::new(14);
        for i in 0..5 {
            let base = 1.1 + i as f64 * 0.001;
            assert!(adx.update(&bar(i, base + 0.001, base - 0.001, base)).is_none());
        }
    }
}
