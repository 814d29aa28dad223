use crate::core::error::StrategyError;
use chrono::NaiveTime;

/// 交易时段
///
/// 以 "HH:MM" 配置起止时间，区间为左闭右开 [start, end)。
/// start > end 时表示跨午夜时段（例如 22:00-02:00）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradingSession {
    start: NaiveTime,
    end: NaiveTime,
}

impl TradingSession {
    pub fn parse(start: &str, end: &str) -> Result<Self, StrategyError> {
        let start = parse_hhmm("session_start", start)?;
        let end = parse_hhmm("session_end", end)?;
        if start == end {
            return Err(StrategyError::ValidationError {
                field: "session_end".to_string(),
                reason: "起止时间不能相同".to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// 判断时刻是否落在时段内
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start < self.end {
            t >= self.start && t < self.end
        } else {
            // 跨午夜
            t >= self.start || t < self.end
        }
    }
}

/// 解析 "HH:MM" 格式的时间
fn parse_hhmm(field: &str, value: &str) -> Result<NaiveTime, StrategyError> {
    let invalid = || StrategyError::ValidationError {
        field: field.to_string(),
        reason: format!("时间格式必须为 HH:MM，实际为 '{}'", value),
    };

    let mut parts = value.split(':');
    let hour = parts
        .next()
        .and_then(|p| p.parse::<u32>().ok())
        .ok_or_else(invalid)?;
    let minute = parts
        .next()
        .and_then(|p| p.parse::<u32>().ok())
        .ok_or_else(invalid)?;
    if parts.next().is_some() {
        return Err(invalid());
    }

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let session = TradingSession::parse("06:00", "18:00").unwrap();
        assert_eq!(session.start(), NaiveTime::from_hms_opt(6, 0, 0).unwrap());
        assert_eq!(session.end(), NaiveTime::from_hms_opt(18, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_rejects_bad_format() {
        assert!(TradingSession::parse("6am", "18:00").is_err());
        assert!(TradingSession::parse("25:00", "18:00").is_err());
        assert!(TradingSession::parse("06:61", "18:00").is_err());
        assert!(TradingSession::parse("06:00:00", "18:00").is_err());
        assert!(TradingSession::parse("09:00", "09:00").is_err());
    }

    #[test]
    fn test_contains_normal_window() {
        let session = TradingSession::parse("06:00", "18:00").unwrap();
        assert!(session.contains(NaiveTime::from_hms_opt(6, 0, 0).unwrap()));
        assert!(session.contains(NaiveTime::from_hms_opt(12, 30, 0).unwrap()));
        // 右开区间
        assert!(!session.contains(NaiveTime::from_hms_opt(18, 0, 0).unwrap()));
        assert!(!session.contains(NaiveTime::from_hms_opt(5, 59, 59).unwrap()));
        assert!(!session.contains(NaiveTime::from_hms_opt(23, 0, 0).unwrap()));
    }

    #[test]
    fn test_contains_overnight_window() {
        let session = TradingSession::parse("22:00", "02:00").unwrap();
        assert!(session.contains(NaiveTime::from_hms_opt(22, 0, 0).unwrap()));
        assert!(session.contains(NaiveTime::from_hms_opt(23, 59, 0).unwrap()));
        assert!(session.contains(NaiveTime::from_hms_opt(0, 30, 0).unwrap()));
        assert!(!session.contains(NaiveTime::from_hms_opt(2, 0, 0).unwrap()));
        assert!(!session.contains(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
    }
}
