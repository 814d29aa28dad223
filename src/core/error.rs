use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("YAML配置错误: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON序列化错误: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("参数验证错误: {field} - {reason}")]
    ValidationError { field: String, reason: String },

    #[error("订单错误: {0}")]
    OrderError(String),

    #[error("订单被拒绝: {symbol} {side} {lots}手 - {reason}")]
    OrderRejected {
        symbol: String,
        side: String,
        lots: f64,
        reason: String,
    },

    #[error("交易对格式错误: {0}")]
    SymbolError(String),

    #[error("交易对未找到: {0}")]
    SymbolNotFound(String),

    #[error("仓位未找到: ticket {0}")]
    PositionNotFound(u64),

    #[error("行情数据缺失或过期: {symbol} ({reason})")]
    StalePrice { symbol: String, reason: String },

    #[error("平台错误: {0}")]
    PlatformError(String),

    #[error("数据解析错误: {0}")]
    ParseError(String),

    #[error("其他错误: {0}")]
    Other(String),
}

impl StrategyError {
    /// 判断错误是否可以在下一个tick重试
    pub fn is_retryable(&self) -> bool {
        match self {
            StrategyError::OrderError(_) => true,
            StrategyError::OrderRejected { .. } => true,
            StrategyError::StalePrice { .. } => true,
            StrategyError::PlatformError(_) => true,
            _ => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            StrategyError::StalePrice { .. } => ErrorSeverity::Info,
            StrategyError::OrderError(_) => ErrorSeverity::Warning,
            StrategyError::OrderRejected { .. } => ErrorSeverity::Warning,
            StrategyError::PlatformError(_) => ErrorSeverity::Warning,
            StrategyError::ConfigError(_) => ErrorSeverity::Critical,
            StrategyError::ValidationError { .. } => ErrorSeverity::Critical,
            StrategyError::YamlError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSeverity {
    Info,     // 信息性错误，跳过当前评估即可
    Warning,  // 警告性错误，下一个tick继续
    Error,    // 一般错误，需要用户处理
    Critical, // 严重错误，启动阶段直接拒绝
}
