pub mod indicators;
pub mod logger;
pub mod session;

pub use logger::StrategyLogger;
pub use session::TradingSession;
