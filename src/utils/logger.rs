use chrono::Local;
use log::Level;
/// 策略日志模块
/// 在log门面之外，为每个策略写独立的滚动日志文件
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

const LOG_DIR: &str = "logs/strategies";

/// 策略日志器
pub struct StrategyLogger {
    name: String,
    file: Mutex<Option<fs::File>>,
    max_size: u64,
    current_size: Mutex<u64>,
}

impl StrategyLogger {
    /// 创建策略日志器，日志写入 logs/strategies/<策略名>_<日期>.log
    pub fn new(strategy_name: &str, max_size_mb: u64) -> Self {
        let file = Self::open_log_file(strategy_name);
        let current_size = file
            .as_ref()
            .and_then(|f| f.metadata().ok())
            .map(|m| m.len())
            .unwrap_or(0);

        Self {
            name: strategy_name.to_string(),
            file: Mutex::new(file),
            max_size: max_size_mb * 1024 * 1024,
            current_size: Mutex::new(current_size),
        }
    }

    fn open_log_file(strategy_name: &str) -> Option<fs::File> {
        if !Path::new(LOG_DIR).exists() {
            if let Err(e) = fs::create_dir_all(LOG_DIR) {
                eprintln!("创建日志目录失败: {}", e);
                return None;
            }
        }

        let timestamp = Local::now().format("%Y%m%d");
        let log_file = format!("{}/{}_{}.log", LOG_DIR, strategy_name, timestamp);

        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .map_err(|e| eprintln!("打开日志文件失败: {}", e))
            .ok()
    }

    /// 写入日志，超过大小上限时滚动到新文件
    pub fn log(&self, level: Level, message: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let formatted = format!("[{}] [{}] [{}] {}\n", timestamp, self.name, level, message);

        let mut file_guard = self.file.lock().expect("Lock poisoned");
        let mut size_guard = self.current_size.lock().expect("Lock poisoned");

        if *size_guard + formatted.len() as u64 > self.max_size {
            *file_guard = None;

            let timestamp = Local::now().format("%Y%m%d_%H%M%S");
            let rotated = format!("{}/{}_{}_rotated.log", LOG_DIR, self.name, timestamp);

            if let Ok(new_file) = fs::OpenOptions::new().create(true).append(true).open(&rotated) {
                *file_guard = Some(new_file);
                *size_guard = 0;
            }
        }

        if let Some(ref mut file) = *file_guard {
            if file.write_all(formatted.as_bytes()).is_ok() {
                *size_guard += formatted.len() as u64;
                let _ = file.flush();
            }
        }
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }
}
