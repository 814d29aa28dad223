use clap::{Arg, Command};
use rustea::core::types::SymbolInfo;
use rustea::platform::PaperPlatform;
use rustea::strategies::{DailyIntervalConfig, DailyIntervalStrategy};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载环境变量
    dotenv::dotenv().ok();

    // 解析命令行参数
    let matches = Command::new("RustEA")
        .version("1.0")
        .about("Rust定时交易策略主机")
        .arg(
            Arg::new("strategy")
                .short('s')
                .long("strategy")
                .value_name("STRATEGY")
                .help("策略类型: daily_interval")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径")
                .required(true),
        )
        .get_matches();

    let strategy_type = matches.get_one::<String>("strategy").unwrap();
    let config_file = matches.get_one::<String>("config").unwrap();

    // 读取策略配置文件获取日志级别
    let file_content = std::fs::read_to_string(config_file)?;
    let raw_config: serde_yaml::Value = serde_yaml::from_str(&file_content)?;

    // 从配置中获取日志级别，默认为INFO
    let log_level = raw_config
        .get("strategy")
        .and_then(|s| s.get("log_level"))
        .and_then(|l| l.as_str())
        .unwrap_or("INFO");

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    log::info!(
        "启动策略: {} with config: {}, 日志级别: {}",
        strategy_type,
        config_file,
        log_level
    );

    // 根据策略类型启动
    match strategy_type.as_str() {
        "daily_interval" => {
            let config: DailyIntervalConfig = serde_yaml::from_str(&file_content)?;

            // 非法配置在启动阶段直接拒绝
            if let Err(e) = config.validate() {
                log::error!("配置校验失败: {}", e);
                return Err(Box::new(e) as Box<dyn std::error::Error>);
            }

            if config.platform.mode != "paper" {
                log::error!("不支持的平台模式: {}", config.platform.mode);
                return Err(format!("不支持的平台模式: {}", config.platform.mode).into());
            }

            let symbol_info = SymbolInfo {
                symbol: config.trading.symbol.clone(),
                point: config.platform.point,
                digits: config.platform.digits,
                contract_size: config.platform.contract_size,
                lot_step: config.platform.lot_step,
            };

            let platform = Arc::new(PaperPlatform::new(
                symbol_info,
                config.platform.initial_balance,
                config.platform.spread_points,
                config.platform.start_price,
                chrono::Utc::now(),
                config.trading.random_seed,
            ));

            // 模拟盘行情推进任务（时间压缩空跑）
            let feeder = platform.clone();
            let step = chrono::Duration::seconds(config.platform.sim_step_secs);
            let max_step_points = config.platform.sim_step_max_points;
            let tick_interval = config.schedule.tick_interval_ms;
            tokio::spawn(async move {
                loop {
                    feeder.step(step, max_step_points).await;
                    tokio::time::sleep(tokio::time::Duration::from_millis(tick_interval)).await;
                }
            });

            log::info!("✅ 模拟盘平台已创建");

            let strategy = DailyIntervalStrategy::new(config, platform).await?;
            log::info!("定时交易策略已创建，开始运行...");

            // 运行策略
            strategy.start().await?;

            // 保持运行直到收到停止信号
            tokio::signal::ctrl_c().await?;
            log::info!("收到停止信号，正在关闭策略...");
            strategy.stop().await?;
        }
        _ => {
            log::error!("未知策略类型: {}", strategy_type);
            return Err(format!("未知策略类型: {}", strategy_type).into());
        }
    }

    Ok(())
}
