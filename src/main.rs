// 课程内容同步命令
// 一次性批处理：把代码书写的内容目录幂等投影到 SQLite，
// 打印各实体的新建/更新/拒绝计数，拒绝内容逐条给出自然键与原因

use anyhow::Result;
use kecheng_sync::services::database::DatabaseService;
use kecheng_sync::services::sync::{SyncEngine, SyncReport};
use kecheng_sync::{content, services, utils};
use log::{error, info};

fn setup_logging() -> Result<()> {
    let level = std::env::var("KECHENG_LOG")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(log::LevelFilter::Info);

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

fn run() -> Result<SyncReport> {
    let db_path = utils::get_database_path();
    info!(
        "kecheng-sync {} 启动, 数据库: {}",
        env!("CARGO_PKG_VERSION"),
        db_path.display()
    );

    let db = DatabaseService::open(&db_path)?;
    services::bootstrap::seed_achievements(&db)?;

    let catalog = content::catalog();
    let report = SyncEngine::new(&db).sync(&catalog)?;
    report.log_summary();
    Ok(report)
}

fn main() {
    if let Err(e) = setup_logging() {
        eprintln!("日志初始化失败: {}", e);
    }

    match run() {
        Ok(report) => {
            if report.has_rejections() {
                // 合法内容已全部入库，被拒绝的条目见上方日志
                error!("同步完成但有 {} 条内容被拒绝", report.rejections.len());
                std::process::exit(1);
            }
            info!("同步完成");
        }
        Err(e) => {
            error!("同步失败: {:#}", e);
            std::process::exit(2);
        }
    }
}
