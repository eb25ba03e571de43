// 计划器诊断日志
//
// 规则、复制会话和计划输出通过 `log` 宏记录；这里负责把它们接到按大小滚动的文件上

use crate::config::Config;
use crate::core::error::{PlanError, PlanResult};
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use std::sync::Mutex;

/// 异步写入线程的句柄，`shutdown` 时取出并 flush
static LOGGER_HANDLE: Mutex<Option<LoggerHandle>> = Mutex::new(None);

/// 按 `[log]` 配置启动文件日志
///
/// 进程内只启动一次，之后的调用保留已有的句柄
///
/// ```no_run
/// use sqlplan::config::Config;
/// use sqlplan::utils::logging;
///
/// logging::init(&Config::default()).expect("日志初始化失败");
/// ```
pub fn init(config: &Config) -> PlanResult<()> {
    let mut guard = LOGGER_HANDLE
        .lock()
        .map_err(|e| PlanError::Config(format!("日志句柄不可用: {}", e)))?;
    if guard.is_some() {
        return Ok(());
    }

    let handle = Logger::try_with_str(&config.log.level)
        .map_err(|e| PlanError::Config(format!("日志级别 {:?} 无效: {}", config.log.level, e)))?
        .log_to_file(
            FileSpec::default()
                .basename(&config.log.file)
                .directory(&config.log.dir),
        )
        .rotate(
            Criterion::Size(config.log.max_file_size),
            Naming::Numbers,
            Cleanup::KeepLogFiles(config.log.max_files),
        )
        .write_mode(WriteMode::Async)
        .append()
        .start()
        .map_err(|e| PlanError::Config(format!("无法在 {} 下写日志: {}", config.log.dir, e)))?;

    *guard = Some(handle);

    log::info!("计划器日志写入 {}/{}，级别 {}", config.log.dir, config.log.file, config.log.level);
    Ok(())
}

/// 写完排队的日志后停止，之后可以用新的配置重新 `init`
pub fn shutdown() {
    if let Ok(mut guard) = LOGGER_HANDLE.lock() {
        if let Some(handle) = guard.take() {
            handle.flush();
            // drop 时等待写入线程退出
        }
    }
}

pub fn is_initialized() -> bool {
    LOGGER_HANDLE
        .lock()
        .map(|guard| guard.is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_logging_init_and_shutdown() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let mut config = Config::default();
        config.log.dir = dir.path().to_string_lossy().into_owned();

        let result = init(&config);
        assert!(result.is_ok(), "日志初始化失败: {:?}", result.err());
        assert!(is_initialized());

        // 已启动时忽略新的配置
        let mut other = config.clone();
        other.log.level = "sqlplan=loud".to_string();
        assert!(init(&other).is_ok());

        log::info!("测试日志消息");

        shutdown();
        assert!(!is_initialized());
    }

    #[test]
    #[serial]
    fn test_bad_level_is_config_error() {
        let mut config = Config::default();
        config.log.level = "sqlplan=loud".to_string();
        assert!(matches!(init(&config), Err(PlanError::Config(_))));
        assert!(!is_initialized());
    }
}
