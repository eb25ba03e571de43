//! 配置与日志集成测试
//!
//! 测试范围:
//! - 配置文件加载、保存和校验
//! - 计划器属性传入计划上下文
//! - 日志系统初始化

use serial_test::serial;
use sqlplan::config::Config;
use sqlplan::query::planner::plan::core::context::PlanContext;
use sqlplan::utils::logging;

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.log.level, "info");
    assert_eq!(config.log.file, "sqlplan");
    assert_eq!(config.log.max_file_size, 100 * 1024 * 1024);
    assert!(!config.planner.include_union_as_equality);
    assert_eq!(config.planner.plan_dump_indent, 2);
    assert!(config.planner.properties.is_empty());
}

#[test]
fn test_config_round_trip_through_file() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("sqlplan.toml");

    let mut config = Config::default();
    config.log.level = "debug".to_string();
    config.planner.include_union_as_equality = true;
    config
        .planner
        .properties
        .insert("bloomFilterMaxSelectivity".to_string(), "0.05".to_string());
    config.save(&path).expect("保存配置失败");

    let loaded = Config::load(&path).expect("加载配置失败");
    assert_eq!(loaded.log.level, "debug");
    assert!(loaded.planner.include_union_as_equality);

    let ctx = PlanContext::with_config(&loaded);
    assert!(ctx.planner_config().include_union_as_equality);
    assert_eq!(ctx.property("bloomFilterMaxSelectivity"), Some("0.05"));
}

#[test]
fn test_partial_config_uses_defaults() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("partial.toml");
    std::fs::write(&path, "[planner]\nplan_dump_indent = 4\n").expect("写入配置失败");

    let loaded = Config::load(&path).expect("加载配置失败");
    assert_eq!(loaded.planner.plan_dump_indent, 4);
    assert_eq!(loaded.log.level, "info");
}

#[test]
fn test_zero_indent_rejected() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[planner]\nplan_dump_indent = 0\n").expect("写入配置失败");
    assert!(Config::load(&path).is_err());
}

#[test]
#[serial]
fn test_logging_writes_into_configured_dir() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let mut config = Config::default();
    config.log.dir = dir.path().to_string_lossy().into_owned();
    config.log.level = "debug".to_string();

    logging::init(&config).expect("日志初始化失败");
    assert!(logging::is_initialized());
    log::debug!("集成测试日志");
    logging::shutdown();
    assert!(!logging::is_initialized());

    let files: Vec<_> = std::fs::read_dir(dir.path())
        .expect("读取日志目录失败")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("sqlplan"))
        .collect();
    assert!(!files.is_empty());
}
