// 查询处理模块
//
// 计划中间表示、访问路径抽象与物理计划边界都在 planner 之下

pub mod planner;
