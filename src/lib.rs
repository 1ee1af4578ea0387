//! rcube-plugin - Roundcube 插件安装器
//!
//! 在插件安装、更新、卸载时：检查宿主版本约束、部署插件文件、
//! 维护主配置中的激活插件列表、生成插件本地配置、执行数据库与生命周期脚本。

// 核心数据结构
pub mod types;

// 错误处理
pub mod error;

// 配置文件格式与安装器设置
pub mod config;

// 编辑器、版本检查、安装器
pub mod core;

// 路径、脚本执行、交互确认
pub mod utils;

// CLI 定义
pub mod cli;

#[cfg(test)]
pub mod test_utils;

// 重新导出常用类型
pub use crate::core::editor::{ConfigVariable, PluginListEdit, edit_plugin_list, probe_variable};
pub use crate::core::{Installer, LifecycleReport};
pub use error::{InstallerError, Result};
pub use types::{ActivationChoice, Config, PluginPackage};
