//! CLI 参数定义

use crate::types::ActivationChoice;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rcube-plugin - Roundcube 插件安装器
#[derive(Parser)]
#[command(
    name = "rcube-plugin",
    version,
    about = "Roundcube 插件安装器",
    long_about = "安装、更新、卸载 Roundcube 插件：检查版本约束，维护激活插件列表，执行数据库与生命周期脚本"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 详细输出模式
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Roundcube 根目录（默认为当前目录）
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 安装插件包
    Install {
        /// 包目录（含 composer.json）
        package: PathBuf,
        /// 不询问，直接激活
        #[arg(short, long, conflicts_with = "no_activate")]
        yes: bool,
        /// 安装后不激活
        #[arg(long)]
        no_activate: bool,
    },

    /// 更新插件包
    Update {
        /// 包目录（含 composer.json）
        package: PathBuf,
    },

    /// 卸载插件
    Uninstall {
        /// 包名（vendor/name）或插件名
        package: String,
    },

    /// 在主配置中激活插件
    Activate {
        /// 包名或插件名
        plugin: String,
    },

    /// 在主配置中停用插件
    Deactivate {
        /// 包名或插件名
        plugin: String,
    },

    /// 检查插件包与宿主版本是否兼容
    Check {
        /// 包目录（含 composer.json）
        package: PathBuf,
    },

    /// 显示宿主与插件状态
    Status,
}

/// 由命令行标志得到激活选择
pub fn activation_choice(yes: bool, no_activate: bool) -> ActivationChoice {
    match (yes, no_activate) {
        (true, _) => ActivationChoice::Always,
        (_, true) => ActivationChoice::Never,
        _ => ActivationChoice::Ask,
    }
}
