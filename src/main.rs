//! rcube-plugin 主程序入口
//!
//! 入口代码只做参数解析与输出，逻辑委托给安装器。
//! 错误通过 --verbose 切换详细/安静模式。

use clap::Parser;
use log::LevelFilter;
use rcube_plugin::cli::{self, Cli, Commands};
use rcube_plugin::core::installer::StatusReport;
use rcube_plugin::{Config, Installer, PluginPackage, Result};
use std::path::PathBuf;

fn main() {
    // 解析 CLI 参数
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config {
        verbose: cli.verbose,
    };

    let result = resolve_root(cli.root.clone())
        .and_then(|root| Installer::open(&root, config))
        .and_then(|installer| run_command(cli.command, &installer, cli.verbose));

    if let Err(e) = result {
        e.report(cli.verbose);
        std::process::exit(e.exit_code());
    }
}

/// 日志级别：默认 warn，--verbose 时 debug；RUST_LOG 优先
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

/// 宿主根目录：--root 或当前目录
fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(root) => Ok(root),
        None => Ok(std::env::current_dir()?),
    }
}

/// 运行具体命令
fn run_command(command: Commands, installer: &Installer, verbose: bool) -> Result<()> {
    match command {
        Commands::Install {
            package,
            yes,
            no_activate,
        } => {
            let package = PluginPackage::load(&package)?;
            let report = installer.install(&package, cli::activation_choice(yes, no_activate))?;
            if verbose {
                println!("✓ 已安装插件 {}", report.plugin);
            }
        }

        Commands::Update { package } => {
            let package = PluginPackage::load(&package)?;
            let report = installer.update(&package)?;
            if verbose {
                println!("✓ 已更新插件 {}", report.plugin);
            }
        }

        Commands::Uninstall { package } => {
            let report = installer.uninstall(&package)?;
            if verbose {
                println!("✓ 已卸载插件 {}", report.plugin);
            }
        }

        Commands::Activate { plugin } => {
            if !installer.set_active(&plugin, true)? && verbose {
                println!("插件已处于激活状态: {}", plugin);
            }
        }

        Commands::Deactivate { plugin } => {
            if !installer.set_active(&plugin, false)? && verbose {
                println!("插件未激活: {}", plugin);
            }
        }

        Commands::Check { package } => {
            let package = PluginPackage::load(&package)?;
            let host = installer.check(&package)?;
            println!("✅ {} 与 Roundcube {} 兼容", package.name(), host);
        }

        Commands::Status => {
            show_status(&installer.status()?, verbose);
        }
    }

    Ok(())
}

/// 显示宿主与插件状态
fn show_status(status: &StatusReport, verbose: bool) {
    println!("Roundcube 根目录: {}", status.root.display());
    match &status.host_version {
        Some(version) => println!("宿主版本: {}", version),
        None => println!("宿主版本: 未检测到"),
    }

    let variable = status
        .variable
        .map(|v| v.to_string())
        .unwrap_or_else(|| "不存在".to_string());
    println!("主配置: {} [{}]", status.config_file.display(), variable);

    println!("\n已激活插件: {} 个", status.active.len());
    if verbose {
        for name in &status.active {
            println!("  {}", name);
        }
    }

    println!("\n已安装插件: {} 个", status.installed.len());
    for plugin in &status.installed {
        let mark = if plugin.active { "✓" } else { " " };
        let package = plugin.package.as_deref().unwrap_or("-");
        match &plugin.version {
            Some(version) => println!("  {} {} ({} {})", mark, plugin.name, package, version),
            None => println!("  {} {} ({})", mark, plugin.name, package),
        }
    }
}
