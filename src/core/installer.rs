//! 插件安装器 (模块原则：生命周期编排与 I/O 集中在这里)
//!
//! 编辑器只做纯文本变换；读写配置文件、复制目录、执行脚本都由安装器完成。

use crate::config::Settings;
use crate::core::editor::{self, ConfigVariable};
use crate::core::version::{self, Version};
use crate::error::{InstallerError, Result};
use crate::types::{self, ActivationChoice, Config, LifecycleAction, PluginPackage, MANIFEST_FILE};
use crate::utils::executor::ScriptRunner;
use crate::utils::{paths, prompt};
use std::fs;
use std::path::{Path, PathBuf};

/// 插件本地配置模板
const PLUGIN_CONFIG_DIST: &str = "config.inc.php.dist";
/// 插件本地配置
const PLUGIN_CONFIG: &str = "config.inc.php";

/// 一次生命周期动作的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleReport {
    pub plugin: String,
    /// 宿主配置文件是否被改写
    pub config_updated: bool,
    /// 是否由模板生成了插件配置
    pub config_seeded: bool,
    /// 是否执行了数据库脚本
    pub sql_ran: bool,
    /// 是否执行了生命周期脚本
    pub script_ran: bool,
}

impl LifecycleReport {
    fn new(plugin: &str) -> Self {
        Self {
            plugin: plugin.to_string(),
            ..Default::default()
        }
    }
}

/// 已安装插件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPlugin {
    pub name: String,
    pub package: Option<String>,
    pub version: Option<String>,
    pub active: bool,
}

/// 宿主状态
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub root: PathBuf,
    pub host_version: Option<Version>,
    pub config_file: PathBuf,
    /// 配置文件可读时探测到的变量
    pub variable: Option<ConfigVariable>,
    pub active: Vec<String>,
    pub installed: Vec<InstalledPlugin>,
}

/// 插件安装器
pub struct Installer {
    root: PathBuf,
    settings: Settings,
    config: Config,
}

impl Installer {
    pub fn new(root: PathBuf, settings: Settings, config: Config) -> Self {
        Self {
            root,
            settings,
            config,
        }
    }

    /// 以宿主根目录创建安装器（加载分层设置）
    pub fn open(root: &Path, config: Config) -> Result<Self> {
        let settings = Settings::load(root)?;
        Ok(Self::new(root.to_path_buf(), settings, config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// 宿主主配置文件
    pub fn config_file(&self) -> PathBuf {
        paths::resolve(&self.root, &self.settings.config_file)
    }

    /// 插件安装目录
    pub fn plugins_dir(&self) -> PathBuf {
        paths::resolve(&self.root, &self.settings.plugins_dir)
    }

    /// 插件的安装路径：`plugins/<插件名>`
    pub fn install_path(&self, plugin_name: &str) -> PathBuf {
        self.plugins_dir().join(plugin_name)
    }

    /// 检测宿主版本
    pub fn host_version(&self) -> Result<Version> {
        let version_file = paths::resolve(&self.root, &self.settings.version_file);
        version::detect_host_version(&self.root, &version_file)
    }

    /// 检查包类型与版本约束，返回检测到的宿主版本
    pub fn check(&self, package: &PluginPackage) -> Result<Version> {
        package.ensure_supported()?;
        let host = self.host_version()?;
        version::check_compatibility(package.name(), package.extra(), &host)?;
        Ok(host)
    }

    /// 安装插件
    pub fn install(&self, package: &PluginPackage, activation: ActivationChoice) -> Result<LifecycleReport> {
        self.check(package)?;

        let name = package.plugin_name()?;
        let plugin_dir = self.install_path(&name);
        let mut report = LifecycleReport::new(&name);

        if same_dir(&package.source_dir, &plugin_dir) {
            log::debug!("包已位于安装目录，跳过复制: {}", plugin_dir.display());
        } else if plugin_dir.exists() {
            return Err(InstallerError::AlreadyInstalled(name));
        } else {
            paths::copy_dir_recursive(&package.source_dir, &plugin_dir)?;
            log::info!("已安装 {} 到 {}", package.name(), plugin_dir.display());
        }

        // 激活插件（尽力而为）
        if paths::is_writable(&self.config_file()) {
            let activate = match activation {
                ActivationChoice::Always => true,
                ActivationChoice::Never => false,
                ActivationChoice::Ask => prompt::confirm(
                    &format!("是否为 Roundcube 激活插件 {}？[n|Y]", name),
                    true,
                ),
            };
            if activate {
                report.config_updated = self.alter_config(&name, true)?;
            }
        } else {
            log::debug!("配置文件不可写，跳过激活: {}", self.config_file().display());
        }

        report.config_seeded = self.seed_plugin_config(&plugin_dir);

        if let Some(sql_dir) = package.extra().and_then(|e| e.sql_dir()) {
            report.sql_ran = self.run_sql(
                &self.settings.init_db_script,
                &name,
                &plugin_dir,
                sql_dir,
                &format!("正在为 {} 运行数据库初始化脚本", name),
            );
        }

        report.script_ran = self.run_lifecycle_script(package, LifecycleAction::Install, &plugin_dir)?;
        Ok(report)
    }

    /// 更新插件
    pub fn update(&self, package: &PluginPackage) -> Result<LifecycleReport> {
        self.check(package)?;

        let name = package.plugin_name()?;
        let plugin_dir = self.install_path(&name);
        let mut report = LifecycleReport::new(&name);

        if same_dir(&package.source_dir, &plugin_dir) {
            log::debug!("包已位于安装目录，跳过复制: {}", plugin_dir.display());
        } else {
            let local_config = read_optional(&plugin_dir.join(PLUGIN_CONFIG));
            paths::remove_dir(&plugin_dir)?;
            paths::copy_dir_recursive(&package.source_dir, &plugin_dir)?;

            // 保留用户的插件本地配置
            if let Some(content) = local_config {
                let target = plugin_dir.join(PLUGIN_CONFIG);
                if !target.exists() {
                    fs::write(&target, content)?;
                    log::debug!("已保留插件本地配置: {}", target.display());
                }
            }
            log::info!("已更新 {} 于 {}", package.name(), plugin_dir.display());
        }

        if let Some(sql_dir) = package.extra().and_then(|e| e.sql_dir()) {
            report.sql_ran = self.run_sql(
                &self.settings.update_db_script,
                &name,
                &plugin_dir,
                sql_dir,
                &format!("正在更新 {} 的数据库结构", name),
            );
        }

        report.script_ran = self.run_lifecycle_script(package, LifecycleAction::Update, &plugin_dir)?;
        Ok(report)
    }

    /// 卸载插件（参数可为包名或插件名）
    ///
    /// 卸载脚本在删除文件之前执行，保证脚本文件仍可解析。
    pub fn uninstall(&self, target: &str) -> Result<LifecycleReport> {
        let name = types::checked_plugin_name(target)?;
        let plugin_dir = self.install_path(&name);
        if !plugin_dir.is_dir() {
            return Err(InstallerError::PluginNotInstalled(name));
        }
        let mut report = LifecycleReport::new(&name);

        match PluginPackage::load(&plugin_dir) {
            Ok(package) => {
                report.script_ran =
                    self.run_lifecycle_script(&package, LifecycleAction::Uninstall, &plugin_dir)?;
            }
            Err(e) => log::debug!("无法读取 {}，跳过卸载脚本: {}", MANIFEST_FILE, e),
        }

        paths::remove_dir(&plugin_dir)?;
        log::info!("已删除 {}", plugin_dir.display());

        report.config_updated = self.alter_config(&name, false)?;
        Ok(report)
    }

    /// 显式激活/停用插件；配置文件不可写时报错
    pub fn set_active(&self, target: &str, active: bool) -> Result<bool> {
        let config_file = self.config_file();
        if !paths::is_writable(&config_file) {
            return Err(InstallerError::ConfigNotWritable(config_file));
        }
        self.alter_config(&types::checked_plugin_name(target)?, active)
    }

    /// 宿主状态
    pub fn status(&self) -> Result<StatusReport> {
        let config_file = self.config_file();
        let document = read_optional(&config_file);
        let variable = document.as_deref().map(editor::probe_variable);
        let active = match (&document, variable) {
            (Some(doc), Some(var)) => editor::current_plugins(doc, var),
            _ => Vec::new(),
        };

        let plugins_dir = self.plugins_dir();
        let installed = paths::list_subdirs(&plugins_dir)?
            .into_iter()
            .map(|name| {
                let manifest = PluginPackage::load(&plugins_dir.join(&name)).ok();
                InstalledPlugin {
                    active: active.contains(&name),
                    package: manifest.as_ref().map(|p| p.name().to_string()),
                    version: manifest.and_then(|p| p.manifest.version),
                    name,
                }
            })
            .collect();

        Ok(StatusReport {
            root: self.root.clone(),
            host_version: self.host_version().ok(),
            config_file,
            variable,
            active,
            installed,
        })
    }

    /// 在宿主配置中加入或移除插件
    ///
    /// 配置不可读写时静默跳过；返回是否改写了文件。
    fn alter_config(&self, plugin: &str, add: bool) -> Result<bool> {
        let config_file = self.config_file();
        if !paths::is_writable(&config_file) {
            log::debug!("配置文件不可写，跳过: {}", config_file.display());
            return Ok(false);
        }
        let document = match paths::read_file(&config_file) {
            Ok(document) => document,
            Err(e) => {
                log::debug!("配置文件不可读，跳过: {}", e);
                return Ok(false);
            }
        };

        let variable = editor::probe_variable(&document);
        log::debug!("使用配置变量 {}", variable);
        let edit = editor::edit_plugin_list(&document, variable, plugin, add);
        if !edit.changed {
            log::debug!("插件列表无变化: {}", plugin);
            return Ok(false);
        }

        // 写入符号链接指向的真实文件
        if let Err(e) = paths::write_in_place(&config_file, &edit.text) {
            log::warn!("无法写入配置文件 {}: {}", config_file.display(), e);
            return Ok(false);
        }

        println!("已更新本地配置: {}", config_file.display());
        if self.config.verbose {
            let action = if add { "激活" } else { "停用" };
            println!("✓ 已{}插件 {}", action, plugin);
        }
        Ok(true)
    }

    /// 由 `config.inc.php.dist` 生成插件本地配置（尽力而为）
    fn seed_plugin_config(&self, plugin_dir: &Path) -> bool {
        let dist = plugin_dir.join(PLUGIN_CONFIG_DIST);
        let target = plugin_dir.join(PLUGIN_CONFIG);
        if !paths::file_exists(&dist) || paths::file_exists(&target) || !paths::is_writable(plugin_dir) {
            return false;
        }

        println!("正在创建插件配置文件");
        match fs::copy(&dist, &target) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("无法创建插件配置 {}: {}", target.display(), e);
                false
            }
        }
    }

    /// 执行数据库脚本；目录或脚本不存在时跳过
    fn run_sql(&self, script: &Path, plugin: &str, plugin_dir: &Path, sql_dir: &str, message: &str) -> bool {
        let Ok(sql_dir) = plugin_dir.join(sql_dir).canonicalize() else {
            log::debug!("SQL 目录不存在，跳过: {}", sql_dir);
            return false;
        };
        let script = paths::resolve(&self.root, script);
        if !paths::file_exists(&script) {
            log::debug!("数据库脚本不存在，跳过: {}", script.display());
            return false;
        }

        println!("{}", message);
        match ScriptRunner::new(&self.root, &self.settings).run_sql_script(&script, plugin, &sql_dir) {
            Ok(0) => true,
            Ok(code) => {
                log::warn!("数据库脚本 {} 退出码 {}", script.display(), code);
                true
            }
            Err(e) => {
                log::warn!("无法执行数据库脚本: {}", e);
                false
            }
        }
    }

    /// 执行包声明的生命周期脚本；失败时中止
    fn run_lifecycle_script(&self, package: &PluginPackage, action: LifecycleAction, plugin_dir: &Path) -> Result<bool> {
        let Some(script) = package.extra().and_then(|e| e.script_for(action)) else {
            return Ok(false);
        };
        log::debug!("执行 post-{} 脚本: {}", action, script);
        ScriptRunner::new(&self.root, &self.settings).run(script, plugin_dir)?;
        Ok(true)
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn read_optional(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}
