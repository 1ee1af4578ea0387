//! 安装器设置 (分层原则：默认值 < 用户级 < 宿主级)
//!
//! - 用户级：`<配置目录>/rcube-plugin/config.toml`
//! - 宿主级：`<宿主根目录>/.rcube-plugin.toml`
//!
//! 所有路径均相对于宿主根目录解析（绝对路径保持不变）。

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 宿主级设置文件名
pub const HOST_SETTINGS_FILE: &str = ".rcube-plugin.toml";

/// 设置文件中的一层（所有字段可选，用于叠加）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsLayer {
    pub config_file: Option<PathBuf>,
    pub plugins_dir: Option<PathBuf>,
    pub version_file: Option<PathBuf>,
    pub bootstrap_file: Option<PathBuf>,
    pub init_db_script: Option<PathBuf>,
    pub update_db_script: Option<PathBuf>,
    pub php_binary: Option<String>,
    pub shell: Option<String>,
}

/// 生效的设置
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// 宿主主配置文件
    pub config_file: PathBuf,
    /// 插件安装目录
    pub plugins_dir: PathBuf,
    /// 含 `RCMAIL_VERSION` 定义的文件
    pub version_file: PathBuf,
    /// 执行 PHP 脚本前加载的引导文件
    pub bootstrap_file: PathBuf,
    /// 数据库初始化脚本（install）
    pub init_db_script: PathBuf,
    /// 数据库升级脚本（update）
    pub update_db_script: PathBuf,
    pub php_binary: String,
    pub shell: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("config/config.inc.php"),
            plugins_dir: PathBuf::from("plugins"),
            version_file: PathBuf::from("program/include/iniset.php"),
            bootstrap_file: PathBuf::from("program/include/iniset.php"),
            init_db_script: PathBuf::from("vendor/bin/rcubeinitdb.sh"),
            update_db_script: PathBuf::from("bin/updatedb.sh"),
            php_binary: "php".to_string(),
            shell: "sh".to_string(),
        }
    }
}

impl Settings {
    /// 加载设置：默认值，然后叠加用户级与宿主级文件
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_from(user_settings_path().as_deref(), &root.join(HOST_SETTINGS_FILE))
    }

    /// 从指定文件加载（不存在的文件跳过）
    pub fn load_from(user: Option<&Path>, host: &Path) -> Result<Self> {
        let mut settings = Self::default();
        for path in user.into_iter().chain(std::iter::once(host)) {
            if let Some(layer) = read_layer(path)? {
                log::debug!("加载设置文件: {}", path.display());
                settings.apply(layer);
            }
        }
        Ok(settings)
    }

    /// 叠加一层设置
    pub fn apply(&mut self, layer: SettingsLayer) {
        let SettingsLayer {
            config_file,
            plugins_dir,
            version_file,
            bootstrap_file,
            init_db_script,
            update_db_script,
            php_binary,
            shell,
        } = layer;

        if let Some(v) = config_file {
            self.config_file = v;
        }
        if let Some(v) = plugins_dir {
            self.plugins_dir = v;
        }
        if let Some(v) = version_file {
            self.version_file = v;
        }
        if let Some(v) = bootstrap_file {
            self.bootstrap_file = v;
        }
        if let Some(v) = init_db_script {
            self.init_db_script = v;
        }
        if let Some(v) = update_db_script {
            self.update_db_script = v;
        }
        if let Some(v) = php_binary {
            self.php_binary = v;
        }
        if let Some(v) = shell {
            self.shell = v;
        }
    }
}

/// 用户级设置文件路径
pub fn user_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rcube-plugin").join("config.toml"))
}

fn read_layer(path: &Path) -> Result<Option<SettingsLayer>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(toml::from_str(&content)?))
}
