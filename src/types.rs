//! 核心数据结构定义 (表达原则：用数据结构表达逻辑)

use crate::error::{InstallerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// 支持的包类型
pub const INSTALLER_TYPE: &str = "roundcube-plugin";

/// 包描述文件名
pub const MANIFEST_FILE: &str = "composer.json";

/// composer.json 中安装器关心的部分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// 带命名空间的包名，如 `vendor/plugin-name`
    pub name: String,
    #[serde(rename = "type", default)]
    pub package_type: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub extra: PackageExtra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageExtra {
    #[serde(default)]
    pub roundcube: Option<RoundcubeExtra>,
}

/// `extra.roundcube` 元数据块
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RoundcubeExtra {
    pub min_version: Option<String>,
    pub max_version: Option<String>,
    pub sql_dir: Option<String>,
    pub post_install_script: Option<String>,
    pub post_update_script: Option<String>,
    pub post_uninstall_script: Option<String>,
}

impl RoundcubeExtra {
    /// 空字符串视为未设置
    fn non_empty(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn min_version(&self) -> Option<&str> {
        Self::non_empty(&self.min_version)
    }

    pub fn max_version(&self) -> Option<&str> {
        Self::non_empty(&self.max_version)
    }

    pub fn sql_dir(&self) -> Option<&str> {
        Self::non_empty(&self.sql_dir)
    }

    /// 获取指定生命周期阶段的脚本
    pub fn script_for(&self, action: LifecycleAction) -> Option<&str> {
        match action {
            LifecycleAction::Install => Self::non_empty(&self.post_install_script),
            LifecycleAction::Update => Self::non_empty(&self.post_update_script),
            LifecycleAction::Uninstall => Self::non_empty(&self.post_uninstall_script),
        }
    }
}

/// 插件包描述（已加载的 composer.json + 来源目录）
#[derive(Debug, Clone)]
pub struct PluginPackage {
    pub manifest: PackageManifest,
    pub source_dir: PathBuf,
}

impl PluginPackage {
    /// 从包目录加载描述文件
    pub fn load(dir: &Path) -> Result<Self> {
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(InstallerError::ManifestNotFound(manifest_path));
        }
        let content = std::fs::read_to_string(&manifest_path)?;
        let manifest = Self::parse_manifest(&content)?;
        Ok(Self {
            manifest,
            source_dir: dir.to_path_buf(),
        })
    }

    /// 解析并校验 composer.json 内容
    pub fn parse_manifest(content: &str) -> Result<PackageManifest> {
        let manifest: PackageManifest = serde_json::from_str(content)?;
        if !manifest.name.contains('/') {
            return Err(InstallerError::InvalidPackageName(manifest.name));
        }
        Ok(manifest)
    }

    /// 检查包类型（未声明类型的包按不支持处理）
    pub fn ensure_supported(&self) -> Result<()> {
        match self.manifest.package_type.as_deref() {
            Some(t) if supports(t) => Ok(()),
            Some(t) => Err(InstallerError::UnsupportedPackageType(t.to_string())),
            None => Err(InstallerError::UnsupportedPackageType("(未声明)".to_string())),
        }
    }

    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    /// 插件目录名
    pub fn plugin_name(&self) -> Result<String> {
        checked_plugin_name(&self.manifest.name)
    }

    pub fn extra(&self) -> Option<&RoundcubeExtra> {
        self.manifest.extra.roundcube.as_ref()
    }
}

/// 是否支持该包类型
pub fn supports(package_type: &str) -> bool {
    package_type == INSTALLER_TYPE
}

/// 由包名推导插件名：取 `/` 之后的部分，`-` 替换为 `_`
///
/// 不带 `/` 的名字视为已经是插件名，仅做 `-` 替换。
pub fn plugin_name(package_name: &str) -> String {
    let segment = match package_name.split_once('/') {
        Some((_, rest)) => rest.split('/').next().unwrap_or(rest),
        None => package_name,
    };
    segment.replace('-', "_")
}

/// 推导插件名并校验其可作为目录名（非空，且不含路径成分）
pub fn checked_plugin_name(package_name: &str) -> Result<String> {
    let name = plugin_name(package_name);
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(InstallerError::InvalidPackageName(package_name.to_string()));
    }
    Ok(name)
}

/// 生命周期动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Install,
    Update,
    Uninstall,
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleAction::Install => write!(f, "install"),
            LifecycleAction::Update => write!(f, "update"),
            LifecycleAction::Uninstall => write!(f, "uninstall"),
        }
    }
}

/// 激活选择：安装后是否把插件加入配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationChoice {
    /// 交互终端下询问，否则取默认值（激活）
    #[default]
    Ask,
    Always,
    Never,
}

/// 配置选项 (支持详细/安静模式切换)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub verbose: bool,
}
