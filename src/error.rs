//! 错误处理模块 (修复原则：明确抛出异常)

use std::error::Error;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallerError {
    #[error("文件IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON解析错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML配置错误: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("无法在 {} 找到 Roundcube 安装", .0.display())]
    HostNotFound(PathBuf),

    #[error("无效的版本号: {0}")]
    InvalidVersion(String),

    #[error(
        "版本检查失败！{package} 要求 Roundcube 版本 {operator} {required}，检测到的版本为 {detected}"
    )]
    VersionMismatch {
        package: String,
        operator: String,
        required: String,
        detected: String,
    },

    #[error("不支持的包类型: {0}（仅支持 roundcube-plugin）")]
    UnsupportedPackageType(String),

    #[error("无效的包名: {0}（应为 vendor/plugin-name）")]
    InvalidPackageName(String),

    #[error("找不到包描述文件: {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("插件已安装: {0}（请使用 update）")]
    AlreadyInstalled(String),

    #[error("插件未安装: {0}")]
    PluginNotInstalled(String),

    #[error("配置文件不可写: {}", .0.display())]
    ConfigNotWritable(PathBuf),

    #[error("脚本执行失败 (退出码 {code}): {stderr}")]
    ScriptFailed { code: i32, stderr: String },

    #[error("命令未找到: {0}")]
    CommandNotFound(String),
}

/// 详细的错误报告函数 (透明原则)
impl InstallerError {
    /// 报告错误，支持详细/安静模式
    /// verbose = true: 详细错误链
    /// verbose = false: 关键信息，安静模式
    pub fn report(&self, verbose: bool) {
        if verbose {
            eprintln!("❌ 错误: {}", self);

            if let Some(source) = self.source() {
                eprintln!("  └─ 原因: {}", source);
                let mut current = source.source();
                while let Some(next) = current {
                    eprintln!("     └─ {}", next);
                    current = next.source();
                }
            }
        } else {
            match self {
                InstallerError::Io(err) => eprintln!("文件错误: {}", err),
                InstallerError::HostNotFound(root) => {
                    eprintln!("未找到 Roundcube 安装: {}", root.display())
                }
                InstallerError::ScriptFailed { code, stderr } => {
                    eprintln!("脚本失败 (退出码 {}): {}", code, stderr.trim_end())
                }
                _ => eprintln!("错误: {}", self),
            }
        }
    }

    /// 进程退出码：脚本失败时透传脚本退出码
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallerError::ScriptFailed { code, .. } if *code > 0 => *code,
            _ => 1,
        }
    }
}

/// 简化 Result 类型别名
pub type Result<T> = std::result::Result<T, InstallerError>;
