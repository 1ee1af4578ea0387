//! 脚本执行器
//!
//! 插件声明的生命周期脚本按以下顺序解析（相对于插件目录）：
//! 1. 文件存在且可执行：在插件目录中直接执行
//! 2. 文件存在且扩展名为 `.php`：先加载宿主引导文件，再在宿主根目录执行
//! 3. 其他情况：把字符串当作 shell 命令，在插件目录中执行
//!
//! 注意：标准输出被捕获后原样打印，标准错误随失败信息一起返回

use crate::config::Settings;
use crate::error::{InstallerError, Result};
use crate::utils::paths;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// 脚本的解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptKind {
    /// 可执行文件（绝对路径）
    Executable(PathBuf),
    /// 在宿主上下文中执行的 PHP 文件
    Php(PathBuf),
    /// 字面 shell 命令
    Shell(String),
}

impl ScriptKind {
    /// 解析脚本字符串
    pub fn classify(script: &str, plugin_dir: &Path) -> Self {
        let candidate = plugin_dir.join(script);
        if let Ok(file) = candidate.canonicalize() {
            if paths::is_executable(&file) {
                return ScriptKind::Executable(file);
            }
            if file.is_file() && file.extension().is_some_and(|ext| ext == "php") {
                return ScriptKind::Php(file);
            }
        }
        ScriptKind::Shell(script.to_string())
    }
}

/// 跨平台脚本执行器
pub struct ScriptRunner<'a> {
    root: &'a Path,
    settings: &'a Settings,
}

impl<'a> ScriptRunner<'a> {
    pub fn new(root: &'a Path, settings: &'a Settings) -> Self {
        Self { root, settings }
    }

    /// 执行插件声明的脚本
    pub fn run(&self, script: &str, plugin_dir: &Path) -> Result<()> {
        let kind = ScriptKind::classify(script, plugin_dir);
        log::debug!("执行脚本 {:?}", kind);

        let output = match &kind {
            ScriptKind::Executable(file) => {
                let mut cmd = Command::new(file);
                cmd.current_dir(plugin_dir);
                Self::capture(cmd, &file.display().to_string())?
            }
            ScriptKind::Php(file) => {
                let mut cmd = Command::new(&self.settings.php_binary);
                cmd.arg("-r")
                    .arg(self.php_bootstrap_code(file))
                    .current_dir(self.root);
                Self::capture(cmd, &self.settings.php_binary)?
            }
            ScriptKind::Shell(command) => {
                let mut cmd = Command::new(&self.settings.shell);
                cmd.arg("-c").arg(command).current_dir(plugin_dir);
                Self::capture(cmd, &self.settings.shell)?
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.is_empty() {
            print!("{}", stdout);
        }

        if !output.status.success() {
            return Err(InstallerError::ScriptFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }

    /// 执行数据库脚本：`<script> --package=<name> --dir=<sql_dir>`
    ///
    /// 返回脚本退出码；退出码非零不视为错误，由调用方决定如何提示。
    pub fn run_sql_script(&self, script: &Path, package: &str, sql_dir: &Path) -> Result<i32> {
        let mut cmd = if paths::is_executable(script) {
            Command::new(script)
        } else {
            let mut cmd = Command::new(&self.settings.shell);
            cmd.arg(script);
            cmd
        };

        cmd.arg(format!("--package={}", package))
            .arg(format!("--dir={}", sql_dir.display()))
            .current_dir(self.root)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let status = cmd.status().map_err(|e| {
            InstallerError::CommandNotFound(format!("{}: {}", script.display(), e))
        })?;

        Ok(status.code().unwrap_or(-1))
    }

    /// 生成在宿主上下文中执行 PHP 文件的代码
    fn php_bootstrap_code(&self, file: &Path) -> String {
        let bootstrap = paths::resolve(self.root, &self.settings.bootstrap_file);
        let include_file = format!("include '{}';", php_quote(&file.display().to_string()));

        if bootstrap.is_file() {
            format!(
                "include_once '{}'; {}",
                php_quote(&bootstrap.display().to_string()),
                include_file
            )
        } else {
            log::warn!("宿主引导文件不存在: {}", bootstrap.display());
            include_file
        }
    }

    fn capture(mut cmd: Command, program: &str) -> Result<Output> {
        cmd.stdin(Stdio::null())
            .output()
            .map_err(|e| InstallerError::CommandNotFound(format!("{}: {} (请确保命令在 PATH 中或使用完整路径)", program, e)))
    }
}

/// 单引号字符串转义
fn php_quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
