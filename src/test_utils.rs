//! 测试工具模块
//!
//! 提供临时宿主目录与环境变量守卫，避免测试之间互相污染

use crate::config::Settings;
use crate::core::installer::Installer;
use crate::types::{Config, MANIFEST_FILE};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 环境变量守卫 - 自动清理
pub struct EnvGuard {
    original_vars: HashMap<String, String>,
}

impl Default for EnvGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvGuard {
    /// 创建一个新的环境守卫，记录当前环境变量
    pub fn new() -> Self {
        let original_vars: HashMap<String, String> = env::vars().collect();
        Self { original_vars }
    }

    /// 设置测试环境变量（自动包装为 unsafe）
    pub fn set_var(&self, key: &str, value: &str) {
        unsafe {
            env::set_var(key, value);
        }
    }

    /// 移除环境变量（自动包装为 unsafe）
    pub fn remove_var(&self, key: &str) {
        unsafe {
            env::remove_var(key);
        }
    }
}

impl Drop for EnvGuard {
    /// 释放时恢复原始环境变量
    fn drop(&mut self) {
        let current_vars: Vec<String> = env::vars().map(|(k, _)| k).collect();
        for key in current_vars {
            if !self.original_vars.contains_key(&key) {
                self.remove_var(&key);
            }
        }

        for (key, value) in &self.original_vars {
            if env::var(key).as_ref() != Ok(value) {
                self.set_var(key, value);
            }
        }
    }
}

/// 临时宿主安装：`program/include/iniset.php` 与 `plugins/`
pub struct HostFixture {
    temp_dir: TempDir,
}

impl HostFixture {
    /// 创建声明了指定版本的宿主目录
    pub fn new(version: &str) -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let include_dir = temp_dir.path().join("program/include");
        fs::create_dir_all(&include_dir).unwrap();
        fs::write(
            include_dir.join("iniset.php"),
            format!("<?php\n\ndefine('RCMAIL_VERSION', '{}');\ndefine('RCMAIL_START', microtime(true));\n", version),
        )
        .unwrap();
        fs::create_dir_all(temp_dir.path().join("plugins")).unwrap();
        Self { temp_dir }
    }

    /// 宿主根目录
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// 写入宿主主配置文件
    pub fn write_config(&self, content: &str) {
        let path = self.root().join("config/config.inc.php");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// 读取宿主主配置文件
    pub fn read_config(&self) -> String {
        fs::read_to_string(self.root().join("config/config.inc.php")).unwrap()
    }

    /// 在宿主目录之外的位置创建插件包（含 composer.json）
    pub fn package(&self, name: &str, roundcube: serde_json::Value) -> PathBuf {
        let dir = self.root().join("packages").join(name.replace('/', "__"));
        fs::create_dir_all(&dir).unwrap();
        let manifest = serde_json::json!({
            "name": name,
            "type": "roundcube-plugin",
            "version": "1.0.0",
            "extra": { "roundcube": roundcube },
        });
        fs::write(dir.join(MANIFEST_FILE), manifest.to_string()).unwrap();
        fs::write(dir.join("plugin.php"), "<?php\nclass sample extends rcube_plugin {}\n").unwrap();
        dir
    }

    /// 使用默认设置的安装器
    pub fn installer(&self) -> Installer {
        Installer::new(self.root().to_path_buf(), Settings::default(), Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn test_env_guard_cleanup() {
        {
            let guard = EnvGuard::new();
            guard.set_var("RCUBE_PLUGIN_TEST_CLEANUP", "cleanup_test");
            assert_eq!(env::var("RCUBE_PLUGIN_TEST_CLEANUP").unwrap(), "cleanup_test");
        }
        assert!(env::var("RCUBE_PLUGIN_TEST_CLEANUP").is_err());
    }

    #[test]
    fn test_host_fixture_layout() {
        let host = HostFixture::new("1.6.0");
        assert!(host.root().join("program/include/iniset.php").is_file());
        assert!(host.root().join("plugins").is_dir());
        let package = host.package("vendor/x", serde_json::json!({}));
        assert!(package.join(MANIFEST_FILE).is_file());
    }
}
