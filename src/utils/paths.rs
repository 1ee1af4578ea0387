//! 跨平台路径与文件工具 (传统原则：常识性接口设计)

use crate::error::{InstallerError, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// 复制插件目录时跳过的条目
const SKIPPED_ENTRIES: &[&str] = &[".git", ".svn", ".hg"];

/// 相对于根目录解析路径（绝对路径保持不变）
pub fn resolve(root: &Path, path: &Path) -> PathBuf {
    root.join(path)
}

/// 检查文件是否存在
pub fn file_exists(path: &Path) -> bool {
    path.exists() && path.is_file()
}

/// 读取文件内容，返回错误时提供详细信息
pub fn read_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(InstallerError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("文件不存在: {}", path.display()),
        )));
    }
    fs::read_to_string(path).map_err(|e| {
        InstallerError::Io(std::io::Error::new(
            e.kind(),
            format!("读取文件 {} 失败: {}", path.display(), e),
        ))
    })
}

/// 原地写入已存在的文件
///
/// 先解析符号链接，再截断写入目标文件，保留 inode、属主与权限。
pub fn write_in_place(path: &Path, content: &str) -> Result<()> {
    let target = path.canonicalize().map_err(|e| {
        InstallerError::Io(std::io::Error::new(
            e.kind(),
            format!("解析路径 {} 失败: {}", path.display(), e),
        ))
    })?;
    fs::write(&target, content)?;
    Ok(())
}

/// 是否可写：文件尝试以写方式打开，目录尝试创建探测文件
pub fn is_writable(path: &Path) -> bool {
    if path.is_dir() {
        let probe = path.join(".rcube-plugin-probe");
        let writable = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&probe)
            .is_ok();
        if writable {
            let _ = fs::remove_file(&probe);
        }
        writable
    } else if path.is_file() {
        OpenOptions::new().append(true).open(path).is_ok()
    } else {
        false
    }
}

/// 是否为可执行文件
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        matches!(
            path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
            Some("exe" | "bat" | "cmd")
        )
    }
}

/// 递归复制目录（跳过版本控制目录，保留文件权限）
pub fn copy_dir_recursive(source: &Path, destination: &Path) -> Result<()> {
    if !source.is_dir() {
        return Err(InstallerError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("源目录不存在: {}", source.display()),
        )));
    }
    fs::create_dir_all(destination)?;

    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let file_name = entry.file_name();
        if SKIPPED_ENTRIES.iter().any(|s| file_name == *s) {
            continue;
        }

        let entry_path = entry.path();
        let dest_path = destination.join(&file_name);
        let metadata = match fs::metadata(&entry_path) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("跳过无法读取的条目 {}: {}", entry_path.display(), e);
                continue;
            }
        };

        if metadata.is_dir() {
            copy_dir_recursive(&entry_path, &dest_path)?;
        } else {
            fs::copy(&entry_path, &dest_path)?;
        }
    }

    Ok(())
}

/// 删除目录（不存在时视为成功）
pub fn remove_dir(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    Ok(())
}

/// 列出目录下的子目录名（排序后返回）
pub fn list_subdirs(path: &Path) -> Result<Vec<String>> {
    if !path.is_dir() {
        return Ok(Vec::new());
    }
    let mut names: Vec<String> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    Ok(names)
}
