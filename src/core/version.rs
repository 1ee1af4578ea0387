//! 版本检查 (表达原则：版本号是可比较的结构，而不是字符串)
//!
//! 规范化规则与包管理器的版本解析器一致：
//! - 最多四段数字，不足补 `.0`，如 `1.5` → `1.5.0.0`
//! - 可选稳定性后缀：`dev`、`alpha|a`、`beta|b`、`RC`、`patch|pl|p`，可带编号
//! - `-git` 先被替换为 `.999`，因此 `1.5.0-git` 高于 `1.5.0`

use crate::error::{InstallerError, Result};
use crate::types::RoundcubeExtra;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

/// 宿主版本常量的定义形式：`define('RCMAIL_VERSION', '1.6.0');`
static HOST_VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"define\(.RCMAIL_VERSION.,\s*.([0-9.]+[a-z-]*)?").expect("静态正则表达式")
});

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^v?(\d{1,5})(\.\d+)?(\.\d+)?(\.\d+)?[._-]?(?:(stable|beta|b|rc|alpha|a|patch|pl|p)((?:[.-]?\d+)*)?)?([.-]?dev)?$",
    )
    .expect("静态正则表达式")
});

/// 稳定性等级，按先后顺序排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stability {
    Dev,
    Alpha,
    Beta,
    Rc,
    Stable,
    Patch,
}

impl Stability {
    fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "alpha" | "a" => Stability::Alpha,
            "beta" | "b" => Stability::Beta,
            "rc" => Stability::Rc,
            "patch" | "pl" | "p" => Stability::Patch,
            _ => Stability::Stable,
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            Stability::Dev => "dev",
            Stability::Alpha => "alpha",
            Stability::Beta => "beta",
            Stability::Rc => "RC",
            Stability::Stable => "",
            Stability::Patch => "patch",
        }
    }
}

/// 规范化后的版本号
#[derive(Debug, Clone)]
pub struct Version {
    parts: [u64; 4],
    stability: Stability,
    /// 稳定性编号，如 `RC1` 中的 1
    stability_number: Option<u64>,
    /// 预发布版本之后是否还带 `-dev`
    dev: bool,
}

impl Version {
    /// 解析版本号（`-git` 按 `.999` 处理）
    pub fn parse(raw: &str) -> Result<Self> {
        let prepared = raw.trim().replace("-git", ".999");
        let caps = VERSION_PATTERN
            .captures(&prepared)
            .ok_or_else(|| InstallerError::InvalidVersion(raw.to_string()))?;

        let mut parts = [0u64; 4];
        for (i, part) in parts.iter_mut().enumerate() {
            if let Some(m) = caps.get(i + 1) {
                *part = m
                    .as_str()
                    .trim_start_matches('.')
                    .parse()
                    .map_err(|_| InstallerError::InvalidVersion(raw.to_string()))?;
            }
        }

        let mut stability = caps
            .get(5)
            .map(|m| Stability::parse(m.as_str()))
            .unwrap_or(Stability::Stable);
        let stability_number = caps
            .get(6)
            .map(|m| m.as_str().trim_start_matches(['.', '-']))
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.split(['.', '-'])
                    .next()
                    .unwrap_or(s)
                    .parse::<u64>()
                    .map_err(|_| InstallerError::InvalidVersion(raw.to_string()))
            })
            .transpose()?;

        let mut dev = caps.get(7).is_some();
        if dev && caps.get(5).is_none() {
            // `1.0-dev` 本身就是开发版
            stability = Stability::Dev;
            dev = false;
        }

        Ok(Self {
            parts,
            stability,
            stability_number,
            dev,
        })
    }

    /// 按运算符比较：`self <op> other`
    pub fn satisfies(&self, operator: Operator, other: &Version) -> bool {
        match operator {
            Operator::GreaterOrEqual => self >= other,
            Operator::LessOrEqual => self <= other,
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts
            .cmp(&other.parts)
            .then(self.stability.cmp(&other.stability))
            .then(
                self.stability_number
                    .unwrap_or(0)
                    .cmp(&other.stability_number.unwrap_or(0)),
            )
            // 带 -dev 的预发布版本早于同号正式预发布版本
            .then(other.dev.cmp(&self.dev))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.parts;
        write!(f, "{a}.{b}.{c}.{d}")?;
        if self.stability != Stability::Stable {
            write!(f, "-{}", self.stability.suffix())?;
            if let Some(n) = self.stability_number {
                write!(f, "{n}")?;
            }
        }
        if self.dev {
            write!(f, "-dev")?;
        }
        Ok(())
    }
}

/// 约束运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    GreaterOrEqual,
    LessOrEqual,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::GreaterOrEqual => write!(f, ">="),
            Operator::LessOrEqual => write!(f, "<="),
        }
    }
}

/// 从版本定义文件内容中提取宿主版本字符串
pub fn extract_host_version(content: &str) -> Option<&str> {
    HOST_VERSION_PATTERN
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// 读取宿主版本
///
/// 文件不可读、找不到定义或版本号无法解析时都视为宿主不存在。
pub fn detect_host_version(root: &Path, version_file: &Path) -> Result<Version> {
    let not_found = || InstallerError::HostNotFound(root.to_path_buf());
    let content = std::fs::read_to_string(version_file).map_err(|_| not_found())?;
    let raw = extract_host_version(&content).ok_or_else(not_found)?;
    log::debug!("检测到宿主版本字符串: {}", raw);
    Version::parse(raw).map_err(|_| not_found())
}

/// 按插件元数据检查宿主版本（先 min-version 后 max-version）
pub fn check_compatibility(package: &str, extra: Option<&RoundcubeExtra>, host: &Version) -> Result<()> {
    let Some(extra) = extra else {
        return Ok(());
    };

    let constraints = [
        (Operator::GreaterOrEqual, extra.min_version()),
        (Operator::LessOrEqual, extra.max_version()),
    ];

    for (operator, required) in constraints {
        let Some(required) = required else {
            continue;
        };
        let required = Version::parse(required)?;
        if !host.satisfies(operator, &required) {
            return Err(InstallerError::VersionMismatch {
                package: package.to_string(),
                operator: operator.to_string(),
                required: required.to_string(),
                detected: host.to_string(),
            });
        }
        log::debug!("版本约束满足: {} {} {}", host, operator, required);
    }

    Ok(())
}
