//! 核心逻辑：插件列表编辑、版本检查与安装编排

pub mod editor;
pub mod installer;
pub mod version;

pub use installer::{Installer, LifecycleReport, StatusReport};
