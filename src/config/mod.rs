//! 配置相关：宿主配置文件格式与安装器自身设置

pub mod format;
pub mod settings;

pub use settings::Settings;
