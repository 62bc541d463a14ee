//! 配置路径管理
//!
//! 管理配置目录、配置文件和模板文件的路径
//!
//! - 默认位置：`dirs::config_dir()/hatena-cli/`
//! - 环境变量 `HATENA_CLI_CONFIG_DIR` 可覆盖

use crate::config::{APP_DIR_NAME, CONFIG_DIR_ENV, CONFIG_FILE_NAME, TEMPLATE_FILE_NAME};
use crate::error::{errors, HatenaResult};
use std::path::{Path, PathBuf};

/// 配置文件路径集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// 配置目录
    pub config_dir: PathBuf,
    /// 主配置文件 (config.toml)
    pub config_file: PathBuf,
    /// pandoc 模板文件 (template.html)
    pub template_file: PathBuf,
}

impl ConfigPaths {
    /// 使用默认位置创建配置路径
    pub fn new() -> HatenaResult<Self> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Ok(Self::in_dir(PathBuf::from(dir)));
        }

        let base = dirs::config_dir()
            .ok_or_else(|| errors::config_error("Cannot find the user config directory"))?;
        Ok(Self::in_dir(base.join(APP_DIR_NAME)))
    }

    /// 在指定目录下创建配置路径
    pub fn in_dir(config_dir: impl AsRef<Path>) -> Self {
        let config_dir = config_dir.as_ref().to_path_buf();
        Self {
            config_file: config_dir.join(CONFIG_FILE_NAME),
            template_file: config_dir.join(TEMPLATE_FILE_NAME),
            config_dir,
        }
    }
}
