//! 分层配置源

use crate::accessor::ConfigAccessor;
use container_common::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 配置源集合
///
/// 文件源按添加顺序分层合并（后加的覆盖先加的），
/// 环境变量层级最高
#[derive(Debug, Default)]
pub struct ConfigSourceSet {
    json_files: Vec<PathBuf>,
    toml_files: Vec<PathBuf>,
    env_prefix: Option<String>,
}

impl ConfigSourceSet {
    /// 创建空的配置源集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加 JSON 配置文件（文件必须存在）
    pub fn add_json_file(mut self, path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        self.json_files.push(path);
        Ok(self)
    }

    /// 添加 TOML 配置文件（文件必须存在）
    pub fn add_toml_file(mut self, path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        self.toml_files.push(path);
        Ok(self)
    }

    /// 启用带前缀的环境变量源，`_` 作为层级分隔符
    ///
    /// 例如前缀 `HOLON` 时，`HOLON_RUNTIME_MODE` 映射到
    /// 路径 `runtime.mode`，值为字符串
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// 合并所有配置源，构建访问器
    pub fn build(self) -> ConfigResult<ConfigAccessor> {
        let mut builder = config::Config::builder();

        for path in &self.json_files {
            builder = builder
                .add_source(config::File::from(path.as_path()).format(config::FileFormat::Json));
        }

        for path in &self.toml_files {
            builder = builder
                .add_source(config::File::from(path.as_path()).format(config::FileFormat::Toml));
        }

        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(config::Environment::with_prefix(prefix).separator("_"));
        }

        let merged = builder.build().map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        })?;

        let root: serde_json::Value =
            merged
                .try_deserialize()
                .map_err(|e| ConfigError::ParseError {
                    source: Box::new(e),
                })?;

        debug!(
            "配置源合并完成: {} 个 JSON 文件, {} 个 TOML 文件, 环境变量前缀 {:?}",
            self.json_files.len(),
            self.toml_files.len(),
            self.env_prefix
        );

        Ok(ConfigAccessor::new(root))
    }
}
