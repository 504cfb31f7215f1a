//! 路径寻址的配置访问器

use container_common::{ConfigError, ConfigResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// 配置访问器
///
/// 持有各配置源合并后的配置树。路径用 `.` 分隔逐层下钻对象，
/// 例如 `"database.pool.size"`。
///
/// 容器对访问器的引用在启动成功后释放——组件定义在启动后
/// 不可再被读取或修改
#[derive(Debug, Clone)]
pub struct ConfigAccessor {
    root: Value,
}

impl ConfigAccessor {
    /// 从合并好的配置树创建访问器
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// 解析配置路径，返回对应的原始值
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        let mut current = &self.root;

        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }

        Some(current)
    }

    /// 配置路径是否存在
    pub fn contains(&self, path: &str) -> bool {
        self.resolve(path).is_some()
    }

    /// 解析配置路径并转换为目标类型
    pub fn typed<T: DeserializeOwned>(&self, path: &str) -> ConfigResult<T> {
        let value = self.resolve(path).ok_or_else(|| ConfigError::KeyNotFound {
            path: path.to_string(),
        })?;

        serde_json::from_value(value.clone()).map_err(|source| ConfigError::TypeConversion {
            path: path.to_string(),
            source,
        })
    }
}
