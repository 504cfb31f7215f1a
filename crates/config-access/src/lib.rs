//! # Config Access
//!
//! 配置源与路径寻址访问的实现。
//!
//! ## 主要组件
//!
//! - [`ConfigAccessor`] - 合并配置树上的路径寻址访问器
//! - [`ConfigSourceSet`] - JSON / TOML 文件与环境变量的分层配置源
//!
//! 容器在装配阶段用访问器解析组件的配置绑定；
//! 启动成功后容器释放对访问器的引用

pub mod accessor;
pub mod sources;

pub use accessor::ConfigAccessor;
pub use sources::ConfigSourceSet;

// 重新导出错误类型
pub use container_common::{ConfigError, ConfigResult};
