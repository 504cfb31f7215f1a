//! 错误类型定义

use thiserror::Error;

/// 组件自身操作（启动、停止、开放访问等）返回的不透明错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 字段注入错误类型
///
/// 字段的存在性与可赋值性由生成层产出的字段访问器表决定，
/// 这里只描述一次注入失败的具体原因
#[derive(Error, Debug)]
pub enum InjectError {
    #[error("字段不存在（没有对应的字段访问器）")]
    FieldNotFound,

    #[error("实例类型不匹配: 期望 {expected}")]
    InstanceTypeMismatch { expected: String },

    #[error("注入值种类不匹配: 期望 {expected}, 实际 {actual}")]
    ValueKindMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("配置值类型转换失败: {source}")]
    ValueTypeMismatch {
        #[from]
        source: serde_json::Error,
    },
}

/// 装配错误类型
///
/// 装配阶段的任何错误都是致命的: 阶段立即中止，
/// 不留下部分装配的可见组件图
#[derive(Error, Debug)]
pub enum WiringError {
    #[error("组件 {component} 不是可注入目标（声明了依赖或配置绑定却没有字段访问器表）")]
    NotWireable { component: String },

    #[error("组件名称重复注册: {name}")]
    DuplicateName { name: String },

    #[error("找不到名为 {target} 的组件（{component}.{field} 需要）")]
    UnresolvedReference {
        target: String,
        component: String,
        field: String,
    },

    #[error("配置路径 {path} 无法解析（{component}.{field} 需要）")]
    UnresolvedConfig {
        path: String,
        component: String,
        field: String,
    },

    #[error("向 {component}.{field} 注入失败: {source}")]
    Injection {
        component: String,
        field: String,
        source: InjectError,
    },
}

/// 生命周期阶段错误类型
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("组件 {name} 启动失败: {source}")]
    StartFailed { name: String, source: BoxError },

    #[error("组件 {name} 无法开放访问: {source}")]
    AccessFailed { name: String, source: BoxError },

    #[error("启动被以下组件阻塞: {names:?}")]
    StartupBlocked { names: Vec<String> },
}

/// 配置访问错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError { source: BoxError },

    #[error("配置键不存在: {path}")]
    KeyNotFound { path: String },

    #[error("配置类型转换失败: {path}: {source}")]
    TypeConversion {
        path: String,
        source: serde_json::Error,
    },

    #[error("配置源已在启动完成后释放")]
    SourceReleased,
}

/// 容器错误总类型
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("装配错误: {source}")]
    Wiring {
        #[from]
        source: WiringError,
    },

    #[error("生命周期错误: {source}")]
    Lifecycle {
        #[from]
        source: LifecycleError,
    },

    #[error("配置错误: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}

/// 结果类型别名
pub type InjectResult<T> = Result<T, InjectError>;
pub type WiringResult<T> = Result<T, WiringError>;
pub type LifecycleResult<T> = Result<T, LifecycleError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type ContainerResult<T> = Result<T, ContainerError>;
