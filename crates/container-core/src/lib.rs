//! # Holon 组件容器
//!
//! 这个 crate 是 Holon 的容器核心: 把一组 proto 组件声明装配成
//! 已接线、可查找、受生命周期管理的组件图。
//!
//! ## 主要功能
//!
//! - **组件注册表**: 按名称与按能力两套索引
//! - **依赖装配**: 修饰符合并、按名称引用解析、字段注入、配置绑定
//! - **装饰器执行**: 装配后的并发横切装饰（扇出/汇合）
//! - **生命周期协调**: 启动（start -> 等待阻塞者 -> 开放访问）与
//!   停止（准备停止 -> 等待就绪 -> 停止）的多阶段推进
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use config_access::ConfigAccessor;
//! use container_core::ComponentContainer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(ConfigAccessor::new(serde_json::json!({
//!         "app": { "name": "demo" }
//!     })));
//!
//!     let mut container = ComponentContainer::new(config);
//!
//!     // 注册由生成层产出的 proto 声明 ...
//!
//!     container.populate().await?;
//!     container.start_all().await?;
//!
//!     // ... 对外提供服务 ...
//!
//!     container.stop_all().await?;
//!     Ok(())
//! }
//! ```

pub mod container;
pub mod decorator;
pub mod lifecycle;
pub mod registry;
pub mod resolver;

pub use container::{
    ComponentContainer, ContainerMetrics, ContainerSettings, ContainerStatus,
    CONTAINER_COMPONENT_NAME,
};
pub use decorator::{DecoratorRunner, CONTAINER_DECORATOR_NAME};
pub use lifecycle::LifecycleCoordinator;
pub use registry::ComponentRegistry;
pub use resolver::DependencyResolver;

// 重新导出公共模型，调用方通常只需要 container-core 一个依赖
pub use container_common::{
    Capability, CapabilitySet, Component, ComponentDecorator, ComponentFinder, ComponentInstance,
    ContainerAware, ContainerError, ContainerResult, FieldValue, FinderRef, ProtoComponent,
    RetrySchedule,
};
