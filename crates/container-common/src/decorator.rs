//! 组件装饰器接口

use crate::component::{Component, FinderRef};
use async_trait::async_trait;

/// 组件装饰器
///
/// 装配完成后对其他组件统一施加横切行为（注入日志器、
/// 注入容器句柄等）。装饰器之间并发执行且没有顺序保证，
/// 同一组件可能被多个装饰器交错装饰；装饰逻辑不得依赖
/// 其他装饰器的执行顺序
#[async_trait]
pub trait ComponentDecorator: Send + Sync {
    /// 目标组件是否需要本装饰器处理
    async fn of_interest(&self, component: &Component) -> bool;

    /// 对目标组件施加装饰
    async fn decorate(&self, component: &Component, container: &FinderRef);
}
