//! 装饰器执行器与内置容器装饰器

use crate::registry::ComponentRegistry;
use async_trait::async_trait;
use container_common::{Component, ComponentDecorator, FinderRef};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, trace};

/// 内置容器装饰器的组件名
pub const CONTAINER_DECORATOR_NAME: &str = "holon.ContainerDecorator";

/// 装饰器条目: 内置装饰器或带装饰能力的组件
enum DecoratorEntry {
    Builtin(Arc<dyn ComponentDecorator>),
    FromComponent(Component),
}

/// 装饰器执行器
///
/// 装配完成后并发执行所有已发现的装饰器——每个装饰器一个任务，
/// 全部任务完成后汇合（扇出/汇合，不是流水线）。执行期间注册表
/// 成员不变；装饰器对目标内部状态的写入经由实例锁串行化，
/// 跨装饰器的加锁顺序由装饰器自身负责
pub struct DecoratorRunner {
    finder: FinderRef,
    decorators: HashMap<String, DecoratorEntry>,
}

impl DecoratorRunner {
    /// 创建执行器并装入内置容器装饰器
    pub fn new(finder: FinderRef) -> Self {
        let mut decorators = HashMap::new();

        decorators.insert(
            CONTAINER_DECORATOR_NAME.to_string(),
            DecoratorEntry::Builtin(Arc::new(ContainerDecorator::new(finder.clone()))),
        );

        Self { finder, decorators }
    }

    /// 登记一个带装饰能力的组件
    pub fn capture(&mut self, component: &Component) {
        if component.capabilities().decorator {
            trace!("发现装饰器 {}", component.name());

            self.decorators.insert(
                component.name().to_string(),
                DecoratorEntry::FromComponent(component.clone()),
            );
        }
    }

    /// 并发执行全部装饰器并等待汇合
    ///
    /// 返回应从对外可见集合移除的装饰器名称。
    /// 装饰任务的 panic 视为不可恢复: 记录后异常终止进程
    pub async fn run(self, registry: &ComponentRegistry) -> Vec<String> {
        let targets = registry.all_sorted();
        let names: Vec<String> = self.decorators.keys().cloned().collect();

        let mut tasks = Vec::with_capacity(self.decorators.len());

        for (name, entry) in self.decorators {
            tasks.push(tokio::spawn(run_decorator(
                name,
                entry,
                targets.clone(),
                self.finder.clone(),
            )));
        }

        for joined in join_all(tasks).await {
            if let Err(join_error) = joined {
                if join_error.is_panic() {
                    error!("装饰任务 panic: {}", join_error);
                    std::process::abort();
                }
            }
        }

        names
    }
}

/// 单个装饰器的完整一轮: 跳过自身，按兴趣逐个装饰
async fn run_decorator(
    name: String,
    entry: DecoratorEntry,
    targets: Vec<Component>,
    finder: FinderRef,
) {
    for target in &targets {
        if target.name() == name {
            continue;
        }

        match &entry {
            DecoratorEntry::Builtin(decorator) => {
                if decorator.of_interest(target).await {
                    decorator.decorate(target, &finder).await;
                }
            }
            DecoratorEntry::FromComponent(component) => {
                let guard = component.instance().read().await;

                if let Some(decorator) = guard.as_decorator() {
                    if decorator.of_interest(target).await {
                        decorator.decorate(target, &finder).await;
                    }
                }
            }
        }
    }
}

/// 内置容器装饰器
///
/// 把容器查找句柄注入所有容器感知组件
struct ContainerDecorator {
    finder: FinderRef,
}

impl ContainerDecorator {
    fn new(finder: FinderRef) -> Self {
        Self { finder }
    }
}

#[async_trait]
impl ComponentDecorator for ContainerDecorator {
    async fn of_interest(&self, component: &Component) -> bool {
        component.instance().write().await.as_container_aware().is_some()
    }

    async fn decorate(&self, component: &Component, _container: &FinderRef) {
        let mut guard = component.instance().write().await;

        if let Some(aware) = guard.as_container_aware() {
            trace!("向 {} 注入容器句柄", component.name());
            aware.set_container(self.finder.clone());
        }
    }
}
