//! 已装配组件的注册表

use container_common::{Capability, Component, ComponentFinder};
use parking_lot::RwLock;
use std::collections::HashMap;

/// 组件注册表
///
/// 维护按名称与按能力两套索引。成员只在单线程的装配阶段变动；
/// 装饰阶段对注册表只做并发读取，锁从不跨越挂起点持有
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    by_name: RwLock<HashMap<String, Component>>,
    by_capability: RwLock<HashMap<Capability, Vec<Component>>>,
}

impl ComponentRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册组件并按能力建立索引
    pub fn add(&self, component: Component) {
        {
            let mut by_capability = self.by_capability.write();

            for capability in component.capabilities().as_list() {
                by_capability
                    .entry(capability)
                    .or_default()
                    .push(component.clone());
            }
        }

        self.by_name
            .write()
            .insert(component.name().to_string(), component);
    }

    /// 按名称查找组件
    pub fn component_by_name(&self, name: &str) -> Option<Component> {
        self.by_name.read().get(name).cloned()
    }

    /// 是否存在同名组件
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.read().contains_key(name)
    }

    /// 具备指定能力的组件，按注册顺序返回
    ///
    /// 注册顺序与依赖图无关——调用方不得假设依赖先于使用者出现
    pub fn by_capability(&self, capability: Capability) -> Vec<Component> {
        self.by_capability
            .read()
            .get(&capability)
            .cloned()
            .unwrap_or_default()
    }

    /// 全部对外可见组件，按名称排序
    pub fn all_sorted(&self) -> Vec<Component> {
        let mut all: Vec<Component> = self.by_name.read().values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// 对外可见组件数量
    pub fn len(&self) -> usize {
        self.by_name.read().len()
    }

    /// 可见集合是否为空
    pub fn is_empty(&self) -> bool {
        self.by_name.read().is_empty()
    }

    /// 从对外可见集合移除组件
    ///
    /// 能力索引保留: 兼具生命周期能力的装饰器在被移出可见集合后
    /// 仍参与启动与停止阶段
    pub fn remove_visible(&self, name: &str) -> Option<Component> {
        self.by_name.write().remove(name)
    }

    /// 清空全部索引（装配失败时回收部分状态）
    pub fn clear(&self) {
        self.by_name.write().clear();
        self.by_capability.write().clear();
    }
}

impl ComponentFinder for ComponentRegistry {
    fn component_by_name(&self, name: &str) -> Option<Component> {
        ComponentRegistry::component_by_name(self, name)
    }
}
