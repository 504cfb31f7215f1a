//! 组件与组件实例定义

use crate::capability::CapabilitySet;
use crate::decorator::ComponentDecorator;
use crate::lifecycle::{Accessible, Nameable, Startable, StartupBlocker, Stoppable};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// 框架内部组件的名称前缀
///
/// 应用组件不应使用该前缀命名
pub const FRAMEWORK_PREFIX: &str = "holon.";

/// 组件实例的共享句柄
///
/// 实例锁在注入、装饰与生命周期调用期间可能跨越挂起点持有
pub type InstanceRef = Arc<RwLock<dyn ComponentInstance>>;

/// 容器查找句柄
pub type FinderRef = Arc<dyn ComponentFinder>;

/// 按名称查找组件的能力
///
/// 由容器的注册表实现，提供给装饰器与容器感知组件
pub trait ComponentFinder: Send + Sync {
    /// 按名称查找已装配组件
    fn component_by_name(&self, name: &str) -> Option<Component>;
}

/// 容器感知组件
///
/// 装配完成后由内置装饰器注入容器查找句柄
pub trait ContainerAware: Send + Sync {
    /// 接收容器查找句柄
    fn set_container(&mut self, container: FinderRef);
}

/// 组件实例基础 trait
///
/// 每个能力访问器默认返回 `None`；具体类型按自身实现的能力覆盖
/// 对应的访问器，通常通过 [`component_instance!`](crate::component_instance)
/// 宏生成。访问器是对运行期接口探测的显式替代:
/// 能力归属成为注册时一次性计算、可直接检视的值
pub trait ComponentInstance: Any + Send + Sync + fmt::Debug {
    /// 以 [`Any`] 形式访问实例（用于按具体类型下钻）
    fn as_any(&self) -> &dyn Any;

    /// 以可变 [`Any`] 形式访问实例（字段注入使用）
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// 可启动能力
    fn as_startable(&mut self) -> Option<&mut dyn Startable> {
        None
    }

    /// 可停止能力
    fn as_stoppable(&mut self) -> Option<&mut dyn Stoppable> {
        None
    }

    /// 阻塞启动能力
    fn as_blocker(&self) -> Option<&dyn StartupBlocker> {
        None
    }

    /// 接收外部流量能力
    fn as_accessible(&mut self) -> Option<&mut dyn Accessible> {
        None
    }

    /// 装饰器能力
    fn as_decorator(&self) -> Option<&dyn ComponentDecorator> {
        None
    }

    /// 命名感知能力
    fn as_nameable(&mut self) -> Option<&mut dyn Nameable> {
        None
    }

    /// 容器感知能力
    fn as_container_aware(&mut self) -> Option<&mut dyn ContainerAware> {
        None
    }
}

/// 组件: 命名实例加注册时探测出的生命周期能力
///
/// 名称即身份；同名组件不会同时存活。句柄可廉价克隆，
/// 各克隆共享同一实例锁
#[derive(Debug, Clone)]
pub struct Component {
    name: String,
    instance: InstanceRef,
    capabilities: CapabilitySet,
}

impl Component {
    /// 创建组件并一次性探测实例能力
    ///
    /// 能力集合在此之后不再变化——装饰可能改变组件内部状态，
    /// 但不会触发重新探测。命名感知的实例在这里获得注册名
    pub fn new<T: ComponentInstance>(name: impl Into<String>, mut instance: T) -> Self {
        let name = name.into();
        let capabilities = CapabilitySet::probe(&mut instance);

        if let Some(nameable) = instance.as_nameable() {
            nameable.set_component_name(&name);
        }

        let instance: InstanceRef = Arc::new(RwLock::new(instance));

        Self {
            name,
            instance,
            capabilities,
        }
    }

    /// 组件名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 实例句柄
    pub fn instance(&self) -> &InstanceRef {
        &self.instance
    }

    /// 注册时探测出的能力集合
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }
}

/// 为具体类型生成 [`ComponentInstance`] 实现
///
/// 列出类型实现的能力，宏生成对应的访问器覆盖；
/// 不列能力则只生成基础实现:
///
/// ```rust
/// use async_trait::async_trait;
/// use container_common::{component_instance, BoxError, Startable};
///
/// #[derive(Debug, Default)]
/// struct CachePrimer {
///     primed: bool,
/// }
///
/// #[async_trait]
/// impl Startable for CachePrimer {
///     async fn start_component(&mut self) -> Result<(), BoxError> {
///         self.primed = true;
///         Ok(())
///     }
/// }
///
/// component_instance!(CachePrimer: startable);
/// ```
///
/// 可用的能力标记: `startable`、`stoppable`、`blocker`、`accessible`、
/// `decorator`、`nameable`、`container_aware`
#[macro_export]
macro_rules! component_instance {
    (@cap startable) => {
        fn as_startable(&mut self) -> Option<&mut dyn $crate::lifecycle::Startable> {
            Some(self)
        }
    };
    (@cap stoppable) => {
        fn as_stoppable(&mut self) -> Option<&mut dyn $crate::lifecycle::Stoppable> {
            Some(self)
        }
    };
    (@cap blocker) => {
        fn as_blocker(&self) -> Option<&dyn $crate::lifecycle::StartupBlocker> {
            Some(self)
        }
    };
    (@cap accessible) => {
        fn as_accessible(&mut self) -> Option<&mut dyn $crate::lifecycle::Accessible> {
            Some(self)
        }
    };
    (@cap decorator) => {
        fn as_decorator(&self) -> Option<&dyn $crate::decorator::ComponentDecorator> {
            Some(self)
        }
    };
    (@cap nameable) => {
        fn as_nameable(&mut self) -> Option<&mut dyn $crate::lifecycle::Nameable> {
            Some(self)
        }
    };
    (@cap container_aware) => {
        fn as_container_aware(&mut self) -> Option<&mut dyn $crate::component::ContainerAware> {
            Some(self)
        }
    };
    ($ty:ty) => {
        $crate::component_instance!($ty:);
    };
    ($ty:ty: $($cap:ident),* $(,)?) => {
        impl $crate::component::ComponentInstance for $ty {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            $($crate::component_instance!(@cap $cap);)*
        }
    };
}
