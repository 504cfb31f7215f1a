//! 未装配的组件声明

use crate::component::{Component, ComponentInstance};
use crate::errors::{InjectError, InjectResult};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// 注入值: 依赖引用或配置值
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// 对另一个已装配组件的引用
    Reference(Component),
    /// 从配置源解析出的原始值
    Config(serde_json::Value),
}

impl FieldValue {
    /// 取出依赖引用，值种类不符时报错
    pub fn reference(self) -> InjectResult<Component> {
        match self {
            FieldValue::Reference(component) => Ok(component),
            FieldValue::Config(_) => Err(InjectError::ValueKindMismatch {
                expected: "reference",
                actual: "config",
            }),
        }
    }

    /// 取出配置值并转换为目标类型
    pub fn config<T: DeserializeOwned>(self) -> InjectResult<T> {
        match self {
            FieldValue::Config(value) => Ok(serde_json::from_value(value)?),
            FieldValue::Reference(_) => Err(InjectError::ValueKindMismatch {
                expected: "config",
                actual: "reference",
            }),
        }
    }
}

/// 字段访问器: 按字段名把注入值写入组件实例
///
/// 访问器表由（范围外的）生成层随声明格式一起产出，
/// 解析器只做查表加调用，不做任何动态内省
pub type FieldSetter =
    Box<dyn Fn(&mut dyn ComponentInstance, FieldValue) -> InjectResult<()> + Send + Sync>;

/// 生成面向具体类型的字段访问器
///
/// 把「下钻到具体类型」这一步统一处理，调用方只需描述赋值:
///
/// ```rust
/// use container_common::{component_instance, field_setter, Component, ProtoComponent};
///
/// #[derive(Debug, Default)]
/// struct IndexService {
///     store: Option<Component>,
/// }
///
/// component_instance!(IndexService);
///
/// let proto = ProtoComponent::new("indexService", IndexService::default())
///     .with_dependency("store", "documentStore")
///     .with_setter(
///         "store",
///         field_setter::<IndexService, _>(|service, value| {
///             service.store = Some(value.reference()?);
///             Ok(())
///         }),
///     );
/// ```
pub fn field_setter<T, F>(apply: F) -> FieldSetter
where
    T: ComponentInstance,
    F: Fn(&mut T, FieldValue) -> InjectResult<()> + Send + Sync + 'static,
{
    Box::new(move |instance, value| {
        let typed = instance.as_any_mut().downcast_mut::<T>().ok_or_else(|| {
            InjectError::InstanceTypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
            }
        })?;

        apply(typed, value)
    })
}

/// 未装配的组件声明
///
/// 由生成层产出，`populate` 消费恰好一次；装配结束后整个
/// proto 集合被丢弃——容器不保留未装配状态，启动后不支持重新装配
pub struct ProtoComponent {
    component: Component,
    dependencies: HashMap<String, String>,
    config_promises: HashMap<String, String>,
    setters: HashMap<String, FieldSetter>,
}

impl ProtoComponent {
    /// 包装实例创建 proto 声明
    pub fn new<T: ComponentInstance>(name: impl Into<String>, instance: T) -> Self {
        Self::from_component(Component::new(name, instance))
    }

    /// 从已创建的组件构建 proto 声明
    pub fn from_component(component: Component) -> Self {
        Self {
            component,
            dependencies: HashMap::new(),
            config_promises: HashMap::new(),
            setters: HashMap::new(),
        }
    }

    /// 声明依赖: 字段名 -> 目标组件名
    pub fn with_dependency(mut self, field: impl Into<String>, target: impl Into<String>) -> Self {
        self.dependencies.insert(field.into(), target.into());
        self
    }

    /// 声明配置绑定: 字段名 -> 配置路径
    pub fn with_config_promise(mut self, field: impl Into<String>, path: impl Into<String>) -> Self {
        self.config_promises.insert(field.into(), path.into());
        self
    }

    /// 注册字段访问器
    pub fn with_setter(mut self, field: impl Into<String>, setter: FieldSetter) -> Self {
        self.setters.insert(field.into(), setter);
        self
    }

    /// 组件名
    pub fn name(&self) -> &str {
        self.component.name()
    }

    /// 内含的组件
    pub fn component(&self) -> &Component {
        &self.component
    }

    /// 声明的依赖
    pub fn dependencies(&self) -> &HashMap<String, String> {
        &self.dependencies
    }

    /// 声明的配置绑定
    pub fn config_promises(&self) -> &HashMap<String, String> {
        &self.config_promises
    }

    /// 指定字段的访问器
    pub fn setter(&self, field: &str) -> Option<&FieldSetter> {
        self.setters.get(field)
    }

    /// 是否为合法的注入目标
    ///
    /// 声明了依赖或配置绑定却没有任何字段访问器的声明，
    /// 在装配开始前即被拒绝，与依赖是否可解析无关
    pub fn wireable(&self) -> bool {
        !self.setters.is_empty() || (self.dependencies.is_empty() && self.config_promises.is_empty())
    }
}
