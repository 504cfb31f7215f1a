//! 依赖与配置装配

use crate::registry::ComponentRegistry;
use config_access::ConfigAccessor;
use container_common::{FieldValue, InjectError, ProtoComponent, WiringError, WiringResult};
use std::collections::HashMap;
use tracing::trace;

/// 依赖解析器
///
/// 把 proto 集合装配到已注册的组件图上: 逐字段合并修饰符、
/// 按名称查找依赖目标、通过字段访问器注入、解析配置绑定。
/// 所有 proto 在装配开始前已整体注册为组件，同一批次内的
/// 前向引用与循环引用都能正确解析——装配是单遍字段赋值，
/// 不是构造顺序问题
pub struct DependencyResolver<'a> {
    registry: &'a ComponentRegistry,
    modifiers: &'a HashMap<String, HashMap<String, String>>,
    config: &'a ConfigAccessor,
}

impl<'a> DependencyResolver<'a> {
    /// 创建解析器
    pub fn new(
        registry: &'a ComponentRegistry,
        modifiers: &'a HashMap<String, HashMap<String, String>>,
        config: &'a ConfigAccessor,
    ) -> Self {
        Self {
            registry,
            modifiers,
            config,
        }
    }

    /// 装配全部 proto，任一错误立即中止
    pub async fn resolve_all(&self, protos: &HashMap<String, ProtoComponent>) -> WiringResult<()> {
        for proto in protos.values() {
            self.resolve_dependencies(proto).await?;
            self.resolve_config(proto).await?;
        }

        Ok(())
    }

    /// 合并声明依赖与修饰符，修饰符逐字段优先
    fn effective_dependencies(&self, proto: &ProtoComponent) -> HashMap<String, String> {
        let mut merged = proto.dependencies().clone();

        if let Some(overrides) = self.modifiers.get(proto.name()) {
            for (field, target) in overrides {
                merged.insert(field.clone(), target.clone());
            }
        }

        merged
    }

    async fn resolve_dependencies(&self, proto: &ProtoComponent) -> WiringResult<()> {
        let component_name = proto.name();

        for (field, target_name) in self.effective_dependencies(proto) {
            trace!("{} 需要 {}（字段 {}）", component_name, target_name, field);

            let target = self.registry.component_by_name(&target_name).ok_or_else(|| {
                WiringError::UnresolvedReference {
                    target: target_name.clone(),
                    component: component_name.to_string(),
                    field: field.clone(),
                }
            })?;

            self.inject(proto, &field, FieldValue::Reference(target))
                .await?;
        }

        Ok(())
    }

    async fn resolve_config(&self, proto: &ProtoComponent) -> WiringResult<()> {
        let component_name = proto.name();

        for (field, path) in proto.config_promises() {
            trace!("{} 绑定配置 {}（字段 {}）", component_name, path, field);

            let value = self
                .config
                .resolve(path)
                .ok_or_else(|| WiringError::UnresolvedConfig {
                    path: path.clone(),
                    component: component_name.to_string(),
                    field: field.clone(),
                })?;

            self.inject(proto, field, FieldValue::Config(value.clone()))
                .await?;
        }

        Ok(())
    }

    /// 通过字段访问器向实例写入一个值
    async fn inject(
        &self,
        proto: &ProtoComponent,
        field: &str,
        value: FieldValue,
    ) -> WiringResult<()> {
        let setter = proto.setter(field).ok_or_else(|| WiringError::Injection {
            component: proto.name().to_string(),
            field: field.to_string(),
            source: InjectError::FieldNotFound,
        })?;

        let mut instance = proto.component().instance().write().await;

        setter(&mut *instance, value).map_err(|source| WiringError::Injection {
            component: proto.name().to_string(),
            field: field.to_string(),
            source,
        })
    }
}
