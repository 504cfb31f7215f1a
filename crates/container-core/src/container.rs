//! 组件容器

use crate::decorator::DecoratorRunner;
use crate::lifecycle::LifecycleCoordinator;
use crate::registry::ComponentRegistry;
use crate::resolver::DependencyResolver;
use chrono::{DateTime, Utc};
use config_access::ConfigAccessor;
use container_common::{
    Capability, Component, ComponentInstance, ConfigError, ContainerResult, FinderRef,
    ProtoComponent, RetrySchedule, WiringError,
};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, trace};

/// 容器自身的组件名（保留名，应用组件不得使用）
pub const CONTAINER_COMPONENT_NAME: &str = "holon.Container";

/// 容器级设置
#[derive(Debug, Clone)]
pub struct ContainerSettings {
    /// 等待阻塞启动组件的重试计划
    pub blocker_schedule: RetrySchedule,
    /// 等待停止就绪的重试计划
    pub stop_schedule: RetrySchedule,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            blocker_schedule: RetrySchedule::for_startup(),
            stop_schedule: RetrySchedule::for_shutdown(),
        }
    }
}

/// 容器运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    /// 已创建，等待注册与装配
    Created,
    /// 装配中
    Populating,
    /// 装配完成
    Populated,
    /// 启动中
    Starting,
    /// 运行中
    Running,
    /// 停止中
    Stopping,
    /// 已停止
    Stopped,
    /// 装配或启动失败
    Failed,
}

/// 容器统计信息
#[derive(Debug, Clone, Default)]
pub struct ContainerMetrics {
    /// 装配完成后对外可见的组件数量
    pub registered_components: usize,
    /// 装配后从可见集合移除的装饰器数量
    pub discarded_decorators: usize,
    /// 装配耗时（毫秒）
    pub populate_duration_ms: u64,
    /// 启动完成时间
    pub started_at: Option<DateTime<Utc>>,
    /// 停止完成时间
    pub stopped_at: Option<DateTime<Utc>>,
}

/// 组件容器
///
/// 组合 proto 注册表、已装配注册表、修饰符表与配置源，
/// 向宿主进程暴露查找与生命周期操作。装配、装饰、启动、停止
/// 各阶段之间严格串行；唯一的并发区域是装饰阶段内部
pub struct ComponentContainer {
    registry: Arc<ComponentRegistry>,
    protos: HashMap<String, ProtoComponent>,
    duplicate_protos: Vec<String>,
    modifiers: HashMap<String, HashMap<String, String>>,
    config: Option<Arc<ConfigAccessor>>,
    settings: ContainerSettings,
    status: ContainerStatus,
    metrics: ContainerMetrics,
}

impl ComponentContainer {
    /// 以默认设置创建容器
    pub fn new(config: Arc<ConfigAccessor>) -> Self {
        Self::with_settings(config, ContainerSettings::default())
    }

    /// 以指定设置创建容器
    pub fn with_settings(config: Arc<ConfigAccessor>, settings: ContainerSettings) -> Self {
        Self {
            registry: Arc::new(ComponentRegistry::new()),
            protos: HashMap::new(),
            duplicate_protos: Vec::new(),
            modifiers: HashMap::new(),
            config: Some(config),
            settings,
            status: ContainerStatus::Created,
            metrics: ContainerMetrics::default(),
        }
    }

    /// 注册一个 proto 声明
    ///
    /// 重名在这里只记录，`populate` 时作为结构错误上报
    pub fn register_proto(&mut self, proto: ProtoComponent) {
        trace!("登记 proto {}", proto.name());

        if self.protos.contains_key(proto.name()) {
            self.duplicate_protos.push(proto.name().to_string());
        }

        self.protos.insert(proto.name().to_string(), proto);
    }

    /// 批量注册 proto
    pub fn register_protos(&mut self, protos: Vec<ProtoComponent>) {
        for proto in protos {
            self.register_proto(proto);
        }
    }

    /// 把裸实例包装成无依赖的 proto 注册
    pub fn register_instance<T: ComponentInstance>(
        &mut self,
        name: impl Into<String>,
        instance: T,
    ) {
        self.register_proto(ProtoComponent::new(name, instance));
    }

    /// 注册一条框架级装配覆盖
    ///
    /// 装配时覆盖对目标组件同名字段的声明依赖
    pub fn add_modifier(
        &mut self,
        component: impl Into<String>,
        field: impl Into<String>,
        target: impl Into<String>,
    ) {
        self.modifiers
            .entry(component.into())
            .or_default()
            .insert(field.into(), target.into());
    }

    /// 批量注册装配覆盖
    pub fn add_modifiers(&mut self, modifiers: HashMap<String, HashMap<String, String>>) {
        for (component, overrides) in modifiers {
            for (field, target) in overrides {
                self.add_modifier(component.clone(), field, target);
            }
        }
    }

    /// 指定组件与字段是否存在覆盖
    pub fn modifier_exists(&self, component: &str, field: &str) -> bool {
        self.modifiers
            .get(component)
            .map_or(false, |m| m.contains_key(field))
    }

    /// 指定组件的全部覆盖
    pub fn modifiers_for(&self, component: &str) -> Option<&HashMap<String, String>> {
        self.modifiers.get(component)
    }

    /// 按名称查找已装配组件
    pub fn lookup_by_name(&self, name: &str) -> Option<Component> {
        self.registry.component_by_name(name)
    }

    /// 全部对外可见组件，按名称排序
    pub fn all_components(&self) -> Vec<Component> {
        self.registry.all_sorted()
    }

    /// 具备指定能力的组件
    pub fn by_capability(&self, capability: Capability) -> Vec<Component> {
        self.registry.by_capability(capability)
    }

    /// 容器查找句柄，供容器感知组件与装饰器长期持有
    pub fn finder(&self) -> FinderRef {
        self.registry.clone()
    }

    /// 当前运行状态
    pub fn status(&self) -> ContainerStatus {
        self.status
    }

    /// 统计信息
    pub fn metrics(&self) -> &ContainerMetrics {
        &self.metrics
    }

    /// 尚未装配的 proto 数量（装配成功后恒为 0）
    pub fn pending_protos(&self) -> usize {
        self.protos.len()
    }

    /// 装配: 注册全部 proto、解析依赖与配置、并发执行装饰器
    ///
    /// 任一装配错误立即返回，且不留下部分装配的可见注册表；
    /// 装配成功后 proto 集合整体丢弃。装配过程中的 panic
    /// 在此边界捕获、记录，并转换为异常进程终止
    pub async fn populate(&mut self) -> ContainerResult<()> {
        match AssertUnwindSafe(self.populate_inner()).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                error!("装配过程中发生 panic: {}", panic_message(panic.as_ref()));
                std::process::abort();
            }
        }
    }

    async fn populate_inner(&mut self) -> ContainerResult<()> {
        let populate_started = Instant::now();
        self.status = ContainerStatus::Populating;

        let Some(config) = self.config.clone() else {
            self.status = ContainerStatus::Failed;
            return Err(ConfigError::SourceReleased.into());
        };

        if let Some(name) = self.duplicate_protos.first() {
            self.status = ContainerStatus::Failed;
            self.protos.clear();
            return Err(WiringError::DuplicateName { name: name.clone() }.into());
        }

        let protos = std::mem::take(&mut self.protos);

        // 结构检查先于一切装配，与依赖是否可解析无关
        for proto in protos.values() {
            if !proto.wireable() {
                self.status = ContainerStatus::Failed;
                return Err(WiringError::NotWireable {
                    component: proto.name().to_string(),
                }
                .into());
            }
        }

        let mut runner = DecoratorRunner::new(self.finder());

        for proto in protos.values() {
            let component = proto.component().clone();
            trace!("注册组件 {}", component.name());

            runner.capture(&component);
            self.registry.add(component);
        }

        let resolver =
            DependencyResolver::new(self.registry.as_ref(), &self.modifiers, config.as_ref());

        if let Err(wiring_error) = resolver.resolve_all(&protos).await {
            error!("{}", wiring_error);
            info!("中止装配");

            self.registry.clear();
            self.status = ContainerStatus::Failed;

            return Err(wiring_error.into());
        }

        let removed = runner.run(&self.registry).await;
        let mut discarded = 0;

        for name in &removed {
            if self.registry.remove_visible(name).is_some() {
                discarded += 1;
            }
        }

        self.metrics.registered_components = self.registry.len();
        self.metrics.discarded_decorators = discarded;
        self.metrics.populate_duration_ms = populate_started.elapsed().as_millis() as u64;
        self.status = ContainerStatus::Populated;

        info!(
            "装配完成: {} 个组件，移除 {} 个装饰器",
            self.registry.len(),
            discarded
        );

        Ok(())
    }

    /// 启动全部组件: start -> 等待阻塞者 -> 开放访问
    ///
    /// 首个失败即中止并返回；全部阶段成功后释放配置源句柄。
    /// 启动过程中的 panic 在此边界捕获并转换为异常进程终止
    pub async fn start_all(&mut self) -> ContainerResult<()> {
        match AssertUnwindSafe(self.start_inner()).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                error!("启动过程中发生 panic: {}", panic_message(panic.as_ref()));
                std::process::abort();
            }
        }
    }

    async fn start_inner(&mut self) -> ContainerResult<()> {
        self.status = ContainerStatus::Starting;

        if let Err(lifecycle_error) = self.coordinator().start_all().await {
            self.status = ContainerStatus::Failed;
            return Err(lifecycle_error.into());
        }

        // 启动完成后组件定义不可再读取或修改
        self.config = None;
        self.metrics.started_at = Some(Utc::now());
        self.status = ContainerStatus::Running;

        info!("全部组件启动完成");
        Ok(())
    }

    /// 停止全部组件
    ///
    /// 停止尽最大可能推进: 就绪超时与单个组件的停止失败
    /// 只记录，不会使整个阶段失败
    pub async fn stop_all(&mut self) -> ContainerResult<()> {
        self.status = ContainerStatus::Stopping;

        self.coordinator().stop_all().await?;

        self.metrics.stopped_at = Some(Utc::now());
        self.status = ContainerStatus::Stopped;

        info!("全部组件停止完成");
        Ok(())
    }

    fn coordinator(&self) -> LifecycleCoordinator {
        LifecycleCoordinator::new(
            self.registry.clone(),
            self.settings.blocker_schedule,
            self.settings.stop_schedule,
        )
    }
}

/// 从 panic 负载中提取可读信息
fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "未知 panic".to_string()
    }
}
