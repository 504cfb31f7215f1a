//! 组件容器的端到端集成测试
//!
//! 从分层配置源到完整的装配 -> 启动 -> 停止周期

use async_trait::async_trait;
use config_access::{ConfigAccessor, ConfigSourceSet};
use container_common::{
    component_instance, field_setter, Accessible, BlockCheck, BoxError, Component,
    ComponentDecorator, FinderRef, Nameable, ProtoComponent, ReadyCheck, RetrySchedule, Startable,
    StartupBlocker, Stoppable,
};
use container_core::{ComponentContainer, ContainerSettings, ContainerStatus};
use serde_json::json;
use std::io::Write as _;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tempfile::NamedTempFile;

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .try_init()
            .ok();
    });
}

/// 预热中的连接池: 阻塞启动、可启动可停止、接收配置与自身名称
#[derive(Debug, Default)]
struct ConnectionPool {
    component_name: String,
    max_size: Option<u64>,
    started: bool,
    warm_checks: AtomicU32,
}

#[async_trait]
impl Startable for ConnectionPool {
    async fn start_component(&mut self) -> Result<(), BoxError> {
        self.started = true;
        Ok(())
    }
}

#[async_trait]
impl StartupBlocker for ConnectionPool {
    async fn block_access(&self) -> BlockCheck {
        if self.warm_checks.load(Ordering::SeqCst) == 0 {
            BlockCheck::clear()
        } else {
            self.warm_checks.fetch_sub(1, Ordering::SeqCst);
            BlockCheck::blocked("连接池预热中")
        }
    }
}

#[async_trait]
impl Stoppable for ConnectionPool {
    async fn prepare_to_stop(&mut self) {}

    async fn ready_to_stop(&self) -> ReadyCheck {
        ReadyCheck::ready()
    }

    async fn stop_component(&mut self) -> Result<(), BoxError> {
        self.started = false;
        Ok(())
    }
}

impl Nameable for ConnectionPool {
    fn set_component_name(&mut self, name: &str) {
        self.component_name = name.to_string();
    }

    fn component_name(&self) -> &str {
        &self.component_name
    }
}

component_instance!(ConnectionPool: startable, stoppable, blocker, nameable);

/// 依赖连接池对外服务的查询服务
#[derive(Debug, Default)]
struct QueryService {
    pool: Option<Component>,
    accepting: bool,
}

#[async_trait]
impl Accessible for QueryService {
    async fn allow_access(&mut self) -> Result<(), BoxError> {
        self.accepting = true;
        Ok(())
    }
}

component_instance!(QueryService: accessible);

/// 无依赖的静态池组件
#[derive(Debug, Default)]
struct StaticPool;

component_instance!(StaticPool);

/// 记录经手组件的审计装饰器
#[derive(Debug)]
struct AuditDecorator {
    seen: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ComponentDecorator for AuditDecorator {
    async fn of_interest(&self, _component: &Component) -> bool {
        true
    }

    async fn decorate(&self, component: &Component, _container: &FinderRef) {
        self.seen.lock().unwrap().push(component.name().to_string());
    }
}

component_instance!(AuditDecorator: decorator);

fn fast_settings() -> ContainerSettings {
    ContainerSettings {
        blocker_schedule: RetrySchedule::new(Duration::from_millis(10), 5, 0),
        stop_schedule: RetrySchedule::new(Duration::from_millis(10), 3, 1),
    }
}

fn pool_proto(name: &str) -> ProtoComponent {
    ProtoComponent::new(
        name,
        ConnectionPool {
            warm_checks: AtomicU32::new(2),
            ..Default::default()
        },
    )
    .with_config_promise("max_size", "database.pool.size")
    .with_setter(
        "max_size",
        field_setter::<ConnectionPool, _>(|pool, value| {
            pool.max_size = Some(value.config()?);
            Ok(())
        }),
    )
}

fn service_proto(name: &str, pool: &str) -> ProtoComponent {
    ProtoComponent::new(name, QueryService::default())
        .with_dependency("pool", pool)
        .with_setter(
            "pool",
            field_setter::<QueryService, _>(|service, value| {
                service.pool = Some(value.reference()?);
                Ok(())
            }),
        )
}

#[tokio::test]
async fn test_full_cycle_with_layered_config() {
    init_test_logger();

    let mut config_file = NamedTempFile::new().unwrap();
    write!(
        config_file,
        "{}",
        json!({
            "database": { "pool": { "size": 32 } },
            "service": { "banner": "holon" }
        })
    )
    .unwrap();

    std::env::set_var("HOLONIT_RUNTIME_MODE", "integration");

    let accessor = ConfigSourceSet::new()
        .add_json_file(config_file.path())
        .expect("添加配置文件应该成功")
        .with_env_prefix("HOLONIT")
        .build()
        .expect("配置源合并应该成功");

    // 环境变量层参与合并
    let mode: String = accessor.typed("runtime.mode").unwrap();
    assert_eq!(mode, "integration");

    let mut container = ComponentContainer::with_settings(Arc::new(accessor), fast_settings());

    container.register_proto(pool_proto("connectionPool"));
    container.register_proto(service_proto("queryService", "connectionPool"));

    let seen = Arc::new(Mutex::new(Vec::new()));
    container.register_instance("auditDecorator", AuditDecorator { seen: seen.clone() });

    container.populate().await.expect("装配应该成功");
    assert_eq!(container.status(), ContainerStatus::Populated);
    assert_eq!(container.pending_protos(), 0);

    // 装饰器覆盖了两个应用组件，且自身不出现在可见集合中
    let mut decorated = seen.lock().unwrap().clone();
    decorated.sort();
    assert_eq!(
        decorated,
        vec!["connectionPool".to_string(), "queryService".to_string()]
    );
    assert!(container.lookup_by_name("auditDecorator").is_none());

    container.start_all().await.expect("启动应该成功");
    assert_eq!(container.status(), ContainerStatus::Running);

    {
        let pool = container.lookup_by_name("connectionPool").unwrap();
        let guard = pool.instance().read().await;
        let pool = guard.as_any().downcast_ref::<ConnectionPool>().unwrap();
        assert_eq!(pool.max_size, Some(32), "配置绑定应注入文件中的值");
        assert_eq!(pool.component_name(), "connectionPool");
        assert!(pool.started);
    }
    {
        let service = container.lookup_by_name("queryService").unwrap();
        let guard = service.instance().read().await;
        let service = guard.as_any().downcast_ref::<QueryService>().unwrap();
        assert!(service.accepting, "阻塞清除后应已开放访问");
        assert_eq!(service.pool.as_ref().unwrap().name(), "connectionPool");
    }

    container.stop_all().await.expect("停止应该成功");
    assert_eq!(container.status(), ContainerStatus::Stopped);

    {
        let pool = container.lookup_by_name("connectionPool").unwrap();
        let guard = pool.instance().read().await;
        assert!(!guard.as_any().downcast_ref::<ConnectionPool>().unwrap().started);
    }

    let metrics = container.metrics();
    assert_eq!(metrics.registered_components, 2);
    assert_eq!(metrics.discarded_decorators, 1);
    assert!(metrics.started_at.is_some());
    assert!(metrics.stopped_at.is_some());

    std::env::remove_var("HOLONIT_RUNTIME_MODE");
}

#[tokio::test]
async fn test_framework_modifier_rewires_service() {
    init_test_logger();

    let accessor = ConfigAccessor::new(json!({}));
    let mut container = ComponentContainer::with_settings(Arc::new(accessor), fast_settings());

    container.register_instance("primaryPool", StaticPool);
    container.register_instance("replicaPool", StaticPool);
    container.register_proto(service_proto("queryService", "primaryPool"));

    // 框架级覆盖改接只读副本
    container.add_modifier("queryService", "pool", "replicaPool");

    container.populate().await.expect("装配应该成功");

    let service = container.lookup_by_name("queryService").unwrap();
    let guard = service.instance().read().await;
    let service = guard.as_any().downcast_ref::<QueryService>().unwrap();

    assert_eq!(
        service.pool.as_ref().unwrap().name(),
        "replicaPool",
        "修饰符应覆盖声明的依赖"
    );
}
