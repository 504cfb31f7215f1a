//! 生命周期各阶段的集成测试

use async_trait::async_trait;
use config_access::ConfigAccessor;
use container_common::{
    component_instance, Accessible, BlockCheck, BoxError, ReadyCheck, RetrySchedule, Startable,
    StartupBlocker, Stoppable,
};
use container_core::{ComponentContainer, ContainerSettings, ContainerStatus};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

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

/// 记录启动与停止事件的组件
#[derive(Debug)]
struct Recorder {
    label: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Startable for Recorder {
    async fn start_component(&mut self) -> Result<(), BoxError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("start:{}", self.label));
        Ok(())
    }
}

#[async_trait]
impl Stoppable for Recorder {
    async fn prepare_to_stop(&mut self) {
        self.log
            .lock()
            .unwrap()
            .push(format!("prepare:{}", self.label));
    }

    async fn ready_to_stop(&self) -> ReadyCheck {
        ReadyCheck::ready()
    }

    async fn stop_component(&mut self) -> Result<(), BoxError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("stop:{}", self.label));
        Ok(())
    }
}

component_instance!(Recorder: startable, stoppable);

/// 启动即失败的组件
#[derive(Debug)]
struct FailingStarter;

#[async_trait]
impl Startable for FailingStarter {
    async fn start_component(&mut self) -> Result<(), BoxError> {
        Err("初始化资源不可用".into())
    }
}

component_instance!(FailingStarter: startable);

/// 预热若干轮检查后才放行的阻塞组件
#[derive(Debug)]
struct WarmingPool {
    checks_until_clear: AtomicU32,
}

impl WarmingPool {
    fn new(checks: u32) -> Self {
        Self {
            checks_until_clear: AtomicU32::new(checks),
        }
    }
}

#[async_trait]
impl StartupBlocker for WarmingPool {
    async fn block_access(&self) -> BlockCheck {
        if self.checks_until_clear.load(Ordering::SeqCst) == 0 {
            BlockCheck::clear()
        } else {
            self.checks_until_clear.fetch_sub(1, Ordering::SeqCst);
            BlockCheck::blocked("连接池预热中")
        }
    }
}

component_instance!(WarmingPool: blocker);

/// 「开放访问」阶段的开关组件
#[derive(Debug, Default)]
struct Gate {
    open: bool,
    fail: bool,
}

#[async_trait]
impl Accessible for Gate {
    async fn allow_access(&mut self) -> Result<(), BoxError> {
        if self.fail {
            return Err("监听端口被占用".into());
        }

        self.open = true;
        Ok(())
    }
}

component_instance!(Gate: accessible);

/// 永远不就绪的组件，可选地在停止时失败
#[derive(Debug)]
struct Stubborn {
    stop_attempted: Arc<AtomicBool>,
    fail_stop: bool,
}

#[async_trait]
impl Stoppable for Stubborn {
    async fn prepare_to_stop(&mut self) {}

    async fn ready_to_stop(&self) -> ReadyCheck {
        ReadyCheck::not_ready("仍有在途请求")
    }

    async fn stop_component(&mut self) -> Result<(), BoxError> {
        self.stop_attempted.store(true, Ordering::SeqCst);

        if self.fail_stop {
            return Err("句柄关闭失败".into());
        }

        Ok(())
    }
}

component_instance!(Stubborn: stoppable);

fn fast_settings() -> ContainerSettings {
    ContainerSettings {
        blocker_schedule: RetrySchedule::new(Duration::from_millis(10), 3, 0),
        stop_schedule: RetrySchedule::new(Duration::from_millis(10), 3, 1),
    }
}

fn test_container() -> ComponentContainer {
    let config = Arc::new(ConfigAccessor::new(json!({ "app": { "name": "lifecycle-test" } })));
    ComponentContainer::with_settings(config, fast_settings())
}

#[tokio::test]
async fn test_start_all_runs_every_startable() {
    init_test_logger();

    let log = Arc::new(Mutex::new(Vec::new()));

    let mut container = test_container();
    container.register_instance(
        "serviceA",
        Recorder {
            label: "a",
            log: log.clone(),
        },
    );
    container.register_instance(
        "serviceB",
        Recorder {
            label: "b",
            log: log.clone(),
        },
    );

    container.populate().await.expect("装配应该成功");
    container.start_all().await.expect("启动应该成功");

    // 启动顺序是注册表顺序，与依赖图无关——这里只断言覆盖面，
    // 不断言任何先后关系（已知的顺序非保证）
    let mut started = log.lock().unwrap().clone();
    started.sort();
    assert_eq!(started, vec!["start:a".to_string(), "start:b".to_string()]);
    assert_eq!(container.status(), ContainerStatus::Running);
}

#[tokio::test]
async fn test_start_failure_aborts_and_is_fatal() {
    let mut container = test_container();
    container.register_instance("brokenService", FailingStarter);

    container.populate().await.expect("装配应该成功");

    let err = container.start_all().await.expect_err("启动失败应该上报");

    assert!(
        err.to_string().contains("brokenService"),
        "错误应包含失败组件名: {err}"
    );
    assert_eq!(container.status(), ContainerStatus::Failed);
}

#[tokio::test]
async fn test_blocked_startup_within_budget_succeeds() {
    let mut container = test_container();
    // 两轮检查后放行，预算是三次尝试
    container.register_instance("warmPool", WarmingPool::new(2));
    container.register_instance("gate", Gate::default());

    container.populate().await.expect("装配应该成功");
    container.start_all().await.expect("阻塞在预算内应该成功");

    // 「开放访问」只在阻塞清除之后执行
    let gate = container.lookup_by_name("gate").unwrap();
    let guard = gate.instance().read().await;
    assert!(guard.as_any().downcast_ref::<Gate>().unwrap().open);
}

#[tokio::test]
async fn test_blocked_startup_beyond_budget_fails() {
    let mut container = test_container();
    container.register_instance("warmPool", WarmingPool::new(10));

    container.populate().await.expect("装配应该成功");

    let err = container
        .start_all()
        .await
        .expect_err("超出重试预算应该失败");

    assert!(
        err.to_string().contains("warmPool"),
        "错误应列出仍在阻塞的组件: {err}"
    );
    assert_eq!(container.status(), ContainerStatus::Failed);
}

#[tokio::test]
async fn test_allow_access_failure_aborts() {
    let mut container = test_container();
    container.register_instance(
        "edgeGate",
        Gate {
            open: false,
            fail: true,
        },
    );

    container.populate().await.expect("装配应该成功");

    let err = container
        .start_all()
        .await
        .expect_err("开放访问失败应该上报");

    assert!(
        err.to_string().contains("edgeGate"),
        "错误应包含失败组件名: {err}"
    );
}

#[tokio::test]
async fn test_stop_all_proceeds_past_stuck_component() {
    init_test_logger();

    let stop_attempted = Arc::new(AtomicBool::new(false));
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut container = test_container();
    container.register_instance(
        "stuckService",
        Stubborn {
            stop_attempted: stop_attempted.clone(),
            fail_stop: false,
        },
    );
    container.register_instance(
        "cleanService",
        Recorder {
            label: "clean",
            log: log.clone(),
        },
    );

    container.populate().await.expect("装配应该成功");
    container.start_all().await.expect("启动应该成功");

    // 就绪超时只记录，不阻止停止
    container.stop_all().await.expect("停止必须始终推进");

    assert!(
        stop_attempted.load(Ordering::SeqCst),
        "卡住的组件最终也要被停止"
    );
    assert!(log.lock().unwrap().contains(&"stop:clean".to_string()));
    assert_eq!(container.status(), ContainerStatus::Stopped);
}

#[tokio::test]
async fn test_stop_failure_does_not_halt_others() {
    let stop_attempted = Arc::new(AtomicBool::new(false));
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut container = test_container();
    container.register_instance(
        "faultyService",
        Stubborn {
            stop_attempted: stop_attempted.clone(),
            fail_stop: true,
        },
    );
    container.register_instance(
        "cleanService",
        Recorder {
            label: "clean",
            log: log.clone(),
        },
    );

    container.populate().await.expect("装配应该成功");
    container.stop_all().await.expect("单个停止失败不应中断整个阶段");

    assert!(stop_attempted.load(Ordering::SeqCst));
    assert!(log.lock().unwrap().contains(&"stop:clean".to_string()));
}

#[tokio::test]
async fn test_full_cycle_order_for_single_component() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut container = test_container();
    container.register_instance(
        "svc",
        Recorder {
            label: "svc",
            log: log.clone(),
        },
    );

    container.populate().await.expect("装配应该成功");
    container.start_all().await.expect("启动应该成功");
    container.stop_all().await.expect("停止应该成功");

    assert_eq!(
        log.lock().unwrap().clone(),
        vec![
            "start:svc".to_string(),
            "prepare:svc".to_string(),
            "stop:svc".to_string()
        ]
    );
}

#[tokio::test]
async fn test_config_accessor_released_after_start() {
    let mut container = test_container();
    container.register_instance("svc", Recorder {
        label: "svc",
        log: Arc::new(Mutex::new(Vec::new())),
    });

    container.populate().await.expect("装配应该成功");
    container.start_all().await.expect("启动应该成功");

    // 启动成功后配置源句柄已释放，再次装配是编程错误
    let err = container.populate().await.expect_err("配置源释放后装配应该报错");

    assert!(
        err.to_string().contains("配置源"),
        "错误应说明配置源已释放: {err}"
    );
}
