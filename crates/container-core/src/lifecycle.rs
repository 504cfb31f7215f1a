//! 生命周期协调器

use crate::registry::ComponentRegistry;
use container_common::{Capability, Component, LifecycleError, LifecycleResult, RetrySchedule};
use std::sync::Arc;
use tracing::{error, trace, warn};

/// 生命周期协调器
///
/// 以能力过滤出的子集推进启动与停止的各个阶段。阶段之间严格串行；
/// 阶段内部按注册顺序执行，与依赖图无关——协调器不做拓扑排序，
/// 组件的启动逻辑不得假设依赖已先行启动
pub struct LifecycleCoordinator {
    registry: Arc<ComponentRegistry>,
    blocker_schedule: RetrySchedule,
    stop_schedule: RetrySchedule,
}

impl LifecycleCoordinator {
    /// 创建协调器
    pub fn new(
        registry: Arc<ComponentRegistry>,
        blocker_schedule: RetrySchedule,
        stop_schedule: RetrySchedule,
    ) -> Self {
        Self {
            registry,
            blocker_schedule,
            stop_schedule,
        }
    }

    /// 启动: start -> 等待阻塞者 -> 开放访问
    ///
    /// 首个失败立即中止当前阶段并上报；启动失败对进程是致命的，
    /// 不做重试
    pub async fn start_all(&self) -> LifecycleResult<()> {
        for component in self.registry.by_capability(Capability::CanStart) {
            trace!("启动 {}", component.name());

            let mut guard = component.instance().write().await;

            if let Some(startable) = guard.as_startable() {
                startable
                    .start_component()
                    .await
                    .map_err(|source| LifecycleError::StartFailed {
                        name: component.name().to_string(),
                        source,
                    })?;
            }
        }

        if !self.registry.by_capability(Capability::CanBlockStart).is_empty() {
            self.wait_for_blockers().await?;
        }

        for component in self.registry.by_capability(Capability::CanBeAccessed) {
            trace!("{} 开放访问", component.name());

            let mut guard = component.instance().write().await;

            if let Some(accessible) = guard.as_accessible() {
                accessible
                    .allow_access()
                    .await
                    .map_err(|source| LifecycleError::AccessFailed {
                        name: component.name().to_string(),
                        source,
                    })?;
            }
        }

        Ok(())
    }

    /// 按固定重试计划轮询所有阻塞启动的组件
    ///
    /// 尝试次数耗尽后，错误中列出所有仍在阻塞的组件
    async fn wait_for_blockers(&self) -> LifecycleResult<()> {
        let schedule = self.blocker_schedule;
        let mut blocking = Vec::new();

        for attempt in 0..schedule.max_attempts {
            blocking = self.collect_blocking(attempt > schedule.warn_after).await;

            if blocking.is_empty() {
                return Ok(());
            }

            tokio::time::sleep(schedule.interval).await;
        }

        Err(LifecycleError::StartupBlocked { names: blocking })
    }

    /// 收集仍在阻塞的组件名，超过告警阈值后记录阻塞原因
    async fn collect_blocking(&self, warn: bool) -> Vec<String> {
        let mut names = Vec::new();

        for component in self.registry.by_capability(Capability::CanBlockStart) {
            let guard = component.instance().read().await;

            if let Some(blocker) = guard.as_blocker() {
                let check = blocker.block_access().await;

                if check.blocked {
                    if warn {
                        match &check.reason {
                            Some(reason) => warn!("{} 仍在阻塞启动: {}", component.name(), reason),
                            None => warn!("{} 仍在阻塞启动（未给出原因）", component.name()),
                        }
                    }

                    names.push(component.name().to_string());
                }
            }
        }

        names
    }

    /// 停止全部可停止组件
    ///
    /// 停止必须尽量推进: 就绪超时不是致命错误，
    /// 单个组件的停止失败只记录、不中断其余组件
    pub async fn stop_all(&self) -> LifecycleResult<()> {
        let stoppables = self.registry.by_capability(Capability::CanStop);

        for component in &stoppables {
            trace!("{} 准备停止", component.name());

            let mut guard = component.instance().write().await;

            if let Some(stoppable) = guard.as_stoppable() {
                stoppable.prepare_to_stop().await;
            }
        }

        self.wait_for_ready_to_stop(&stoppables).await;

        for component in &stoppables {
            let mut guard = component.instance().write().await;

            if let Some(stoppable) = guard.as_stoppable() {
                if let Err(e) = stoppable.stop_component().await {
                    error!("{} 停止时出错: {}", component.name(), e);
                }
            }
        }

        Ok(())
    }

    /// 轮询等待所有组件停止就绪；尝试耗尽后记录并继续
    async fn wait_for_ready_to_stop(&self, stoppables: &[Component]) {
        let schedule = self.stop_schedule;

        for attempt in 0..schedule.max_attempts {
            let not_ready = self
                .count_not_ready(stoppables, attempt > schedule.warn_after)
                .await;

            if not_ready == 0 {
                return;
            }

            tokio::time::sleep(schedule.interval).await;
        }

        error!("仍有组件未准备好停止，强制停止");
    }

    async fn count_not_ready(&self, stoppables: &[Component], warn: bool) -> usize {
        let mut not_ready = 0;

        for component in stoppables {
            let mut guard = component.instance().write().await;

            if let Some(stoppable) = guard.as_stoppable() {
                let check = stoppable.ready_to_stop().await;

                if !check.ready {
                    not_ready += 1;

                    if warn {
                        match &check.reason {
                            Some(reason) => {
                                warn!("{} 尚未准备好停止: {}", component.name(), reason)
                            }
                            None => warn!("{} 尚未准备好停止（未给出原因）", component.name()),
                        }
                    }
                }
            }
        }

        not_ready
    }
}
