//! 组件生命周期能力接口
//!
//! 组件通过实现这些 trait 声明参与的生命周期阶段；
//! 容器在注册时一次性探测能力归属，之后不再变化

use crate::errors::BoxError;
use async_trait::async_trait;
use std::time::Duration;

/// 可启动组件
#[async_trait]
pub trait Startable: Send + Sync {
    /// 启动组件
    ///
    /// 启动失败会中止整个启动阶段并上报给宿主进程
    async fn start_component(&mut self) -> Result<(), BoxError>;
}

/// 可停止组件
#[async_trait]
pub trait Stoppable: Send + Sync {
    /// 通知组件准备停止（停止外发请求、拒绝新工作等）
    async fn prepare_to_stop(&mut self);

    /// 组件是否已准备好被停止
    async fn ready_to_stop(&self) -> ReadyCheck;

    /// 停止组件
    ///
    /// 停止失败只记录，不会阻止其余组件停止
    async fn stop_component(&mut self) -> Result<(), BoxError>;
}

/// 可阻塞启动的组件
///
/// 就绪条件是异步的组件（例如预热中的连接池）用它推迟
/// 「开放访问」阶段，容器按固定重试计划轮询
#[async_trait]
pub trait StartupBlocker: Send + Sync {
    /// 检查组件当前是否仍在阻塞启动
    async fn block_access(&self) -> BlockCheck;
}

/// 可接收外部流量的组件
#[async_trait]
pub trait Accessible: Send + Sync {
    /// 通知组件可以开始接收外部流量
    async fn allow_access(&mut self) -> Result<(), BoxError>;
}

/// 需要知道自身注册名的组件
pub trait Nameable: Send + Sync {
    /// 注册时由容器注入组件名
    fn set_component_name(&mut self, name: &str);

    /// 组件名
    fn component_name(&self) -> &str;
}

/// 停止就绪检查结果
#[derive(Debug, Clone)]
pub struct ReadyCheck {
    /// 是否已准备好停止
    pub ready: bool,
    /// 未就绪的原因（可选）
    pub reason: Option<String>,
}

impl ReadyCheck {
    /// 已准备好停止
    pub fn ready() -> Self {
        Self {
            ready: true,
            reason: None,
        }
    }

    /// 尚未准备好，附带原因
    pub fn not_ready(reason: impl Into<String>) -> Self {
        Self {
            ready: false,
            reason: Some(reason.into()),
        }
    }

    /// 尚未准备好，未给出原因
    pub fn not_ready_without_reason() -> Self {
        Self {
            ready: false,
            reason: None,
        }
    }
}

/// 启动阻塞检查结果
#[derive(Debug, Clone)]
pub struct BlockCheck {
    /// 是否仍在阻塞启动
    pub blocked: bool,
    /// 阻塞原因（可选，超过告警阈值后会被记录）
    pub reason: Option<String>,
}

impl BlockCheck {
    /// 不再阻塞
    pub fn clear() -> Self {
        Self {
            blocked: false,
            reason: None,
        }
    }

    /// 仍在阻塞，附带原因
    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            blocked: true,
            reason: Some(reason.into()),
        }
    }

    /// 仍在阻塞，未给出原因
    pub fn blocked_without_reason() -> Self {
        Self {
            blocked: true,
            reason: None,
        }
    }
}

/// 轮询等待的重试计划
///
/// 等待阻塞启动与等待停止就绪共用这一结构，
/// 各自携带不同的默认值
#[derive(Debug, Clone, Copy)]
pub struct RetrySchedule {
    /// 两次检查之间的间隔
    pub interval: Duration,
    /// 最大尝试次数
    pub max_attempts: u32,
    /// 超过该次数后开始记录告警
    pub warn_after: u32,
}

impl RetrySchedule {
    /// 自定义重试计划
    pub fn new(interval: Duration, max_attempts: u32, warn_after: u32) -> Self {
        Self {
            interval,
            max_attempts,
            warn_after,
        }
    }

    /// 启动阶段默认计划: 5 秒 x 12 次，全程告警
    pub fn for_startup() -> Self {
        Self::new(Duration::from_secs(5), 12, 0)
    }

    /// 停止阶段默认计划: 5 秒 x 10 次，3 次后告警
    pub fn for_shutdown() -> Self {
        Self::new(Duration::from_secs(5), 10, 3)
    }
}
