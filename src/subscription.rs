//! 自动重连的订阅循环
//!
//! 状态: Disconnected → Connecting → Streaming → (ReconnectWait → Connecting)* → Stopped
//!
//! - 拨号失败: 等待 backoff (每次翻倍，有上限)
//! - 拨号成功: backoff 复位，读任务和心跳任务共用同一个连接
//! - 任一任务结束: 关闭连接，固定暂停后重连 (不增长 backoff)
//! - 取消: 任何状态下立即停止，不再拨号
//!
//! 传输错误只记录日志，不会返回给调用方，也不会作为事件通知回调。

use crate::config::ReconnectPolicy;
use crate::connection::{FrameReader, FrameWriter, StreamConnection};
use crate::decoder::{self, StreamEvent};
use crate::error::Result;
use crate::protocol::EventKind;
use crate::session::Session;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// 发送关闭帧的最长等待
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// 订阅循环状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SubscriptionState {
    Disconnected = 0,
    Connecting = 1,
    Streaming = 2,
    ReconnectWait = 3,
    Stopped = 4,
}

impl SubscriptionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SubscriptionState::Connecting,
            2 => SubscriptionState::Streaming,
            3 => SubscriptionState::ReconnectWait,
            4 => SubscriptionState::Stopped,
            _ => SubscriptionState::Disconnected,
        }
    }
}

/// 拨号失败的指数退避
#[derive(Debug, Clone)]
pub struct Backoff {
    floor: Duration,
    ceiling: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(floor: Duration, ceiling: Duration) -> Self {
        Self {
            floor,
            ceiling,
            current: floor,
        }
    }

    /// 下一次等待的时长
    pub fn current(&self) -> Duration {
        self.current
    }

    /// 返回本次等待时长，并把下一次翻倍 (不超过上限)
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.ceiling);
        delay
    }

    /// 复位到初始值
    pub fn reset(&mut self) {
        self.current = self.floor;
    }
}

/// 重连等待的决策
///
/// backoff 只因连续的拨号失败增长；连接成功后中断只等待固定暂停。
#[derive(Debug, Clone)]
pub struct ReconnectSchedule {
    backoff: Backoff,
    pause: Duration,
}

impl ReconnectSchedule {
    pub fn new(policy: &ReconnectPolicy) -> Self {
        Self {
            backoff: Backoff::new(policy.backoff_floor, policy.backoff_ceiling),
            pause: policy.reconnect_pause,
        }
    }

    /// 拨号失败后的等待
    pub fn after_dial_failure(&mut self) -> Duration {
        self.backoff.next_delay()
    }

    /// 拨号成功
    pub fn after_connected(&mut self) {
        self.backoff.reset();
    }

    /// 已连接的流中断后的等待
    pub fn after_stream_end(&self) -> Duration {
        self.pause
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }
}

/// 订阅循环统计
#[derive(Debug, Default)]
pub struct SubscriptionStats {
    state: AtomicU8,
    delivered: AtomicU64,
    dropped: AtomicU64,
    connects: AtomicU64,
    dial_failures: AtomicU64,
}

impl SubscriptionStats {
    /// 当前状态
    pub fn state(&self) -> SubscriptionState {
        SubscriptionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// 已交给回调的事件数
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// 无法解码而丢弃的帧数
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// 成功拨号次数
    pub fn connects(&self) -> u64 {
        self.connects.load(Ordering::Relaxed)
    }

    /// 拨号失败次数
    pub fn dial_failures(&self) -> u64 {
        self.dial_failures.load(Ordering::Relaxed)
    }

    fn set_state(&self, state: SubscriptionState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// 单个订阅循环
///
/// 每个实例独立：不共享 backoff，也不与其他订阅协调。
pub struct SubscriptionLoop<E, F> {
    session: Session,
    policy: ReconnectPolicy,
    callback: F,
    stats: Arc<SubscriptionStats>,
    _event: PhantomData<fn(E)>,
}

enum EpisodeEnd<F> {
    /// 连接中断，回调交还给循环
    Dropped(F),
    Cancelled,
    CallbackPanicked,
}

impl<E, F> SubscriptionLoop<E, F>
where
    E: StreamEvent,
    F: FnMut(E) + Send + 'static,
{
    /// 创建订阅循环，`policy` 不合法时返回 `InvalidParams`
    pub fn new(session: Session, policy: ReconnectPolicy, callback: F) -> Result<Self> {
        policy.validate()?;
        Ok(Self::with_valid_policy(session, policy, callback))
    }

    /// `policy` 已经校验过
    pub(crate) fn with_valid_policy(session: Session, policy: ReconnectPolicy, callback: F) -> Self {
        Self {
            session,
            policy,
            callback,
            stats: Arc::new(SubscriptionStats::default()),
            _event: PhantomData,
        }
    }

    /// 统计信息
    pub fn stats(&self) -> Arc<SubscriptionStats> {
        self.stats.clone()
    }

    /// 在后台任务中运行
    pub fn spawn(self) -> SubscriptionHandle {
        self.spawn_with(CancellationToken::new())
    }

    /// 使用外部的取消 token 在后台运行
    pub fn spawn_with(self, cancel: CancellationToken) -> SubscriptionHandle {
        let stats = self.stats.clone();
        let task = tokio::spawn(self.run(cancel.clone()));
        SubscriptionHandle {
            kind: E::KIND,
            cancel,
            stats,
            task,
        }
    }

    /// 运行直到 `cancel` 被触发
    pub async fn run(self, cancel: CancellationToken) {
        let SubscriptionLoop {
            session,
            policy,
            mut callback,
            stats,
            ..
        } = self;
        let endpoint = E::KIND.endpoint();
        let mut schedule = ReconnectSchedule::new(&policy);

        tracing::info!("Subscription {} started", endpoint);

        loop {
            if cancel.is_cancelled() {
                break;
            }

            stats.set_state(SubscriptionState::Connecting);
            let dialed = tokio::select! {
                _ = cancel.cancelled() => break,
                result = StreamConnection::open(&session, endpoint) => result,
            };

            let connection = match dialed {
                Ok(connection) => connection,
                Err(e) => {
                    stats.dial_failures.fetch_add(1, Ordering::Relaxed);
                    let delay = schedule.after_dial_failure();
                    tracing::warn!(
                        "Subscription {} dial failed: {}, retrying in {:?}",
                        endpoint,
                        e,
                        delay
                    );
                    stats.set_state(SubscriptionState::ReconnectWait);
                    if !wait_or_cancel(&cancel, delay).await {
                        break;
                    }
                    continue;
                }
            };

            schedule.after_connected();
            stats.connects.fetch_add(1, Ordering::Relaxed);
            stats.set_state(SubscriptionState::Streaming);
            tracing::info!("Subscription {} streaming", endpoint);

            callback = match stream_episode::<E, F>(
                connection,
                callback,
                policy.heartbeat_interval,
                &stats,
                &cancel,
            )
            .await
            {
                EpisodeEnd::Dropped(callback) => callback,
                EpisodeEnd::Cancelled => break,
                EpisodeEnd::CallbackPanicked => {
                    tracing::error!("Subscription {} callback panicked, stopping", endpoint);
                    break;
                }
            };

            let pause = schedule.after_stream_end();
            stats.set_state(SubscriptionState::ReconnectWait);
            tracing::info!("Subscription {} reconnecting in {:?}", endpoint, pause);
            if !wait_or_cancel(&cancel, pause).await {
                break;
            }
        }

        stats.set_state(SubscriptionState::Stopped);
        tracing::info!("Subscription {} stopped", endpoint);
    }
}

/// 一次连接的生命周期：读任务 + 心跳任务，任一结束即整体结束
async fn stream_episode<E, F>(
    connection: StreamConnection,
    callback: F,
    heartbeat_interval: Duration,
    stats: &Arc<SubscriptionStats>,
    cancel: &CancellationToken,
) -> EpisodeEnd<F>
where
    E: StreamEvent,
    F: FnMut(E) + Send + 'static,
{
    // 父 token 取消会传播到 episode；任一任务结束也会取消 episode
    let episode = cancel.child_token();
    let (reader, writer) = connection.split();

    let read_task = tokio::spawn(read_activity::<E, F>(
        reader,
        callback,
        stats.clone(),
        episode.clone(),
    ));
    let heartbeat_task = tokio::spawn(heartbeat_activity(
        writer,
        heartbeat_interval,
        episode.clone(),
    ));

    supervise(cancel, &episode, read_task, heartbeat_task).await
}

/// 等待任一任务结束 (或取消)，然后回收两个任务
async fn supervise<F>(
    cancel: &CancellationToken,
    episode: &CancellationToken,
    read_task: JoinHandle<F>,
    heartbeat_task: JoinHandle<()>,
) -> EpisodeEnd<F> {
    episode.cancelled().await;

    if cancel.is_cancelled() {
        // 两个任务会自行退出并释放连接
        return EpisodeEnd::Cancelled;
    }

    let joined = async move {
        let callback = read_task.await;
        if let Err(e) = heartbeat_task.await {
            tracing::debug!("Heartbeat task ended abnormally: {}", e);
        }
        callback
    };

    // 关闭连接期间被取消也立即返回
    tokio::select! {
        _ = cancel.cancelled() => EpisodeEnd::Cancelled,
        callback = joined => match callback {
            Ok(callback) => EpisodeEnd::Dropped(callback),
            Err(_) => EpisodeEnd::CallbackPanicked,
        },
    }
}

/// 读任务：读帧 → 解码 → 回调，读失败即结束
async fn read_activity<E, F>(
    mut reader: FrameReader,
    mut callback: F,
    stats: Arc<SubscriptionStats>,
    episode: CancellationToken,
) -> F
where
    E: StreamEvent,
    F: FnMut(E) + Send + 'static,
{
    let endpoint = reader.endpoint();
    // 回调 panic 时也要结束 episode
    let _done = episode.clone().drop_guard();

    loop {
        let frame = tokio::select! {
            _ = episode.cancelled() => break,
            frame = reader.read_frame() => frame,
        };

        match frame {
            Ok(raw) => match decoder::decode::<E>(&raw) {
                Some(event) => {
                    stats.delivered.fetch_add(1, Ordering::Relaxed);
                    callback(event);
                }
                None => {
                    stats.dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        "Subscription {} dropped frame: {}",
                        endpoint,
                        decoder::preview(&raw)
                    );
                }
            },
            Err(e) => {
                tracing::warn!("Subscription {} read failed: {}", endpoint, e);
                break;
            }
        }
    }

    callback
}

/// 心跳任务：固定周期发送 Ping，发送失败即结束
async fn heartbeat_activity(mut writer: FrameWriter, period: Duration, episode: CancellationToken) {
    let endpoint = writer.endpoint();
    let _done = episode.clone().drop_guard();
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = episode.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = writer.send_ping().await {
                    tracing::warn!("Subscription {} heartbeat failed: {}", endpoint, e);
                    break;
                }
                tracing::trace!("Subscription {} ping sent", endpoint);
            }
        }
    }

    episode.cancel();
    if tokio::time::timeout(CLOSE_TIMEOUT, writer.close())
        .await
        .is_err()
    {
        tracing::debug!("Subscription {} close timed out", endpoint);
    }
}

/// 等待 `delay`，期间被取消返回 false
async fn wait_or_cancel(cancel: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// 后台订阅的句柄
///
/// 丢弃句柄不会停止订阅，需要调用 [`SubscriptionHandle::cancel`] 或
/// [`SubscriptionHandle::stop`]。
pub struct SubscriptionHandle {
    kind: EventKind,
    cancel: CancellationToken,
    stats: Arc<SubscriptionStats>,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// 订阅的事件种类
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// 当前状态
    pub fn state(&self) -> SubscriptionState {
        self.stats.state()
    }

    pub fn stats(&self) -> &SubscriptionStats {
        &self.stats
    }

    /// 取消用的 token (可以与其他任务共享)
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 请求停止，不等待
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 后台任务是否已结束
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// 停止并等待后台任务结束
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!("Subscription {} task failed: {}", self.kind.endpoint(), e);
        }
    }
}
