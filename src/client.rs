//! MT5 客户端
//!
//! HTTP 接口通过 [`Mt5Client::api`] 访问；推送通过订阅循环接收，
//! 每个订阅一个后台任务，断线自动重连。

use crate::api::Mt5Api;
use crate::config::ClientConfig;
use crate::connection::StreamConnection;
use crate::decoder::{StreamEvent, SubscriptionEvent};
use crate::error::Result;
use crate::protocol::{Endpoint, EventKind};
use crate::session::Session;
use crate::subscription::{SubscriptionHandle, SubscriptionLoop};
use crate::types::{
    MailMessage, MarketWatch, OhlcSubscription, OrderUpdateSummary, ProfitUpdate, Quote,
    SymbolTickValue, TickHistoryEventArgs,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// [`Mt5Client::subscribe_events`] 通道容量
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// MT5 客户端
#[derive(Clone, Debug)]
pub struct Mt5Client {
    config: ClientConfig,
    session: Session,
    api: Mt5Api,
}

impl Mt5Client {
    /// 创建客户端 (不发起任何网络请求)
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.reconnect.validate()?;
        let session = Session::new(&config)?;
        let api = Mt5Api::new(session.clone());
        Ok(Self {
            config,
            session,
            api,
        })
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Self::new(ClientConfig::new(base_url))
    }

    /// 使用环境变量配置创建
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// HTTP 接口
    pub fn api(&self) -> &Mt5Api {
        &self.api
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// 是否持有会话 token
    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// 启动订阅循环，每个事件调用一次 `callback`
    ///
    /// 回调在订阅的读任务中串行调用，不应阻塞。没有 token 时循环
    /// 按拨号失败处理，登录后自动连上。
    pub fn subscribe<E, F>(&self, callback: F) -> SubscriptionHandle
    where
        E: StreamEvent,
        F: FnMut(E) + Send + 'static,
    {
        tracing::info!("Subscribing to {}", E::KIND.endpoint());
        SubscriptionLoop::with_valid_policy(self.session.clone(), self.config.reconnect, callback)
            .spawn()
    }

    /// 报价推送
    pub fn on_quote<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: FnMut(Quote) + Send + 'static,
    {
        self.subscribe(callback)
    }

    /// 订单变更推送
    pub fn on_order_update<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: FnMut(OrderUpdateSummary) + Send + 'static,
    {
        self.subscribe(callback)
    }

    /// 浮动盈亏推送
    pub fn on_order_profit<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: FnMut(ProfitUpdate) + Send + 'static,
    {
        self.subscribe(callback)
    }

    pub fn on_ohlc<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: FnMut(OhlcSubscription) + Send + 'static,
    {
        self.subscribe(callback)
    }

    pub fn on_tick_history<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: FnMut(TickHistoryEventArgs) + Send + 'static,
    {
        self.subscribe(callback)
    }

    pub fn on_market_watch<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: FnMut(MarketWatch) + Send + 'static,
    {
        self.subscribe(callback)
    }

    pub fn on_tick_value<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: FnMut(SymbolTickValue) + Send + 'static,
    {
        self.subscribe(callback)
    }

    pub fn on_mail<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: FnMut(MailMessage) + Send + 'static,
    {
        self.subscribe(callback)
    }

    /// 以通道方式接收某类事件
    ///
    /// 通道容量为 [`EVENT_CHANNEL_CAPACITY`]，满了之后新事件被丢弃。
    /// 接收端被丢弃后订阅自动停止。
    pub fn subscribe_events(
        &self,
        kind: EventKind,
    ) -> (SubscriptionHandle, mpsc::Receiver<SubscriptionEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let handle = match kind {
            EventKind::Quote => self.forward::<Quote>(tx),
            EventKind::OrderUpdate => self.forward::<OrderUpdateSummary>(tx),
            EventKind::ProfitUpdate => self.forward::<ProfitUpdate>(tx),
            EventKind::Ohlc => self.forward::<OhlcSubscription>(tx),
            EventKind::TickHistory => self.forward::<TickHistoryEventArgs>(tx),
            EventKind::MarketWatch => self.forward::<MarketWatch>(tx),
            EventKind::TickValue => self.forward::<SymbolTickValue>(tx),
            EventKind::Mail => self.forward::<MailMessage>(tx),
        };
        (handle, rx)
    }

    fn forward<E: StreamEvent>(
        &self,
        tx: mpsc::Sender<SubscriptionEvent>,
    ) -> SubscriptionHandle {
        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        let callback = move |event: E| match tx.try_send(event.into_event()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Event channel full, dropping {} event", E::KIND.label());
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Event receiver dropped, stopping {}", E::KIND.endpoint());
                stop.cancel();
            }
        };
        SubscriptionLoop::with_valid_policy(self.session.clone(), self.config.reconnect, callback)
            .spawn_with(cancel)
    }

    /// 打开单个推送连接 (不重连)
    pub async fn open_stream(&self, endpoint: Endpoint) -> Result<StreamConnection> {
        StreamConnection::open(&self.session, endpoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconnectPolicy;
    use crate::error::Mt5Error;
    use crate::subscription::SubscriptionState;
    use std::time::Duration;

    #[test]
    fn test_new_rejects_bad_policy() {
        let policy = ReconnectPolicy {
            backoff_floor: Duration::ZERO,
            ..ReconnectPolicy::default()
        };
        let result = Mt5Client::new(ClientConfig::default().with_reconnect_policy(policy));
        assert!(matches!(result, Err(Mt5Error::InvalidParams(_))));
    }

    #[test]
    fn test_api_shares_session() {
        let client = Mt5Client::with_base_url("http://localhost:5000").unwrap();
        assert!(!client.is_connected());
        client.api().session().set_token("tok");
        assert!(client.is_connected());
        assert_eq!(client.session().token().as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_open_stream_requires_token() {
        let client = Mt5Client::with_base_url("http://127.0.0.1:9").unwrap();
        assert!(matches!(
            client.open_stream(Endpoint::Quote).await,
            Err(Mt5Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_subscription_waits_for_login() {
        let client = Mt5Client::with_base_url("http://127.0.0.1:9").unwrap();
        let handle = client.on_mail(|_mail| {});
        assert_eq!(handle.kind(), EventKind::Mail);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handle.state(), SubscriptionState::ReconnectWait);
        assert_eq!(handle.stats().delivered(), 0);
        handle.stop().await;
    }
}
