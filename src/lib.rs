//! MT5 Gateway Client Library
//!
//! 用于连接 MT5 REST/WebSocket 网关的 Rust 客户端库
//!
//! # 功能
//! - HTTP API (登录、账户、交易、历史、报价)
//! - WebSocket 推送订阅 (报价、订单、盈亏、K线 等)
//! - 断线自动重连 (指数退避) 和 Ping 心跳
//! - 裸结构体 / `{type, data}` 信封两种推送格式
//!
//! # 示例
//! ```no_run
//! use mt5_client::{ConnectRequest, Mt5Client};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Mt5Client::with_base_url("http://localhost:5000")?;
//!     client
//!         .api()
//!         .connect(&ConnectRequest::new(62333850, "password", "78.140.180.198", 443))
//!         .await?;
//!
//!     client.api().subscribe("EURUSD", 0).await?;
//!     let quotes = client.on_quote(|quote| {
//!         println!("{} {} / {}", quote.symbol, quote.bid, quote.ask);
//!     });
//!
//!     tokio::signal::ctrl_c().await?;
//!     quotes.stop().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod connection;
pub mod decoder;
pub mod error;
pub mod protocol;
pub mod session;
pub mod subscription;
pub mod types;

pub use api::{
    ConnectExRequest, ConnectProxyRequest, ConnectRequest, Mt5Api, OrderCloseRequest,
    OrderHistoryPageRequest, OrderModifyRequest, OrderSendRequest,
};
pub use client::{Mt5Client, EVENT_CHANNEL_CAPACITY};
pub use config::{ClientConfig, ReconnectPolicy};
pub use connection::StreamConnection;
pub use decoder::{StreamEvent, SubscriptionEvent};
pub use error::{Mt5Error, Result};
pub use protocol::{
    AccountMethod, Endpoint, EventKind, ExpirationType, OrderState, OrderType, PlacedType,
    ProxyType, SortType,
};
pub use session::Session;
pub use subscription::{SubscriptionHandle, SubscriptionLoop, SubscriptionState, SubscriptionStats};
pub use types::*;
