//! 错误类型定义

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// MT5 客户端错误类型
#[derive(Error, Debug)]
pub enum Mt5Error {
    /// HTTP 请求错误 (网络层失败)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 非 200/201 的 HTTP 状态
    #[error("HTTP error {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// 网关返回的业务异常 (HTTP 201)
    #[error("API error [{code}]: {message}")]
    Api { code: String, message: String },

    /// 登录/握手失败
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// WebSocket 拨号失败
    #[error("WebSocket dial error: {0}")]
    Dial(#[source] tungstenite::Error),

    /// WebSocket 读取失败
    #[error("WebSocket read error: {0}")]
    Read(#[source] tungstenite::Error),

    /// WebSocket 写入失败 (心跳)
    #[error("WebSocket write error: {0}")]
    Write(#[source] tungstenite::Error),

    /// 连接已被对端或本端关闭
    #[error("Connection closed")]
    ConnectionClosed,

    /// 推送帧无法解码为期望的事件
    #[error("Decode error: {0}")]
    Decode(String),

    /// JSON 解析错误
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL 错误
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// 未连接 (没有会话 token)
    #[error("Not connected")]
    NotConnected,

    /// 无效参数
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

impl Mt5Error {
    /// 是否为流连接上的传输错误 (订阅循环会自行重连)
    pub fn is_stream_transport(&self) -> bool {
        matches!(
            self,
            Mt5Error::Dial(_) | Mt5Error::Read(_) | Mt5Error::Write(_) | Mt5Error::ConnectionClosed
        )
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, Mt5Error>;
