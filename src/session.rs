//! 会话上下文 - 网关地址、token 和共享的 HTTP 客户端

use crate::config::ClientConfig;
use crate::error::{Mt5Error, Result};
use crate::protocol::Endpoint;
use std::sync::{Arc, RwLock};
use url::Url;

/// 会话
///
/// 克隆开销很小，所有克隆共享同一个 token。token 只由登录/登出修改，
/// 订阅循环在每次拨号时读取一份快照。
#[derive(Clone, Debug)]
pub struct Session {
    base_url: Url,
    token: Arc<RwLock<Option<String>>>,
    http: reqwest::Client,
}

impl Session {
    /// 根据配置创建会话
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))?;
        match base_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Mt5Error::InvalidParams(format!(
                    "unsupported base url scheme: {}",
                    other
                )))
            }
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            base_url,
            token: Arc::new(RwLock::new(None)),
            http,
        })
    }

    /// 网关地址
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// 当前 token 快照
    pub fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// 设置 token (空字符串视为清除)
    pub fn set_token(&self, token: &str) {
        let value = if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        };
        match self.token.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }

    /// 清除 token
    pub fn clear_token(&self) {
        self.set_token("");
    }

    /// 是否已登录
    pub fn is_connected(&self) -> bool {
        self.token().is_some()
    }

    /// HTTP 接口地址
    pub fn endpoint_url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&join_path(self.base_url.path(), path));
        url
    }

    /// 推送端点的 WebSocket 地址
    ///
    /// http → ws, https → wss，token 以 `id=<token>` 附加在查询串中。
    pub fn stream_url(&self, endpoint: Endpoint) -> Result<Url> {
        let token = self.token().ok_or(Mt5Error::NotConnected)?;

        let mut url = self.base_url.clone();
        let scheme = match url.scheme() {
            "https" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|_| Mt5Error::InvalidParams(format!("cannot rewrite scheme of {}", self.base_url)))?;
        url.set_path(&join_path(self.base_url.path(), endpoint.path()));
        url.set_query(None);
        url.query_pairs_mut().append_pair("id", &token);
        Ok(url)
    }
}

fn join_path(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
