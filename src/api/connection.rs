//! 登录 / 登出

use super::{Mt5Api, Query};
use crate::error::{Mt5Error, Result};
use crate::protocol::ProxyType;

/// 通过主机地址登录
#[derive(Debug, Clone, Default)]
pub struct ConnectRequest {
    pub user: i64,
    pub password: String,
    pub host: String,
    pub port: u16,
    /// 复用已有会话 id
    pub id: String,
    pub hardware_id: String,
    /// 一次性密码
    pub otp: String,
    pub connect_timeout_seconds: u32,
    pub download_order_history: bool,
    pub reconnect_on_symbol_update: bool,
}

impl ConnectRequest {
    pub fn new(user: i64, password: &str, host: &str, port: u16) -> Self {
        Self {
            user,
            password: password.to_string(),
            host: host.to_string(),
            port,
            ..Self::default()
        }
    }

    fn query(&self) -> Query {
        Query::new()
            .add("user", self.user)
            .add("password", &self.password)
            .add("host", &self.host)
            .add("port", self.port)
    }

    fn options(&self, query: Query) -> Query {
        query
            .add_nonempty("id", &self.id)
            .add_nonempty("hardwareId", &self.hardware_id)
            .add_nonempty("otp", &self.otp)
            .add_positive("connectTimeoutSeconds", self.connect_timeout_seconds)
            .add_flag("downloadOrderHistory", self.download_order_history)
            .add_flag("reconnectOnSymbolUpdate", self.reconnect_on_symbol_update)
    }
}

/// 通过服务器名称登录 (网关解析集群)
#[derive(Debug, Clone, Default)]
pub struct ConnectExRequest {
    pub user: i64,
    pub password: String,
    /// 经纪商服务器名称
    pub server: String,
    pub id: String,
    pub hardware_id: String,
    pub otp: String,
    pub connect_timeout_seconds: u32,
    /// 单个集群节点的超时
    pub connect_timeout_cluster_member_seconds: u32,
    pub download_order_history: bool,
    pub reconnect_on_symbol_update: bool,
}

impl ConnectExRequest {
    pub fn new(user: i64, password: &str, server: &str) -> Self {
        Self {
            user,
            password: password.to_string(),
            server: server.to_string(),
            ..Self::default()
        }
    }

    fn query(&self) -> Query {
        Query::new()
            .add("user", self.user)
            .add("password", &self.password)
            .add("server", &self.server)
            .add_nonempty("id", &self.id)
            .add_nonempty("hardwareId", &self.hardware_id)
            .add_nonempty("otp", &self.otp)
            .add_positive("connectTimeoutSeconds", self.connect_timeout_seconds)
            .add_positive(
                "connectTimeoutClusterMemberSeconds",
                self.connect_timeout_cluster_member_seconds,
            )
            .add_flag("downloadOrderHistory", self.download_order_history)
            .add_flag("reconnectOnSymbolUpdate", self.reconnect_on_symbol_update)
    }
}

/// 通过代理登录
#[derive(Debug, Clone, Default)]
pub struct ConnectProxyRequest {
    pub connect: ConnectRequest,
    pub proxy_host: String,
    pub proxy_port: u16,
    pub proxy_type: ProxyType,
    pub proxy_user: String,
    pub proxy_password: String,
}

impl ConnectProxyRequest {
    fn query(&self) -> Query {
        let query = self
            .connect
            .query()
            .add("proxyHost", &self.proxy_host)
            .add("proxyPort", self.proxy_port)
            .add("proxyType", self.proxy_type)
            .add_nonempty("proxyUser", &self.proxy_user)
            .add_nonempty("proxyPassword", &self.proxy_password);
        self.connect.options(query)
    }
}

impl Mt5Api {
    /// 登录，成功后保存 token
    pub async fn connect(&self, request: &ConnectRequest) -> Result<String> {
        let query = request.options(request.query());
        self.login("/Connect", query).await
    }

    /// 按服务器名称登录，成功后保存 token
    pub async fn connect_ex(&self, request: &ConnectExRequest) -> Result<String> {
        self.login("/ConnectEx", request.query()).await
    }

    /// 通过代理登录，成功后保存 token
    pub async fn connect_proxy(&self, request: &ConnectProxyRequest) -> Result<String> {
        self.login("/ConnectProxy", request.query()).await
    }

    /// 检查连接状态 (网关在连接丢失时会自动重连)
    pub async fn check_connect(&self) -> Result<String> {
        self.execute("/CheckConnect", Query::new()).await
    }

    /// 登出，成功后清除 token
    pub async fn disconnect(&self) -> Result<String> {
        let body = self.execute("/Disconnect", Query::new()).await?;
        self.session().clear_token();
        tracing::info!("Disconnected");
        Ok(body)
    }

    async fn login(&self, path: &str, query: Query) -> Result<String> {
        let body = self.execute(path, query).await.map_err(|e| match e {
            Mt5Error::Api { code, message } => Mt5Error::Auth(format!("[{}] {}", code, message)),
            Mt5Error::HttpStatus { status, body } => {
                Mt5Error::Auth(format!("HTTP {} - {}", status, body))
            }
            other => other,
        })?;

        let token = parse_token(&body)?;
        self.session().set_token(&token);
        tracing::info!("Connected via {}", path);
        Ok(token)
    }
}

/// 响应体就是 token，可能带引号 (JSON 字符串)
fn parse_token(body: &str) -> Result<String> {
    let token = body.trim().trim_matches('"').trim();
    if token.is_empty() {
        return Err(Mt5Error::Auth("empty session token".to_string()));
    }
    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(query: &Query) -> Vec<&str> {
        query.pairs().iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_parse_token() {
        assert_eq!(parse_token("abc").unwrap(), "abc");
        assert_eq!(parse_token("\"abc\"\n").unwrap(), "abc");
        assert!(matches!(parse_token("  "), Err(Mt5Error::Auth(_))));
        assert!(matches!(parse_token("\"\""), Err(Mt5Error::Auth(_))));
    }

    #[test]
    fn test_connect_query_minimal() {
        let request = ConnectRequest::new(62333850, "pw", "78.140.180.198", 443);
        let query = request.options(request.query());
        assert_eq!(keys(&query), vec!["user", "password", "host", "port"]);
        assert!(!query.contains("id"));
    }

    #[test]
    fn test_connect_ex_query_options() {
        let mut request = ConnectExRequest::new(1, "pw", "MetaQuotes-Demo");
        request.connect_timeout_cluster_member_seconds = 10;
        request.download_order_history = true;
        let query = request.query();
        assert_eq!(
            keys(&query),
            vec![
                "user",
                "password",
                "server",
                "connectTimeoutClusterMemberSeconds",
                "downloadOrderHistory"
            ]
        );
    }

    #[test]
    fn test_proxy_query() {
        let request = ConnectProxyRequest {
            connect: ConnectRequest::new(1, "pw", "host", 443),
            proxy_host: "10.0.0.1".to_string(),
            proxy_port: 1080,
            proxy_type: ProxyType::Socks5,
            ..ConnectProxyRequest::default()
        };
        let query = request.query();
        assert!(query
            .pairs()
            .iter()
            .any(|(k, v)| *k == "proxyType" && v == "Socks5"));
        assert!(!query.contains("proxyUser"));
    }
}
