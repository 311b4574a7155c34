//! HTTP API 模块 - 网关的请求/响应接口
//!
//! 所有接口都是 GET + 查询参数。会话 token 以 `id` 参数附加，
//! 除非调用方已经显式提供了 `id` (登录接口)。
//!
//! 响应状态：
//! - 200: 成功，响应体为结果
//! - 201: 业务异常，响应体为 [`ExceptionResult`]
//! - 其他: HTTP 错误

mod account;
mod connection;
mod history;
mod market;
mod service;
mod subscriptions;
mod trading;

pub use connection::{ConnectExRequest, ConnectProxyRequest, ConnectRequest};
pub use history::OrderHistoryPageRequest;
pub use trading::{OrderCloseRequest, OrderModifyRequest, OrderSendRequest};

use crate::error::{Mt5Error, Result};
use crate::session::Session;
use crate::types::{from_gateway_slice, ExceptionResult};
use chrono::NaiveDateTime;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;

/// 网关使用的时间格式
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// MT5 HTTP API 客户端
#[derive(Clone, Debug)]
pub struct Mt5Api {
    session: Session,
}

impl Mt5Api {
    /// 使用已有会话创建 (共享 token)
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// 发送请求，返回 200 响应体
    pub(crate) async fn execute(&self, path: &str, query: Query) -> Result<String> {
        let query = match self.session.token() {
            Some(token) if !query.contains("id") => query.add("id", token),
            _ => query,
        };

        let url = self.session.endpoint_url(path);
        tracing::debug!("GET {}", path);

        let response = self
            .session
            .http()
            .get(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .query(query.pairs())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        classify_response(status, body)
    }

    /// 发送请求并解析 JSON 响应
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str, query: Query) -> Result<T> {
        let body = self.execute(path, query).await?;
        Ok(from_gateway_slice(body.as_bytes())?)
    }
}

/// 按状态码分类响应
pub(crate) fn classify_response(status: u16, body: String) -> Result<String> {
    match status {
        200 => Ok(body),
        201 => match from_gateway_slice::<ExceptionResult>(body.as_bytes()) {
            Ok(exception) => Err(Mt5Error::Api {
                code: exception.code,
                message: exception.message,
            }),
            Err(_) => Err(Mt5Error::Api {
                code: String::new(),
                message: body,
            }),
        },
        _ => Err(Mt5Error::HttpStatus { status, body }),
    }
}

/// 格式化时间参数
pub(crate) fn format_time(time: &NaiveDateTime) -> String {
    time.format(DATE_FORMAT).to_string()
}

/// 查询参数 (保持顺序，允许重复键)
#[derive(Debug, Clone, Default)]
pub(crate) struct Query {
    pairs: Vec<(&'static str, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, key: &'static str, value: impl ToString) -> Self {
        self.pairs.push((key, value.to_string()));
        self
    }

    /// 值大于零时才添加
    pub fn add_positive<T>(self, key: &'static str, value: T) -> Self
    where
        T: PartialOrd + Default + ToString,
    {
        if value > T::default() {
            self.add(key, value)
        } else {
            self
        }
    }

    /// 非空字符串才添加
    pub fn add_nonempty(self, key: &'static str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.add(key, value)
        }
    }

    /// 只在为 true 时添加 `key=true`
    pub fn add_flag(self, key: &'static str, value: bool) -> Self {
        if value {
            self.add(key, "true")
        } else {
            self
        }
    }

    pub fn add_opt<T: ToString>(self, key: &'static str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.add(key, value),
            None => self,
        }
    }

    /// 同一个键添加多个值
    pub fn add_all<I, T>(mut self, key: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        for value in values {
            self.pairs.push((key, value.to_string()));
        }
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| *k == key)
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_query_optional_params() {
        let query = Query::new()
            .add("symbol", "EURUSD")
            .add_positive("price", 0.0)
            .add_positive("slippage", 3_i64)
            .add_nonempty("comment", "")
            .add_flag("downloadOrderHistory", false)
            .add_flag("reconnectOnSymbolUpdate", true)
            .add_opt::<&str>("sort", None)
            .add_all("symbols", ["EURUSD", "GBPUSD"]);

        let pairs: Vec<(&str, &str)> = query
            .pairs()
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("symbol", "EURUSD"),
                ("slippage", "3"),
                ("reconnectOnSymbolUpdate", "true"),
                ("symbols", "EURUSD"),
                ("symbols", "GBPUSD"),
            ]
        );
        assert!(query.contains("symbols"));
        assert!(!query.contains("id"));
    }

    #[test]
    fn test_float_formatting() {
        let query = Query::new().add("volume", 0.01).add("lots", 1.0);
        assert_eq!(query.pairs()[0].1, "0.01");
        assert_eq!(query.pairs()[1].1, "1");
    }

    #[test]
    fn test_format_time() {
        let time = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        assert_eq!(format_time(&time), "2024-03-05T07:08:09");
    }

    #[test]
    fn test_classify_ok() {
        assert_eq!(classify_response(200, "x".to_string()).unwrap(), "x");
    }

    #[test]
    fn test_classify_exception() {
        let body = r#"{"message":"Invalid symbol","code":"INVALID_SYMBOL","stackTrace":null}"#;
        match classify_response(201, body.to_string()) {
            Err(Mt5Error::Api { code, message }) => {
                assert_eq!(code, "INVALID_SYMBOL");
                assert_eq!(message, "Invalid symbol");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_classify_exception_not_json() {
        match classify_response(201, "boom".to_string()) {
            Err(Mt5Error::Api { code, message }) => {
                assert!(code.is_empty());
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_classify_http_status() {
        assert!(matches!(
            classify_response(500, "oops".to_string()),
            Err(Mt5Error::HttpStatus { status: 500, .. })
        ));
    }
}
