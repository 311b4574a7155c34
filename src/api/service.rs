//! 服务接口

use super::{Mt5Api, Query};
use crate::error::{Mt5Error, Result};
use crate::types::Company;

impl Mt5Api {
    /// 网关到交易服务器的延迟 (毫秒)
    pub async fn ping_host(&self, host: &str, port: u16) -> Result<i64> {
        let query = Query::new()
            .add("host", host)
            .add_positive("port", port);
        self.get_json("/PingHost", query).await
    }

    /// 按公司名搜索经纪商服务器
    pub async fn search(&self, company: &str) -> Result<Vec<Company>> {
        self.get_json("/Search", Query::new().add("company", company))
            .await
    }

    /// 服务器时区 (相对 UTC 的小时数)
    pub async fn server_timezone(&self) -> Result<i32> {
        let body = self.execute("/ServerTimezone", Query::new()).await?;
        parse_timezone(&body)
    }
}

/// 响应体是裸浮点数，截断为整数小时
fn parse_timezone(body: &str) -> Result<i32> {
    body.trim()
        .parse::<f64>()
        .map(|hours| hours.trunc() as i32)
        .map_err(|e| Mt5Error::Decode(format!("server timezone {:?}: {}", body, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("2").unwrap(), 2);
        assert_eq!(parse_timezone("3.0\n").unwrap(), 3);
        assert_eq!(parse_timezone("-4.5").unwrap(), -4);
        assert!(matches!(parse_timezone("utc"), Err(Mt5Error::Decode(_))));
    }
}
