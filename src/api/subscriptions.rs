//! 推送订阅控制
//!
//! 这些接口告诉网关要推送什么，推送本身通过 `/On*` WebSocket 端点接收。

use super::{Mt5Api, Query};
use crate::error::Result;
use crate::types::Order;

impl Mt5Api {
    /// 订阅报价推送，`interval` 为推送间隔 (毫秒，0 表示实时)
    pub async fn subscribe(&self, symbol: &str, interval: u32) -> Result<String> {
        let query = Query::new()
            .add("symbol", symbol)
            .add_positive("interval", interval);
        self.execute("/Subscribe", query).await
    }

    pub async fn subscribe_many(&self, symbols: &[&str], interval: u32) -> Result<String> {
        let query = Query::new()
            .add_all("symbols", symbols)
            .add_positive("interval", interval);
        self.execute("/SubscribeMany", query).await
    }

    pub async fn unsubscribe(&self, symbol: &str) -> Result<String> {
        self.execute("/UnSubscribe", Query::new().add("symbol", symbol))
            .await
    }

    pub async fn unsubscribe_many(&self, symbols: &[&str]) -> Result<String> {
        self.execute("/UnSubscribeMany", Query::new().add_all("symbols", symbols))
            .await
    }

    /// 订阅浮动盈亏推送，返回当前持仓
    pub async fn subscribe_order_profit(&self, interval: u32) -> Result<Vec<Order>> {
        let query = Query::new().add_positive("interval", interval);
        self.get_json("/SubscribeOrderProfit", query).await
    }

    /// 订阅 K线推送
    pub async fn subscribe_ohlc(&self, symbol: &str, timeframe: u32, interval: u32) -> Result<String> {
        let query = Query::new()
            .add_nonempty("symbol", symbol)
            .add_positive("timeframe", timeframe)
            .add_positive("interval", interval);
        self.execute("/SubscribeOhlc", query).await
    }

    pub async fn unsubscribe_ohlc(&self, symbol: &str, timeframe: u32) -> Result<String> {
        let query = Query::new()
            .add_nonempty("symbol", symbol)
            .add_positive("timeframe", timeframe);
        self.execute("/UnsubscribeOhlc", query).await
    }
}
