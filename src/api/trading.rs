//! 持仓查询与交易请求

use super::{Mt5Api, Query};
use crate::error::{Mt5Error, Result};
use crate::protocol::{OrderType, PlacedType, SortType};
use crate::types::Order;

/// 下单请求
#[derive(Debug, Clone, Default)]
pub struct OrderSendRequest {
    pub symbol: String,
    pub operation: OrderType,
    /// 手数
    pub volume: f64,
    /// 挂单价格 (市价单为 0)
    pub price: f64,
    /// 允许滑点 (点)
    pub slippage: i64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub comment: String,
    /// EA 魔术号
    pub expert_id: i64,
    pub stop_limit_price: f64,
    pub placed_type: Option<PlacedType>,
}

impl OrderSendRequest {
    /// 市价单
    pub fn market(symbol: &str, operation: OrderType, volume: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            operation,
            volume,
            ..Self::default()
        }
    }

    /// 挂单
    pub fn pending(symbol: &str, operation: OrderType, volume: f64, price: f64) -> Self {
        Self {
            price,
            ..Self::market(symbol, operation, volume)
        }
    }

    pub fn with_stops(mut self, stop_loss: f64, take_profit: f64) -> Self {
        self.stop_loss = stop_loss;
        self.take_profit = take_profit;
        self
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_string();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.symbol.is_empty() {
            return Err(Mt5Error::InvalidParams("symbol is required".to_string()));
        }
        if self.volume <= 0.0 {
            return Err(Mt5Error::InvalidParams(format!(
                "volume must be > 0, got {}",
                self.volume
            )));
        }
        if self.operation.is_pending() && self.price <= 0.0 {
            return Err(Mt5Error::InvalidParams(format!(
                "{} requires a price",
                self.operation
            )));
        }
        Ok(())
    }

    fn query(&self) -> Query {
        Query::new()
            .add("symbol", &self.symbol)
            .add("operation", self.operation)
            .add("volume", self.volume)
            .add_positive("price", self.price)
            .add_positive("slippage", self.slippage)
            .add_positive("stoploss", self.stop_loss)
            .add_positive("takeprofit", self.take_profit)
            .add_nonempty("comment", &self.comment)
            .add_positive("expertId", self.expert_id)
            .add_positive("stopLimitPrice", self.stop_limit_price)
            .add_opt("placedType", self.placed_type)
    }
}

/// 修改订单 (止损/止盈为 0 表示移除)
#[derive(Debug, Clone, Default)]
pub struct OrderModifyRequest {
    pub ticket: i64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// 挂单新价格
    pub price: f64,
    pub stop_limit: f64,
}

impl OrderModifyRequest {
    pub fn new(ticket: i64, stop_loss: f64, take_profit: f64) -> Self {
        Self {
            ticket,
            stop_loss,
            take_profit,
            ..Self::default()
        }
    }

    fn query(&self) -> Query {
        Query::new()
            .add("ticket", self.ticket)
            .add("stoploss", self.stop_loss)
            .add("takeprofit", self.take_profit)
            .add_positive("price", self.price)
            .add_positive("stoplimit", self.stop_limit)
    }
}

/// 平仓 / 删除挂单
#[derive(Debug, Clone, Default)]
pub struct OrderCloseRequest {
    pub ticket: i64,
    /// 部分平仓手数 (0 表示全部)
    pub lots: f64,
    pub price: f64,
    pub slippage: i64,
}

impl OrderCloseRequest {
    pub fn new(ticket: i64) -> Self {
        Self {
            ticket,
            ..Self::default()
        }
    }

    fn query(&self) -> Query {
        Query::new()
            .add("ticket", self.ticket)
            .add_positive("lots", self.lots)
            .add_positive("price", self.price)
            .add_positive("slippage", self.slippage)
    }
}

impl Mt5Api {
    /// 当前持仓和挂单
    pub async fn opened_orders(&self, sort: Option<SortType>, ascending: bool) -> Result<Vec<Order>> {
        let query = Query::new()
            .add_opt("sort", sort)
            .add("ascending", ascending);
        self.get_json("/OpenedOrders", query).await
    }

    /// 单个持仓
    pub async fn opened_order(&self, ticket: i64) -> Result<Order> {
        self.get_json("/OpenedOrder", Query::new().add("ticket", ticket))
            .await
    }

    /// 下单
    pub async fn order_send(&self, request: &OrderSendRequest) -> Result<Order> {
        request.validate()?;
        tracing::info!(
            "OrderSend {} {} {} lots",
            request.symbol,
            request.operation,
            request.volume
        );
        self.get_json("/OrderSend", request.query()).await
    }

    /// 修改止损/止盈/挂单价格
    pub async fn order_modify(&self, request: &OrderModifyRequest) -> Result<Order> {
        tracing::info!("OrderModify #{}", request.ticket);
        self.get_json("/OrderModify", request.query()).await
    }

    /// 平仓
    pub async fn order_close(&self, request: &OrderCloseRequest) -> Result<Order> {
        tracing::info!("OrderClose #{}", request.ticket);
        self.get_json("/OrderClose", request.query()).await
    }
}
