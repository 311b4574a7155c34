//! 数据类型定义
//!
//! 字段与网关 JSON 一一对应 (camelCase)。网关会省略部分字段，
//! 也会把字段写成 `null`，所以所有结构体缺省字段都取默认值，
//! 解码统一走 [`from_gateway_slice`]。

use crate::protocol::{AccountMethod, OrderState, OrderType, PlacedType};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 解码网关 JSON，值为 `null` 的字段按缺省处理
pub fn from_gateway_slice<T: DeserializeOwned>(raw: &[u8]) -> serde_json::Result<T> {
    from_gateway_value(serde_json::from_slice(raw)?)
}

/// 同 [`from_gateway_slice`]，输入为已解析的 JSON
pub fn from_gateway_value<T: DeserializeOwned>(mut value: Value) -> serde_json::Result<T> {
    strip_nulls(&mut value);
    serde_json::from_value(value)
}

/// 递归删除对象中值为 `null` 的字段
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, field| !field.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

/// 订单/持仓
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Order {
    /// 订单号
    pub ticket: i64,
    /// 盈亏
    pub profit: f64,
    /// 隔夜利息
    pub swap: f64,
    /// 佣金
    pub commission: f64,
    pub fee: f64,
    /// 平仓价格
    pub close_price: f64,
    /// 平仓时间 (UTC 毫秒，0 表示未平仓)
    #[serde(rename = "closeTimestampUTC")]
    pub close_timestamp_utc: u64,
    pub close_lots: f64,
    pub close_comment: String,
    /// 开仓价格
    pub open_price: f64,
    /// 开仓时间 (UTC 毫秒)
    #[serde(rename = "openTimestampUTC")]
    pub open_timestamp_utc: u64,
    /// 手数
    pub lots: f64,
    pub contract_size: f64,
    pub expert_id: i64,
    pub placed_type: PlacedType,
    /// 订单类型
    pub order_type: OrderType,
    /// 品种
    pub symbol: String,
    /// 注释
    pub comment: String,
    pub state: OrderState,
    /// 止损
    pub stop_loss: f64,
    /// 止盈
    pub take_profit: f64,
    pub request_id: i32,
    /// 小数位数
    pub digits: i32,
    pub profit_rate: f64,
    pub stop_limit_price: f64,
}

impl Order {
    /// 是否为持仓订单
    pub fn is_open(&self) -> bool {
        self.close_timestamp_utc == 0
    }

    /// 是否为挂单
    pub fn is_pending(&self) -> bool {
        self.order_type.is_pending()
    }
}

/// 报价
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Quote {
    /// 品种
    pub symbol: String,
    /// 买价
    pub bid: f64,
    /// 卖价
    pub ask: f64,
    /// 时间戳 (UTC 毫秒)
    #[serde(rename = "timestampUTC")]
    pub timestamp_utc: u64,
    pub last: f64,
    pub volume: i64,
}

impl Quote {
    /// 点差 (价格单位)
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }
}

/// 订单推送 (/OnOrderUpdate)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderUpdateSummary {
    /// 推送时的全部持仓
    pub opened_orders: Vec<Order>,
    /// 本次变更
    pub update: OrderUpdate,
    pub balance: f64,
    pub equity: f64,
    pub margin: f64,
    pub free_margin: f64,
    pub profit: f64,
    pub margin_level: f64,
    pub credit: f64,
    /// 账号
    pub user: i64,
}

/// 单次订单变更
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderUpdate {
    pub trans: TransactionInfo,
    pub order_internal: OrderInternal,
    pub deal: DealInternal,
    pub opposite_deal: DealInternal,
    pub order: Order,
    #[serde(rename = "type")]
    pub update_type: String,
    pub close_by_ticket: i64,
}

/// 交易事务信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionInfo {
    pub update_id: i32,
    pub action: i32,
    pub ticket_number: i64,
    pub currency: String,
    pub id: i32,
    /// 订单类型 (网关字段名即为 s58)
    pub s58: OrderType,
    pub order_state: OrderState,
    pub open_price: f64,
    pub order_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub volume: i64,
}

/// 成交记录
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DealInternal {
    pub ticket_number: i64,
    pub id: String,
    pub login: i64,
    pub history_time: i64,
    pub order_ticket: i64,
    pub open_time: i64,
    pub symbol: String,
    #[serde(rename = "type")]
    pub deal_type: String,
    pub direction: String,
    pub open_price: f64,
    pub price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub volume: i64,
    pub profit: f64,
    pub profit_rate: f64,
    pub volume_rate: f64,
    pub commission: f64,
    pub fee: f64,
    pub swap: f64,
    pub expert_id: i64,
    pub position_ticket: i64,
    pub comment: String,
    pub contract_size: f64,
    pub digits: i32,
    pub money_digits: i32,
    pub free_profit: f64,
    pub trail_rounder: f64,
    pub open_time_ms: i64,
    pub placed_type: PlacedType,
    pub lots: f64,
}

/// 服务器内部订单
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderInternal {
    pub ticket_number: i64,
    pub id: String,
    pub login: i64,
    pub symbol: String,
    pub history_time: i64,
    pub open_time: i64,
    pub expiration_time: i64,
    pub execution_time: i64,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub fill_policy: String,
    pub placed_type: PlacedType,
    pub open_price: f64,
    pub stop_limit_price: f64,
    pub price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub volume: i64,
    pub request_volume: i64,
    pub state: OrderState,
    pub expert_id: i64,
    pub deal_ticket: i64,
    pub comment: String,
    pub contract_size: f64,
    pub digits: i32,
    pub base_digits: i32,
    pub profit_rate: f64,
    pub open_time_ms: i64,
    pub ticket: i64,
    pub lots: f64,
    pub request_lots: f64,
}

/// 浮动盈亏推送 (/OnOrderProfit)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfitUpdate {
    pub balance: f64,
    pub credit: f64,
    pub equity: f64,
    pub margin: f64,
    pub free_margin: f64,
    pub profit: f64,
    pub orders: Vec<Order>,
    pub margin_level: f64,
    /// 账号
    pub user: i64,
}

/// K线推送 (/OnOhlc)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OhlcSubscription {
    pub symbol: String,
    /// 周期 (分钟)
    pub timeframe: i32,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// K线开始时间 (服务器原样字符串)
    pub time: String,
    pub volume: i64,
    pub tick_volume: i64,
    pub last_quote_time: String,
}

/// Tick 历史推送 (/OnTickHistory)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TickHistoryEventArgs {
    pub symbol: String,
    pub bars: Vec<TickBar>,
}

/// 单个 Tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TickBar {
    pub time: String,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub volume: i64,
}

/// 行情看板推送 (/OnMarketWatch)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketWatch {
    pub symbol: String,
    pub high: f64,
    pub low: f64,
    pub open_price: f64,
    pub close_price: f64,
    pub daily_change: f64,
    pub bid: f64,
    pub ask: f64,
    pub spread: i32,
    pub volume: i64,
}

/// 点值推送 (/OnTickValue)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SymbolTickValue {
    pub symbol: String,
    pub tick_value: f64,
    pub tick_size: f64,
}

/// 邮件推送 (/OnMail)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MailMessage {
    pub id: i64,
    pub time: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// 账户资料 (/Account)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountRec {
    pub login: i64,
    #[serde(rename = "type")]
    pub account_type: String,
    pub user_name: String,
    pub trade_flags: i32,
    pub country: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub user_address: String,
    pub phone: String,
    pub email: String,
    pub balance: f64,
    pub credit: f64,
    pub blocked: f64,
    pub leverage: i32,
}

/// 账户交易概要 (/AccountSummary)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountSummary {
    /// 余额
    pub balance: f64,
    pub credit: f64,
    pub profit: f64,
    /// 净值
    pub equity: f64,
    /// 已用保证金
    pub margin: f64,
    /// 可用保证金
    pub free_margin: f64,
    pub margin_level: f64,
    /// 账户杠杆
    pub leverage: f64,
    /// 账户货币
    pub currency: String,
    pub method: AccountMethod,
    #[serde(rename = "type")]
    pub account_type: String,
    pub is_investor: bool,
}

/// 账户详情 (/AccountDetails)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountDetails {
    pub server_name: String,
    pub user: i64,
    pub password: String,
    pub host: String,
    pub port: i32,
    pub company: String,
    pub currency: String,
    pub account_name: String,
    pub group: String,
    pub account_type: String,
    pub account_leverage: i32,
    pub account_method: AccountMethod,
    pub is_investor: bool,
}

/// 品种信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SymbolInfo {
    pub update_time: i64,
    pub currency: String,
    pub isin: String,
    pub description: String,
    pub basis: String,
    pub ref_to_site: String,
    pub custom: i32,
    pub profit_currency: String,
    pub margin_currency: String,
    pub precision: i32,
    pub bkgnd_color: i32,
    pub digits: i32,
    pub points: f64,
    pub limit_points: f64,
    pub id: i32,
    pub depth_of_market: i32,
    pub spread: i32,
    pub tick_value: f64,
    pub tick_size: f64,
    pub contract_size: f64,
    pub settlement_price: f64,
    pub lower_limit: f64,
    pub upper_limit: f64,
    pub face_value: f64,
    pub accrued_interest: f64,
    pub first_trade_time: i64,
    pub last_trade_time: i64,
    #[serde(rename = "bid_tickvalue")]
    pub bid_tick_value: f64,
    #[serde(rename = "ask_tickvalue")]
    pub ask_tick_value: f64,
}

/// 品种组参数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SymGroup {
    pub group_name: String,
    pub deviation_rate: i32,
    pub round_rate: i32,
    pub trade_mode: String,
    pub sl: i32,
    pub tp: i32,
    pub trade_type: String,
    pub fill_policy: String,
    pub expiration: String,
    pub order_flags: i32,
    pub price_timeout: i32,
    pub requote_timeout: i32,
    pub request_lots: i32,
    pub min_volume: i64,
    pub max_volume: i64,
    pub volume_step: i64,
    pub initial_margin: f64,
    pub maintenance_margin: f64,
    pub hedged_margin: f64,
    pub swap_type: String,
    pub swap_long: f64,
    pub swap_short: f64,
    pub three_days_swap: String,
    pub min_lots: f64,
    pub max_lots: f64,
    pub lots_step: f64,
}

/// 品种完整参数 (/SymbolParams)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SymbolParams {
    pub symbol: String,
    pub symbol_info: SymbolInfo,
    pub symbol_group: SymGroup,
}

/// K线
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bar {
    pub time: String,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub close_price: f64,
    pub tick_volume: i64,
    pub spread: i32,
    pub volume: i64,
}

/// 多品种 K线结果中的一项
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BarsForSymbol {
    pub symbol: String,
    pub bars: Vec<Bar>,
    /// 该品种的错误信息 (成功时为空)
    pub exception: String,
}

/// 订单历史 (/OrderHistory)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderHistoryEventArgs {
    pub orders: Vec<Order>,
    pub internal_deals: Vec<DealInternal>,
    pub internal_orders: Vec<OrderInternal>,
    pub action: i32,
    pub partial_response: bool,
}

/// 分页订单历史
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationReply {
    pub pages_count: i32,
    pub page_number: i32,
    pub orders: Vec<Order>,
}

/// 经纪商搜索结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Company {
    pub company_name: String,
    pub results: Vec<BrokerResult>,
}

/// 经纪商服务器
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrokerResult {
    pub name: String,
    pub access: Vec<String>,
}

/// 网关异常 (HTTP 201 响应体)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExceptionResult {
    pub message: String,
    pub code: String,
    pub stack_trace: String,
}
