//! 品种、报价与 K线历史

use super::{format_time, Mt5Api, Query};
use crate::error::Result;
use crate::protocol::OrderType;
use crate::types::{Bar, BarsForSymbol, Quote, SymbolInfo, SymbolParams};
use chrono::NaiveDateTime;
use std::collections::HashMap;

impl Mt5Api {
    /// 全部品种信息 (按品种名索引)
    pub async fn symbols(&self) -> Result<HashMap<String, SymbolInfo>> {
        self.get_json("/Symbols", Query::new()).await
    }

    /// 品种名列表
    pub async fn symbol_list(&self) -> Result<Vec<String>> {
        self.get_json("/SymbolList", Query::new()).await
    }

    /// 最新报价
    ///
    /// `ms_not_older` > 0 时，网关会等待不早于该毫秒数的报价。
    pub async fn get_quote(&self, symbol: &str, ms_not_older: u32) -> Result<Quote> {
        let query = Query::new()
            .add("symbol", symbol)
            .add_positive("msNotOlder", ms_not_older);
        self.get_json("/GetQuote", query).await
    }

    pub async fn get_quote_many(&self, symbols: &[&str], ms_not_older: u32) -> Result<Vec<Quote>> {
        let query = Query::new()
            .add_all("symbols", symbols)
            .add_positive("msNotOlder", ms_not_older);
        self.get_json("/GetQuoteMany", query).await
    }

    /// 品种参数和所属组参数
    pub async fn symbol_params(&self, symbol: &str) -> Result<SymbolParams> {
        self.get_json("/SymbolParams", Query::new().add("symbol", symbol))
            .await
    }

    /// 品种当前是否在交易时段
    pub async fn is_trade_session(&self, symbol: &str) -> Result<bool> {
        self.get_json("/IsTradeSession", Query::new().add("symbol", symbol))
            .await
    }

    /// 开仓所需保证金
    pub async fn required_margin(
        &self,
        symbol: &str,
        lots: f64,
        order_type: OrderType,
        price: f64,
    ) -> Result<f64> {
        let query = Query::new()
            .add("symbol", symbol)
            .add("lots", lots)
            .add("type", order_type)
            .add_positive("price", price);
        self.get_json("/RequiredMargin", query).await
    }

    /// K线历史
    ///
    /// `time_frame` 为分钟数 (1, 5, 15, 30, 60, 240, 1440, ...)。
    pub async fn price_history(
        &self,
        symbol: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
        time_frame: u32,
    ) -> Result<Vec<Bar>> {
        let query = Query::new()
            .add("symbol", symbol)
            .add("from", format_time(&from))
            .add("to", format_time(&to))
            .add("timeFrame", time_frame);
        self.get_json("/PriceHistory", query).await
    }

    /// 多品种 K线历史，单个品种失败时结果中的 `exception` 非空
    pub async fn price_history_many(
        &self,
        symbols: &[&str],
        from: NaiveDateTime,
        to: NaiveDateTime,
        time_frame: u32,
    ) -> Result<Vec<BarsForSymbol>> {
        let query = Query::new()
            .add_all("symbol", symbols)
            .add("from", format_time(&from))
            .add("to", format_time(&to))
            .add("timeFrame", time_frame);
        self.get_json("/PriceHistoryMany", query).await
    }

    /// 当天 K线
    pub async fn price_history_today(&self, symbol: &str, time_frame: u32) -> Result<Vec<Bar>> {
        let query = Query::new()
            .add("symbol", symbol)
            .add("timeFrame", time_frame);
        self.get_json("/PriceHistoryToday", query).await
    }

    /// 从指定日期开始一个月的 K线
    pub async fn price_history_month(
        &self,
        symbol: &str,
        year: i32,
        month: u32,
        day: u32,
        time_frame: u32,
    ) -> Result<Vec<Bar>> {
        let query = Query::new()
            .add("symbol", symbol)
            .add("year", year)
            .add("month", month)
            .add("day", day)
            .add("timeFrame", time_frame);
        self.get_json("/PriceHistoryMonth", query).await
    }

    /// 从 `from` 开始的 `num_bars` 根 K线
    pub async fn price_history_ex(
        &self,
        symbol: &str,
        from: NaiveDateTime,
        num_bars: u32,
        time_frame: u32,
    ) -> Result<Vec<Bar>> {
        let query = Query::new()
            .add("symbol", symbol)
            .add("from", format_time(&from))
            .add("numBars", num_bars)
            .add("timeFrame", time_frame);
        self.get_json("/PriceHistoryEx", query).await
    }
}
