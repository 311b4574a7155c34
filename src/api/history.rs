//! 订单历史

use super::{format_time, Mt5Api, Query};
use crate::error::Result;
use crate::protocol::SortType;
use crate::types::{DealInternal, Order, OrderHistoryEventArgs, PaginationReply};
use chrono::NaiveDateTime;

/// 分页查询订单历史
#[derive(Debug, Clone)]
pub struct OrderHistoryPageRequest {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
    pub orders_per_page: u32,
    /// 页码 (从 1 开始)
    pub page_number: u32,
    /// 忽略网关缓存重新拉取
    pub request_again: bool,
    pub sort: Option<SortType>,
    pub ascending: bool,
    /// 只返回这些订单号
    pub tickets: Vec<i64>,
    pub ignore_deposit_withdraw: bool,
}

impl OrderHistoryPageRequest {
    pub fn new(from: NaiveDateTime, to: NaiveDateTime, orders_per_page: u32, page_number: u32) -> Self {
        Self {
            from,
            to,
            orders_per_page,
            page_number,
            request_again: false,
            sort: None,
            ascending: true,
            tickets: Vec::new(),
            ignore_deposit_withdraw: false,
        }
    }

    fn query(&self) -> Query {
        Query::new()
            .add("from", format_time(&self.from))
            .add("to", format_time(&self.to))
            .add("ordersPerPage", self.orders_per_page)
            .add("pageNumber", self.page_number)
            .add("requestAgain", self.request_again)
            .add_opt("sort", self.sort)
            .add("ascending", self.ascending)
            .add_all("tickets", &self.tickets)
            .add("ignoreDepositWithdraw", self.ignore_deposit_withdraw)
    }
}

impl Mt5Api {
    /// 时间段内的订单历史
    ///
    /// `filter` 为空时返回全部品种。
    pub async fn order_history(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        sort: Option<SortType>,
        ascending: bool,
        filter: &[&str],
    ) -> Result<OrderHistoryEventArgs> {
        let query = Query::new()
            .add("from", format_time(&from))
            .add("to", format_time(&to))
            .add_opt("sort", sort)
            .add("ascending", ascending)
            .add_all("filter", filter);
        self.get_json("/OrderHistory", query).await
    }

    /// 分页订单历史
    pub async fn order_history_pagination(
        &self,
        request: &OrderHistoryPageRequest,
    ) -> Result<PaginationReply> {
        self.get_json("/OrderHistoryPagination", request.query())
            .await
    }

    /// 某个持仓的全部成交
    pub async fn history_deals_by_position_id(&self, ticket: i64) -> Result<Vec<DealInternal>> {
        self.get_json(
            "/HistoryDealsByPositionId",
            Query::new().add("ticket", ticket),
        )
        .await
    }

    /// 按订单号查询已平仓持仓
    pub async fn history_positions(&self, tickets: &[i64]) -> Result<Vec<Order>> {
        self.get_json("/HistoryPositions", Query::new().add_all("tickets", tickets))
            .await
    }

    /// 按平仓时间查询已平仓持仓
    pub async fn history_positions_by_close_time(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Order>> {
        let query = Query::new()
            .add("from", format_time(&from))
            .add("to", format_time(&to));
        self.get_json("/HistoryPositionsByCloseTime", query).await
    }

    /// 登录后网关是否已经下载完订单历史
    pub async fn order_history_download_complete(&self) -> Result<bool> {
        self.get_json("/OrderHistoryDownloadComplete", Query::new())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_pagination_query() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let mut request = OrderHistoryPageRequest::new(from, to, 50, 2);
        request.tickets = vec![11, 12];
        request.sort = Some(SortType::CloseTime);

        let query = request.query();
        let pairs: Vec<(&str, &str)> = query
            .pairs()
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("from", "2024-01-01T00:00:00"),
                ("to", "2024-02-01T12:30:00"),
                ("ordersPerPage", "50"),
                ("pageNumber", "2"),
                ("requestAgain", "false"),
                ("sort", "CloseTime"),
                ("ascending", "true"),
                ("tickets", "11"),
                ("tickets", "12"),
                ("ignoreDepositWithdraw", "false"),
            ]
        );
    }
}
