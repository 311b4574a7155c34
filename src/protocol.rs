//! MT5 网关协议常量和枚举

use serde::{Deserialize, Serialize};
use std::fmt;

/// 推送端点 (路径必须与网关完全一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Quote,
    OrderUpdate,
    OrderProfit,
    Ohlc,
    TickHistory,
    MarketWatch,
    OrderBook,
    TickValue,
    Mail,
}

impl Endpoint {
    /// 全部推送端点
    pub const ALL: [Endpoint; 9] = [
        Endpoint::Quote,
        Endpoint::OrderUpdate,
        Endpoint::OrderProfit,
        Endpoint::Ohlc,
        Endpoint::TickHistory,
        Endpoint::MarketWatch,
        Endpoint::OrderBook,
        Endpoint::TickValue,
        Endpoint::Mail,
    ];

    /// WebSocket 路径
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Quote => "/OnQuote",
            Endpoint::OrderUpdate => "/OnOrderUpdate",
            Endpoint::OrderProfit => "/OnOrderProfit",
            Endpoint::Ohlc => "/OnOhlc",
            Endpoint::TickHistory => "/OnTickHistory",
            Endpoint::MarketWatch => "/OnMarketWatch",
            Endpoint::OrderBook => "/OnOrderBook",
            Endpoint::TickValue => "/OnTickValue",
            Endpoint::Mail => "/OnMail",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// 订阅事件种类 (每种对应一个独立的订阅循环)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Quote,
    OrderUpdate,
    ProfitUpdate,
    Ohlc,
    TickHistory,
    MarketWatch,
    TickValue,
    Mail,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Quote,
        EventKind::OrderUpdate,
        EventKind::ProfitUpdate,
        EventKind::Ohlc,
        EventKind::TickHistory,
        EventKind::MarketWatch,
        EventKind::TickValue,
        EventKind::Mail,
    ];

    /// 信封 `{"type": ..., "data": ...}` 中的 type 值
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Quote => "Quote",
            EventKind::OrderUpdate => "OrderUpdate",
            EventKind::ProfitUpdate => "ProfitUpdate",
            EventKind::Ohlc => "Ohlc",
            EventKind::TickHistory => "TickHistory",
            EventKind::MarketWatch => "MarketWatch",
            EventKind::TickValue => "TickValue",
            EventKind::Mail => "Mail",
        }
    }

    /// 该事件所在的推送端点
    pub fn endpoint(&self) -> Endpoint {
        match self {
            EventKind::Quote => Endpoint::Quote,
            EventKind::OrderUpdate => Endpoint::OrderUpdate,
            EventKind::ProfitUpdate => Endpoint::OrderProfit,
            EventKind::Ohlc => Endpoint::Ohlc,
            EventKind::TickHistory => Endpoint::TickHistory,
            EventKind::MarketWatch => Endpoint::MarketWatch,
            EventKind::TickValue => Endpoint::TickValue,
            EventKind::Mail => Endpoint::Mail,
        }
    }
}

/// 定义网关的字符串枚举，未知取值解码为 `Unknown`
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
            #[default]
            #[serde(other)]
            Unknown,
        }

        impl $name {
            /// 网关使用的字符串
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Unknown => "",
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum!(
    /// 订单类型
    OrderType {
        Buy => "Buy",
        Sell => "Sell",
        BuyLimit => "BuyLimit",
        SellLimit => "SellLimit",
        BuyStop => "BuyStop",
        SellStop => "SellStop",
        BuyStopLimit => "BuyStopLimit",
        SellStopLimit => "SellStopLimit",
        CloseBy => "CloseBy",
        Balance => "Balance",
        Credit => "Credit",
    }
);

impl OrderType {
    /// 是否为挂单
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            OrderType::BuyLimit
                | OrderType::SellLimit
                | OrderType::BuyStop
                | OrderType::SellStop
                | OrderType::BuyStopLimit
                | OrderType::SellStopLimit
        )
    }
}

wire_enum!(
    /// 订单状态
    OrderState {
        Started => "Started",
        Placed => "Placed",
        Cancelled => "Cancelled",
        Partial => "Partial",
        Filled => "Filled",
        Rejected => "Rejected",
        Expired => "Expired",
        RequestAdding => "RequestAdding",
        RequestModifying => "RequestModifying",
        RequestCancelling => "RequestCancelling",
    }
);

wire_enum!(
    /// 下单来源
    PlacedType {
        Manually => "Manually",
        ByExpert => "ByExpert",
        ByDealer => "ByDealer",
        OnSl => "OnSL",
        OnTp => "OnTP",
        OnStopOut => "OnStopOut",
        OnRollover => "OnRollover",
        OnVmargin => "OnVmargin",
        Gateway => "Gateway",
        Signal => "Signal",
        Settlement => "Settlement",
        Transfer => "Transfer",
        Sync => "Sync",
        ExternalService => "ExternalService",
        Migration => "Migration",
        Mobile => "Mobile",
        Web => "Web",
        OnSplit => "OnSplit",
        Default => "Default",
    }
);

wire_enum!(
    /// 挂单过期方式
    ExpirationType {
        Gtc => "GTC",
        Today => "Today",
        Specified => "Specified",
        SpecifiedDay => "SpecifiedDay",
    }
);

wire_enum!(
    /// 账户持仓模式
    AccountMethod {
        Default => "Default",
        Netting => "Netting",
        Hedging => "Hedging",
    }
);

wire_enum!(
    /// 代理类型
    ProxyType {
        None => "None",
        Https => "Https",
        Socks4 => "Socks4",
        Socks5 => "Socks5",
    }
);

wire_enum!(
    /// 排序字段
    SortType {
        OpenTime => "OpenTime",
        CloseTime => "CloseTime",
    }
);
