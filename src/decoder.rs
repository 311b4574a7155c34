//! 推送帧解码
//!
//! 网关在不同端点/版本上既可能推送裸结构体，也可能推送
//! `{"type": "...", "data": {...}}` 信封。解码按顺序尝试：
//! 1. 直接解码为期望类型，且判别字段非空
//! 2. 解码信封，type 与期望类型的标签一致时再解码 data
//!
//! 都不匹配的帧 (心跳、其他类型的推送) 直接丢弃，不算错误。

use crate::error::{Mt5Error, Result};
use crate::protocol::EventKind;
use crate::types::{
    from_gateway_slice, from_gateway_value, MailMessage, MarketWatch, OhlcSubscription,
    OrderUpdateSummary, ProfitUpdate, Quote, SymbolTickValue, TickHistoryEventArgs,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// 可以通过订阅循环接收的事件类型
pub trait StreamEvent: DeserializeOwned + Send + 'static {
    /// 事件种类 (决定端点和信封标签)
    const KIND: EventKind;

    /// 判别字段是否有值
    ///
    /// 所有字段都有默认值，任何 JSON 对象都能解码成功，
    /// 因此直接解码必须再检查判别字段。
    fn is_populated(&self) -> bool;

    /// 转换为统一事件
    fn into_event(self) -> SubscriptionEvent;
}

/// 统一的订阅事件
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent {
    Quote(Quote),
    OrderUpdate(OrderUpdateSummary),
    ProfitUpdate(ProfitUpdate),
    Ohlc(OhlcSubscription),
    MarketWatch(MarketWatch),
    TickHistory(TickHistoryEventArgs),
    TickValue(SymbolTickValue),
    Mail(MailMessage),
}

impl SubscriptionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SubscriptionEvent::Quote(_) => EventKind::Quote,
            SubscriptionEvent::OrderUpdate(_) => EventKind::OrderUpdate,
            SubscriptionEvent::ProfitUpdate(_) => EventKind::ProfitUpdate,
            SubscriptionEvent::Ohlc(_) => EventKind::Ohlc,
            SubscriptionEvent::MarketWatch(_) => EventKind::MarketWatch,
            SubscriptionEvent::TickHistory(_) => EventKind::TickHistory,
            SubscriptionEvent::TickValue(_) => EventKind::TickValue,
            SubscriptionEvent::Mail(_) => EventKind::Mail,
        }
    }
}

macro_rules! stream_event {
    ($ty:ty, $kind:ident, |$this:ident| $populated:expr) => {
        impl StreamEvent for $ty {
            const KIND: EventKind = EventKind::$kind;

            fn is_populated(&self) -> bool {
                let $this = self;
                $populated
            }

            fn into_event(self) -> SubscriptionEvent {
                SubscriptionEvent::$kind(self)
            }
        }
    };
}

stream_event!(Quote, Quote, |q| !q.symbol.is_empty());
stream_event!(OrderUpdateSummary, OrderUpdate, |s| s.user != 0);
stream_event!(ProfitUpdate, ProfitUpdate, |p| p.user != 0);
stream_event!(OhlcSubscription, Ohlc, |o| !o.symbol.is_empty());
stream_event!(MarketWatch, MarketWatch, |m| !m.symbol.is_empty());
stream_event!(TickHistoryEventArgs, TickHistory, |t| !t.symbol.is_empty());
stream_event!(SymbolTickValue, TickValue, |t| !t.symbol.is_empty());
stream_event!(MailMessage, Mail, |m| m.id != 0);

/// 信封
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// 单个解码策略
type Strategy<E> = fn(&[u8]) -> Option<E>;

fn decode_bare<E: StreamEvent>(raw: &[u8]) -> Option<E> {
    from_gateway_slice::<E>(raw)
        .ok()
        .filter(|event| event.is_populated())
}

fn decode_enveloped<E: StreamEvent>(raw: &[u8]) -> Option<E> {
    let envelope: Envelope = serde_json::from_slice(raw).ok()?;
    if envelope.kind != E::KIND.label() {
        return None;
    }
    from_gateway_value(envelope.data?).ok()
}

/// 按顺序尝试所有策略，返回第一个成功的结果
///
/// 返回 `None` 表示该帧应被丢弃。
pub fn decode<E: StreamEvent>(raw: &[u8]) -> Option<E> {
    let strategies: [Strategy<E>; 2] = [decode_bare::<E>, decode_enveloped::<E>];
    strategies.iter().find_map(|strategy| strategy(raw))
}

/// 同 [`decode`]，失败时返回 `Mt5Error::Decode`
pub fn try_decode<E: StreamEvent>(raw: &[u8]) -> Result<E> {
    decode(raw).ok_or_else(|| {
        Mt5Error::Decode(format!(
            "frame is not a {} event: {}",
            E::KIND.label(),
            preview(raw)
        ))
    })
}

/// 按事件种类动态解码
pub fn decode_event(raw: &[u8], kind: EventKind) -> Option<SubscriptionEvent> {
    match kind {
        EventKind::Quote => decode::<Quote>(raw).map(StreamEvent::into_event),
        EventKind::OrderUpdate => decode::<OrderUpdateSummary>(raw).map(StreamEvent::into_event),
        EventKind::ProfitUpdate => decode::<ProfitUpdate>(raw).map(StreamEvent::into_event),
        EventKind::Ohlc => decode::<OhlcSubscription>(raw).map(StreamEvent::into_event),
        EventKind::TickHistory => decode::<TickHistoryEventArgs>(raw).map(StreamEvent::into_event),
        EventKind::MarketWatch => decode::<MarketWatch>(raw).map(StreamEvent::into_event),
        EventKind::TickValue => decode::<SymbolTickValue>(raw).map(StreamEvent::into_event),
        EventKind::Mail => decode::<MailMessage>(raw).map(StreamEvent::into_event),
    }
}

/// 截断的帧内容 (日志用)
pub(crate) fn preview(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let mut out: String = text.chars().take(120).collect();
    if text.chars().count() > 120 {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE_QUOTE: &str =
        r#"{"symbol":"EURUSD","bid":1.1000,"ask":1.1002,"timestampUTC":1700000000000}"#;
    const ENVELOPED_QUOTE: &str = r#"{"type":"Quote","data":{"symbol":"EURUSD","bid":1.1000,"ask":1.1002,"timestampUTC":1700000000000}}"#;

    #[test]
    fn test_bare_quote() {
        let quote: Quote = decode(BARE_QUOTE.as_bytes()).unwrap();
        assert_eq!(quote.symbol, "EURUSD");
        assert_eq!(quote.bid, 1.1000);
        assert_eq!(quote.ask, 1.1002);
    }

    #[test]
    fn test_enveloped_quote_matches_bare() {
        let bare: Quote = decode(BARE_QUOTE.as_bytes()).unwrap();
        let enveloped: Quote = decode(ENVELOPED_QUOTE.as_bytes()).unwrap();
        assert_eq!(bare, enveloped);
    }

    #[test]
    fn test_heartbeat_frame_dropped() {
        assert!(decode::<Quote>(br#"{"type":"Heartbeat"}"#).is_none());
        for kind in EventKind::ALL {
            assert!(decode_event(br#"{"type":"Heartbeat"}"#, kind).is_none());
        }
    }

    #[test]
    fn test_wrong_envelope_label_dropped() {
        let frame = br#"{"type":"Ohlc","data":{"symbol":"EURUSD","open":1.0}}"#;
        assert!(decode::<Quote>(frame).is_none());
        let ohlc: OhlcSubscription = decode(frame).unwrap();
        assert_eq!(ohlc.symbol, "EURUSD");
    }

    #[test]
    fn test_empty_symbol_not_accepted_bare() {
        assert!(decode::<Quote>(br#"{"symbol":"","bid":1.0}"#).is_none());
    }

    #[test]
    fn test_non_json_dropped() {
        assert!(decode::<Quote>(b"pong").is_none());
        assert!(decode::<MarketWatch>(b"").is_none());
        assert!(decode::<Quote>(br#"["EURUSD"]"#).is_none());
    }

    #[test]
    fn test_decode_is_idempotent() {
        let frames: [&[u8]; 3] = [
            BARE_QUOTE.as_bytes(),
            ENVELOPED_QUOTE.as_bytes(),
            br#"{"type":"Heartbeat"}"#,
        ];
        for frame in frames {
            assert_eq!(
                decode_event(frame, EventKind::Quote),
                decode_event(frame, EventKind::Quote)
            );
        }
    }

    #[test]
    fn test_order_update_needs_user() {
        let bare = br#"{"user":555,"balance":1000.0,"update":{"type":"MarketOpen"}}"#;
        let summary: OrderUpdateSummary = decode(bare).unwrap();
        assert_eq!(summary.user, 555);

        let enveloped = br#"{"type":"OrderUpdate","data":{"user":555,"balance":1000.0,"update":{"type":"MarketOpen"}}}"#;
        assert_eq!(decode::<OrderUpdateSummary>(enveloped), Some(summary));

        assert!(decode::<OrderUpdateSummary>(br#"{"type":"Quote","data":{}}"#).is_none());
    }

    #[test]
    fn test_null_fields_still_delivered() {
        let quote: Quote = decode(
            br#"{"symbol":"EURUSD","bid":1.1,"ask":1.1002,"timestampUTC":1700000000000,"last":null}"#,
        )
        .unwrap();
        assert_eq!(quote.symbol, "EURUSD");
        assert_eq!(quote.last, 0.0);

        let summary: OrderUpdateSummary = decode(
            br#"{"user":555,"openedOrders":null,"balance":1000.0,"update":{"type":"MarketOpen","order":{"ticket":5,"comment":null}}}"#,
        )
        .unwrap();
        assert_eq!(summary.user, 555);
        assert!(summary.opened_orders.is_empty());
        assert_eq!(summary.update.order.ticket, 5);

        let mail: MailMessage = decode(br#"{"id":9,"body":null}"#).unwrap();
        assert_eq!(mail.id, 9);
        assert_eq!(mail.body, "");
    }

    #[test]
    fn test_null_fields_in_envelope() {
        let frame = br#"{"type":"Mail","data":{"id":4,"subject":"Hi","from":null}}"#;
        let mail: MailMessage = decode(frame).unwrap();
        assert_eq!(mail.subject, "Hi");
        assert_eq!(mail.from, "");

        // 判别字段为 null 仍然丢弃
        assert!(decode::<Quote>(br#"{"symbol":null,"bid":1.0}"#).is_none());
    }

    #[test]
    fn test_decode_event_kind() {
        let event = decode_event(br#"{"id":9,"subject":"Welcome"}"#, EventKind::Mail).unwrap();
        assert_eq!(event.kind(), EventKind::Mail);
        match event {
            SubscriptionEvent::Mail(mail) => assert_eq!(mail.subject, "Welcome"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_try_decode_error() {
        let err = try_decode::<ProfitUpdate>(br#"{"type":"Heartbeat"}"#).unwrap_err();
        assert!(matches!(err, Mt5Error::Decode(_)));
    }
}
