//! MT5 报价推送演示 - 登录、订阅报价、打印推送
//!
//! 用法:
//! ```bash
//! MT5_API_URL=http://localhost:5000 \
//!     cargo run --example quote_stream -- <user> <password> <host> <port> [symbol...]
//! ```

use mt5_client::{ConnectRequest, EventKind, Mt5Client, SubscriptionEvent};
use std::env;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mt5_client=info,quote_stream=info")),
        )
        .init();

    // 解析命令行参数
    let args: Vec<String> = env::args().collect();
    if args.len() < 5 {
        eprintln!("用法: {} <user> <password> <host> <port> [symbol...]", args[0]);
        std::process::exit(1);
    }

    let user: i64 = args[1].parse()?;
    let port: u16 = args[4].parse()?;
    let symbols: Vec<&str> = if args.len() > 5 {
        args[5..].iter().map(String::as_str).collect()
    } else {
        vec!["EURUSD"]
    };

    let client = Mt5Client::from_env()?;
    let request = ConnectRequest::new(user, &args[2], &args[3], port);
    client.api().connect(&request).await?;
    println!("[OK] 登录成功");

    let summary = client.api().account_summary().await?;
    println!(
        "余额: {:.2} {}  净值: {:.2}  可用保证金: {:.2}",
        summary.balance, summary.currency, summary.equity, summary.free_margin
    );

    client.api().subscribe_many(&symbols, 0).await?;
    let (quotes, mut events) = client.subscribe_events(EventKind::Quote);
    let profit = client.on_order_profit(|update| {
        println!("[盈亏] {:.2}  净值 {:.2}", update.profit, update.equity);
    });

    println!("等待推送 (Ctrl+C 退出)...");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Some(SubscriptionEvent::Quote(quote)) => println!(
                    "[报价] {} {} / {} (点差 {:.5})",
                    quote.symbol,
                    quote.bid,
                    quote.ask,
                    quote.spread()
                ),
                Some(_) => {}
                None => break,
            },
        }
    }

    println!(
        "收到 {} 条报价，丢弃 {} 帧，连接 {} 次",
        quotes.stats().delivered(),
        quotes.stats().dropped_frames(),
        quotes.stats().connects()
    );

    quotes.stop().await;
    profit.stop().await;

    let _ = tokio::time::timeout(Duration::from_secs(5), client.api().unsubscribe_many(&symbols)).await;
    client.api().disconnect().await?;
    println!("[OK] 已登出");
    Ok(())
}
