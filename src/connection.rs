//! 推送端点的 WebSocket 连接
//!
//! 单次拨号、单次生命周期，不包含任何重连逻辑。

use crate::decoder::{self, StreamEvent};
use crate::error::{Mt5Error, Result};
use crate::protocol::Endpoint;
use crate::session::Session;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 推送连接
pub struct StreamConnection {
    endpoint: Endpoint,
    socket: WsStream,
    live: bool,
}

impl StreamConnection {
    /// 拨号
    ///
    /// 使用会话当前的 token；没有 token 时返回 `NotConnected`。
    pub async fn open(session: &Session, endpoint: Endpoint) -> Result<Self> {
        let url = session.stream_url(endpoint)?;
        tracing::debug!(
            "Dialing {}://{}{}",
            url.scheme(),
            url.host_str().unwrap_or_default(),
            url.path()
        );

        let (socket, _) = connect_async(url.as_str()).await.map_err(Mt5Error::Dial)?;
        tracing::debug!("Stream {} connected", endpoint);

        Ok(Self {
            endpoint,
            socket,
            live: true,
        })
    }

    /// 端点
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// 连接是否仍然可用
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// 读取下一个数据帧
    pub async fn read_frame(&mut self) -> Result<Vec<u8>> {
        if !self.live {
            return Err(Mt5Error::Read(WsError::AlreadyClosed));
        }
        let result = next_frame(&mut self.socket).await;
        if result.is_err() {
            self.live = false;
        }
        result
    }

    /// 读取下一个可解码为 `E` 的帧，无法解码时返回 `Mt5Error::Decode`
    pub async fn read_event<E: StreamEvent>(&mut self) -> Result<E> {
        let frame = self.read_frame().await?;
        decoder::try_decode(&frame)
    }

    /// 发送 Ping 控制帧
    pub async fn send_ping(&mut self) -> Result<()> {
        if !self.live {
            return Err(Mt5Error::Write(WsError::AlreadyClosed));
        }
        let result = self
            .socket
            .send(Message::Ping(Vec::new()))
            .await
            .map_err(Mt5Error::Write);
        if result.is_err() {
            self.live = false;
        }
        result
    }

    /// 关闭连接，可重复调用
    pub async fn close(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        if let Err(e) = self.socket.close(None).await {
            tracing::trace!("Stream {} close: {}", self.endpoint, e);
        }
    }

    /// 拆分为读端和写端，可以分别交给两个任务
    pub fn split(self) -> (FrameReader, FrameWriter) {
        let (sink, stream) = self.socket.split();
        (
            FrameReader {
                endpoint: self.endpoint,
                stream,
                live: self.live,
            },
            FrameWriter {
                endpoint: self.endpoint,
                sink,
                live: self.live,
            },
        )
    }
}

/// 连接读端
pub struct FrameReader {
    endpoint: Endpoint,
    stream: SplitStream<WsStream>,
    live: bool,
}

impl FrameReader {
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// 读取下一个数据帧
    pub async fn read_frame(&mut self) -> Result<Vec<u8>> {
        if !self.live {
            return Err(Mt5Error::Read(WsError::AlreadyClosed));
        }
        let result = next_frame(&mut self.stream).await;
        if result.is_err() {
            self.live = false;
        }
        result
    }
}

/// 连接写端 (只用于心跳和关闭)
pub struct FrameWriter {
    endpoint: Endpoint,
    sink: SplitSink<WsStream, Message>,
    live: bool,
}

impl FrameWriter {
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// 发送 Ping 控制帧
    pub async fn send_ping(&mut self) -> Result<()> {
        if !self.live {
            return Err(Mt5Error::Write(WsError::AlreadyClosed));
        }
        let result = self
            .sink
            .send(Message::Ping(Vec::new()))
            .await
            .map_err(Mt5Error::Write);
        if result.is_err() {
            self.live = false;
        }
        result
    }

    /// 发送关闭帧，可重复调用
    pub async fn close(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        if let Err(e) = self.sink.close().await {
            tracing::trace!("Stream {} close: {}", self.endpoint, e);
        }
    }
}

/// 读取下一个文本/二进制帧，Ping/Pong 由 tungstenite 处理后跳过
async fn next_frame<S>(stream: &mut S) -> Result<Vec<u8>>
where
    S: Stream<Item = std::result::Result<Message, WsError>> + Unpin,
{
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => return Ok(text.into_bytes()),
            Some(Ok(Message::Binary(data))) => return Ok(data),
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {}
            Some(Ok(Message::Close(frame))) => {
                tracing::debug!("Stream closed by peer: {:?}", frame);
                return Err(Mt5Error::ConnectionClosed);
            }
            Some(Err(e)) => return Err(Mt5Error::Read(e)),
            None => return Err(Mt5Error::ConnectionClosed),
        }
    }
}
