#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::Arc;

use chat_api::{ChatApiError, ChatRequest, ChatResponse, StatusCode};
use chat_session::{ChatSession, ChatTransport, SessionConfig};
use futures_util::future::{self, LocalBoxFuture};
use futures_util::stream::{self, StreamExt};
use futures_util::FutureExt;
use streamchat::{GfmConverter, IncrementalRenderer, MarkdownCapability, ViewConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

/// One step of a scripted response body.
#[derive(Clone)]
pub enum BodyStep {
    Chunk(Vec<u8>),
    /// Block the body until the notify fires.
    Gate(Arc<Notify>),
    Fail(String),
}

pub fn chunk(text: &str) -> BodyStep {
    BodyStep::Chunk(text.as_bytes().to_vec())
}

pub fn frame(payload: &str) -> BodyStep {
    BodyStep::Chunk(format!("data: {payload}\n\n").into_bytes())
}

#[derive(Clone)]
pub enum Scripted {
    Complete(String),
    Stream(Vec<BodyStep>),
    Status(u16, String),
}

/// In-memory transport replaying scripted responses in order.
#[derive(Default)]
pub struct FakeTransport {
    script: RefCell<VecDeque<Scripted>>,
    requests: RefCell<Vec<ChatRequest>>,
}

impl FakeTransport {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl ChatTransport for FakeTransport {
    fn send<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> LocalBoxFuture<'a, Result<ChatResponse, ChatApiError>> {
        self.requests.borrow_mut().push(request.clone());
        let next = self.script.borrow_mut().pop_front();
        let response = match next {
            Some(Scripted::Complete(body)) => Ok(ChatResponse::Complete(body)),
            Some(Scripted::Stream(steps)) => Ok(ChatResponse::Stream(body_stream(steps))),
            Some(Scripted::Status(code, message)) => Err(ChatApiError::Status(
                StatusCode::from_u16(code).expect("valid scripted status"),
                message,
            )),
            None => Err(ChatApiError::Stream("script exhausted".to_string())),
        };
        future::ready(response).boxed_local()
    }
}

fn body_stream(steps: Vec<BodyStep>) -> chat_api::ByteStream {
    stream::unfold(VecDeque::from(steps), |mut steps| async move {
        loop {
            match steps.pop_front()? {
                BodyStep::Chunk(bytes) => return Some((Ok(bytes), steps)),
                BodyStep::Gate(gate) => gate.notified().await,
                BodyStep::Fail(message) => {
                    steps.clear();
                    return Some((Err(ChatApiError::Stream(message)), steps));
                }
            }
        }
    })
    .boxed()
}

pub fn markdown_session<T: ChatTransport>(transport: T) -> ChatSession<T> {
    ChatSession::new(
        transport,
        IncrementalRenderer::new(MarkdownCapability::ready(GfmConverter), ViewConfig::default()),
        SessionConfig::default(),
    )
}

/// Minimal HTTP/1.1 server answering each connection with the next script.
pub struct HttpScript {
    pub base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

pub struct HttpReply {
    pub status: u16,
    pub content_type: &'static str,
    pub chunks: Vec<Vec<u8>>,
}

impl HttpScript {
    pub async fn start(replies: Vec<HttpReply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("local TCP listener should bind");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));

        let handle = tokio::spawn(async move {
            let mut replies = VecDeque::from(replies);
            while let Ok((socket, _)) = listener.accept().await {
                let Some(reply) = replies.pop_front() else {
                    break;
                };
                serve(socket, reply).await;
            }
        });

        Self { base_url, handle }
    }

    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

async fn serve(mut socket: TcpStream, reply: HttpReply) {
    if read_request(&mut socket).await.is_err() {
        return;
    }

    let head = format!(
        "HTTP/1.1 {} Scripted\r\nContent-Type: {}\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
        reply.status, reply.content_type
    );
    if socket.write_all(head.as_bytes()).await.is_err() {
        return;
    }
    for bytes in reply.chunks {
        let prefix = format!("{:X}\r\n", bytes.len());
        if socket.write_all(prefix.as_bytes()).await.is_err()
            || socket.write_all(&bytes).await.is_err()
            || socket.write_all(b"\r\n").await.is_err()
        {
            return;
        }
        let _ = socket.flush().await;
    }
    let _ = socket.write_all(b"0\r\n\r\n").await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buffer = [0_u8; 2048];

    let header_end = loop {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buffer[..n]);
        if let Some(position) = request.windows(4).position(|window| window == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let head = String::from_utf8_lossy(&request[..header_end]).to_ascii_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while request.len() < header_end + content_length {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        request.extend_from_slice(&buffer[..n]);
    }
    Ok(())
}
