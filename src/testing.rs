//! Scripted fakes for the capability traits.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, Rgba, RgbaImage};
use reqwest::StatusCode;

use crate::auth::Token;
use crate::display::Display;
use crate::error::{FrameError, Result};
use crate::ports::{FeedProvider, HttpReply, ImageFetcher, NowPlayingProvider, TokenProvider};

pub fn solid_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255])))
}

/// Issues `token-1`, `token-2`, ... and can be told to fail the first exchanges.
#[derive(Default)]
pub struct FakeTokenProvider {
    calls: AtomicUsize,
    fail_first: usize,
}

impl FakeTokenProvider {
    pub fn failing_first(count: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_first: count,
        }
    }

    pub fn exchanges(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TokenProvider for FakeTokenProvider {
    async fn exchange(&self) -> Result<Token> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.fail_first {
            return Err(FrameError::Auth("token endpoint returned 400".into()));
        }
        Ok(Token::new(format!("token-{n}")))
    }
}

/// Replays queued replies; answers 204 once the queue is drained.
#[derive(Default)]
pub struct FakePlayer {
    replies: Mutex<VecDeque<HttpReply>>,
    bearers: Mutex<Vec<String>>,
}

impl FakePlayer {
    pub fn with_replies(replies: impl IntoIterator<Item = HttpReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            bearers: Mutex::new(Vec::new()),
        }
    }

    pub fn bearers(&self) -> Vec<String> {
        self.bearers.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl NowPlayingProvider for FakePlayer {
    async fn currently_playing(&self, bearer: &str) -> Result<HttpReply> {
        self.bearers.lock().unwrap().push(bearer.to_string());
        let reply = self.replies.lock().unwrap().pop_front();
        Ok(reply.unwrap_or_else(|| HttpReply::new(StatusCode::NO_CONTENT, "")))
    }
}

/// Replays queued feed pages and records each pagination token requested.
#[derive(Default)]
pub struct FakeFeed {
    pages: Mutex<VecDeque<HttpReply>>,
    requested: Mutex<Vec<Option<String>>>,
}

impl FakeFeed {
    pub fn with_pages(pages: impl IntoIterator<Item = HttpReply>) -> Self {
        Self {
            pages: Mutex::new(pages.into_iter().collect()),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<Option<String>> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FeedProvider for FakeFeed {
    async fn liked_page(&self, pagination_token: Option<&str>) -> Result<HttpReply> {
        self.requested
            .lock()
            .unwrap()
            .push(pagination_token.map(str::to_string));
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| FrameError::Provider {
                status: 500,
                body: "no scripted page".into(),
            })
    }
}

/// Returns a small image for any URL except those marked as failing.
#[derive(Default)]
pub struct FakeFetcher {
    failing: HashSet<String>,
    fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn failing_on(urls: &[&str]) -> Self {
        Self {
            failing: urls.iter().map(|u| u.to_string()).collect(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ImageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<DynamicImage> {
        self.fetched.lock().unwrap().push(url.to_string());
        if self.failing.contains(url) {
            return Err(FrameError::Fetch(format!("{url}: connection reset")));
        }
        Ok(solid_image(4, 4))
    }
}

#[derive(Debug, Default)]
pub struct DisplayLog {
    pub updates: Vec<(u32, u32)>,
    pub cleaned_up: bool,
}

/// Records every push; the log is shared so tests can inspect it after the
/// display has been moved into an orchestrator.
#[derive(Default, Clone)]
pub struct RecordingDisplay {
    pub log: Arc<Mutex<DisplayLog>>,
}

impl RecordingDisplay {
    pub fn updates(&self) -> usize {
        self.log.lock().unwrap().updates.len()
    }

    pub fn cleaned_up(&self) -> bool {
        self.log.lock().unwrap().cleaned_up
    }
}

impl Display for RecordingDisplay {
    fn update(&mut self, image: &DynamicImage) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .updates
            .push((image.width(), image.height()));
        Ok(())
    }

    fn cleanup(&mut self) {
        self.log.lock().unwrap().cleaned_up = true;
    }
}

/// One canned HTTP/1.1 reply served from a loopback socket.
pub struct StubServer {
    pub base_url: String,
    request: tokio::task::JoinHandle<String>,
}

impl StubServer {
    /// Accept a single connection, answer it with `status`, `content_type`
    /// and `body`, then close.
    pub async fn reply(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let body = body.into();
        let head = format!(
            "HTTP/1.1 {status} Stub\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );

        let request = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if let Some(end) = find_header_end(&raw) {
                    if raw.len() >= end + content_length(&raw[..end]) {
                        break;
                    }
                }
            }
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&raw).into_owned()
        });

        Self { base_url, request }
    }

    /// The raw request the stub received.
    pub async fn request(self) -> String {
        self.request.await.unwrap()
    }
}

fn find_header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

fn content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())
                .flatten()
        })
        .unwrap_or(0)
}

/// Encode a small PNG for transport tests.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    solid_image(width, height)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// A client that talks to loopback stubs directly, ignoring proxy variables.
pub fn local_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
