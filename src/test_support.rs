// src/test_support.rs
// Shared fixtures for unit and route tests.
use crate::errors::RestyleError;
use crate::models::{GeneratedImage, SourceImage};
use crate::services::{ImageProcessor, Restyler};
use crate::session::Session;
use crate::style::StyleOptions;
use async_trait::async_trait;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let buffer = ImageBuffer::from_pixel(width, height, Rgb([200u8, 120, 40]));
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(buffer)
        .write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

pub fn png_file(name: &str) -> SourceImage {
    SourceImage::new(name, "image/png", png_bytes(4, 4))
}

/// Scripted restyler. Replies are popped in order; an empty script yields a
/// fixed PNG. With a gate, each call waits for a permit before replying.
pub struct StubRestyler {
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, StyleOptions)>>,
    replies: Mutex<VecDeque<Result<GeneratedImage, RestyleError>>>,
    gate: Option<Arc<Semaphore>>,
    pub started: Notify,
}

impl StubRestyler {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            gate: None,
            started: Notify::new(),
        }
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn reply(self, reply: Result<GeneratedImage, RestyleError>) -> Self {
        self.replies.lock().push_back(reply);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<(String, StyleOptions)> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl Restyler for StubRestyler {
    async fn restyle(
        &self,
        image: &SourceImage,
        options: &StyleOptions,
    ) -> Result<GeneratedImage, RestyleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .push((image.file_name.clone(), options.clone()));
        self.started.notify_one();

        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.unwrap();
            permit.forget();
        }

        let reply = self.replies.lock().pop_front();
        reply.unwrap_or_else(|| {
            Ok(GeneratedImage::from_bytes(
                png_bytes(2, 2),
                "image/png",
                "stub",
            ))
        })
    }

    fn name(&self) -> &str {
        "stub"
    }
}

pub fn session_with(restyler: Arc<StubRestyler>) -> Arc<Session> {
    Arc::new(Session::new(restyler, Arc::new(ImageProcessor::new(512))))
}

/// Polls `done` until it holds, failing the test after two seconds.
pub async fn wait_until(mut done: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !done() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
