use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use vsplit_models::EncodingOptions;

use crate::backend::MediaBackend;
use crate::command::ExitOutcome;
use crate::download::SourceFetcher;
use crate::error::{MediaError, MediaResult};

#[derive(Debug, Clone)]
enum Behavior {
    Fail(String),
    Unavailable,
    TimedOut,
    Hang,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodeCall {
    pub start_secs: f64,
    pub end_secs: f64,
    pub output: PathBuf,
}

/// Backend that writes a small file per successful encode.
pub struct FakeBackend {
    duration: Option<f64>,
    behaviors: HashMap<usize, Behavior>,
    calls: Mutex<Vec<EncodeCall>>,
}

impl FakeBackend {
    pub fn new(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            behaviors: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Probe fails, as if ffprobe printed nothing usable.
    pub fn without_duration() -> Self {
        Self {
            duration: None,
            ..Self::new(0.0)
        }
    }

    /// Segment at 0-based `ordinal` exits non-zero with `stderr`.
    pub fn failing_on(mut self, ordinal: usize, stderr: &str) -> Self {
        self.behaviors.insert(ordinal, Behavior::Fail(stderr.to_string()));
        self
    }

    /// Segment at `ordinal` cannot even start the tool.
    pub fn unavailable_on(mut self, ordinal: usize) -> Self {
        self.behaviors.insert(ordinal, Behavior::Unavailable);
        self
    }

    /// Segment at `ordinal` is killed by the encode timeout after writing a partial file.
    pub fn timing_out_on(mut self, ordinal: usize) -> Self {
        self.behaviors.insert(ordinal, Behavior::TimedOut);
        self
    }

    /// Segment at `ordinal` never finishes.
    pub fn hanging_on(mut self, ordinal: usize) -> Self {
        self.behaviors.insert(ordinal, Behavior::Hang);
        self
    }

    pub fn calls(&self) -> Vec<EncodeCall> {
        self.calls.lock().unwrap().clone()
    }

    fn ordinal_of(output: &Path) -> Option<usize> {
        let stem = output.file_stem()?.to_str()?;
        let number: usize = stem.rsplit_once("_split_")?.1.parse().ok()?;
        number.checked_sub(1)
    }
}

#[async_trait]
impl MediaBackend for FakeBackend {
    fn tool_name(&self) -> &str {
        "FFmpeg"
    }

    async fn probe_duration(&self, _path: &Path) -> MediaResult<f64> {
        self.duration
            .ok_or_else(|| MediaError::InvalidDuration(String::new()))
    }

    async fn encode_range(
        &self,
        _input: &Path,
        start_secs: f64,
        end_secs: f64,
        _options: &EncodingOptions,
        output: &Path,
    ) -> MediaResult<ExitOutcome> {
        self.calls.lock().unwrap().push(EncodeCall {
            start_secs,
            end_secs,
            output: output.to_path_buf(),
        });

        let behavior = Self::ordinal_of(output).and_then(|o| self.behaviors.get(&o).cloned());
        match behavior {
            Some(Behavior::Fail(stderr)) => {
                // ffmpeg leaves a truncated file behind on failure
                tokio::fs::write(output, b"partial").await?;
                Ok(ExitOutcome::failure(1, stderr))
            }
            Some(Behavior::Unavailable) => Err(MediaError::FfmpegNotFound),
            Some(Behavior::TimedOut) => {
                tokio::fs::write(output, b"partial").await?;
                Err(MediaError::Timeout(5))
            }
            Some(Behavior::Hang) => {
                tokio::fs::write(output, b"partial").await?;
                std::future::pending::<MediaResult<ExitOutcome>>().await
            }
            None => {
                tokio::fs::write(output, b"segment").await?;
                Ok(ExitOutcome::success())
            }
        }
    }
}

/// Fetcher that writes a fixed payload, or fails.
pub struct FakeFetcher {
    extension: &'static str,
    fail: bool,
}

impl FakeFetcher {
    pub fn new(extension: &'static str) -> Self {
        Self {
            extension,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            extension: ".mp4",
            fail: true,
        }
    }
}

#[async_trait]
impl SourceFetcher for FakeFetcher {
    async fn fetch(&self, reference: &str, destination_prefix: &Path) -> MediaResult<PathBuf> {
        if self.fail {
            return Err(MediaError::download_failed(format!("{} returned HTTP 404", reference)));
        }
        let mut name = destination_prefix.as_os_str().to_os_string();
        name.push(self.extension);
        let path = PathBuf::from(name);
        tokio::fs::write(&path, b"source").await?;
        Ok(path)
    }
}

/// HTTP server that announces a large body, sends `sent` bytes of it and then
/// stalls with the connection held open. Returns the base URL.
pub async fn stalling_server(sent: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = [0u8; 2048];
                let _ = socket.read(&mut request).await;
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: {}\r\n\r\n",
                    sent * 256
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&vec![0u8; sent]).await;
                let _ = socket.flush().await;
                tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            });
        }
    });

    format!("http://{}", addr)
}
