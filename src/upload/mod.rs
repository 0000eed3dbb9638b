//! Upload client for recorded clips.
//!
//! Assembles captured fragments into a single `audio/wav` payload and POSTs
//! it to the configured server endpoint as multipart form data. One upload
//! per stop; there is no retry, no idempotency key, and no timeout. The
//! request pends until the server or the network resolves it.

use anyhow::{anyhow, Result};

/// Multipart field name carrying the audio payload.
pub const FIELD_NAME: &str = "audio_data";
/// Fixed filename the payload travels under.
pub const FILE_NAME: &str = "recorded_audio.wav";
/// MIME type of the payload.
pub const MIME_TYPE: &str = "audio/wav";

/// The assembled recording, ready for upload and local replay.
///
/// Built once, at stop time, from the concatenation of the session's
/// fragments in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    bytes: Vec<u8>,
}

impl UploadPayload {
    /// Concatenates capture fragments into one binary object.
    ///
    /// Concatenation order matches capture order regardless of fragment
    /// sizes.
    pub fn assemble(chunks: &[Vec<u8>]) -> Self {
        let total: usize = chunks.iter().map(Vec::len).sum();
        let mut bytes = Vec::with_capacity(total);
        for chunk in chunks {
            bytes.extend_from_slice(chunk);
        }
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Result of a successful upload, surfaced to the caller so it can make the
/// new recording visible.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// HTTP status returned by the server (always 2xx)
    pub status: u16,
}

/// Performs the upload POST for a recorded clip.
#[allow(async_fn_in_trait)]
pub trait Uploader {
    async fn upload(&self, payload: &UploadPayload) -> Result<UploadOutcome>;
}

/// Performs the single POST of a recorded clip to the upload endpoint.
pub struct UploadClient {
    url: String,
}

impl Uploader for UploadClient {
    async fn upload(&self, payload: &UploadPayload) -> Result<UploadOutcome> {
        UploadClient::upload(self, payload).await
    }
}

impl UploadClient {
    /// Creates a client targeting `<server><endpoint>`.
    pub fn new(server: &str, endpoint: &str) -> Self {
        Self {
            url: format!("{}{}", server.trim_end_matches('/'), endpoint),
        }
    }

    /// Uploads the payload as multipart form data.
    ///
    /// The body carries a single part named `audio_data` with filename
    /// `recorded_audio.wav` and content type `audio/wav`.
    ///
    /// # Errors
    /// - If the request cannot be built or sent (network failure)
    /// - If the server responds with a non-2xx status
    pub async fn upload(&self, payload: &UploadPayload) -> Result<UploadOutcome> {
        let part = reqwest::multipart::Part::bytes(payload.bytes().to_vec())
            .file_name(FILE_NAME)
            .mime_str(MIME_TYPE)
            .map_err(|e| anyhow!("Failed to create upload part: {e}"))?;
        let form = reqwest::multipart::Form::new().part(FIELD_NAME, part);

        tracing::debug!(
            "Uploading {} bytes to {} (field {}, filename {})",
            payload.len(),
            self.url,
            FIELD_NAME,
            FILE_NAME
        );

        let client = reqwest::Client::new();
        let response = client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    anyhow!("Failed to connect to upload server at {}", self.url)
                } else {
                    anyhow!("Upload network error: {e}")
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Upload rejected with status {status}: {body}"));
        }

        tracing::info!("Audio uploaded successfully (status {})", status.as_u16());
        Ok(UploadOutcome {
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn assemble_concatenates_in_order() {
        let chunks = vec![vec![1u8, 2, 3], vec![4u8], vec![5u8, 6]];
        let payload = UploadPayload::assemble(&chunks);
        assert_eq!(payload.bytes(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(payload.len(), 6);
    }

    #[test]
    fn assemble_empty_is_empty() {
        let payload = UploadPayload::assemble(&[]);
        assert!(payload.is_empty());
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    /// Accepts one HTTP request, returns its raw bytes, and responds with
    /// the given status line.
    async fn stub_server(listener: TcpListener, status_line: &'static str) -> Vec<u8> {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            if let Some(headers_end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&request[..headers_end]).to_lowercase();
                let content_length: usize = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(0);
                if request.len() >= headers_end + 4 + content_length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }

        socket
            .write_all(
                format!("{status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                    .as_bytes(),
            )
            .await
            .unwrap();
        socket.flush().await.unwrap();

        request
    }

    #[tokio::test]
    async fn upload_posts_multipart_wav_and_reports_success() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(stub_server(listener, "HTTP/1.1 200 OK"));

        let payload = UploadPayload::assemble(&[vec![0xDE, 0xAD, 0xBE, 0xEF]]);
        let client = UploadClient::new(&format!("http://{addr}"), "/upload");
        let outcome = client.upload(&payload).await.unwrap();
        assert_eq!(outcome.status, 200);

        let request = server.await.unwrap();
        assert!(request.starts_with(b"POST /upload HTTP/1.1"));
        assert!(contains(&request, b"name=\"audio_data\""));
        assert!(contains(&request, b"filename=\"recorded_audio.wav\""));
        assert!(contains(&request, b"Content-Type: audio/wav"));
        assert!(contains(&request, &[0xDE, 0xAD, 0xBE, 0xEF]));
    }

    #[tokio::test]
    async fn upload_treats_non_2xx_as_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(stub_server(listener, "HTTP/1.1 500 Internal Server Error"));

        let payload = UploadPayload::assemble(&[vec![1, 2, 3]]);
        let client = UploadClient::new(&format!("http://{addr}"), "/upload");
        let err = client.upload(&payload).await.unwrap_err();
        assert!(err.to_string().contains("500"));

        server.await.unwrap();
    }

    #[tokio::test]
    async fn upload_surfaces_network_failure() {
        // Bind then drop to find a port with nothing listening on it.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let payload = UploadPayload::assemble(&[vec![1]]);
        let client = UploadClient::new(&format!("http://{addr}"), "/upload");
        assert!(client.upload(&payload).await.is_err());
    }

    #[test]
    fn server_trailing_slash_is_normalized() {
        let client = UploadClient::new("http://localhost:5000/", "/upload");
        assert_eq!(client.url, "http://localhost:5000/upload");
    }
}
