use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::CompareError;
use crate::row::{Row, RowSequence};
use crate::tables::{ExtractionError, TableExtractor, DEFAULT_EXTRACTION_TIMEOUT};

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5001/parse-pdf-tables";

/// Multipart field carrying the PDF document.
const PDF_FIELD: &str = "pdf_file";

/// Client for the PDF table-extraction HTTP service.
///
/// The service accepts a multipart upload and answers with
/// `{"data": [[{..}, ..], ..]}` on success or `{"error": ".."}` otherwise.
pub struct HttpTableExtractor {
    inner: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

/// Builder for [`HttpTableExtractor`].
pub struct TableExtractorBuilder {
    endpoint: String,
    timeout: Duration,
    user_agent: String,
    system_proxy: bool,
}

impl Default for TableExtractorBuilder {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_EXTRACTION_TIMEOUT,
            user_agent: format!("perfcompare/{}", env!("CARGO_PKG_VERSION")),
            system_proxy: true,
        }
    }
}

impl TableExtractorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    /// Whether to honour `HTTP_PROXY`-style environment settings.
    pub fn system_proxy(mut self, enabled: bool) -> Self {
        self.system_proxy = enabled;
        self
    }

    pub fn build(self) -> Result<HttpTableExtractor, CompareError> {
        if self.endpoint.trim().is_empty() {
            return Err(CompareError::Config(
                "table extraction endpoint must not be empty".to_string(),
            ));
        }

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .gzip(true)
            .brotli(true);
        if !self.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(HttpTableExtractor {
            inner: client,
            endpoint: self.endpoint,
            timeout: self.timeout,
        })
    }
}

impl HttpTableExtractor {
    /// Returns a builder for customising the client.
    pub fn builder() -> TableExtractorBuilder {
        TableExtractorBuilder::new()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Default, Deserialize)]
struct ServiceReply {
    #[serde(default)]
    data: Vec<Vec<Map<String, Value>>>,
    #[serde(default)]
    error: Option<String>,
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> ExtractionError {
    if err.is_timeout() {
        ExtractionError::Timeout(timeout)
    } else {
        ExtractionError::Unavailable(err.to_string())
    }
}

impl TableExtractor for HttpTableExtractor {
    async fn extract_tables(
        &self,
        pdf: Vec<u8>,
        file_name: &str,
    ) -> Result<Vec<RowSequence>, ExtractionError> {
        let part = Part::bytes(pdf)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| ExtractionError::Unavailable(e.to_string()))?;
        let form = Form::new().part(PDF_FIELD, part);

        tracing::debug!(endpoint = %self.endpoint, file = file_name, "requesting PDF table extraction");

        let response = self
            .inner
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ServiceReply>(&body)
                .ok()
                .and_then(|reply| reply.error)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(ExtractionError::Service(message));
        }

        let reply: ServiceReply = serde_json::from_slice(&body)
            .map_err(|e| ExtractionError::InvalidResponse(e.to_string()))?;
        if let Some(error) = reply.error {
            return Err(ExtractionError::Service(error));
        }

        Ok(reply
            .data
            .iter()
            .map(|table| table.iter().map(Row::from_json_object).collect())
            .collect())
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response after draining the request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if request_complete(&buf) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/parse-pdf-tables")
    }

    fn request_complete(buf: &[u8]) -> bool {
        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
        let content_length = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());
        match content_length {
            Some(len) => buf.len() >= header_end + 4 + len,
            None => buf.ends_with(b"0\r\n\r\n"),
        }
    }

    #[test]
    fn default_builder_has_expected_values() {
        let builder = TableExtractorBuilder::default();
        assert_eq!(builder.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(builder.timeout, DEFAULT_EXTRACTION_TIMEOUT);
        assert!(builder.user_agent.starts_with("perfcompare/"));
        assert!(builder.system_proxy);
    }

    #[test]
    fn builder_with_custom_settings() {
        let extractor = HttpTableExtractor::builder()
            .endpoint("http://tables.internal:8080/extract")
            .timeout(Duration::from_secs(5))
            .user_agent("perfcompare-test")
            .build()
            .expect("builder should succeed");
        assert_eq!(extractor.endpoint(), "http://tables.internal:8080/extract");
        assert_eq!(TableExtractor::timeout(&extractor), Duration::from_secs(5));
    }

    #[test]
    fn builder_rejects_blank_endpoint() {
        let result = HttpTableExtractor::builder().endpoint("  ").build();
        assert!(matches!(result, Err(CompareError::Config(_))));
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        // Bind then drop to obtain a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let extractor = HttpTableExtractor::builder()
            .endpoint(format!("http://{addr}/parse-pdf-tables"))
            .timeout(Duration::from_secs(5))
            .system_proxy(false)
            .build()
            .unwrap();
        let result = extractor.extract_tables(b"%PDF".to_vec(), "a.pdf").await;
        assert!(matches!(result, Err(ExtractionError::Unavailable(_))));
    }

    #[tokio::test]
    async fn successful_reply_is_converted_to_rows() {
        let endpoint = serve_once(
            "200 OK",
            r#"{"data": [[{"0": "Host", "1": "CPU"}, {"0": "web-1", "1": null}], [{"zone": "eu", "app": "x"}]],
                "message": "Extracted 2 tables."}"#,
        )
        .await;
        let extractor = HttpTableExtractor::builder()
            .endpoint(endpoint)
            .system_proxy(false)
            .build()
            .unwrap();

        let tables = extractor
            .extract_tables(b"%PDF-1.4 fake".to_vec(), "report.pdf")
            .await
            .expect("extraction should succeed");
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].len(), 2);
        assert_eq!(tables[0][1].get("0"), Some("web-1"));
        assert_eq!(tables[0][1].get("1"), Some(""));
        assert_eq!(tables[1][0].get("app"), Some("x"));
        let keys: Vec<&str> = tables[1][0].keys().collect();
        assert_eq!(keys, vec!["zone", "app"]);
    }

    #[tokio::test]
    async fn error_reply_surfaces_service_message() {
        let endpoint = serve_once(
            "500 Internal Server Error",
            r#"{"error": "Failed to process PDF: no pages"}"#,
        )
        .await;
        let extractor = HttpTableExtractor::builder()
            .endpoint(endpoint)
            .system_proxy(false)
            .build()
            .unwrap();

        let err = extractor
            .extract_tables(b"%PDF".to_vec(), "report.pdf")
            .await
            .unwrap_err();
        match err {
            ExtractionError::Service(msg) => assert_eq!(msg, "Failed to process PDF: no pages"),
            other => panic!("expected service error, got {other:?}"),
        }
    }
}
