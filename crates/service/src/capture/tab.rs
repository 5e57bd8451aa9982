use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::{Host, Url};

use configs::CaptureConfig;

use super::metadata::{extract_metadata, PageMetadata};
use super::CaptureError;

/// The browser tab a capture runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTab {
    pub id: i32,
    pub url: String,
}

/// Where tabs and their documents come from.
#[async_trait]
pub trait TabSource: Send + Sync {
    async fn active_tab(&self) -> Option<ActiveTab>;
    async fn document(&self, tab: &ActiveTab) -> Result<String, CaptureError>;
}

/// Only http(s) documents can be read; browser-internal and file pages cannot.
pub fn is_capturable(url: &str) -> bool {
    matches!(Url::parse(url), Ok(u) if matches!(u.scheme(), "http" | "https"))
}

/// Addresses reachable from the public internet. Loopback, private, link-local,
/// shared and documentation ranges are not.
pub fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            !(v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                || (a == 100 && (64..128).contains(&b)))
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_public_ip(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            !(v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80)
        }
    }
}

/// Host check that needs no DNS: IP literals and `localhost`.
fn is_public_literal(url: &Url) -> bool {
    match url.host() {
        Some(Host::Ipv4(ip)) => is_public_ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => is_public_ip(IpAddr::V6(ip)),
        Some(Host::Domain(d)) => {
            let d = d.trim_end_matches('.').to_ascii_lowercase();
            d != "localhost" && !d.ends_with(".localhost")
        }
        None => false,
    }
}

/// Fetches the tab's URL over HTTP. Has no notion of an active tab.
pub struct HttpTabSource {
    client: reqwest::Client,
    max_bytes: usize,
    allow_private_hosts: bool,
}

impl HttpTabSource {
    pub fn new(cfg: &CaptureConfig) -> Result<Self, CaptureError> {
        let allow_private_hosts = cfg.allow_private_hosts;
        let redirects = reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= 5 {
                attempt.error("too many redirects")
            } else if !allow_private_hosts && !is_public_literal(attempt.url()) {
                attempt.error("redirect to a non-public address")
            } else {
                attempt.follow()
            }
        });
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.fetch_timeout_secs))
            .user_agent(cfg.user_agent.clone())
            .redirect(redirects)
            .build()
            .map_err(|e| CaptureError::Document(e.to_string()))?;
        Ok(Self { client, max_bytes: cfg.max_bytes, allow_private_hosts })
    }

    /// Refuses targets that are, or resolve to, non-public addresses.
    async fn ensure_public_target(&self, raw: &str) -> Result<(), CaptureError> {
        if self.allow_private_hosts {
            return Ok(());
        }
        let restricted = || CaptureError::RestrictedPage(raw.to_string());
        let url = Url::parse(raw).map_err(|_| restricted())?;
        if !is_public_literal(&url) {
            return Err(restricted());
        }
        if let Some(Host::Domain(domain)) = url.host() {
            let port = url.port_or_known_default().unwrap_or(80);
            let addrs = tokio::net::lookup_host((domain, port))
                .await
                .map_err(|e| CaptureError::Document(format!("cannot resolve {domain}: {e}")))?;
            for addr in addrs {
                if !is_public_ip(addr.ip()) {
                    warn!(url = %raw, ip = %addr.ip(), "capture target resolves to a non-public address");
                    return Err(restricted());
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TabSource for HttpTabSource {
    async fn active_tab(&self) -> Option<ActiveTab> {
        None
    }

    async fn document(&self, tab: &ActiveTab) -> Result<String, CaptureError> {
        self.ensure_public_target(&tab.url).await?;
        let mut resp = self
            .client
            .get(&tab.url)
            .send()
            .await
            .map_err(|e| CaptureError::Document(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CaptureError::Document(format!("{} returned {}", tab.url, status)));
        }
        let too_large = || CaptureError::Document(format!("page exceeds {} bytes", self.max_bytes));
        if resp.content_length().is_some_and(|n| n > self.max_bytes as u64) {
            return Err(too_large());
        }
        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(|e| CaptureError::Document(e.to_string()))? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// A tab whose document is already in hand, as handed over by the page script.
#[derive(Debug, Clone, Default)]
pub struct StaticTabSource {
    tab: Option<ActiveTab>,
    html: String,
}

impl StaticTabSource {
    pub fn new(tab: Option<ActiveTab>, html: impl Into<String>) -> Self {
        Self { tab, html: html.into() }
    }
}

#[async_trait]
impl TabSource for StaticTabSource {
    async fn active_tab(&self) -> Option<ActiveTab> {
        self.tab.clone()
    }

    async fn document(&self, _tab: &ActiveTab) -> Result<String, CaptureError> {
        Ok(self.html.clone())
    }
}

pub struct TabCapture {
    source: Arc<dyn TabSource>,
}

impl TabCapture {
    pub fn new(source: Arc<dyn TabSource>) -> Self {
        Self { source }
    }

    /// Captures whichever tab is active.
    pub async fn capture_active(&self) -> Result<(ActiveTab, PageMetadata), CaptureError> {
        let tab = self.source.active_tab().await.ok_or(CaptureError::NoActiveTab)?;
        let meta = self.capture(&tab).await?;
        Ok((tab, meta))
    }

    #[instrument(skip(self), fields(url = %tab.url))]
    pub async fn capture(&self, tab: &ActiveTab) -> Result<PageMetadata, CaptureError> {
        if !is_capturable(&tab.url) {
            return Err(CaptureError::RestrictedPage(tab.url.clone()));
        }
        let html = self.source.document(tab).await?;
        let meta = extract_metadata(&html, &tab.url, Utc::now());
        debug!(title = %meta.title, "page captured");
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(url: &str) -> ActiveTab {
        ActiveTab { id: 7, url: url.into() }
    }

    #[test]
    fn only_http_pages_are_capturable() {
        assert!(is_capturable("https://example.com/a"));
        assert!(is_capturable("http://localhost:3000/"));
        assert!(!is_capturable("chrome://extensions"));
        assert!(!is_capturable("file:///tmp/a.html"));
        assert!(!is_capturable("not a url"));
    }

    #[tokio::test]
    async fn captures_active_tab() {
        let src = StaticTabSource::new(Some(tab("https://example.com/a")), "<title>A</title>");
        let (t, meta) = TabCapture::new(Arc::new(src)).capture_active().await.unwrap();
        assert_eq!(t.id, 7);
        assert_eq!(meta.title, "A");
    }

    #[tokio::test]
    async fn no_active_tab() {
        let cap = TabCapture::new(Arc::new(StaticTabSource::default()));
        assert_eq!(cap.capture_active().await.unwrap_err(), CaptureError::NoActiveTab);
    }

    #[test]
    fn public_address_ranges() {
        for ip in ["127.0.0.1", "10.1.2.3", "172.16.0.1", "192.168.1.1", "169.254.169.254", "100.64.0.1", "0.0.0.0", "::1", "fd00::1", "fe80::1", "::ffff:127.0.0.1"] {
            assert!(!is_public_ip(ip.parse().unwrap()), "{ip}");
        }
        for ip in ["93.184.216.34", "8.8.8.8", "2606:4700::1111"] {
            assert!(is_public_ip(ip.parse().unwrap()), "{ip}");
        }
    }

    #[tokio::test]
    async fn http_source_refuses_internal_targets() {
        let src = HttpTabSource::new(&CaptureConfig::default()).unwrap();
        for url in ["http://127.0.0.1:9/", "http://localhost/", "http://[::1]/", "http://169.254.169.254/latest/meta-data"] {
            assert_eq!(src.document(&tab(url)).await.unwrap_err(), CaptureError::RestrictedPage(url.into()));
        }
    }

    /// Serves `body` once over a raw socket, without a content length.
    async fn serve_once(body: String) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = sock.read(&mut buf).await;
            let head = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n";
            let _ = sock.write_all(head.as_bytes()).await;
            let _ = sock.write_all(body.as_bytes()).await;
            let _ = sock.shutdown().await;
        });
        format!("http://{addr}/")
    }

    fn local_config(max_bytes: usize) -> CaptureConfig {
        CaptureConfig { max_bytes, allow_private_hosts: true, ..Default::default() }
    }

    #[tokio::test]
    async fn page_body_is_capped() {
        let url = serve_once(format!("<title>Big</title>{}", "x".repeat(8 * 1024))).await;
        let src = HttpTabSource::new(&local_config(1024)).unwrap();
        let err = src.document(&tab(&url)).await.unwrap_err();
        assert_eq!(err, CaptureError::Document("page exceeds 1024 bytes".into()));
    }

    #[tokio::test]
    async fn page_within_cap_is_captured() {
        let url = serve_once("<title>Small</title>".to_string()).await;
        let capture = TabCapture::new(Arc::new(HttpTabSource::new(&local_config(1024)).unwrap()));
        assert_eq!(capture.capture(&tab(&url)).await.unwrap().title, "Small");
    }

    #[tokio::test]
    async fn restricted_page_is_rejected_before_reading() {
        let src = StaticTabSource::new(Some(tab("chrome://newtab/")), "<title>x</title>");
        let err = TabCapture::new(Arc::new(src)).capture_active().await.unwrap_err();
        assert_eq!(err, CaptureError::RestrictedPage("chrome://newtab/".into()));
    }
}
