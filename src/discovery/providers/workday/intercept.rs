// src/discovery/providers/workday/intercept.rs
//! Last-resort Workday channel: render the careers page in a headless browser
//! and lift the job feed out of the page's own XHR/fetch traffic.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::collections::HashSet;

/// Decides which observed response is the job feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMatcher {
    origin: String,
}

impl FeedMatcher {
    /// Only responses from the same origin as `page_url` are considered.
    pub fn for_page(page_url: &str) -> Result<Self> {
        let url = reqwest::Url::parse(page_url)
            .map_err(|e| anyhow!("invalid page url {page_url}: {e}"))?;
        Ok(Self {
            origin: url.origin().ascii_serialization(),
        })
    }

    /// `is_async` is true for XHR and fetch resource types.
    pub fn matches(&self, url: &str, status: i64, is_async: bool) -> bool {
        if !is_async || status != 200 {
            return false;
        }
        let Ok(parsed) = reqwest::Url::parse(url) else {
            return false;
        };
        if parsed.origin().ascii_serialization() != self.origin {
            return false;
        }
        let path = parsed.path();
        path.ends_with("/jobs") || path.contains("/getJobs")
    }
}

/// A network response as reported by the browser, reduced to what
/// [`FeedMatcher`] needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedResponse {
    pub request_id: String,
    pub url: String,
    pub status: i64,
    pub is_async: bool,
}

/// Request id of the first feed response that has both been received and
/// finished loading. The two events come from separate queues and may be read
/// in either order. `None` once both streams end without a match.
pub async fn finished_feed_request<R, F>(
    matcher: &FeedMatcher,
    mut responses: R,
    mut finished: F,
) -> Option<String>
where
    R: Stream<Item = ObservedResponse> + Unpin,
    F: Stream<Item = String> + Unpin,
{
    let mut feeds: HashSet<String> = HashSet::new();
    let mut loaded: HashSet<String> = HashSet::new();
    let (mut responses_open, mut finished_open) = (true, true);

    loop {
        tokio::select! {
            next = responses.next(), if responses_open => match next {
                Some(ev) if matcher.matches(&ev.url, ev.status, ev.is_async) => {
                    tracing::debug!(url = %ev.url, "feed response seen");
                    if loaded.contains(&ev.request_id) {
                        return Some(ev.request_id);
                    }
                    feeds.insert(ev.request_id);
                }
                Some(_) => {}
                None => responses_open = false,
            },
            next = finished.next(), if finished_open => match next {
                Some(id) => {
                    if feeds.contains(&id) {
                        return Some(id);
                    }
                    loaded.insert(id);
                }
                None => finished_open = false,
            },
            else => return None,
        }
    }
}

#[async_trait]
pub trait FeedInterceptor: Send + Sync {
    /// Render `page_url` and return the body of the first response accepted by
    /// `matcher`. `Ok(None)` means nothing matched within the wait budget.
    async fn capture(&self, page_url: &str, matcher: &FeedMatcher) -> Result<Option<String>>;
}

#[cfg(feature = "browser")]
pub use chromium::ChromiumInterceptor;

#[cfg(feature = "browser")]
mod chromium {
    use super::{finished_feed_request, FeedInterceptor, FeedMatcher, ObservedResponse};
    use anyhow::{anyhow, Context, Result};
    use async_trait::async_trait;
    use base64::Engine as _;
    use chromiumoxide::cdp::browser_protocol::network::{
        EventLoadingFinished, EventResponseReceived, GetResponseBodyParams, RequestId,
        ResourceType,
    };
    use chromiumoxide::listeners::EventStream;
    use chromiumoxide::{Browser, BrowserConfig, Page};
    use futures::StreamExt;
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// Launches a fresh headless Chromium per capture. Captures are serialized:
    /// one rendering context is never shared between concurrent fetches.
    pub struct ChromiumInterceptor {
        chrome_path: Option<PathBuf>,
        nav_timeout: Duration,
        wait_timeout: Duration,
        lock: Mutex<()>,
    }

    impl ChromiumInterceptor {
        pub fn new(nav_timeout: Duration, wait_timeout: Duration) -> Self {
            Self {
                chrome_path: None,
                nav_timeout,
                wait_timeout,
                lock: Mutex::new(()),
            }
        }

        pub fn with_chrome_path(mut self, path: Option<PathBuf>) -> Self {
            self.chrome_path = path;
            self
        }

        async fn observe(
            &self,
            browser: &Browser,
            page_url: &str,
            matcher: &FeedMatcher,
        ) -> Result<Option<String>> {
            let page = browser
                .new_page("about:blank")
                .await
                .context("opening browser page")?;
            // Listeners go up before navigation so early responses are buffered.
            let responses = page.event_listener::<EventResponseReceived>().await?;
            let finished = page.event_listener::<EventLoadingFinished>().await?;

            tokio::time::timeout(self.nav_timeout, page.goto(page_url))
                .await
                .map_err(|_| anyhow!("navigation to {page_url} timed out"))?
                .with_context(|| format!("navigating to {page_url}"))?;

            match tokio::time::timeout(
                self.wait_timeout,
                wait_for_feed(&page, responses, finished, matcher),
            )
            .await
            {
                Ok(res) => res,
                Err(_) => {
                    tracing::info!(page = page_url, "no feed response before wait expired");
                    Ok(None)
                }
            }
        }
    }

    async fn wait_for_feed(
        page: &Page,
        responses: EventStream<EventResponseReceived>,
        finished: EventStream<EventLoadingFinished>,
        matcher: &FeedMatcher,
    ) -> Result<Option<String>> {
        let responses = responses.map(|ev| ObservedResponse {
            request_id: ev.request_id.inner().clone(),
            url: ev.response.url.clone(),
            status: ev.response.status,
            is_async: matches!(ev.r#type, ResourceType::Xhr | ResourceType::Fetch),
        });
        let finished = finished.map(|ev| ev.request_id.inner().clone());

        let Some(id) =
            finished_feed_request(matcher, Box::pin(responses), Box::pin(finished)).await
        else {
            return Ok(None);
        };
        let body = page
            .execute(GetResponseBodyParams::new(RequestId::new(id)))
            .await
            .context("reading intercepted response body")?;
        decode_body(&body.result.body, body.result.base64_encoded).map(Some)
    }

    fn decode_body(body: &str, base64_encoded: bool) -> Result<String> {
        if !base64_encoded {
            return Ok(body.to_string());
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(body)
            .context("decoding base64 response body")?;
        String::from_utf8(bytes).context("intercepted body is not utf-8")
    }

    #[async_trait]
    impl FeedInterceptor for ChromiumInterceptor {
        async fn capture(&self, page_url: &str, matcher: &FeedMatcher) -> Result<Option<String>> {
            let _guard = self.lock.lock().await;

            let mut builder = BrowserConfig::builder().request_timeout(self.nav_timeout);
            if let Some(path) = &self.chrome_path {
                builder = builder.chrome_executable(path);
            }
            let config = builder
                .build()
                .map_err(|e| anyhow!("browser config: {e}"))?;

            let (mut browser, mut handler) = Browser::launch(config)
                .await
                .context("launching headless chromium")?;
            let pump = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let result = self.observe(&browser, page_url, matcher).await;

            if let Err(e) = browser.close().await {
                tracing::warn!(error = ?e, "closing browser");
            }
            let _ = browser.wait().await;
            pump.abort();

            result
        }
    }

    #[cfg(test)]
    mod tests {
        use super::decode_body;

        #[test]
        fn decodes_plain_and_base64_bodies() {
            assert_eq!(decode_body("{}", false).unwrap(), "{}");
            assert_eq!(
                decode_body("eyJqb2JQb3N0aW5ncyI6W119", true).unwrap(),
                r#"{"jobPostings":[]}"#
            );
            assert!(decode_body("***", true).is_err());
        }
    }
}
