use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{info, warn};
use url::Url;

use threadlens_common::{QuestionThread, ThreadLensError};

use crate::extract::extract_thread;
use crate::fallback::FallbackSource;
use crate::profiles::{pick_profile, HeaderProfile, PROFILES};

/// The one host the retriever will fetch from. Anything else is
/// rejected before a single request goes out.
const SUPPORTED_HOST: &str = "stackoverflow.com";

const FETCH_TIMEOUT: Duration = Duration::from_secs(45);

#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

/// One GET under one client identity. `Err` is a network-level failure
/// (timeout, connection reset, DNS); HTTP error statuses come back as
/// `Ok` with the status set, so the caller owns the retry decision.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get(&self, url: &str, profile: &HeaderProfile) -> Result<PageResponse>;
}

pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(8))
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .expect("Failed to build HTTP client");

        Self { http }
    }

    fn profile_headers(profile: &HeaderProfile) -> HeaderMap {
        let mut map = HeaderMap::new();
        for &(name, value) in profile.headers {
            // reqwest negotiates content codings itself; forwarding the
            // profile's Accept-Encoding would disable auto-decompression.
            if name.eq_ignore_ascii_case("accept-encoding") {
                continue;
            }
            if let Ok(name) = HeaderName::from_bytes(name.as_bytes()) {
                map.insert(name, HeaderValue::from_static(value));
            }
        }
        map
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get(&self, url: &str, profile: &HeaderProfile) -> Result<PageResponse> {
        let resp = self
            .http
            .get(url)
            .headers(Self::profile_headers(profile))
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(PageResponse { status, body })
    }
}

/// What one direct attempt produced, as data. The retry/fallback
/// decision lives in a single match over this enum.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Usable page body.
    Page(String),
    /// 403: the host is actively refusing this client identity.
    Blocked,
    /// Network-level failure, worth retrying under another identity.
    Retryable(String),
    /// Any other HTTP error status. Not retried, not worked around.
    Fatal(u16),
}

pub fn classify(result: Result<PageResponse>) -> AttemptOutcome {
    match result {
        Ok(resp) if (200..300).contains(&resp.status) => AttemptOutcome::Page(resp.body),
        Ok(resp) if resp.status == 403 => AttemptOutcome::Blocked,
        Ok(resp) => AttemptOutcome::Fatal(resp.status),
        Err(e) => AttemptOutcome::Retryable(e.to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay slept before each retry, drawn uniformly in milliseconds.
    /// Desynchronizes concurrent retries against the same host; this is
    /// deliberately not exponential.
    pub jitter_ms: Range<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            jitter_ms: 1_000..3_000,
        }
    }
}

/// Drives direct retrieval: rotate identities across bounded attempts,
/// retry what might clear up, fall back to the structured API when the
/// host keeps refusing, and fail fast on everything else.
pub struct Retriever {
    fetcher: Arc<dyn PageFetcher>,
    fallback: Arc<dyn FallbackSource>,
    policy: RetryPolicy,
}

impl Retriever {
    pub fn new(fetcher: Arc<dyn PageFetcher>, fallback: Arc<dyn FallbackSource>) -> Self {
        Self {
            fetcher,
            fallback,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fetch and normalize the question thread at `url`.
    pub async fn retrieve(&self, url: &str) -> std::result::Result<QuestionThread, ThreadLensError> {
        validate_host(url)?;

        let mut last_failure = String::new();
        for attempt in 1..=self.policy.max_attempts {
            let profile = pick_profile(PROFILES, &mut rand::rng());

            if attempt > 1 && !self.policy.jitter_ms.is_empty() {
                let delay = rand::rng().random_range(self.policy.jitter_ms.clone());
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            info!(url, attempt, profile = profile.name, "Fetching page");

            match classify(self.fetcher.get(url, profile).await) {
                AttemptOutcome::Page(body) => {
                    info!(url, attempt, "Page fetched");
                    return extract_thread(&body, url);
                }
                AttemptOutcome::Blocked => {
                    warn!(url, attempt, "403 Forbidden");
                    if attempt == self.policy.max_attempts {
                        info!(url, "Direct fetch blocked, querying the Stack Exchange API");
                        return self
                            .fallback
                            .lookup(url)
                            .await
                            .map_err(|e| ThreadLensError::Exhausted(e.to_string()));
                    }
                    last_failure = "403 Forbidden".to_string();
                }
                AttemptOutcome::Retryable(reason) => {
                    warn!(url, attempt, reason = %reason, "Fetch failed");
                    if attempt == self.policy.max_attempts {
                        return Err(ThreadLensError::TransientFetch {
                            attempts: self.policy.max_attempts,
                            reason,
                        });
                    }
                    last_failure = reason;
                }
                AttemptOutcome::Fatal(status) => {
                    warn!(url, attempt, status, "Unrecoverable HTTP status");
                    return Err(ThreadLensError::PermanentFetch { status });
                }
            }
        }

        // Reachable only with max_attempts == 0; every arm above either
        // returns or runs another attempt.
        Err(ThreadLensError::TransientFetch {
            attempts: self.policy.max_attempts,
            reason: last_failure,
        })
    }
}

fn validate_host(raw: &str) -> std::result::Result<(), ThreadLensError> {
    let parsed =
        Url::parse(raw).map_err(|e| ThreadLensError::Validation(format!("Invalid URL: {e}")))?;
    let host = parsed.host_str().unwrap_or_default();
    if host == SUPPORTED_HOST || host.ends_with(&format!(".{SUPPORTED_HOST}")) {
        Ok(())
    } else {
        Err(ThreadLensError::Validation(format!(
            "URL must be from {SUPPORTED_HOST}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const PAGE: &str = r#"
        <html><head><title>fixture</title></head><body>
            <h1 class="fs-headline1">How do I reverse a list?</h1>
            <div class="question"><div class="s-prose">I have a list and want it reversed.</div></div>
            <div class="answer"><div class="s-prose">Call .reverse() in place.</div></div>
            <a class="post-tag">python</a>
        </body></html>
    "#;

    const QUESTION_URL: &str = "https://stackoverflow.com/questions/42/reverse-a-list";

    /// Replays a scripted sequence of responses and counts calls.
    struct ScriptedFetcher {
        script: Mutex<VecDeque<Result<PageResponse>>>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<Result<PageResponse>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                calls: AtomicUsize::new(0),
            }
        }

        fn status(status: u16, body: &str) -> Result<PageResponse> {
            Ok(PageResponse {
                status,
                body: body.to_string(),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn get(&self, _url: &str, _profile: &HeaderProfile) -> Result<PageResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("fetcher called more times than scripted")
        }
    }

    /// Returns a canned thread and counts lookups.
    struct CountingFallback {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingFallback {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FallbackSource for CountingFallback {
        async fn lookup(
            &self,
            url: &str,
        ) -> std::result::Result<QuestionThread, ThreadLensError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ThreadLensError::Upstream("API down".to_string()));
            }
            Ok(QuestionThread {
                title: "From the API".to_string(),
                question_body: "body".to_string(),
                answers: vec!["answer".to_string()],
                tags: vec!["rust".to_string()],
                source_url: url.to_string(),
            })
        }
    }

    fn no_jitter() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            jitter_ms: 0..0,
        }
    }

    fn retriever(
        fetcher: Arc<ScriptedFetcher>,
        fallback: Arc<CountingFallback>,
    ) -> Retriever {
        Retriever::new(fetcher, fallback).with_policy(no_jitter())
    }

    #[tokio::test]
    async fn off_domain_url_is_rejected_without_fetching() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![]));
        let fallback = Arc::new(CountingFallback::new());
        let r = retriever(fetcher.clone(), fallback.clone());

        let err = r
            .retrieve("https://www.google.com/search?q=rust")
            .await
            .unwrap_err();

        assert!(matches!(err, ThreadLensError::Validation(_)));
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn meta_subdomain_is_accepted() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![ScriptedFetcher::status(
            200, PAGE,
        )]));
        let fallback = Arc::new(CountingFallback::new());
        let r = retriever(fetcher.clone(), fallback);

        let doc = r
            .retrieve("https://meta.stackoverflow.com/questions/42/foo")
            .await
            .unwrap();
        assert_eq!(doc.title, "How do I reverse a list?");
    }

    #[tokio::test]
    async fn blocked_twice_then_success_uses_third_response() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            ScriptedFetcher::status(403, ""),
            ScriptedFetcher::status(403, ""),
            ScriptedFetcher::status(200, PAGE),
        ]));
        let fallback = Arc::new(CountingFallback::new());
        let r = retriever(fetcher.clone(), fallback.clone());

        let doc = r.retrieve(QUESTION_URL).await.unwrap();

        assert_eq!(fetcher.calls(), 3);
        assert_eq!(fallback.calls(), 0);
        assert_eq!(doc.title, "How do I reverse a list?");
        assert_eq!(doc.answers, vec!["Call .reverse() in place.".to_string()]);
        assert_eq!(doc.source_url, QUESTION_URL);
    }

    #[tokio::test]
    async fn blocked_three_times_falls_back_once() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            ScriptedFetcher::status(403, ""),
            ScriptedFetcher::status(403, ""),
            ScriptedFetcher::status(403, ""),
        ]));
        let fallback = Arc::new(CountingFallback::new());
        let r = retriever(fetcher.clone(), fallback.clone());

        let doc = r.retrieve(QUESTION_URL).await.unwrap();

        assert_eq!(fetcher.calls(), 3);
        assert_eq!(fallback.calls(), 1);
        assert_eq!(doc.title, "From the API");
    }

    #[tokio::test]
    async fn blocked_with_failing_fallback_reports_exhaustion() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            ScriptedFetcher::status(403, ""),
            ScriptedFetcher::status(403, ""),
            ScriptedFetcher::status(403, ""),
        ]));
        let fallback = Arc::new(CountingFallback::failing());
        let r = retriever(fetcher.clone(), fallback.clone());

        let err = r.retrieve(QUESTION_URL).await.unwrap_err();

        assert_eq!(fallback.calls(), 1);
        assert!(matches!(err, ThreadLensError::Exhausted(_)));
    }

    #[tokio::test]
    async fn server_error_fails_immediately() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![ScriptedFetcher::status(
            500, "",
        )]));
        let fallback = Arc::new(CountingFallback::new());
        let r = retriever(fetcher.clone(), fallback.clone());

        let err = r.retrieve(QUESTION_URL).await.unwrap_err();

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(fallback.calls(), 0);
        assert!(matches!(
            err,
            ThreadLensError::PermanentFetch { status: 500 }
        ));
    }

    #[tokio::test]
    async fn network_errors_exhaust_without_fallback() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Err(anyhow::anyhow!("connection reset")),
            Err(anyhow::anyhow!("connection reset")),
            Err(anyhow::anyhow!("connection reset")),
        ]));
        let fallback = Arc::new(CountingFallback::new());
        let r = retriever(fetcher.clone(), fallback.clone());

        let err = r.retrieve(QUESTION_URL).await.unwrap_err();

        assert_eq!(fetcher.calls(), 3);
        assert_eq!(fallback.calls(), 0);
        assert!(matches!(
            err,
            ThreadLensError::TransientFetch { attempts: 3, .. }
        ));
    }

    #[tokio::test]
    async fn network_error_then_success_recovers() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Err(anyhow::anyhow!("timed out")),
            ScriptedFetcher::status(200, PAGE),
        ]));
        let fallback = Arc::new(CountingFallback::new());
        let r = retriever(fetcher.clone(), fallback.clone());

        let doc = r.retrieve(QUESTION_URL).await.unwrap();
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(doc.tags, vec!["python".to_string()]);
    }

    #[test]
    fn classify_maps_statuses() {
        assert!(matches!(
            classify(ScriptedFetcher::status(200, "x")),
            AttemptOutcome::Page(_)
        ));
        // Redirects were already followed, so a stray 204 still counts
        // as a page.
        assert!(matches!(
            classify(ScriptedFetcher::status(204, "")),
            AttemptOutcome::Page(_)
        ));
        assert!(matches!(
            classify(ScriptedFetcher::status(403, "")),
            AttemptOutcome::Blocked
        ));
        assert!(matches!(
            classify(ScriptedFetcher::status(404, "")),
            AttemptOutcome::Fatal(404)
        ));
        assert!(matches!(
            classify(ScriptedFetcher::status(500, "")),
            AttemptOutcome::Fatal(500)
        ));
        assert!(matches!(
            classify(Err(anyhow::anyhow!("dns failure"))),
            AttemptOutcome::Retryable(_)
        ));
    }
}
