//! Zipkin v2 HTTP exporter.
//!
//! Finished spans are handed to a background reporter thread which
//! batches them and POSTs a JSON array to the collector.

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use rand::Rng as _;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::Serialize;

use super::{SpanContext, Tracer};
use crate::error::TracerError;

/// Local Zipkin collector.
pub const DEFAULT_ZIPKIN_ENDPOINT: &str = "http://127.0.0.1:9411/api/v2/spans";

/// Service name reported in every span's local endpoint.
pub const SERVICE_NAME: &str = "dhcp-packet-analyzer";

const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Parse and validate a collector URL.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, TracerError> {
    let url = Url::parse(endpoint).map_err(|e| TracerError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(TracerError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// When the reporter thread posts a batch.
#[derive(Debug, Clone, Copy)]
struct BatchPolicy {
    /// Longest a span waits in the batch, counted from the first span
    interval: Duration,
    /// Batch size that triggers an immediate post
    max_spans: usize,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_spans: 100,
        }
    }
}

fn is_loopback(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    host.eq_ignore_ascii_case("localhost")
        || host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct LocalEndpoint {
    service_name: String,
}

/// A finished span in Zipkin v2 JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct ZipkinSpan {
    trace_id: String,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
    name: String,
    /// Epoch microseconds
    timestamp: u64,
    /// Microseconds
    duration: u64,
    local_endpoint: LocalEndpoint,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    tags: BTreeMap<String, String>,
}

#[derive(Debug)]
struct OpenSpan {
    context: SpanContext,
    parent: Option<SpanContext>,
    name: String,
    timestamp: SystemTime,
    started: Instant,
    tags: BTreeMap<String, String>,
}

impl OpenSpan {
    fn new(context: SpanContext, parent: Option<SpanContext>, name: &str) -> Self {
        Self {
            context,
            parent,
            name: name.to_string(),
            timestamp: SystemTime::now(),
            started: Instant::now(),
            tags: BTreeMap::new(),
        }
    }

    fn into_zipkin(self, elapsed: Duration) -> ZipkinSpan {
        let timestamp = self
            .timestamp
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or_default();

        ZipkinSpan {
            trace_id: format!("{:032x}", self.context.trace_id),
            id: format!("{:016x}", self.context.span_id),
            parent_id: self.parent.map(|p| format!("{:016x}", p.span_id)),
            name: self.name,
            timestamp,
            // Zipkin rejects zero durations
            duration: (elapsed.as_micros() as u64).max(1),
            local_endpoint: LocalEndpoint {
                service_name: SERVICE_NAME.to_string(),
            },
            tags: self.tags,
        }
    }
}

/// Tracer exporting spans to a Zipkin collector over HTTP.
pub struct ZipkinTracer {
    open: HashMap<u64, OpenSpan>,
    sender: Option<Sender<ZipkinSpan>>,
    worker: Option<JoinHandle<()>>,
}

impl ZipkinTracer {
    /// Create a tracer reporting to `endpoint`.
    ///
    /// Fails if the endpoint is not an http(s) URL or the HTTP client
    /// cannot be built. The collector is not contacted here.
    pub fn new(endpoint: &str) -> Result<Self, TracerError> {
        Self::with_policy(endpoint, BatchPolicy::default())
    }

    fn with_policy(endpoint: &str, policy: BatchPolicy) -> Result<Self, TracerError> {
        let url = parse_endpoint(endpoint)?;
        let mut builder = Client::builder().timeout(HTTP_TIMEOUT);
        if is_loopback(&url) {
            // Proxy settings from the environment never apply to a local collector
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        let (sender, receiver) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("zipkin-reporter".to_string())
            .spawn(move || run_reporter(client, url, policy, receiver))?;

        tracing::info!(endpoint, "Zipkin span export enabled");

        Ok(Self {
            open: HashMap::new(),
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    fn next_span_id() -> u64 {
        // Zero is not a valid Zipkin id
        rand::rng().random_range(1..=u64::MAX)
    }

    fn start(&mut self, context: SpanContext, parent: Option<SpanContext>, name: &str) {
        self.open
            .insert(context.span_id, OpenSpan::new(context, parent, name));
    }
}

impl Tracer for ZipkinTracer {
    fn start_root_span(&mut self, name: &str, tags: &[(&str, &str)]) -> SpanContext {
        let context = SpanContext {
            trace_id: rand::rng().random_range(1..=u128::MAX),
            span_id: Self::next_span_id(),
        };
        self.start(context, None, name);
        for (key, value) in tags {
            self.set_tag(context, key, value);
        }
        context
    }

    fn start_child_span(&mut self, name: &str, parent: SpanContext) -> SpanContext {
        let context = SpanContext {
            trace_id: parent.trace_id,
            span_id: Self::next_span_id(),
        };
        self.start(context, Some(parent), name);
        context
    }

    fn set_tag(&mut self, span: SpanContext, key: &str, value: &str) {
        if let Some(open) = self.open.get_mut(&span.span_id) {
            open.tags.insert(key.to_string(), value.to_string());
        }
    }

    fn finish(&mut self, span: SpanContext) {
        let Some(open) = self.open.remove(&span.span_id) else {
            return;
        };
        let elapsed = open.started.elapsed();
        if let Some(sender) = &self.sender {
            if sender.send(open.into_zipkin(elapsed)).is_err() {
                tracing::warn!("Zipkin reporter stopped, dropping span");
            }
        }
    }
}

impl Drop for ZipkinTracer {
    fn drop(&mut self) {
        // Closing the channel makes the worker flush and exit
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Zipkin reporter thread panicked");
            }
        }
    }
}

fn run_reporter(
    client: Client,
    endpoint: Url,
    policy: BatchPolicy,
    receiver: Receiver<ZipkinSpan>,
) {
    let mut batch = Vec::with_capacity(policy.max_spans);
    // Set when the first span enters an empty batch
    let mut deadline: Option<Instant> = None;

    loop {
        let received = match deadline {
            Some(at) => {
                let wait = at.saturating_duration_since(Instant::now());
                receiver.recv_timeout(wait)
            }
            None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(span) => {
                if batch.is_empty() {
                    deadline = Some(Instant::now() + policy.interval);
                }
                batch.push(span);
                let expired = deadline.is_some_and(|at| Instant::now() >= at);
                if batch.len() >= policy.max_spans || expired {
                    post_batch(&client, &endpoint, &mut batch);
                    deadline = None;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                post_batch(&client, &endpoint, &mut batch);
                deadline = None;
            }
            Err(RecvTimeoutError::Disconnected) => {
                post_batch(&client, &endpoint, &mut batch);
                break;
            }
        }
    }
}

fn post_batch(client: &Client, endpoint: &Url, batch: &mut Vec<ZipkinSpan>) {
    if batch.is_empty() {
        return;
    }

    let body = match serde_json::to_vec(&batch) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("Failed to encode {} spans: {}", batch.len(), e);
            batch.clear();
            return;
        }
    };

    match client
        .post(endpoint.clone())
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
    {
        Ok(response) if response.status().is_success() => {
            tracing::debug!("Reported {} spans to Zipkin", batch.len());
        }
        Ok(response) => {
            tracing::warn!(
                "Zipkin collector rejected {} spans: HTTP {}",
                batch.len(),
                response.status()
            );
        }
        Err(e) => {
            tracing::warn!("Failed to report {} spans to Zipkin: {}", batch.len(), e);
        }
    }

    batch.clear();
}
