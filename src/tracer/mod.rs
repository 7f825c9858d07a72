//! Tracing backends for transaction spans.
//!
//! The correlator talks to a `Tracer` only through the four operations
//! below, so the backend can be swapped for a no-op, an in-memory
//! recorder, or the Zipkin HTTP exporter without touching decode logic.

mod noop;
mod recording;
mod zipkin;

pub use noop::NoopTracer;
pub use recording::{RecordedSpan, RecordingTracer};
pub use zipkin::{parse_endpoint, ZipkinTracer, DEFAULT_ZIPKIN_ENDPOINT, SERVICE_NAME};

/// Identifies a span and the trace it belongs to.
///
/// Handles stay valid after the span is finished, so a finished root
/// can still parent later child spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpanContext {
    pub trace_id: u128,
    pub span_id: u64,
}

/// Capability surface of a tracing backend.
pub trait Tracer: Send {
    /// Start a span with no parent, carrying the given tags.
    fn start_root_span(&mut self, name: &str, tags: &[(&str, &str)]) -> SpanContext;

    /// Start a span parented to `parent`.
    fn start_child_span(&mut self, name: &str, parent: SpanContext) -> SpanContext;

    /// Set a tag on an open span. Setting an existing key replaces it.
    fn set_tag(&mut self, span: SpanContext, key: &str, value: &str);

    /// Finish a span. Finishing an already finished span is a no-op.
    fn finish(&mut self, span: SpanContext);
}

impl<T: Tracer + ?Sized> Tracer for Box<T> {
    fn start_root_span(&mut self, name: &str, tags: &[(&str, &str)]) -> SpanContext {
        (**self).start_root_span(name, tags)
    }

    fn start_child_span(&mut self, name: &str, parent: SpanContext) -> SpanContext {
        (**self).start_child_span(name, parent)
    }

    fn set_tag(&mut self, span: SpanContext, key: &str, value: &str) {
        (**self).set_tag(span, key, value)
    }

    fn finish(&mut self, span: SpanContext) {
        (**self).finish(span)
    }
}
