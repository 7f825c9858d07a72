//! In-memory tracer.

use super::{SpanContext, Tracer};

/// A span captured by [`RecordingTracer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSpan {
    pub context: SpanContext,
    pub parent: Option<SpanContext>,
    pub name: String,
    /// Tags in first-set order
    pub tags: Vec<(String, String)>,
    /// How many times `finish` was called on this span
    pub finish_count: usize,
}

impl RecordedSpan {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_finished(&self) -> bool {
        self.finish_count > 0
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Keeps every span in memory, in creation order.
///
/// Unlike the exporting tracers it counts repeated `finish` calls
/// instead of ignoring them, which makes double finishes observable.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    spans: Vec<RecordedSpan>,
    next_trace_id: u128,
    next_span_id: u64,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All spans, in creation order.
    pub fn spans(&self) -> &[RecordedSpan] {
        &self.spans
    }

    pub fn span(&self, context: SpanContext) -> Option<&RecordedSpan> {
        self.spans.iter().find(|span| span.context == context)
    }

    pub fn roots(&self) -> impl Iterator<Item = &RecordedSpan> {
        self.spans.iter().filter(|span| span.is_root())
    }

    pub fn children_of(&self, parent: SpanContext) -> impl Iterator<Item = &RecordedSpan> {
        self.spans
            .iter()
            .filter(move |span| span.parent == Some(parent))
    }

    fn span_mut(&mut self, context: SpanContext) -> Option<&mut RecordedSpan> {
        self.spans.iter_mut().find(|span| span.context == context)
    }

    fn push(&mut self, trace_id: u128, parent: Option<SpanContext>, name: &str) -> SpanContext {
        self.next_span_id += 1;
        let context = SpanContext {
            trace_id,
            span_id: self.next_span_id,
        };
        self.spans.push(RecordedSpan {
            context,
            parent,
            name: name.to_string(),
            tags: Vec::new(),
            finish_count: 0,
        });
        context
    }
}

impl Tracer for RecordingTracer {
    fn start_root_span(&mut self, name: &str, tags: &[(&str, &str)]) -> SpanContext {
        self.next_trace_id += 1;
        let context = self.push(self.next_trace_id, None, name);
        for (key, value) in tags {
            self.set_tag(context, key, value);
        }
        context
    }

    fn start_child_span(&mut self, name: &str, parent: SpanContext) -> SpanContext {
        self.push(parent.trace_id, Some(parent), name)
    }

    fn set_tag(&mut self, span: SpanContext, key: &str, value: &str) {
        let Some(span) = self.span_mut(span) else {
            return;
        };
        match span.tags.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => span.tags.push((key.to_string(), value.to_string())),
        }
    }

    fn finish(&mut self, span: SpanContext) {
        if let Some(span) = self.span_mut(span) {
            span.finish_count += 1;
        }
    }
}
