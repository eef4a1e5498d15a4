//! Invocation Dispatcher
//!
//! Orchestrates a batch of requested tool calls: permission check against
//! the session's allow-list, cache lookup, tool execution on miss
//! (bounded by a per-call timeout), cache store on success, result
//! formatting, and session history updates. Responses are returned
//! either aggregated or as an incremental event stream.
//!
//! Calls within a batch are independent and execute concurrently; one
//! call's failure never aborts its siblings. Session history is always
//! appended in request order, whatever the execution interleaving was.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::event::{DispatchEvent, StreamState};
use crate::format::{format_call_result, FormatMetadata, FormattedResult, OutputFormat};
use crate::single_flight::SingleFlight;
use toolgate_foundation::{
    CacheStats, Error, GateConfig, Message, Result, ResultCache, SessionStore, ToolCall, ToolResult,
};
use toolgate_tool::ToolRegistry;

// ============================================================================
// Request / Response
// ============================================================================

/// How a streaming dispatch exposes progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Emit each call's result as it completes
    Standard,

    /// Run the batch silently, emit one aggregated result
    Automatic,
}

impl Default for DispatchMode {
    fn default() -> Self {
        Self::Standard
    }
}

/// One dispatch request as handed over by the API layer
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Session to run under; absence creates a fresh one
    pub session_id: Option<String>,

    /// Requested calls, in order
    pub calls: Vec<ToolCall>,

    pub mode: DispatchMode,
    pub output_format: OutputFormat,

    /// Render the full success/data/error envelope instead of the bare
    /// payload
    pub include_metadata: bool,

    /// Emit standard-mode events in request order instead of completion
    /// order (for UI stability)
    pub ordered_events: bool,
}

impl DispatchRequest {
    pub fn new(calls: Vec<ToolCall>) -> Self {
        Self {
            session_id: None,
            calls,
            mode: DispatchMode::default(),
            output_format: OutputFormat::default(),
            include_metadata: false,
            ordered_events: false,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_metadata(mut self) -> Self {
        self.include_metadata = true;
        self
    }

    pub fn with_ordered_events(mut self) -> Self {
        self.ordered_events = true;
        self
    }
}

/// Aggregated (non-streaming) response
#[derive(Debug, Clone)]
pub struct DispatchResponse {
    pub session_id: String,

    /// Whether the session was created by this request
    pub session_created: bool,

    /// One entry per requested call, in request order
    pub results: Vec<FormattedResult>,
}

/// Dispatcher tuning knobs
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Per-call execution budget
    pub tool_timeout: Duration,

    /// Streaming event channel capacity
    pub event_buffer: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            tool_timeout: Duration::from_secs(5),
            event_buffer: 64,
        }
    }
}

impl DispatcherConfig {
    pub fn from_gate_config(config: &GateConfig) -> Self {
        Self {
            tool_timeout: config.dispatch.tool_timeout(),
            event_buffer: config.dispatch.event_buffer,
        }
    }
}

/// Outcome of one call before formatting
#[derive(Debug, Clone)]
struct CallOutcome {
    result: ToolResult,
    cached: bool,
}

// ============================================================================
// Dispatcher
// ============================================================================

/// The orchestration core
///
/// Every collaborator is injected, so independent dispatchers (and
/// tests) can hold isolated registries, caches and session stores.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    cache: Arc<ResultCache>,
    sessions: Arc<SessionStore>,
    single_flight: SingleFlight,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ToolRegistry>,
        cache: Arc<ResultCache>,
        sessions: Arc<SessionStore>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            registry,
            cache,
            sessions,
            single_flight: SingleFlight::new(),
            config,
        }
    }

    /// The session store, for permission management independent of
    /// dispatch
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// The tool registry backing this dispatcher
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Read-only cache observability snapshot
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // ========================================================================
    // Non-streaming dispatch
    // ========================================================================

    /// Run a batch to completion and return one aggregated response
    pub async fn dispatch(&self, request: &DispatchRequest) -> Result<DispatchResponse> {
        self.validate(request)?;

        let (session_id, session_created) = self
            .sessions
            .get_or_create(request.session_id.as_deref())
            .await;
        info!(
            session_id = %session_id,
            calls = request.calls.len(),
            mode = ?request.mode,
            "dispatching batch"
        );

        let results = self.run_batch(&session_id, request).await;
        Ok(DispatchResponse {
            session_id,
            session_created,
            results,
        })
    }

    // ========================================================================
    // Streaming dispatch
    // ========================================================================

    /// Run a batch, delivering progress as typed events over a channel
    ///
    /// The receiver is the transport's end; dropping it cancels event
    /// production (in-flight calls still run to completion so cache
    /// state stays correct).
    pub fn dispatch_stream(
        self: &Arc<Self>,
        request: DispatchRequest,
    ) -> mpsc::Receiver<DispatchEvent> {
        let (tx, rx) = mpsc::channel(self.config.event_buffer);
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            dispatcher.run_stream(request, tx).await;
        });
        rx
    }

    /// `dispatch_stream`, adapted to a `futures::Stream`
    pub fn event_stream(
        self: &Arc<Self>,
        request: DispatchRequest,
    ) -> impl Stream<Item = DispatchEvent> {
        let mut rx = self.dispatch_stream(request);
        async_stream::stream! {
            while let Some(event) = rx.recv().await {
                yield event;
            }
        }
    }

    async fn run_stream(self: Arc<Self>, request: DispatchRequest, tx: mpsc::Sender<DispatchEvent>) {
        let mut state = StreamState::Started;

        if let Err(e) = self.validate(&request) {
            // Batch-level error: reported before any execution begins
            let _ = tx
                .send(DispatchEvent::Error {
                    call_id: None,
                    message: e.to_string(),
                })
                .await;
            let _ = tx.send(DispatchEvent::Completed).await;
            return;
        }

        let (session_id, _) = self
            .sessions
            .get_or_create(request.session_id.as_deref())
            .await;

        if request.calls.is_empty() {
            state.advance(StreamState::Completed);
            let _ = tx.send(DispatchEvent::Completed).await;
            return;
        }

        if tx.send(DispatchEvent::CallStarted).await.is_err() {
            state.advance(StreamState::Aborted);
            debug!(session_id = %session_id, "stream receiver closed before start");
            return;
        }
        state.advance(StreamState::Dispatching);

        match request.mode {
            DispatchMode::Automatic => {
                // Batch granularity: the transport stays event-based but
                // individual call progress is intentionally hidden
                let results = self.run_batch(&session_id, &request).await;
                if tx
                    .send(DispatchEvent::AggregatedResult { results })
                    .await
                    .is_err()
                {
                    state.advance(StreamState::Aborted);
                    return;
                }
            }
            DispatchMode::Standard => {
                self.run_standard_stream(&session_id, &request, &tx, &mut state)
                    .await;
                if state.is_terminal() {
                    return;
                }
            }
        }

        state.advance(StreamState::Completed);
        let _ = tx.send(DispatchEvent::Completed).await;
    }

    /// Standard sub-mode: per-call events in completion order (or
    /// request order when the caller asked for it)
    async fn run_standard_stream(
        self: &Arc<Self>,
        session_id: &str,
        request: &DispatchRequest,
        tx: &mpsc::Sender<DispatchEvent>,
        state: &mut StreamState,
    ) {
        let call_count = request.calls.len();
        let (done_tx, mut done_rx) = mpsc::channel::<(usize, CallOutcome)>(call_count);

        for (index, call) in request.calls.iter().cloned().enumerate() {
            let dispatcher = Arc::clone(self);
            let session_id = session_id.to_string();
            let done_tx = done_tx.clone();
            tokio::spawn(async move {
                let outcome = dispatcher.run_call(&session_id, &call).await;
                let _ = done_tx.send((index, outcome)).await;
            });
        }
        drop(done_tx);

        // Completed-but-not-yet-recorded calls, keyed by request index.
        // History must follow request order even though execution does
        // not, so entries wait here until their prefix is done.
        let mut pending: BTreeMap<usize, (DispatchEvent, String)> = BTreeMap::new();
        let mut next_in_order = 0usize;

        while let Some((index, outcome)) = done_rx.recv().await {
            let call = &request.calls[index];
            let (event, history_text) = match self.render(call, &outcome, request) {
                Ok(formatted) => {
                    let text = formatted.formatted.clone();
                    (DispatchEvent::Result { result: formatted }, text)
                }
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "result rendering failed");
                    let message = e.to_string();
                    (
                        DispatchEvent::Error {
                            call_id: Some(call.id.clone()),
                            message: message.clone(),
                        },
                        message,
                    )
                }
            };

            if !request.ordered_events && !state.is_terminal() {
                if tx.send(event.clone()).await.is_err() {
                    state.advance(StreamState::Aborted);
                    debug!(session_id, "stream receiver closed mid-dispatch");
                }
            }
            pending.insert(index, (event, history_text));

            while let Some((event, history_text)) = pending.remove(&next_in_order) {
                let call = &request.calls[next_in_order];
                self.record_call(session_id, call, &history_text).await;
                if request.ordered_events && !state.is_terminal() {
                    if tx.send(event).await.is_err() {
                        state.advance(StreamState::Aborted);
                        debug!(session_id, "stream receiver closed mid-dispatch");
                    }
                }
                next_in_order += 1;
            }
        }
    }

    // ========================================================================
    // Batch internals
    // ========================================================================

    /// Execute every call concurrently, then format and record results
    /// in request order
    async fn run_batch(&self, session_id: &str, request: &DispatchRequest) -> Vec<FormattedResult> {
        let outcomes = join_all(
            request
                .calls
                .iter()
                .map(|call| self.run_call(session_id, call)),
        )
        .await;

        let mut results = Vec::with_capacity(outcomes.len());
        for (call, outcome) in request.calls.iter().zip(outcomes.iter()) {
            let formatted = match self.render(call, outcome, request) {
                Ok(f) => f,
                Err(e) => {
                    // Formatting failure is per-call: siblings still render
                    warn!(tool = %call.name, error = %e, "result rendering failed");
                    Self::formatting_fallback(call, outcome.cached, request.output_format, &e)
                }
            };
            self.record_call(session_id, call, &formatted.formatted).await;
            results.push(formatted);
        }
        results
    }

    /// The per-call pipeline: permission, cache, execute, store
    async fn run_call(&self, session_id: &str, call: &ToolCall) -> CallOutcome {
        let allowed = match self.sessions.is_allowed(session_id, &call.name).await {
            Ok(allowed) => allowed,
            Err(_) => {
                // Session swept mid-flight; recreate and re-ask so the
                // race degrades to a fresh-session default, not an error
                self.sessions.get_or_create(Some(session_id)).await;
                self.sessions
                    .is_allowed(session_id, &call.name)
                    .await
                    .unwrap_or(false)
            }
        };
        if !allowed {
            debug!(session_id, tool = %call.name, "permission denied");
            return CallOutcome {
                result: ToolResult::fail(format!(
                    "Permission denied: tool '{}' is not allowed for this session",
                    call.name
                )),
                cached: false,
            };
        }

        if let Some(hit) = self.cache.lookup(&call.name, &call.arguments) {
            return CallOutcome {
                result: hit,
                cached: true,
            };
        }

        // Hold the per-fingerprint guard across execute-and-store so
        // concurrent identical calls wait and then hit the cache
        let key = toolgate_foundation::CacheKey::new(&call.name, &call.arguments);
        let _guard = self.single_flight.guard(&key).await;

        if let Some(hit) = self.cache.lookup(&call.name, &call.arguments) {
            return CallOutcome {
                result: hit,
                cached: true,
            };
        }

        let result = match tokio::time::timeout(
            self.config.tool_timeout,
            self.registry.execute(&call.name, call.arguments.clone()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(tool = %call.name, timeout_secs = self.config.tool_timeout.as_secs(), "tool timed out");
                ToolResult::fail(format!(
                    "Tool '{}' timed out after {}s",
                    call.name,
                    self.config.tool_timeout.as_secs()
                ))
            }
        };

        if result.success {
            self.cache.store(&call.name, &call.arguments, &result);
        }

        CallOutcome {
            result,
            cached: false,
        }
    }

    fn render(
        &self,
        call: &ToolCall,
        outcome: &CallOutcome,
        request: &DispatchRequest,
    ) -> Result<FormattedResult> {
        format_call_result(
            &call.name,
            &outcome.result,
            outcome.cached,
            request.output_format,
            request.include_metadata,
        )
    }

    /// Failure-shaped entry for a call whose result could not be rendered
    fn formatting_fallback(
        call: &ToolCall,
        cached: bool,
        format: OutputFormat,
        error: &Error,
    ) -> FormattedResult {
        let failure = ToolResult::fail(format!("Formatting error: {}", error));
        FormattedResult {
            result: serde_json::to_value(&failure).unwrap_or(Value::Null),
            formatted: failure.error_message().to_string(),
            metadata: FormatMetadata {
                tool_name: call.name.clone(),
                cached,
                format,
                timestamp: Utc::now(),
            },
        }
    }

    /// Append the call and its rendered result to the session history
    ///
    /// A vanished session (swept mid-flight) loses its history; that is
    /// the documented resolution of the sweep race, not an error.
    async fn record_call(&self, session_id: &str, call: &ToolCall, rendered: &str) {
        let announce = Message::assistant_call(call.clone());
        let reply = Message::tool_result(call.clone(), rendered.to_string());

        if let Err(e) = self.sessions.append_message(session_id, announce).await {
            debug!(session_id, error = %e, "history append skipped");
            return;
        }
        if let Err(e) = self.sessions.append_message(session_id, reply).await {
            debug!(session_id, error = %e, "history append skipped");
        }
    }

    /// Batch-level validation; failures abort before any execution
    fn validate(&self, request: &DispatchRequest) -> Result<()> {
        let mut seen = HashSet::new();
        for call in &request.calls {
            if call.name.trim().is_empty() {
                return Err(Error::InvalidInput("call with empty tool name".into()));
            }
            if !seen.insert(call.id.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "duplicate call id: {}",
                    call.id
                )));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Permission passthroughs (callable independent of dispatch)
    // ========================================================================

    pub async fn allow(&self, session_id: &str, tool_name: &str) -> Result<()> {
        self.sessions.allow(session_id, tool_name).await
    }

    pub async fn disallow(&self, session_id: &str, tool_name: &str) -> Result<()> {
        self.sessions.disallow(session_id, tool_name).await
    }

    pub async fn reset_permissions(&self, session_id: &str) -> Result<()> {
        self.sessions.reset_permissions(session_id).await
    }
}
