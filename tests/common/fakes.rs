//! Scripted collaborators for the remote-call client, the batch orchestrator
//! and the auto-save controller

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use post_planner::autosave::{SaveError, SaveHandler};
use post_planner::client::{Credential, RemoteTransport};
use post_planner::models::{GeneratePostRequest, GeneratePostResponse, Platform, VersionToken};
use post_planner::orchestration::PostGenerator;
use post_planner::resilience::{ClassifiedError, ErrorKind, RawFailure};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use super::builders::post_response;

/// One scripted transport reply
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Value),
    Fail(RawFailure),
    /// Wait, then answer with the inner reply
    Delayed(Duration, Box<Reply>),
    /// Never answer
    Hang,
}

#[derive(Debug, Clone)]
pub struct Invocation {
    pub operation: String,
    pub payload: Value,
    pub token: String,
    pub at: Instant,
}

/// Transport answering from a script, then from a fallback reply
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    invocations: Mutex<Vec<Invocation>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: Reply::Fail(RawFailure::new("script exhausted")),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: Reply) -> Self {
        Self {
            fallback: reply,
            ..Self::new(Vec::new())
        }
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.invocations.lock().len()
    }
}

#[async_trait]
impl RemoteTransport for ScriptedTransport {
    async fn invoke(
        &self,
        operation: &str,
        payload: &Value,
        credential: &Credential,
    ) -> Result<Value, RawFailure> {
        self.invocations.lock().push(Invocation {
            operation: operation.to_string(),
            payload: payload.clone(),
            token: credential.access_token().to_string(),
            at: Instant::now(),
        });

        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        resolve(reply).await
    }

    fn transport_name(&self) -> &'static str {
        "scripted"
    }
}

async fn resolve(mut reply: Reply) -> Result<Value, RawFailure> {
    loop {
        match reply {
            Reply::Ok(value) => return Ok(value),
            Reply::Fail(failure) => return Err(failure),
            Reply::Delayed(delay, next) => {
                tokio::time::sleep(delay).await;
                reply = *next;
            }
            Reply::Hang => return std::future::pending().await,
        }
    }
}

type GenerateScript =
    dyn Fn(&GeneratePostRequest, usize) -> Result<GeneratePostResponse, ClassifiedError>
        + Send
        + Sync;

type CallHook = Box<dyn Fn(usize) + Send + Sync>;

/// Post generator driven by a closure over the request and the 1-based call
/// number
pub struct ScriptedGenerator {
    script: Box<GenerateScript>,
    delay: Duration,
    calls: Mutex<Vec<GeneratePostRequest>>,
    on_call: Mutex<Option<CallHook>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(
        script: impl Fn(&GeneratePostRequest, usize) -> Result<GeneratePostResponse, ClassifiedError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            on_call: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(|request, _| Ok(post_response(request)))
    }

    /// Fails every request for `platform` with a server error
    pub fn failing_on(platform: Platform) -> Self {
        Self::new(move |request, _| {
            if request.platform == platform {
                Err(ClassifiedError::new(ErrorKind::ApiError, "Service unavailable"))
            } else {
                Ok(post_response(request))
            }
        })
    }

    pub fn failing() -> Self {
        Self::new(|_, _| Err(ClassifiedError::from_kind(ErrorKind::QuotaExceeded)))
    }

    /// Each request takes `delay` of (virtual) time
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Run `hook` with the call number as each request arrives
    pub fn on_call(&self, hook: impl Fn(usize) + Send + Sync + 'static) {
        *self.on_call.lock() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> Vec<GeneratePostRequest> {
        self.calls.lock().clone()
    }

    /// Highest number of requests that were ever in flight together
    pub fn max_concurrent(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PostGenerator for ScriptedGenerator {
    async fn generate_post(
        &self,
        request: GeneratePostRequest,
    ) -> Result<GeneratePostResponse, ClassifiedError> {
        let call_number = {
            let mut calls = self.calls.lock();
            calls.push(request.clone());
            calls.len()
        };

        if let Some(hook) = self.on_call.lock().as_ref() {
            hook(call_number);
        }

        let concurrent = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(concurrent, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.script)(&request, call_number)
    }
}

/// What the save handler answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Succeed,
    Conflict,
    Fail,
    NoVersion,
}

#[derive(Debug, Clone)]
pub struct RecordedSave {
    pub data: String,
    pub expected: Option<VersionToken>,
    pub at: Instant,
}

/// Save handler keeping its own server revision and a log of every save
pub struct RecordingSaveHandler {
    mode: Mutex<SaveMode>,
    latency: Duration,
    server: Mutex<VersionToken>,
    saves: Mutex<Vec<RecordedSave>>,
}

impl RecordingSaveHandler {
    pub fn new() -> Self {
        Self {
            mode: Mutex::new(SaveMode::Succeed),
            latency: Duration::ZERO,
            server: Mutex::new(VersionToken::initial(Utc::now())),
            saves: Mutex::new(Vec::new()),
        }
    }

    /// Each save takes `latency` of (virtual) time
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_mode(&self, mode: SaveMode) {
        *self.mode.lock() = mode;
    }

    pub fn server_version(&self) -> VersionToken {
        *self.server.lock()
    }

    /// Simulate a write from another session
    pub fn bump_remotely(&self) -> VersionToken {
        let mut server = self.server.lock();
        *server = server.next(Utc::now());
        *server
    }

    pub fn saves(&self) -> Vec<RecordedSave> {
        self.saves.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().len()
    }
}

#[async_trait]
impl SaveHandler<String> for RecordingSaveHandler {
    async fn save(
        &self,
        data: &String,
        expected: Option<&VersionToken>,
    ) -> Result<Option<VersionToken>, SaveError> {
        self.saves.lock().push(RecordedSave {
            data: data.clone(),
            expected: expected.copied(),
            at: Instant::now(),
        });

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mode = *self.mode.lock();
        match mode {
            SaveMode::Succeed => Ok(Some(self.bump_remotely())),
            SaveMode::Conflict => Err(SaveError::Conflict(
                "The post was modified in another session".to_string(),
            )),
            SaveMode::Fail => Err(SaveError::Failed("Network unreachable".to_string())),
            SaveMode::NoVersion => Ok(None),
        }
    }
}
