//! # Mutation Bindings
//!
//! Ties domain mutations (file create/update/delete, session touch, stats
//! recompute) to cache invalidation without coupling mutation code to cache
//! internals. A binding is configured once with an event type, key templates,
//! and a strategy; after the wrapped mutation succeeds, the templates are
//! resolved against the call's declared arguments and submitted to the
//! invalidation manager. A mutation that fails emits nothing.
//!
//! Placeholder resolution is statically declared: the caller supplies the
//! argument names alongside their values in [`MutationArgs`], named values
//! checked first with declared positional parameters as the fallback. There
//! is no runtime signature introspection.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{CacheCoreError, Result};
use crate::invalidation::{
    CacheEventType, InvalidationEvent, InvalidationManager, InvalidationStrategy,
};

/// A key template with `{placeholder}` segments resolved from mutation
/// arguments, e.g. `file:meta:{file_id}`.
#[derive(Debug, Clone)]
pub struct KeyTemplate {
    template: String,
    placeholders: Vec<String>,
}

impl KeyTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let placeholders = parse_placeholders(&template);
        Self {
            template,
            placeholders,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Resolve every placeholder against the declared arguments.
    ///
    /// A placeholder absent from the arguments makes the whole template
    /// malformed; the caller decides whether to skip it.
    pub fn resolve(&self, args: &MutationArgs) -> Result<String> {
        let mut resolved = self.template.clone();
        for placeholder in &self.placeholders {
            match args.lookup(placeholder) {
                Some(value) => {
                    resolved = resolved.replace(&format!("{{{placeholder}}}"), value);
                }
                None => {
                    return Err(CacheCoreError::malformed_template(
                        &self.template,
                        placeholder,
                    ));
                }
            }
        }
        Ok(resolved)
    }
}

fn parse_placeholders(template: &str) -> Vec<String> {
    let mut placeholders = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                if !name.is_empty() {
                    placeholders.push(name.to_string());
                }
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    placeholders
}

/// Explicitly declared arguments of one wrapped mutation call.
///
/// `named` models keyword arguments; `positional` carries the wrapped
/// function's declared parameter names in order, paired with the values the
/// call received. Lookup checks named arguments first and falls back to the
/// positional declarations.
#[derive(Debug, Clone, Default)]
pub struct MutationArgs {
    named: HashMap<String, String>,
    positional: Vec<(String, String)>,
}

impl MutationArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.named.insert(name.into(), value.to_string());
        self
    }

    pub fn positional(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.positional.push((name.into(), value.to_string()));
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.named
            .get(name)
            .map(String::as_str)
            .or_else(|| {
                self.positional
                    .iter()
                    .find(|(declared, _)| declared == name)
                    .map(|(_, value)| value.as_str())
            })
    }
}

/// Binding between one domain mutation and its cache invalidation.
#[derive(Debug, Clone)]
pub struct MutationBinding {
    event_type: CacheEventType,
    templates: Vec<KeyTemplate>,
    strategy: InvalidationStrategy,
    metadata: HashMap<String, String>,
}

impl MutationBinding {
    pub fn new(
        event_type: CacheEventType,
        templates: Vec<KeyTemplate>,
        strategy: InvalidationStrategy,
    ) -> Self {
        Self {
            event_type,
            templates,
            strategy,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Everything related to one file: metadata, content, stats wildcard, and
    /// access entries, so call sites need not enumerate them.
    pub fn for_file(event_type: CacheEventType) -> Self {
        Self::new(
            event_type,
            vec![
                KeyTemplate::new("file:meta:{file_id}"),
                KeyTemplate::new("file:content:{file_id}"),
                KeyTemplate::new("file:stats:{file_id}:*"),
                KeyTemplate::new("file:access:{file_id}"),
            ],
            InvalidationStrategy::PatternBased,
        )
    }

    /// Everything related to one user: profile, session, files wildcard, and
    /// stats entries.
    pub fn for_user(event_type: CacheEventType) -> Self {
        Self::new(
            event_type,
            vec![
                KeyTemplate::new("user:profile:{user_id}"),
                KeyTemplate::new("user:session:{user_id}"),
                KeyTemplate::new("user:files:{user_id}:*"),
                KeyTemplate::new("user:stats:{user_id}"),
            ],
            InvalidationStrategy::PatternBased,
        )
    }

    pub fn event_type(&self) -> CacheEventType {
        self.event_type
    }

    pub fn strategy(&self) -> InvalidationStrategy {
        self.strategy
    }

    /// Resolve all templates against the declared arguments.
    ///
    /// A template whose placeholder is missing is skipped with a warning;
    /// the remaining templates still resolve.
    pub fn resolve_keys(&self, args: &MutationArgs) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.templates.len());
        for template in &self.templates {
            match template.resolve(args) {
                Ok(key) => keys.push(key),
                Err(error) => {
                    warn!(
                        template = template.template(),
                        error = %error,
                        "Skipping unresolvable key template"
                    );
                }
            }
        }
        keys
    }

    /// Run a mutation and submit invalidation only if it succeeds.
    ///
    /// Immediate-strategy invalidation is awaited inline, guaranteeing
    /// read-after-write consistency for the common case; the other strategies
    /// are queued for the background worker and tolerate eventual
    /// consistency. The mutation's own result passes through untouched.
    pub async fn run<F, T, E>(
        &self,
        manager: &InvalidationManager,
        args: &MutationArgs,
        mutation: F,
    ) -> std::result::Result<T, E>
    where
        F: Future<Output = std::result::Result<T, E>>,
    {
        let result = mutation.await;
        if result.is_ok() {
            self.apply(manager, args).await;
        }
        result
    }

    /// Resolve and submit without wrapping a mutation (for call sites that
    /// already know the mutation succeeded).
    pub async fn apply(&self, manager: &InvalidationManager, args: &MutationArgs) {
        let keys = self.resolve_keys(args);
        if keys.is_empty() {
            debug!(
                event_type = self.event_type.name(),
                "No key template resolved - nothing to invalidate"
            );
            return;
        }

        let event = InvalidationEvent::new(self.event_type, keys, self.strategy)
            .with_metadata(self.metadata.clone());

        match self.strategy {
            InvalidationStrategy::Immediate => {
                manager.invalidate_now(&event).await;
            }
            _ => manager.submit(event),
        }
    }
}

/// Producer half of the supervised fire-and-forget channel.
///
/// Non-async call sites submit through this handle instead of spawning
/// detached tasks: the channel is consumed by one supervised task owned by
/// the composition root, so outstanding work is never silently lost and
/// shutdown drains or discards deterministically.
#[derive(Debug, Clone)]
pub struct InvalidationHandle {
    sender: mpsc::Sender<InvalidationEvent>,
}

impl InvalidationHandle {
    /// Submit an event without awaiting. Returns `false` when the channel is
    /// full or closed; the event is dropped after a warning, mirroring the
    /// queue's shed-oldest posture.
    pub fn submit(&self, event: InvalidationEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(
                    event_id = %event.id,
                    event_type = event.event_type.name(),
                    "Submission channel full - dropping invalidation event"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                warn!(
                    event_id = %event.id,
                    event_type = event.event_type.name(),
                    "Submission channel closed - dropping invalidation event"
                );
                false
            }
        }
    }
}

/// Create the submission channel without spawning its consumer.
///
/// The receiver is handed to [`spawn_submission_consumer`] once a runtime is
/// available; splitting the two keeps construction synchronous.
pub(crate) fn submission_channel(
    capacity: usize,
) -> (InvalidationHandle, mpsc::Receiver<InvalidationEvent>) {
    let (sender, receiver) = mpsc::channel(capacity);
    (InvalidationHandle { sender }, receiver)
}

/// Spawn the single consumer task that forwards channel submissions into the
/// manager's queue.
pub(crate) fn spawn_submission_consumer(
    manager: Arc<InvalidationManager>,
    mut receiver: mpsc::Receiver<InvalidationEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            manager.submit(event);
        }
        debug!("Submission channel closed - consumer exiting");
    })
}
