//! Captured-failure storage and best-effort reconstruction.
//!
//! A failed job stores its exception as three plain text fields (class name,
//! message, trace) so the record stays inspectable long after the failing
//! process exited. Reconstructing a live error value from the stored class
//! name is inherently unreliable in the observing process, so it is a lookup
//! into a registry of known failure kinds rather than reflection.

use std::collections::HashMap;
use std::error::Error;

/// The stored failure fields of a record, verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedException {
    /// Fully-qualified type name of the failure
    pub class: String,
    pub message: Option<String>,
    /// Full serialized trace
    pub trace: Option<String>,
}

/// Builds an error value for one failure kind from the stored class name and
/// message.
pub type ExceptionFactory = fn(&str, Option<&str>) -> Box<dyn Error + Send + Sync>;

/// Maps stored exception class names to factories for the failure kinds this
/// process knows how to materialize. Extensible; an empty registry simply
/// reconstructs nothing.
#[derive(Default)]
pub struct ExceptionRegistry {
    factories: HashMap<String, ExceptionFactory>,
}

impl ExceptionRegistry {
    pub fn new() -> Self {
        Self { factories: HashMap::new() }
    }

    /// Registers a factory for a failure kind. A later registration for the
    /// same class name replaces the earlier one.
    pub fn register(&mut self, class: impl Into<String>, factory: ExceptionFactory) {
        self.factories.insert(class.into(), factory);
    }

    /// Registers the generic reconstruction for a class name: a
    /// [`ReconstructedException`] carrying the class and stored message.
    pub fn register_generic(&mut self, class: impl Into<String>) {
        self.register(class, |class, message| {
            Box::new(ReconstructedException { class: class.to_string(), message: message.map(str::to_string) })
        });
    }

    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    pub(crate) fn instantiate(&self, class: &str, message: Option<&str>) -> Option<Box<dyn Error + Send + Sync>> {
        self.factories.get(class).map(|factory| factory(class, message))
    }
}

/// Generic stand-in for a failure kind with no richer registered type:
/// displays as `class: message`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{class}{}", message_suffix(.message))]
pub struct ReconstructedException {
    pub class: String,
    pub message: Option<String>,
}

fn message_suffix(message: &Option<String>) -> String {
    match message {
        Some(message) => format!(": {}", message),
        None => String::new(),
    }
}
