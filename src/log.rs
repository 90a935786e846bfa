//! Injected logging capability.
//!
//! Components that report diagnostics take a `Logger` instead of writing to a
//! process-wide sink. The default is [`NoopLogger`].

use std::fmt;

use auto_impl::auto_impl;

#[auto_impl(&, Box, Arc)]
pub trait Logger: Send + Sync {
    fn error(&self, message: &dyn fmt::Display);
}

/// Discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn error(&self, _message: &dyn fmt::Display) {}
}

/// Forwards messages to `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn error(&self, message: &dyn fmt::Display) {
        tracing::error!(target: "mysql_binrow", "{message}");
    }
}
