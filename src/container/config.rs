//! Container configuration and misuse diagnostics

use std::fmt::{Display, Formatter};

/// Describes how the container reacts to registration mistakes
/// that are usually caused by test setup ordering.
///
/// None of these is ever surfaced as an [`Error`](crate::error::Error):
/// the registration itself always behaves the same way regardless of the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostics {
    /// Panics once the registration has been applied.
    ///
    /// Default when `debug_assertions` are enabled.
    Panic,

    /// Emits a `tracing` warning if the `tracing` feature is enabled,
    /// otherwise does nothing.
    Warn,

    /// Does nothing.
    ///
    /// Default in release builds.
    Ignore,
}

impl Default for Diagnostics {
    #[inline]
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Panic
        } else {
            Self::Ignore
        }
    }
}

/// A registration mistake detected by the container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Misuse {
    /// `provide` was called twice for the same dependency
    ProvidedTwice,
    /// `provide` was called after the dependency had been resolved
    ProvidedAfterResolve,
    /// `mock` was called twice for the same dependency
    MockedTwice,
    /// `mock` was called after the real dependency had been resolved
    MockedAfterResolve,
}

impl Display for Misuse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Misuse::ProvidedTwice => f.write_str("dependency has already been provided"),
            Misuse::ProvidedAfterResolve => f.write_str("dependency has been provided after it was resolved"),
            Misuse::MockedTwice => f.write_str("an existing mock has been overwritten"),
            Misuse::MockedAfterResolve => f.write_str("dependency has been mocked after it was resolved"),
        }
    }
}

impl Diagnostics {
    /// Reports a misuse of the dependency `type_name`.
    ///
    /// Must be called without holding the entries lock.
    #[inline]
    pub(crate) fn report(self, misuse: Misuse, type_name: &'static str) {
        match self {
            Diagnostics::Panic => panic!("Dependency Misuse: {misuse}: {type_name}"),
            Diagnostics::Warn => {
                #[cfg(feature = "tracing")]
                tracing::warn!(dependency = type_name, "{misuse}");
                #[cfg(not(feature = "tracing"))]
                let _ = (misuse, type_name);
            }
            Diagnostics::Ignore => ()
        }
    }
}

/// Represents a container configuration
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainerConfig {
    /// Specifies how registration mistakes are reported
    ///
    /// Default: [`Diagnostics::Panic`] in debug builds, [`Diagnostics::Ignore`] in release builds
    pub(crate) diagnostics: Diagnostics,
}

impl ContainerConfig {
    /// Creates a default container configuration
    ///
    /// Defaults:
    /// - diagnostics: [`Diagnostics::Panic`] in debug builds, [`Diagnostics::Ignore`] otherwise
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures how registration mistakes are reported
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Returns the configured diagnostics mode
    #[inline]
    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }
}
