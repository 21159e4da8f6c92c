//! # HypoSpray
//!
//! > A minimal dependency injection container: provide builders upfront,
//! > resolve shared instances once, and swap them for mocks in tests.
//!
//! ## Features
//! * Strong dependencies, that must be provided before they are resolved
//! * Lazy dependencies, that build themselves with [`Default`]
//! * Builders run at most once, even under concurrent resolution
//! * Trait objects as contracts (`dyn Logger` bound to `ConsoleLogger`)
//! * Mocks that always win over real registrations
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use hypospray::{Container, LazyInject, StrongInject, lazy, strong};
//!
//! trait Logger: Send + Sync {
//!     fn prefix(&self) -> &'static str;
//! }
//!
//! struct ConsoleLogger;
//!
//! impl Logger for ConsoleLogger {
//!     fn prefix(&self) -> &'static str {
//!         "console"
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Clock {
//!     ticks: u64
//! }
//!
//! strong! { dyn Logger }
//! lazy! { Clock }
//!
//! let container = Container::new();
//! container.provide::<dyn Logger, _>(|| Arc::new(ConsoleLogger));
//!
//! let logger = StrongInject::<dyn Logger>::from_container(&container);
//! let clock = LazyInject::<Clock>::from_container(&container);
//!
//! assert_eq!(logger.prefix(), "console");
//! assert_eq!(clock.ticks, 0);
//! ```

pub use crate::{
    container::{Container, ContainerConfig, Diagnostics},
    dependency::{Dependency, LazyDependency, StrongDependency, kind},
    global::{global, mock, provide, reset},
    inject::{LazyInject, StrongInject},
};

pub mod error;
pub mod container;
pub mod dependency;
pub mod global;
pub mod inject;
