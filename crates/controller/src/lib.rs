pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod desired;
pub mod metrics;
pub mod reconciler;
pub mod remote;
pub mod resolver;
pub mod run;
pub mod shutdown;
pub mod test_support;

pub use cache::RemoteCache;
pub use reconciler::{ApplyError, IterationError, IterationReport, Reconciler};
pub use resolver::{DefaultActionBinding, DefaultActionResolver, ResolveError};
