//! Typed job API: payloads, handlers, registry and the per-job context.

pub mod context;
pub mod handler;
pub mod payload;
pub mod registry;

pub use self::context::JobContext;
pub use self::handler::{DynHandler, Handler, TypedHandler};
pub use self::payload::JobPayload;
pub use self::registry::{HandlerRegistry, RegistryError};
