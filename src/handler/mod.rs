//! Handler module - services, method tables and the registry.
//!
//! Provides:
//! - [`RpcService`] - implemented by receiver types to list their methods
//! - [`Service`] / [`MethodType`] - a receiver and its invocable methods
//! - [`ServiceRegistry`] - maps `Service.Method` names to methods
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use simrpc::handler::{MethodTable, RpcService, ServiceRegistry};
//!
//! struct Echo;
//!
//! impl RpcService for Echo {
//!     fn register_methods(methods: &mut MethodTable<Self>) {
//!         methods.method("Say", |_: Arc<Echo>, text: String| async move {
//!             Ok::<_, String>(text)
//!         });
//!     }
//! }
//!
//! let registry = ServiceRegistry::new();
//! registry.register(Echo).unwrap();
//! assert!(registry.lookup("Echo.Say").is_ok());
//! assert!(registry.register(Echo).is_err());
//! ```

mod registry;
mod service;

pub use registry::ServiceRegistry;
pub use service::{
    Argv, BoxFuture, MethodResult, MethodTable, MethodType, Receiver, ReplyValue, Replyv,
    RpcService, Service,
};
