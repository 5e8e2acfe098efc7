//! Services and their method tables.
//!
//! A receiver type implements [`RpcService`] and lists its methods in a
//! [`MethodTable`]. Each entry becomes a [`MethodType`] that knows how to
//! decode a fresh argument value from a request body and how to invoke the
//! method on the receiver.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde::{Deserialize, Serialize};
//! use simrpc::handler::{MethodTable, RpcService, Service};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Args {
//!     num1: i64,
//!     num2: i64,
//! }
//!
//! struct Foo;
//!
//! impl RpcService for Foo {
//!     fn register_methods(methods: &mut MethodTable<Self>) {
//!         methods.method("Sum", |_foo: Arc<Foo>, args: Args| async move {
//!             Ok::<_, String>(args.num1 + args.num2)
//!         });
//!     }
//! }
//!
//! let service = Service::new(Foo);
//! assert_eq!(service.name(), "Foo");
//! assert!(service.method("Sum").is_some());
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::CodecType;
use crate::error::Result;

/// Boxed future for method results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Type-erased receiver object.
pub type Receiver = Arc<dyn Any + Send + Sync>;

/// Type-erased, freshly decoded argument value.
pub type Argv = Box<dyn Any + Send>;

/// Type-erased reply value.
pub type Replyv = Box<dyn ReplyValue>;

/// Outcome of one invocation; the error is the message sent to the caller.
pub type MethodResult = std::result::Result<Replyv, String>;

/// A reply value that can be encoded with whichever codec was negotiated.
pub trait ReplyValue: Send {
    /// Encode the reply body.
    fn encode(&self, codec: CodecType) -> Result<Vec<u8>>;
}

impl<T: Serialize + Send> ReplyValue for T {
    fn encode(&self, codec: CodecType) -> Result<Vec<u8>> {
        codec.encode(self)
    }
}

/// A receiver that exposes methods over RPC.
pub trait RpcService: Send + Sync + Sized + 'static {
    /// Name used in `Service.Method`. Defaults to the unqualified type name.
    fn service_name(&self) -> String {
        short_type_name::<Self>().to_string()
    }

    /// Add this receiver's methods to the table.
    fn register_methods(methods: &mut MethodTable<Self>);
}

/// Strip module path and generic parameters from a type name.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Only names starting with an ASCII uppercase letter and free of `.`
/// are callable.
fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) && !name.contains('.')
}

trait Handler: Send + Sync + 'static {
    fn new_argv(&self, codec: CodecType, body: &[u8]) -> Result<Argv>;

    fn call(&self, receiver: Receiver, argv: Argv) -> BoxFuture<'static, MethodResult>;
}

struct TypedHandler<S, A, F, Fut> {
    handler: F,
    _phantom: PhantomData<fn(Arc<S>, A) -> Fut>,
}

impl<S, A, F, Fut, R, E> Handler for TypedHandler<S, A, F, Fut>
where
    S: Send + Sync + 'static,
    A: DeserializeOwned + Send + 'static,
    F: Fn(Arc<S>, A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<R, E>> + Send + 'static,
    R: Serialize + Send + 'static,
    E: Display,
{
    fn new_argv(&self, codec: CodecType, body: &[u8]) -> Result<Argv> {
        let argv: A = codec.decode(body)?;
        Ok(Box::new(argv))
    }

    fn call(&self, receiver: Receiver, argv: Argv) -> BoxFuture<'static, MethodResult> {
        let receiver = match receiver.downcast::<S>() {
            Ok(r) => r,
            Err(_) => {
                return Box::pin(async {
                    Err::<Replyv, _>("rpc server: receiver type mismatch".to_string())
                })
            }
        };
        let argv = match argv.downcast::<A>() {
            Ok(a) => *a,
            Err(_) => {
                return Box::pin(async {
                    Err::<Replyv, _>("rpc server: argument type mismatch".to_string())
                })
            }
        };

        let fut = (self.handler)(receiver, argv);
        Box::pin(async move {
            match fut.await {
                Ok(reply) => Ok(Box::new(reply) as Replyv),
                Err(e) => Err(e.to_string()),
            }
        })
    }
}

/// One invocable method of a service.
pub struct MethodType {
    name: String,
    arg_type: &'static str,
    reply_type: &'static str,
    handler: Box<dyn Handler>,
    num_calls: AtomicU64,
}

impl MethodType {
    /// Method name (without the service prefix).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Argument type descriptor.
    pub fn arg_type(&self) -> &'static str {
        self.arg_type
    }

    /// Reply type descriptor.
    pub fn reply_type(&self) -> &'static str {
        self.reply_type
    }

    /// Number of times this method has been invoked.
    pub fn num_calls(&self) -> u64 {
        self.num_calls.load(Ordering::Relaxed)
    }

    /// Decode a fresh argument value from a request body.
    ///
    /// Every call gets its own value; nothing is shared between calls.
    pub fn new_argv(&self, codec: CodecType, body: &[u8]) -> Result<Argv> {
        self.handler.new_argv(codec, body)
    }

    /// Invoke the method on `receiver` and count the call.
    pub fn invoke(&self, receiver: Receiver, argv: Argv) -> BoxFuture<'static, MethodResult> {
        self.num_calls.fetch_add(1, Ordering::Relaxed);
        self.handler.call(receiver, argv)
    }
}

/// Collects the methods of one receiver type.
pub struct MethodTable<S> {
    methods: HashMap<String, Arc<MethodType>>,
    _receiver: PhantomData<fn() -> S>,
}

impl<S: Send + Sync + 'static> MethodTable<S> {
    fn new() -> Self {
        Self {
            methods: HashMap::new(),
            _receiver: PhantomData,
        }
    }

    /// Add a method shaped `async fn(Arc<S>, Arg) -> Result<Reply, E>`.
    ///
    /// Names that are not exported (see [`RpcService`]) and duplicate names
    /// are skipped with a warning.
    pub fn method<A, R, E, F, Fut>(&mut self, name: &str, handler: F) -> &mut Self
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        E: Display,
        F: Fn(Arc<S>, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<R, E>> + Send + 'static,
    {
        if !is_exported(name) {
            tracing::warn!("rpc server: skipping unexported method {:?}", name);
            return self;
        }
        if self.methods.contains_key(name) {
            tracing::warn!("rpc server: skipping duplicate method {:?}", name);
            return self;
        }

        let method = MethodType {
            name: name.to_string(),
            arg_type: std::any::type_name::<A>(),
            reply_type: std::any::type_name::<R>(),
            handler: Box::new(TypedHandler {
                handler,
                _phantom: PhantomData,
            }),
            num_calls: AtomicU64::new(0),
        };
        self.methods.insert(name.to_string(), Arc::new(method));
        self
    }
}

/// A registered receiver together with its method table.
///
/// Immutable once built, so lookups need no locking.
pub struct Service {
    name: String,
    receiver: Receiver,
    methods: HashMap<String, Arc<MethodType>>,
}

impl Service {
    /// Build a service from an owned receiver.
    pub fn new<S: RpcService>(receiver: S) -> Self {
        Self::from_arc(Arc::new(receiver))
    }

    /// Build a service from a shared receiver.
    pub fn from_arc<S: RpcService>(receiver: Arc<S>) -> Self {
        let mut table = MethodTable::<S>::new();
        S::register_methods(&mut table);

        let name = receiver.service_name();
        for method in table.methods.values() {
            tracing::debug!(
                "rpc server: register {}.{} ({} -> {})",
                name,
                method.name(),
                method.arg_type(),
                method.reply_type()
            );
        }

        Self {
            name,
            receiver,
            methods: table.methods,
        }
    }

    /// Service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a method by name.
    pub fn method(&self, name: &str) -> Option<Arc<MethodType>> {
        self.methods.get(name).cloned()
    }

    /// Number of callable methods.
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Invoke `method` on this service's receiver.
    pub fn call(&self, method: &MethodType, argv: Argv) -> BoxFuture<'static, MethodResult> {
        method.invoke(self.receiver.clone(), argv)
    }
}
