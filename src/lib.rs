//! # simrpc
//!
//! A small RPC framework over any ordered byte stream.
//!
//! A client and server first agree on a codec through a one-line JSON
//! [`Options`] exchange, then trade length-prefixed header+body messages.
//! One connection carries many concurrent calls; responses are matched to
//! callers by sequence number and may arrive in any order.
//!
//! ## Architecture
//!
//! - **Negotiation** (JSON line): magic number, codec, timeouts
//! - **Data plane** (framed): `[len][Header][len][Body]` per message,
//!   encoded with MessagePack or JSON
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde::{Deserialize, Serialize};
//! use simrpc::{Client, MethodTable, Options, RpcService, Server};
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
//!         methods.method("Sum", |_: Arc<Foo>, args: Args| async move {
//!             Ok::<_, String>(args.num1 + args.num2)
//!         });
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::new();
//!     server.register(Foo)?;
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
//!     let addr = listener.local_addr()?;
//!     tokio::spawn(Arc::new(server).accept(listener));
//!
//!     let client = Client::dial(addr, Options::default()).await?;
//!     let sum: i64 = client.call("Foo.Sum", &Args { num1: 3, num2: 4 }).await?;
//!     assert_eq!(sum, 7);
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod control;
pub mod error;
pub mod handler;
pub mod protocol;

mod client;
mod server;

pub use client::{Call, Client};
pub use codec::{CodecType, Header};
pub use control::Options;
pub use error::{Result, RpcError};
pub use handler::{MethodTable, RpcService};
pub use server::{accept, default_server, register, Server, HANDLE_TIMEOUT_ERROR};
