//! Sum demo - a server and a client in one process.
//!
//! This example demonstrates:
//! - Registering a service with typed arguments and replies
//! - Dialing the server over TCP
//! - Issuing concurrent calls over one connection
//!
//! # Running
//!
//! ```text
//! RUST_LOG=simrpc=debug cargo run --example sum
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use simrpc::{Client, MethodTable, Options, RpcService, Server};
use tracing_subscriber::EnvFilter;

#[derive(Serialize, Deserialize, Debug)]
struct Args {
    num1: i64,
    num2: i64,
}

struct Foo;

impl RpcService for Foo {
    fn register_methods(methods: &mut MethodTable<Self>) {
        methods.method("Sum", |_: Arc<Foo>, args: Args| async move {
            Ok::<_, String>(args.num1 + args.num2)
        });
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let server = Server::new();
    server.register(Foo)?;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(Arc::new(server).accept(listener));

    let client = Client::dial(addr, Options::default()).await?;

    let mut calls = Vec::new();
    for i in 0..5 {
        let client = client.clone();
        calls.push(tokio::spawn(async move {
            let args = Args { num1: i, num2: i * i };
            let sum: simrpc::Result<i64> = client.call("Foo.Sum", &args).await;
            (args, sum)
        }));
    }

    for call in calls {
        let (args, sum) = call.await?;
        println!("{} + {} = {}", args.num1, args.num2, sum?);
    }

    client.close().await?;
    Ok(())
}
