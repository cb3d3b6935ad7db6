// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Shared helpers for integration tests: a tiny in-process stand-in for a
//! RepliSQL node, built on axum.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::Router;
use serde_json::{json, Map, Value};

/// Bind an ephemeral port and serve `app` on it in the background.
///
/// The listener is bound before this returns, so connections made
/// immediately afterwards are queued rather than refused.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A shape-A `/status` document. The first address is the leader; node keys
/// are small integers so iteration order is deterministic.
pub fn status_doc(leader: &str, followers: &[&str]) -> Value {
    let mut metadata = Map::new();
    metadata.insert("1".into(), json!({ "api_addr": leader }));
    for (index, follower) in followers.iter().enumerate() {
        metadata.insert(format!("{}", index + 2), json!({ "api_addr": follower }));
    }
    json!({ "store": { "leader": "1", "metadata": metadata } })
}

/// A port that was just bound and released, so connecting to it fails.
pub fn dead_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// A canned one-statement query response.
pub fn single_row_response() -> Value {
    json!({
        "results": [{
            "columns": ["n"],
            "types": ["integer"],
            "values": [[1]],
            "time": 0.0001
        }],
        "time": 0.0002
    })
}
