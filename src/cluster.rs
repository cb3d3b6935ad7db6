// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Peer directory and cluster topology discovery.
//!
//! The store exposes its topology through two historically different
//! endpoints. `GET /status` (shape A) nests leader identity and a metadata
//! map of node identifiers to API addresses inside a `store` section.
//! `GET /nodes` (shape B, newer deployments) is a flat map of node
//! identifiers to `{api_addr, reachable, leader}` records. Discovery tries
//! shape A first and falls back to shape B.
//!
//! Each successful discovery builds a fresh [`PeerDirectory`] off to the
//! side and installs it with a single reference swap, so an in-flight
//! dispatch never observes a half-built directory. A failed discovery
//! leaves the previous directory untouched. Peers reported unreachable, or
//! lacking a usable API address, are excluded until the next discovery.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::client::{Operation, RepliSqlClient};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Peer / PeerDirectory
// ---------------------------------------------------------------------------

/// A reachable cluster node address. Identity only; no behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Peer {
    /// Hostname or IP address.
    pub host: String,
    /// HTTP API port.
    pub port: u16,
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// The cluster view used for dispatch: leader first, then followers.
///
/// Replaced wholesale on each successful discovery, never merged.
#[derive(Debug, Clone)]
pub struct PeerDirectory {
    leader: Peer,
    followers: Vec<Peer>,
}

impl PeerDirectory {
    pub(crate) fn new(leader: Peer, followers: Vec<Peer>) -> Self {
        PeerDirectory { leader, followers }
    }

    /// A directory containing only the connection-string seed peer.
    pub(crate) fn seed(peer: Peer) -> Self {
        PeerDirectory::new(peer, Vec::new())
    }

    /// The current leader.
    pub fn leader(&self) -> &Peer {
        &self.leader
    }

    /// Follower peers, in discovery order.
    pub fn followers(&self) -> &[Peer] {
        &self.followers
    }

    /// All peers in dispatch order: leader first, then followers.
    pub fn peer_list(&self) -> Vec<Peer> {
        let mut peers = Vec::with_capacity(1 + self.followers.len());
        peers.push(self.leader.clone());
        peers.extend(self.followers.iter().cloned());
        peers
    }
}

// ---------------------------------------------------------------------------
// Topology parsing
// ---------------------------------------------------------------------------

/// Build a directory from a shape-A `/status` document.
///
/// `store.leader` is either a plain node key or an object carrying one in
/// `node_id`; `store.metadata` maps node keys to `{api_addr}` records. The
/// leader's key must resolve to a usable API address or the shape is
/// rejected.
pub(crate) fn directory_from_status(doc: &Value) -> Result<PeerDirectory> {
    let store = doc
        .get("store")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::Discovery("status response has no store section".into()))?;

    let leader_key = match store.get("leader") {
        Some(Value::String(key)) => key.clone(),
        Some(Value::Object(fields)) => fields
            .get("node_id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Discovery("store.leader carries no node_id".into()))?
            .to_owned(),
        _ => return Err(Error::Discovery("store.leader is missing".into())),
    };

    let metadata = store
        .get("metadata")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::Discovery("store.metadata is missing".into()))?;

    let mut leader = None;
    let mut followers = Vec::new();
    for (key, entry) in metadata {
        let Some(address) = entry.get("api_addr").and_then(Value::as_str) else {
            continue;
        };
        let Some(peer) = peer_from_api_addr(address) else {
            continue;
        };
        if *key == leader_key {
            leader = Some(peer);
        } else {
            followers.push(peer);
        }
    }

    let leader = leader.ok_or_else(|| {
        Error::Discovery(format!("leader {leader_key} has no usable api address"))
    })?;
    Ok(PeerDirectory::new(leader, followers))
}

/// Build a directory from a shape-B `/nodes` document.
///
/// Nodes flagged unreachable, or without a parseable `api_addr`, are
/// dropped. Exactly the node flagged `leader: true` becomes the leader.
pub(crate) fn directory_from_nodes(doc: &Value) -> Result<PeerDirectory> {
    let nodes = doc
        .as_object()
        .ok_or_else(|| Error::Discovery("nodes response is not a JSON object".into()))?;

    let mut leader = None;
    let mut followers = Vec::new();
    for entry in nodes.values() {
        let reachable = entry
            .get("reachable")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        if !reachable {
            continue;
        }
        let Some(address) = entry.get("api_addr").and_then(Value::as_str) else {
            continue;
        };
        let Some(peer) = peer_from_api_addr(address) else {
            continue;
        };
        if entry.get("leader").and_then(Value::as_bool).unwrap_or(false) {
            leader = Some(peer);
        } else {
            followers.push(peer);
        }
    }

    let leader =
        leader.ok_or_else(|| Error::Discovery("no reachable leader in nodes response".into()))?;
    Ok(PeerDirectory::new(leader, followers))
}

/// Parse an API address into a peer.
///
/// `/status` metadata reports bare `host:port` pairs while `/nodes` reports
/// full URLs; both forms are accepted.
fn peer_from_api_addr(address: &str) -> Option<Peer> {
    if address.contains("://") {
        let url = Url::parse(address).ok()?;
        let host = url.host_str()?.to_owned();
        let port = url.port_or_known_default()?;
        Some(Peer { host, port })
    } else {
        let (host, port) = address.rsplit_once(':')?;
        Some(Peer {
            host: host.to_owned(),
            port: port.parse().ok()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Discovery operations
// ---------------------------------------------------------------------------

impl RepliSqlClient {
    /// Refresh the peer directory from the cluster's topology endpoints.
    ///
    /// Tries the `/status` shape first, then falls back to `/nodes`. On
    /// success the new directory fully replaces the old one; on failure the
    /// previous directory is left untouched. A no-op when cluster discovery
    /// was disabled in the connection string.
    pub async fn refresh_cluster(&self) -> Result<()> {
        self.ensure_open()?;
        if !self.discovery_enabled() {
            return Ok(());
        }

        let body = self.dispatch(Operation::Status, None).await?;
        let doc: Value = serde_json::from_slice(&body)
            .map_err(|e| Error::Discovery(format!("malformed status response: {e}")))?;

        let directory = match directory_from_status(&doc) {
            Ok(directory) => directory,
            Err(error) => {
                debug!(client = %self.id(), %error, "status discovery failed, trying nodes");
                let body = self.dispatch(Operation::Nodes, None).await?;
                let doc: Value = serde_json::from_slice(&body)
                    .map_err(|e| Error::Discovery(format!("malformed nodes response: {e}")))?;
                directory_from_nodes(&doc)?
            }
        };

        debug!(
            client = %self.id(),
            leader = %directory.leader(),
            followers = directory.followers().len(),
            "installed new peer directory"
        );
        self.install_directory(directory);
        Ok(())
    }

    /// The current leader address as `host:port`, refreshing the directory
    /// first unless discovery is disabled.
    pub async fn leader(&self) -> Result<String> {
        self.refresh_cluster().await?;
        Ok(self.directory().leader().to_string())
    }

    /// All known peer addresses, leader first, refreshing the directory
    /// first unless discovery is disabled.
    pub async fn peers(&self) -> Result<Vec<String>> {
        self.refresh_cluster().await?;
        Ok(self
            .directory()
            .peer_list()
            .iter()
            .map(Peer::to_string)
            .collect())
    }

    /// A snapshot of the current peer directory.
    pub fn directory(&self) -> Arc<PeerDirectory> {
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_shape_with_string_leader() {
        let doc = json!({
            "store": {
                "leader": "raft-2",
                "metadata": {
                    "raft-1": {"api_addr": "host1:4001"},
                    "raft-2": {"api_addr": "host2:4001"},
                    "raft-3": {"api_addr": "host3:4001"},
                }
            }
        });
        let directory = directory_from_status(&doc).unwrap();
        assert_eq!(directory.leader().to_string(), "host2:4001");
        assert_eq!(directory.followers().len(), 2);
        assert_eq!(directory.peer_list()[0].to_string(), "host2:4001");
    }

    #[test]
    fn test_status_shape_with_object_leader() {
        let doc = json!({
            "store": {
                "leader": {"node_id": "raft-1", "addr": "host1:4002"},
                "metadata": {
                    "raft-1": {"api_addr": "host1:4001"},
                }
            }
        });
        let directory = directory_from_status(&doc).unwrap();
        assert_eq!(directory.leader().to_string(), "host1:4001");
        assert!(directory.followers().is_empty());
    }

    #[test]
    fn test_status_shape_drops_entries_without_api_addr() {
        let doc = json!({
            "store": {
                "leader": "raft-1",
                "metadata": {
                    "raft-1": {"api_addr": "host1:4001"},
                    "raft-2": {"addr": "host2:4002"},
                }
            }
        });
        let directory = directory_from_status(&doc).unwrap();
        assert!(directory.followers().is_empty());
    }

    #[test]
    fn test_status_shape_without_leader_fails() {
        let doc = json!({"store": {"leader": "", "metadata": {}}});
        assert!(directory_from_status(&doc).is_err());

        let doc = json!({"build": {"version": "v8"}});
        assert!(directory_from_status(&doc).is_err());
    }

    #[test]
    fn test_nodes_shape() {
        let doc = json!({
            "1": {"api_addr": "http://host1:4001", "reachable": true, "leader": true},
            "2": {"api_addr": "http://host2:4001", "reachable": true, "leader": false},
            "3": {"api_addr": "http://host3:4001", "reachable": true, "leader": false},
        });
        let directory = directory_from_nodes(&doc).unwrap();
        assert_eq!(directory.leader().to_string(), "host1:4001");
        assert_eq!(directory.followers().len(), 2);
    }

    #[test]
    fn test_nodes_shape_drops_unreachable() {
        let doc = json!({
            "1": {"api_addr": "http://host1:4001", "reachable": true, "leader": true},
            "2": {"api_addr": "http://host2:4001", "reachable": false, "leader": false},
        });
        let directory = directory_from_nodes(&doc).unwrap();
        assert!(directory.followers().is_empty());
    }

    #[test]
    fn test_nodes_shape_without_leader_fails() {
        let doc = json!({
            "1": {"api_addr": "http://host1:4001", "reachable": true, "leader": false},
        });
        assert!(matches!(
            directory_from_nodes(&doc),
            Err(Error::Discovery(_))
        ));
    }

    #[test]
    fn test_api_addr_forms() {
        assert_eq!(
            peer_from_api_addr("host1:4001").unwrap().to_string(),
            "host1:4001"
        );
        assert_eq!(
            peer_from_api_addr("http://host1:4001").unwrap().to_string(),
            "host1:4001"
        );
        assert_eq!(
            peer_from_api_addr("https://host1").unwrap().port,
            443
        );
        assert!(peer_from_api_addr("host-without-port").is_none());
    }
}
