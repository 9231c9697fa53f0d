//! In-process audit log service for end-to-end client tests
//!
//! Stores envelopes in an RFC 6962 tree and answers the four endpoints
//! with real proofs. Knobs let tests make it misbehave the way a
//! compromised service would: rewrite stored events, roll back, fork the
//! history or hand out broken proofs.

#![allow(dead_code)]

use auditlog::crypto::{generate_key_pem, SigningScheme};
use auditlog::merkle::{empty_root, hash_children, hash_leaf};
use auditlog::transport::{
    Error as TransportError, LogRequest, RootRequest, SearchOrder, SearchRequest,
    SearchResultsRequest, Transport, TransportFuture,
};
use auditlog::types::{canonicalize, Base64, Event, Hex, Sha256Hash, SignedEvent};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const DEFAULT_PAGE: usize = 20;
const TREE_NAME: &str = "mock-tree";

#[derive(Default)]
struct State {
    records: Vec<SignedEvent>,
    leaves: Vec<Sha256Hash>,
    published: usize,
    searches: HashMap<String, Vec<usize>>,
    next_search: u64,
    corrupt_proofs: bool,
    mangle_next_write: bool,
}

/// A mock audit service implementing [`Transport`]
#[derive(Default)]
pub struct MockLog {
    state: Mutex<State>,
}

impl MockLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn size(&self) -> usize {
        self.state.lock().unwrap().leaves.len()
    }

    /// Anchor everything logged so far
    pub fn publish(&self) {
        let mut state = self.state.lock().unwrap();
        state.published = state.leaves.len();
    }

    /// Rewrite a stored event without touching the tree
    pub fn tamper_event(&self, index: usize, edit: impl FnOnce(&mut Event)) {
        edit(&mut self.state.lock().unwrap().records[index].event);
    }

    /// Replace a stored signature with garbage
    pub fn corrupt_signature(&self, index: usize) {
        self.state.lock().unwrap().records[index].signature =
            Some(Base64::encode(&[0u8; 64]));
    }

    /// Drop everything after the first `size` entries
    pub fn truncate(&self, size: usize) {
        let mut state = self.state.lock().unwrap();
        state.records.truncate(size);
        state.leaves.truncate(size);
        state.published = state.published.min(size);
    }

    /// Rewrite history: replace entry `index` and rebuild the tree
    pub fn fork_at(&self, index: usize) {
        let mut state = self.state.lock().unwrap();
        let forged = Event::new("forged entry");
        state.leaves[index] = hash_leaf(&canonicalize(&forged).unwrap());
        state.records[index] = SignedEvent::unsigned(forged);
    }

    /// Flip a byte in every membership proof handed out
    pub fn set_corrupt_proofs(&self, corrupt: bool) {
        self.state.lock().unwrap().corrupt_proofs = corrupt;
    }

    /// Store a different event than the next one submitted
    pub fn mangle_next_write(&self) {
        self.state.lock().unwrap().mangle_next_write = true;
    }

    fn handle(&self, path: &str, payload: Value) -> Result<Value, TransportError> {
        let mut state = self.state.lock().unwrap();
        match path {
            "v1/log" => Ok(state.log(serde_json::from_value(payload)?)),
            "v1/search" => Ok(state.search(serde_json::from_value(payload)?)),
            "v1/results" => state.results(serde_json::from_value(payload)?),
            "v1/root" => state.root(serde_json::from_value(payload)?),
            other => Err(api_error("NotFound", format!("no endpoint {}", other))),
        }
    }
}

impl Transport for MockLog {
    fn execute<'a>(&'a self, path: &'a str, payload: Value) -> TransportFuture<'a> {
        let result = self.handle(path, payload);
        Box::pin(async move { result })
    }
}

impl State {
    fn log(&mut self, request: LogRequest) -> Value {
        let mut stored = SignedEvent {
            event: request.event,
            signature: request.signature,
            public_key: request.public_key,
            received_at: Some("2026-01-01T00:00:00.000000Z".to_string()),
        };
        if std::mem::take(&mut self.mangle_next_write) {
            stored.event.message.push_str(" (edited)");
        }

        let leaf = hash_leaf(&canonicalize(&stored.event).unwrap());
        self.leaves.push(leaf);
        self.records.push(stored.clone());
        let index = self.leaves.len() - 1;
        let size = self.leaves.len();

        let mut result = json!({
            "hash": Hex::from(&leaf),
            "leaf_index": index,
            "unpublished_root": self.root_info(size),
            "membership_proof": self.membership(index, size),
        });
        if request.verbose {
            result["envelope"] = json!(stored);
        }
        if let Some(proof) = self.consistency_from(request.consistency_from, size) {
            result["consistency_proof"] = json!(proof);
        }
        result
    }

    fn search(&mut self, request: SearchRequest) -> Value {
        let mut matches: Vec<usize> = (0..self.records.len())
            .filter(|&i| matches_query(&self.records[i].event, &request))
            .collect();
        if request.order == Some(SearchOrder::Desc) {
            matches.reverse();
        }
        if let Some(max) = request.max_results {
            matches.truncate(max as usize);
        }

        self.next_search += 1;
        let id = format!("pit_{}", self.next_search);
        self.searches.insert(id.clone(), matches);

        let limit = request.limit.map_or(DEFAULT_PAGE, |l| l as usize);
        self.page(&id, 0, limit, request.consistency_from)
    }

    fn results(&mut self, request: SearchResultsRequest) -> Result<Value, TransportError> {
        if !self.searches.contains_key(&request.id) {
            return Err(api_error("NotFound", format!("unknown search {}", request.id)));
        }
        let offset = request.offset.map_or(0, |o| o as usize);
        let limit = request.limit.map_or(DEFAULT_PAGE, |l| l as usize);
        Ok(self.page(&request.id, offset, limit, request.consistency_from))
    }

    fn page(&self, id: &str, offset: usize, limit: usize, from: Option<u64>) -> Value {
        let matches = &self.searches[id];
        let size = self.leaves.len();
        let events: Vec<Value> = matches
            .iter()
            .skip(offset)
            .take(limit)
            .map(|&i| {
                let published = i < self.published;
                let root_size = if published { self.published } else { size };
                json!({
                    "envelope": self.records[i],
                    "hash": Hex::from(&self.leaves[i]),
                    "leaf_index": i,
                    "membership_proof": self.membership(i, root_size),
                    "published": published,
                })
            })
            .collect();

        let mut result = json!({
            "id": id,
            "expires_at": "2026-01-02T00:00:00Z",
            "count": matches.len(),
            "events": events,
            "unpublished_root": self.root_info(size),
        });
        if self.published > 0 {
            result["root"] = json!({
                "tree_name": TREE_NAME,
                "size": self.published,
                "root_hash": Hex::from(&mth(&self.leaves[..self.published])),
                "published_at": "2026-01-01T00:00:00Z",
                "consistency_proof": to_hex(&consistency(self.published, &self.leaves)),
            });
        }
        if let Some(proof) = self.consistency_from(from, size) {
            result["consistency_proof"] = json!(proof);
        }
        result
    }

    fn root(&self, request: RootRequest) -> Result<Value, TransportError> {
        let size = request.tree_size.map_or(self.leaves.len(), |s| s as usize);
        if size > self.leaves.len() {
            return Err(api_error("NotFound", format!("no root at size {}", size)));
        }

        let mut data = json!({
            "tree_name": TREE_NAME,
            "size": size,
            "root_hash": Hex::from(&mth(&self.leaves[..size])),
            "published_at": "2026-01-01T00:00:00Z",
        });
        if let Some(from) = request.consistency_from {
            let from = from as usize;
            let proof = if from <= size {
                consistency(from, &self.leaves[..size])
            } else if from <= self.leaves.len() {
                consistency(size, &self.leaves[..from])
            } else {
                Vec::new()
            };
            data["consistency_proof"] = json!(to_hex(&proof));
        }
        Ok(json!({ "data": data }))
    }

    fn root_info(&self, size: usize) -> Value {
        json!({"size": size, "root_hash": Hex::from(&mth(&self.leaves[..size]))})
    }

    fn membership(&self, index: usize, size: usize) -> Vec<Hex> {
        let mut proof = path(index, &self.leaves[..size]);
        if self.corrupt_proofs {
            if let Some(first) = proof.first_mut() {
                let mut bytes = *first.as_bytes();
                bytes[0] ^= 0xff;
                *first = Sha256Hash::from_bytes(bytes);
            }
        }
        to_hex(&proof)
    }

    /// Proof from the client's size to `size`; empty when it cannot exist
    fn consistency_from(&self, from: Option<u64>, size: usize) -> Option<Vec<Hex>> {
        let from = from? as usize;
        if from > size {
            return Some(Vec::new());
        }
        Some(to_hex(&consistency(from, &self.leaves[..size])))
    }
}

fn api_error(status: &str, summary: String) -> TransportError {
    TransportError::Api {
        status: status.to_string(),
        summary,
        request_id: "mock".to_string(),
    }
}

/// `field:value` terms match a field exactly, bare terms match the message
fn matches_query(event: &Event, request: &SearchRequest) -> bool {
    let fields = serde_json::to_value(event).unwrap();
    let field = |name: &str| fields.get(name).and_then(Value::as_str).map(str::to_string);

    let terms_match = request.query.split_whitespace().all(|term| match term.split_once(':') {
        Some((name, value)) => field(name).as_deref() == Some(value),
        None => event.message.contains(term),
    });
    let restrictions_match = request.search_restriction.iter().flatten().all(|(name, values)| {
        field(name.as_str()).is_some_and(|v| values.contains(&v))
    });
    terms_match && restrictions_match
}

fn to_hex(hashes: &[Sha256Hash]) -> Vec<Hex> {
    hashes.iter().map(Hex::from).collect()
}

fn split_point(n: usize) -> usize {
    let mut k = 1;
    while k << 1 < n {
        k <<= 1;
    }
    k
}

fn mth(leaves: &[Sha256Hash]) -> Sha256Hash {
    match leaves.len() {
        0 => empty_root(),
        1 => leaves[0],
        n => {
            let k = split_point(n);
            hash_children(&mth(&leaves[..k]), &mth(&leaves[k..]))
        }
    }
}

fn path(m: usize, leaves: &[Sha256Hash]) -> Vec<Sha256Hash> {
    let n = leaves.len();
    if n <= 1 {
        return Vec::new();
    }
    let k = split_point(n);
    if m < k {
        let mut p = path(m, &leaves[..k]);
        p.push(mth(&leaves[k..]));
        p
    } else {
        let mut p = path(m - k, &leaves[k..]);
        p.push(mth(&leaves[..k]));
        p
    }
}

fn consistency(old: usize, leaves: &[Sha256Hash]) -> Vec<Sha256Hash> {
    if old == 0 || old == leaves.len() {
        return Vec::new();
    }
    subproof(old, leaves, true)
}

fn subproof(m: usize, leaves: &[Sha256Hash], complete: bool) -> Vec<Sha256Hash> {
    let n = leaves.len();
    if m == n {
        return if complete { Vec::new() } else { vec![mth(leaves)] };
    }
    let k = split_point(n);
    if m <= k {
        let mut p = subproof(m, &leaves[..k], complete);
        p.push(mth(&leaves[k..]));
        p
    } else {
        let mut p = subproof(m - k, &leaves[k..], false);
        p.push(mth(&leaves[..k]));
        p
    }
}

/// Write a fresh signing key to a temp file and return its path
pub fn signing_key_file(name: &str) -> PathBuf {
    let generated = generate_key_pem(SigningScheme::Ed25519).unwrap();
    let path = std::env::temp_dir().join(format!(
        "auditlog-{}-{}.pem",
        name,
        std::process::id()
    ));
    std::fs::write(&path, &generated.private_key_pem).unwrap();
    path
}

/// A unique scratch directory under the system temp dir
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("auditlog-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}
