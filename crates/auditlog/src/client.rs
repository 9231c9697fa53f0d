//! The audit client facade
//!
//! [`AuditClient`] wraps the service endpoints. Outgoing events are
//! canonicalized and signed; everything that comes back is checked against
//! the client's keys and the root it tracks before it is handed to the
//! caller. Which checks run is decided by [`AuditConfig`].

use crate::config::AuditConfig;
use crate::error::{Error, Result};
use crate::tracker::{check_extends, ConsistencyResult, RootTracker, TrackerSession};
use crate::verify::{CheckOutcome, EventChecks, EventVerifier, VerificationVerdict, VerifiedEvent};
use auditlog_crypto::{load_private_key, EventSigner, PublicKeyPem, VerificationKey};
use auditlog_roots::{NoRoots, RootsProvider};
use auditlog_transport::{
    AuditService, LogRequest, RootRequest, SearchRequest, SearchResponse, SearchResultsRequest,
    Transport,
};
use auditlog_types::{canonicalize, Event, Hex, PublishedRoot, RootInfo, SignedEvent, TreeHead};
use std::sync::Arc;

/// Outcome of [`AuditClient::log`]
#[derive(Debug, Clone, PartialEq)]
pub struct LogResult {
    /// Leaf hash the service assigned to the event
    pub hash: Option<Hex>,
    /// Position of the event in the log
    pub leaf_index: Option<u64>,
    /// The envelope as submitted
    pub envelope: SignedEvent,
    /// The envelope as the service stored it (only with `verify_on_write`)
    pub echoed: Option<SignedEvent>,
    /// Root of the log right after the append
    pub unpublished_root: Option<RootInfo>,
    /// How the returned root relates to the tracked root
    pub consistency: Option<ConsistencyResult>,
    pub checks: EventChecks,
    pub verdict: VerificationVerdict,
}

impl LogResult {
    /// Return the result only if it fully verified
    pub fn into_verified(self) -> Result<Self> {
        if self.verdict.is_verified() {
            Ok(self)
        } else {
            Err(Error::Verification(format!(
                "logged event at {:?} is {}",
                self.leaf_index, self.verdict
            )))
        }
    }
}

/// Outcome of [`AuditClient::search`]
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Pagination token for [`AuditClient::search_results`]
    pub id: String,
    pub expires_at: Option<String>,
    /// Total number of matching events
    pub count: u64,
    /// The events in this page, each with its verdict
    pub events: Vec<VerifiedEvent>,
    /// Latest published root
    pub root: Option<PublishedRoot>,
    /// Current unpublished root
    pub unpublished_root: Option<RootInfo>,
    /// How the unpublished root relates to the tracked root
    pub consistency: Option<ConsistencyResult>,
}

impl SearchResult {
    /// Whether every event in the page verified
    pub fn all_verified(&self) -> bool {
        self.events.iter().all(|e| e.verdict.is_verified())
    }
}

/// One page of a paginated search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultPage {
    /// Index of the first event in the page
    pub offset: u64,
    pub result: SearchResult,
}

impl SearchResultPage {
    /// Offset of the following page, if there is one
    pub fn next_offset(&self) -> Option<u64> {
        let next = self.offset + self.result.events.len() as u64;
        (!self.result.events.is_empty() && next < self.result.count).then_some(next)
    }
}

/// Outcome of [`AuditClient::root`]
#[derive(Debug, Clone, PartialEq)]
pub struct RootResult {
    /// The root as returned by the service
    pub root: PublishedRoot,
    /// Decoded size and hash
    pub tree_head: TreeHead,
    /// How the root relates to the tracked root (absent without proof checks)
    pub consistency: Option<ConsistencyResult>,
}

/// Client for a tamper-evident audit log
pub struct AuditClient {
    config: AuditConfig,
    service: AuditService,
    signer: Option<Arc<dyn EventSigner>>,
    public_key: Option<PublicKeyPem>,
    verifier: EventVerifier,
    tracker: RootTracker,
}

impl std::fmt::Debug for AuditClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditClient")
            .field("config", &self.config)
            .field("signing", &self.signer.is_some())
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

impl AuditClient {
    /// Create a client that starts without a known root
    pub fn new(config: AuditConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Self::with_roots_provider(config, transport, Arc::new(NoRoots))
    }

    /// Create a client whose root tracker is seeded from `roots`
    ///
    /// Fails with [`Error::Config`] when the configuration is inconsistent
    /// or a configured key cannot be loaded.
    pub fn with_roots_provider(
        config: AuditConfig,
        transport: Arc<dyn Transport>,
        roots: Arc<dyn RootsProvider>,
    ) -> Result<Self> {
        config.validate()?;

        let (signer, public_key, own_key) = match (&config.signing_key_path, config.sign_logs) {
            (Some(path), true) => {
                let key = load_private_key(path).map_err(|e| {
                    Error::Config(format!(
                        "failed to load signing key {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let public_key = key.public_key_to_pem()?;
                let own_key = VerificationKey::from_spki_der(&key.public_key_to_der()?)?;
                let signer: Arc<dyn EventSigner> = Arc::new(key);
                (Some(signer), Some(public_key), Some(own_key))
            }
            _ => (None, None, None),
        };

        let verifier = EventVerifier::from_config(&config, own_key)?;
        let tracker = RootTracker::new(config.log_id.clone(), roots);
        tracing::debug!(
            "Created audit client for log {} (signing: {}, proofs: {})",
            config.log_id,
            signer.is_some(),
            config.verify_proofs
        );

        Ok(Self {
            config,
            service: AuditService::new(transport),
            signer,
            public_key,
            verifier,
            tracker,
        })
    }

    /// The configuration the client was built with
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// The root currently trusted for this log
    pub async fn trusted_root(&self) -> Result<Option<TreeHead>> {
        self.tracker.current().await
    }

    /// Forget the trusted root, e.g. when switching to another log
    ///
    /// The root stored by the roots provider is cleared as well.
    pub async fn reset_root(&self) -> Result<()> {
        self.tracker.reset().await
    }

    /// Append an event to the log
    ///
    /// With `verify_on_write` the service echoes the stored envelope and
    /// the client checks it is the one it submitted.
    pub async fn log(&self, event: Event, verify_on_write: bool) -> Result<LogResult> {
        let canonical = canonicalize(&event)?;
        let mut envelope = SignedEvent::unsigned(event);
        if let Some(signer) = &self.signer {
            envelope.signature = Some(signer.sign(&canonical)?.to_base64());
            envelope.public_key = self.public_key.as_ref().map(|k| k.as_str().to_string());
        }

        let mut request = LogRequest::from_envelope(envelope.clone());
        request.verbose = verify_on_write;

        let mut session = self.session().await?;
        request.consistency_from = session.as_ref().and_then(|s| s.consistency_from());
        let response = self.service.log(&request).await?;
        tracing::debug!("Logged event at {:?}", response.leaf_index);

        let mut checks = EventChecks::skipped();
        let mut echoed = false;

        if verify_on_write {
            echoed = echo_matches(&canonical, &envelope, response.envelope.as_ref())?;
            if !echoed {
                tracing::warn!("Service stored a different envelope than was submitted");
                checks.signature = CheckOutcome::Failed;
            }
            if let Some(hash) = &response.hash {
                if !crate::verify::leaf_hash_matches(&canonical, hash) {
                    tracing::warn!("Service hash {} does not match submitted event", hash);
                    checks.membership = CheckOutcome::Failed;
                }
            }
        }

        let mut consistency = None;
        if let Some(session) = session.as_mut() {
            let root = match &response.unpublished_root {
                Some(info) => {
                    let (head, result) = observe_root(
                        session,
                        info,
                        response.consistency_proof.as_deref(),
                    )
                    .await?;
                    checks.root_consistency = root_outcome(result);
                    consistency = result;
                    head
                }
                None => {
                    tracing::warn!("Log response carries no root");
                    None
                }
            };
            if checks.membership != CheckOutcome::Failed {
                checks.membership = self.verifier.check_membership(
                    &canonical,
                    response.hash.as_ref(),
                    response.leaf_index,
                    response.membership_proof.as_deref(),
                    root.as_ref(),
                );
            }
        }
        drop(session);

        // Our own signature only counts once the service shows it holds the event
        if envelope.signature.is_some()
            && checks.signature != CheckOutcome::Failed
            && (echoed || checks.membership == CheckOutcome::Passed)
        {
            checks.signature = CheckOutcome::Passed;
        }

        let verdict = checks.verdict();
        if verdict != VerificationVerdict::Verified {
            tracing::debug!("Logged event verdict: {}", verdict);
        }

        Ok(LogResult {
            hash: response.hash,
            leaf_index: response.leaf_index,
            envelope,
            echoed: response.envelope,
            unpublished_root: response.unpublished_root,
            consistency,
            checks,
            verdict,
        })
    }

    /// Search the log and verify every returned event
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResult> {
        let mut request = request;
        let mut session = self.session().await?;
        request.consistency_from = session.as_ref().and_then(|s| s.consistency_from());
        let response = self.service.search(&request).await?;
        self.verify_search(response, session.as_mut()).await
    }

    /// Fetch another page of a previous search
    pub async fn search_results(
        &self,
        id: impl Into<String>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<SearchResultPage> {
        let mut request = SearchResultsRequest::new(id, limit, offset);
        let mut session = self.session().await?;
        request.consistency_from = session.as_ref().and_then(|s| s.consistency_from());
        let response = self.service.results(&request).await?;
        let result = self.verify_search(response, session.as_mut()).await?;
        Ok(SearchResultPage {
            offset: u64::from(offset.unwrap_or(0)),
            result,
        })
    }

    /// Fetch a root of the log and check it against the trusted root
    ///
    /// A root that is not an extension of the trusted one fails the call
    /// with [`Error::RootRollback`]. An explicitly requested older size is
    /// checked as a prefix of the trusted root and does not replace it.
    pub async fn root(&self, tree_size: Option<u64>) -> Result<RootResult> {
        let Some(mut session) = self.session().await? else {
            let request = RootRequest {
                tree_size,
                consistency_from: None,
            };
            let response = self.service.root(&request).await?;
            let tree_head = response.data.tree_head()?;
            return Ok(RootResult {
                root: response.data,
                tree_head,
                consistency: None,
            });
        };

        let trusted = session.trusted();
        let request = RootRequest {
            tree_size,
            consistency_from: session.consistency_from(),
        };
        let response = self.service.root(&request).await?;
        let root = response.data;
        let tree_head = root.tree_head()?;

        let proof = root.consistency_proof.as_deref().unwrap_or(&[]);
        let historical = tree_size.is_some() && trusted.is_some_and(|t| tree_head.size < t.size);
        let result = if historical {
            session.check_prefix(tree_head, proof)
        } else {
            session.observe(tree_head, proof).await?
        };

        if let (ConsistencyResult::Inconsistent, Some(trusted)) = (result, trusted) {
            tracing::warn!(
                "Root rollback on log {}: trusted {}, got {}",
                self.config.log_id,
                trusted,
                tree_head
            );
            return Err(Error::RootRollback {
                trusted,
                observed: tree_head,
            });
        }

        Ok(RootResult {
            root,
            tree_head,
            consistency: Some(result),
        })
    }

    /// Tracker access for calls that check proofs
    ///
    /// Without proof checks the tracker is never consulted, so calls do not
    /// serialize on it.
    async fn session(&self) -> Result<Option<TrackerSession<'_>>> {
        if !self.config.verify_proofs {
            return Ok(None);
        }
        Ok(Some(self.tracker.lock().await?))
    }

    async fn verify_search(
        &self,
        response: SearchResponse,
        session: Option<&mut TrackerSession<'_>>,
    ) -> Result<SearchResult> {
        let mut consistency = None;
        let mut unpublished = (None, CheckOutcome::Skipped);
        let mut published = (None, CheckOutcome::Skipped);

        if let Some(session) = session {
            unpublished = match &response.unpublished_root {
                Some(info) => {
                    let (head, result) = observe_root(
                        session,
                        info,
                        response.consistency_proof.as_deref(),
                    )
                    .await?;
                    consistency = result;
                    (head, root_outcome(result))
                }
                None => (None, CheckOutcome::Failed),
            };
            if let Some(root) = &response.root {
                published = check_published(root, unpublished);
            }
        }

        let mut events = Vec::with_capacity(response.events.len());
        for record in response.events {
            let (root, root_check) = if record.published {
                published
            } else {
                unpublished
            };
            events.push(self.verifier.verify_event(record, root.as_ref(), root_check)?);
        }

        let failed = events.iter().filter(|e| !e.verdict.is_verified()).count();
        if failed > 0 {
            tracing::debug!("{} of {} search results did not verify", failed, events.len());
        }

        Ok(SearchResult {
            id: response.id,
            expires_at: response.expires_at,
            count: response.count,
            events,
            root: response.root,
            unpublished_root: response.unpublished_root,
            consistency,
        })
    }
}

/// Decode a returned root and present it to the tracker
async fn observe_root(
    session: &mut TrackerSession<'_>,
    info: &RootInfo,
    proof: Option<&[Hex]>,
) -> Result<(Option<TreeHead>, Option<ConsistencyResult>)> {
    match info.tree_head() {
        Ok(head) => {
            let result = session.observe(head, proof.unwrap_or(&[])).await?;
            Ok((Some(head), Some(result)))
        }
        Err(e) => {
            tracing::warn!("Malformed root in response: {}", e);
            Ok((None, Some(ConsistencyResult::Inconsistent)))
        }
    }
}

fn root_outcome(result: Option<ConsistencyResult>) -> CheckOutcome {
    match result {
        Some(result) if result.is_accepted() => CheckOutcome::Passed,
        _ => CheckOutcome::Failed,
    }
}

/// Trust a published root only if it is a prefix of the accepted unpublished root
fn check_published(
    root: &PublishedRoot,
    unpublished: (Option<TreeHead>, CheckOutcome),
) -> (Option<TreeHead>, CheckOutcome) {
    let head = match root.tree_head() {
        Ok(head) => head,
        Err(e) => {
            tracing::warn!("Malformed published root: {}", e);
            return (None, CheckOutcome::Failed);
        }
    };
    let outcome = match unpublished {
        (Some(current), CheckOutcome::Passed) if head.size <= current.size => {
            let proof = root.consistency_proof.as_deref().unwrap_or(&[]);
            root_outcome(Some(check_extends(&head, &current, proof)))
        }
        _ => CheckOutcome::Failed,
    };
    if outcome == CheckOutcome::Failed {
        tracing::warn!("Published root {} is not linked to a trusted root", head);
    }
    (Some(head), outcome)
}

/// Whether the echoed envelope is the one that was submitted
fn echo_matches(
    canonical: &[u8],
    submitted: &SignedEvent,
    echoed: Option<&SignedEvent>,
) -> Result<bool> {
    let Some(echoed) = echoed else {
        return Ok(false);
    };
    Ok(canonicalize(&echoed.event)? == canonical
        && echoed.signature == submitted.signature
        && echoed.public_key == submitted.public_key)
}
