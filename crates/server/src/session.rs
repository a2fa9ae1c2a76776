//! Tenant and session resolution.
//!
//! A tool call runs against exactly one tenant. The tenant comes from the
//! call itself, from an earlier call in the same session, or from the
//! configured default, in that order.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use shared::TenantCrn;

use crate::error::ToolError;

/// Sessions opened by `initialize` and their tenant binding, if any.
///
/// Only opened sessions can hold a binding, so the map is bounded by the
/// number of live sessions. Entries go away when the session is closed.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Option<TenantCrn>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session so it may hold a tenant binding.
    pub async fn open(&self, session_id: &str) {
        self.sessions
            .write()
            .await
            .entry(session_id.to_string())
            .or_insert(None);
    }

    pub async fn is_open(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    pub async fn get(&self, session_id: &str) -> Option<TenantCrn> {
        self.sessions.read().await.get(session_id).cloned().flatten()
    }

    /// Bind a tenant to an open session. Returns false, storing nothing,
    /// when the session was never opened.
    pub async fn bind(&self, session_id: &str, crn: TenantCrn) -> bool {
        match self.sessions.write().await.get_mut(session_id) {
            Some(binding) => {
                *binding = Some(crn);
                true
            }
            None => false,
        }
    }

    /// Close a session. Returns whether it was open.
    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Number of open sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Tenant scope a single tool call runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTenant {
    pub session_id: String,
    pub crn: TenantCrn,
    pub tenant_id: String,
}

#[derive(Debug, Clone)]
pub struct TenantResolver {
    sessions: SessionStore,
    default_crn: Option<TenantCrn>,
}

impl TenantResolver {
    pub fn new(sessions: SessionStore, default_crn: Option<TenantCrn>) -> Self {
        Self {
            sessions,
            default_crn,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Resolve the tenant for a call: explicit > session-bound > default.
    ///
    /// A valid explicit CRN is bound to the session for later calls when
    /// the session is open. Calls outside an open session bind nothing.
    pub async fn resolve(
        &self,
        session_id: &str,
        explicit_crn: Option<&str>,
    ) -> Result<ResolvedTenant, ToolError> {
        let explicit = explicit_crn.map(str::trim).filter(|crn| !crn.is_empty());

        let crn = match explicit {
            Some(raw) => {
                let crn = TenantCrn::parse(raw)?;
                if self.sessions.bind(session_id, crn.clone()).await {
                    info!(session_id = %session_id, tenant_id = %crn.tenant_id(), "Tenant bound to session");
                }
                crn
            }
            None => match self.sessions.get(session_id).await {
                Some(crn) => crn,
                None => self.default_crn.clone().ok_or_else(|| {
                    ToolError::validation(
                        "No tenant CRN available: pass 'crn' or configure tenant.default_crn",
                    )
                })?,
            },
        };

        debug!(session_id = %session_id, tenant_id = %crn.tenant_id(), "Tenant resolved");
        Ok(ResolvedTenant {
            session_id: session_id.to_string(),
            tenant_id: crn.tenant_id().to_string(),
            crn,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CRN_A: &str = "crn:v1:bluemix:public:mdm:us-south:a/123:tenant-a::";
    const CRN_B: &str = "crn:v1:bluemix:public:mdm:us-south:a/123:tenant-b::";
    const CRN_DEFAULT: &str = "crn:v1:bluemix:public:mdm:us-south:a/123:tenant-default::";

    async fn resolver(default: Option<&str>) -> TenantResolver {
        let sessions = SessionStore::new();
        sessions.open("s1").await;
        sessions.open("s2").await;
        TenantResolver::new(sessions, default.map(|crn| TenantCrn::parse(crn).unwrap()))
    }

    #[tokio::test]
    async fn test_explicit_crn_wins() {
        let resolver = resolver(Some(CRN_DEFAULT)).await;
        let resolved = resolver.resolve("s1", Some(CRN_A)).await.unwrap();

        assert_eq!(resolved.session_id, "s1");
        assert_eq!(resolved.tenant_id, "tenant-a");
        assert_eq!(resolved.crn.as_str(), CRN_A);
    }

    #[tokio::test]
    async fn test_explicit_crn_binds_session() {
        let resolver = resolver(Some(CRN_DEFAULT)).await;
        resolver.resolve("s1", Some(CRN_A)).await.unwrap();

        let later = resolver.resolve("s1", None).await.unwrap();
        assert_eq!(later.tenant_id, "tenant-a");

        let other_session = resolver.resolve("s2", None).await.unwrap();
        assert_eq!(other_session.tenant_id, "tenant-default");
    }

    #[tokio::test]
    async fn test_explicit_crn_rebinds_session() {
        let resolver = resolver(None).await;
        resolver.resolve("s1", Some(CRN_A)).await.unwrap();
        resolver.resolve("s1", Some(CRN_B)).await.unwrap();

        let later = resolver.resolve("s1", None).await.unwrap();
        assert_eq!(later.tenant_id, "tenant-b");
    }

    #[tokio::test]
    async fn test_blank_crn_falls_back_to_default() {
        let resolver = resolver(Some(CRN_DEFAULT)).await;
        let resolved = resolver.resolve("s1", Some("  ")).await.unwrap();
        assert_eq!(resolved.tenant_id, "tenant-default");
    }

    #[tokio::test]
    async fn test_missing_crn_is_validation_error() {
        let resolver = resolver(None).await;
        let err = resolver.resolve("s1", None).await.unwrap_err();
        assert!(matches!(err, ToolError::Validation { .. }));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_malformed_crn_is_not_bound() {
        let resolver = resolver(None).await;
        let err = resolver.resolve("s1", Some("tenant-a")).await.unwrap_err();
        assert!(err.to_string().starts_with("Invalid CRN"));
        assert!(resolver.sessions().get("s1").await.is_none());
    }

    #[tokio::test]
    async fn test_unopened_session_is_not_bound() {
        let resolver = resolver(None).await;
        for i in 0..5 {
            let session_id = format!("ephemeral-{}", i);
            let resolved = resolver.resolve(&session_id, Some(CRN_A)).await.unwrap();
            assert_eq!(resolved.tenant_id, "tenant-a");
        }

        assert_eq!(resolver.sessions().len().await, 2);
        let err = resolver.resolve("ephemeral-0", None).await.unwrap_err();
        assert!(matches!(err, ToolError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_session_store_remove() {
        let store = SessionStore::new();
        assert!(!store.bind("s1", TenantCrn::parse(CRN_A).unwrap()).await);
        assert_eq!(store.len().await, 0);

        store.open("s1").await;
        assert!(store.bind("s1", TenantCrn::parse(CRN_A).unwrap()).await);
        assert_eq!(store.len().await, 1);
        assert!(store.remove("s1").await);
        assert!(!store.remove("s1").await);
        assert!(!store.is_open("s1").await);
        assert_eq!(store.len().await, 0);
    }
}
