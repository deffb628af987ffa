//! Identity resolution and anonymization
//!
//! Every author identity in the export (reporter, assignee, attachment,
//! comment and history authors) goes through [`IdentityResolver::resolve_author`].
//! Members of the configured exemption groups keep their identity; everyone
//! else is replaced with the placeholder account. Any lookup failure
//! degrades toward anonymization, never the other way around.
//!
//! Two durable caches back the resolver so repeated runs don't re-query the
//! server: the exemption cache (`<userKey>,<True|False>`) and, for
//! cross-system runs, the email-to-accountId cache.

use crate::adapters::jira::models::UserRef;
use crate::adapters::jira::JiraClient;
use crate::config::Deployment;
use crate::core::state::CacheFile;
use std::sync::Arc;

pub struct IdentityResolver {
    source: Arc<JiraClient>,
    /// Cloud directory for account-id lookups; only set for cross-system runs
    directory: Option<Arc<JiraClient>>,
    deployment: Deployment,
    exempt_groups: Vec<String>,
    placeholder: String,
    exemptions: CacheFile,
    accounts: CacheFile,
}

impl IdentityResolver {
    pub fn new(
        source: Arc<JiraClient>,
        directory: Option<Arc<JiraClient>>,
        deployment: Deployment,
        exempt_groups: Vec<String>,
        placeholder: String,
        exemptions: CacheFile,
        accounts: CacheFile,
    ) -> Self {
        Self {
            source,
            directory,
            deployment,
            exempt_groups,
            placeholder,
            exemptions,
            accounts,
        }
    }

    /// Resolve a user reference to the identity written into the export.
    ///
    /// Absent references, users without a stable key, and non-exempt users
    /// all map to the placeholder account.
    pub async fn resolve_author(&self, user: Option<&UserRef>) -> String {
        let Some(user) = user else {
            return self.placeholder.clone();
        };

        let key = match self.deployment {
            Deployment::Cloud => user.account_id.as_deref(),
            Deployment::Datacenter => user.name.as_deref(),
        };
        let Some(key) = key else {
            return self.placeholder.clone();
        };

        if !self.is_exempt(key).await {
            return self.placeholder.clone();
        }

        // Exempt users keep their identity. On a cross-system run the
        // identity must be a Cloud accountId, resolved by email; without an
        // email the source key is the best available.
        if self.deployment == Deployment::Datacenter {
            if let Some(email) = user.email_address.as_deref() {
                return self.account_id_for(email).await;
            }
        }

        key.to_string()
    }

    /// Number of entries in the exemption cache.
    pub fn cached_exemptions(&self) -> usize {
        self.exemptions.len()
    }

    /// Number of entries in the account-id cache.
    pub fn cached_accounts(&self) -> usize {
        self.accounts.len()
    }

    /// Check exemption-group membership, consulting the durable cache first.
    /// Lookup failures classify as not exempt.
    async fn is_exempt(&self, key: &str) -> bool {
        if let Some(cached) = self.exemptions.get(key) {
            return cached == "True";
        }

        let exempt = match self.source.fetch_user_with_groups(key).await {
            Ok(user) => user
                .groups
                .items
                .iter()
                .any(|group| self.exempt_groups.contains(&group.name)),
            Err(e) => {
                tracing::warn!(
                    user_key = key,
                    error = %e,
                    "Group lookup failed, treating user as not exempt"
                );
                false
            }
        };

        if let Err(e) = self
            .exemptions
            .put(key, if exempt { "True" } else { "False" })
        {
            tracing::warn!(user_key = key, error = %e, "Failed to persist exemption cache");
        }

        exempt
    }

    /// Resolve a Cloud accountId for an exempt cross-system user.
    async fn account_id_for(&self, email: &str) -> String {
        if let Some(cached) = self.accounts.get(email) {
            return cached;
        }

        let Some(directory) = &self.directory else {
            tracing::warn!(
                email,
                "No directory configured for account lookup, using placeholder"
            );
            return self.placeholder.clone();
        };

        match directory.search_account_id(email).await {
            Ok(Some(account_id)) => {
                if let Err(e) = self.accounts.put(email, &account_id) {
                    tracing::warn!(email, error = %e, "Failed to persist account-id cache");
                }
                account_id
            }
            Ok(None) => {
                tracing::warn!(email, "No account found for email, using placeholder");
                self.placeholder.clone()
            }
            Err(e) => {
                tracing::warn!(email, error = %e, "Account lookup failed, using placeholder");
                self.placeholder.clone()
            }
        }
    }
}
