// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{operator, poll};
use crate::error::{MultiClusterError, Result};
use crate::types::PermissionScope;
use std::collections::HashSet;
use std::env;
use std::time::Duration;
use url::Url;

/// Interval and overall budget for waiting on platform-populated data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(poll::INTERVAL_MS),
            timeout: Duration::from_secs(poll::TIMEOUT_SECS),
        }
    }
}

impl PollConfig {
    /// Load polling configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let interval = match env::var(poll::INTERVAL_ENV) {
            Ok(v) => Duration::from_millis(v.parse().map_err(|_| {
                MultiClusterError::config(format!("{} must be an integer, got '{}'", poll::INTERVAL_ENV, v))
            })?),
            Err(_) => defaults.interval,
        };
        let timeout = match env::var(poll::TIMEOUT_ENV) {
            Ok(v) => Duration::from_secs(v.parse().map_err(|_| {
                MultiClusterError::config(format!("{} must be an integer, got '{}'", poll::TIMEOUT_ENV, v))
            })?),
            Err(_) => defaults.timeout,
        };

        Ok(Self { interval, timeout })
    }
}

/// How database workload identities are provisioned in member clusters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseRoleMode {
    /// Create the default identities and role from policy
    Install,
    /// Copy the identities and role from a healthy member cluster
    Recover { source: String },
}

/// Everything one invocation needs. Built once, validated, then passed by
/// reference through every phase.
#[derive(Debug, Clone)]
pub struct ReconciliationRequest {
    pub member_clusters: Vec<String>,
    /// Index-aligned with `member_clusters`
    pub member_api_servers: Vec<String>,
    pub central_cluster: String,
    pub service_account: String,
    pub central_namespace: String,
    pub member_namespace: String,
    pub cluster_scoped: bool,
    pub cleanup: bool,
    pub install_database_roles: bool,
    pub source_cluster: Option<String>,
    pub create_service_account_secrets: bool,
    pub image_pull_secret: Option<String>,
    pub poll: PollConfig,
}

impl Default for ReconciliationRequest {
    fn default() -> Self {
        Self {
            member_clusters: Vec::new(),
            member_api_servers: Vec::new(),
            central_cluster: String::new(),
            service_account: operator::DEFAULT_SERVICE_ACCOUNT.to_string(),
            central_namespace: String::new(),
            member_namespace: String::new(),
            cluster_scoped: false,
            cleanup: false,
            install_database_roles: false,
            source_cluster: None,
            create_service_account_secrets: true,
            image_pull_secret: None,
            poll: PollConfig::default(),
        }
    }
}

impl ReconciliationRequest {
    /// Check the request before any cluster is touched
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("service-account", &self.service_account),
            ("central-cluster", &self.central_cluster),
            ("member-cluster-namespace", &self.member_namespace),
            ("central-cluster-namespace", &self.central_namespace),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| *k)
            .collect();
        if !missing.is_empty() {
            return Err(MultiClusterError::config(format!(
                "non empty values are required for [{}]",
                missing.join(", ")
            )));
        }

        if self.member_clusters.is_empty() {
            return Err(MultiClusterError::config(
                "at least one member cluster is required",
            ));
        }

        let mut seen = HashSet::new();
        for name in &self.member_clusters {
            if name.trim().is_empty() {
                return Err(MultiClusterError::config("member cluster names must not be empty"));
            }
            if !seen.insert(name.as_str()) {
                return Err(MultiClusterError::config(format!(
                    "member cluster '{}' is listed more than once",
                    name
                )));
            }
        }

        if let Some(source) = &self.source_cluster {
            if !self.member_clusters.contains(source) {
                return Err(MultiClusterError::config(format!(
                    "source-cluster has to be one of the healthy member clusters: {}",
                    self.member_clusters.join(",")
                )));
            }
        }

        if self.member_api_servers.len() != self.member_clusters.len() {
            return Err(MultiClusterError::config(format!(
                "expected {} api server addresses but got {}",
                self.member_clusters.len(),
                self.member_api_servers.len()
            )));
        }

        for server in &self.member_api_servers {
            Url::parse(server).map_err(|e| {
                MultiClusterError::config(format!("invalid api server address '{}': {}", server, e))
            })?;
        }

        if self.poll.interval.is_zero() || self.poll.timeout.is_zero() {
            return Err(MultiClusterError::config(
                "poll interval and timeout must be greater than zero",
            ));
        }

        Ok(())
    }

    pub fn scope(&self) -> PermissionScope {
        PermissionScope::from_cluster_scoped(self.cluster_scoped)
    }

    /// Recovery from a source cluster takes precedence over a fresh install
    pub fn database_roles(&self) -> Option<DatabaseRoleMode> {
        match &self.source_cluster {
            Some(source) => Some(DatabaseRoleMode::Recover {
                source: source.clone(),
            }),
            None if self.install_database_roles => Some(DatabaseRoleMode::Install),
            None => None,
        }
    }

    /// Namespace written into every kubeconfig context
    pub fn context_namespace(&self) -> &str {
        if self.cluster_scoped {
            ""
        } else {
            &self.member_namespace
        }
    }

    /// Member namespace, plus the central namespace when it differs
    pub fn namespaces(&self) -> Vec<&str> {
        if self.central_namespace == self.member_namespace {
            vec![self.member_namespace.as_str()]
        } else {
            vec![
                self.member_namespace.as_str(),
                self.central_namespace.as_str(),
            ]
        }
    }

    /// Every distinct cluster this request touches: members in order, then central
    pub fn all_clusters(&self) -> Vec<&str> {
        let mut clusters: Vec<&str> = self.member_clusters.iter().map(String::as_str).collect();
        if !clusters.contains(&self.central_cluster.as_str()) {
            clusters.push(&self.central_cluster);
        }
        clusters
    }
}
