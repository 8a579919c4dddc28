// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Per-cluster client handles and kubeconfig utilities

use crate::error::{MultiClusterError, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// One kube client per cluster, addressed by cluster name
#[derive(Clone, Default)]
pub struct ClusterClients {
    clients: BTreeMap<String, Client>,
}

impl ClusterClients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cluster: impl Into<String>, client: Client) {
        self.clients.insert(cluster.into(), client);
    }

    pub fn with(mut self, cluster: impl Into<String>, client: Client) -> Self {
        self.insert(cluster, client);
        self
    }

    /// Get the client for a cluster, failing if none was registered
    pub fn get(&self, cluster: &str) -> Result<&Client> {
        self.clients
            .get(cluster)
            .ok_or_else(|| MultiClusterError::UnknownCluster(cluster.to_string()))
    }

    pub fn contains(&self, cluster: &str) -> bool {
        self.clients.contains_key(cluster)
    }

    /// Build a client for every named cluster from the kubeconfig context of the same name
    #[instrument(skip(kubeconfig))]
    pub async fn from_kubeconfig(kubeconfig: &Kubeconfig, clusters: &[&str]) -> Result<Self> {
        let mut set = Self::new();
        for cluster in clusters {
            if set.contains(cluster) {
                continue;
            }
            let client = create_client_for_context(kubeconfig, cluster).await?;
            set.insert(*cluster, client);
        }
        info!("Created clients for {} clusters", set.clients.len());
        Ok(set)
    }
}

/// Read the local kubeconfig, from `$KUBECONFIG` or `~/.kube/config`
pub fn load_kubeconfig() -> Result<Kubeconfig> {
    Kubeconfig::read()
        .map_err(|e| MultiClusterError::Kubeconfig(format!("Failed to read kubeconfig: {}", e)))
}

/// Create a Kubernetes client for the given kubeconfig context
async fn create_client_for_context(kubeconfig: &Kubeconfig, context: &str) -> Result<Client> {
    debug!("Creating client for context {}", context);

    let options = KubeConfigOptions {
        context: Some(context.to_string()),
        ..Default::default()
    };

    let client_config = kube::Config::from_custom_kubeconfig(kubeconfig.clone(), &options)
        .await
        .map_err(|e| {
            MultiClusterError::Kubeconfig(format!(
                "Failed to create config for cluster {}: {}",
                context, e
            ))
        })?;

    Client::try_from(client_config).map_err(|e| {
        MultiClusterError::Kubeconfig(format!(
            "Failed to create client for cluster {}: {}",
            context, e
        ))
    })
}

/// Look up the API server URL of every named cluster in the kubeconfig, in order
pub fn member_api_server_urls(kubeconfig: &Kubeconfig, clusters: &[String]) -> Result<Vec<String>> {
    clusters
        .iter()
        .map(|name| {
            kubeconfig
                .clusters
                .iter()
                .find(|c| &c.name == name)
                .and_then(|c| c.cluster.as_ref())
                .and_then(|c| c.server.clone())
                .ok_or_else(|| {
                    MultiClusterError::Kubeconfig(format!(
                        "cluster '{}' not found in kubeconfig",
                        name
                    ))
                })
        })
        .collect()
}
