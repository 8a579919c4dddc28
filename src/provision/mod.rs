// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Multi-cluster provisioning: identities, grants, tokens, the central
//! kubeconfig and the member list.

pub mod cleanup;
pub mod database;
pub mod identity;
pub mod kubeconfig;
pub mod members;
pub mod publish;
pub mod tokens;

pub use kubeconfig::assemble_kubeconfig;
pub use members::publish_member_list;
pub use tokens::CredentialToken;

use crate::config::ReconciliationRequest;
use crate::error::Result;
use crate::kubernetes::{ensure_namespace_exists, ClusterClients};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Create the managed namespaces that do not exist yet: member and central
/// namespace in every member cluster, the central namespace in the central cluster
pub async fn ensure_namespaces(clients: &ClusterClients, request: &ReconciliationRequest) -> Result<()> {
    for cluster in &request.member_clusters {
        let client = clients.get(cluster)?;
        for namespace in request.namespaces() {
            ensure_namespace_exists(client, cluster, namespace).await?;
        }
    }
    ensure_namespace_exists(
        clients.get(&request.central_cluster)?,
        &request.central_cluster,
        &request.central_namespace,
    )
    .await?;

    info!("Ensured namespaces exist in all clusters");
    Ok(())
}

/// Run one full reconciliation.
///
/// Phases run in a fixed order and the first failure aborts the rest:
/// cleanup (when requested), namespaces, service accounts and grants, token
/// collection, kubeconfig publication, database roles. The request is
/// validated and every cluster client resolved before any cluster is touched.
pub async fn ensure_multi_cluster_resources(
    clients: &ClusterClients,
    request: &ReconciliationRequest,
    cancel: &CancellationToken,
) -> Result<()> {
    request.validate()?;
    for cluster in request.all_clusters() {
        clients.get(cluster)?;
    }

    if request.cleanup {
        cleanup::cleanup(clients, request)
            .await
            .map_err(|e| e.in_phase("failed performing cleanup of resources"))?;
    }

    ensure_namespaces(clients, request)
        .await
        .map_err(|e| e.in_phase("failed ensuring namespaces"))?;

    identity::ensure_operator_identities(clients, request)
        .await
        .map_err(|e| e.in_phase("failed creating service accounts and roles in all clusters"))?;

    let tokens = tokens::collect_tokens(clients, request, cancel)
        .await
        .map_err(|e| e.in_phase("failed to get service account secret tokens"))?;

    let document = assemble_kubeconfig(
        &request.member_clusters,
        &request.member_api_servers,
        &tokens,
        request.context_namespace(),
    )
    .map_err(|e| e.in_phase("failed to create kubeconfig from service account tokens"))?;

    publish::publish_kubeconfig(
        clients.get(&request.central_cluster)?,
        &request.central_cluster,
        &request.central_namespace,
        &document,
    )
    .await
    .map_err(|e| e.in_phase("failed creating kubeconfig secret"))?;

    if let Some(mode) = request.database_roles() {
        database::provision_database_roles(clients, request, &mode)
            .await
            .map_err(|e| e.in_phase("failed setting up database roles"))?;
    }

    info!(
        "Multi-cluster resources ensured for {} member clusters",
        request.member_clusters.len()
    );
    Ok(())
}
