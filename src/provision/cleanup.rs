// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Remove everything this tool created, ahead of re-provisioning

use crate::config::ReconciliationRequest;
use crate::constants::labels;
use crate::error::{is_not_found, MultiClusterError, Result};
use crate::kubernetes::{apply::kind_of, ClusterClients};
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use kube::{
    api::{DeleteParams, ListParams},
    Api, Client, Resource, ResourceExt,
};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::{info, instrument};

/// Delete every labelled object reachable through `api`. NotFound while
/// listing or deleting means there is nothing left to do.
async fn delete_labelled<K>(api: Api<K>, cluster: &str) -> Result<usize>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
{
    let kind = kind_of::<K>();
    let list = match api.list(&ListParams::default().labels(labels::SELECTOR)).await {
        Ok(list) => list,
        Err(e) if is_not_found(&e) => return Ok(0),
        Err(e) => return Err(MultiClusterError::api(cluster, kind, "*")(e)),
    };

    let mut deleted = 0;
    for object in list.items {
        let name = object.name_any();
        info!(
            "Deleting {} {} in cluster {}",
            kind,
            object
                .namespace()
                .map(|ns| format!("{}/{}", ns, name))
                .unwrap_or_else(|| name.clone()),
            cluster
        );
        match api.delete(&name, &DeleteParams::default()).await {
            Ok(_) => deleted += 1,
            Err(e) if is_not_found(&e) => {}
            Err(e) => return Err(MultiClusterError::api(cluster, kind, &name)(e)),
        }
    }
    Ok(deleted)
}

/// Delete labelled Secrets, ServiceAccounts, Roles and RoleBindings in `namespace`
#[instrument(skip(client))]
pub async fn cleanup_namespace(client: &Client, cluster: &str, namespace: &str) -> Result<usize> {
    let mut deleted = 0;
    deleted += delete_labelled::<Secret>(Api::namespaced(client.clone(), namespace), cluster).await?;
    deleted +=
        delete_labelled::<ServiceAccount>(Api::namespaced(client.clone(), namespace), cluster).await?;
    deleted += delete_labelled::<Role>(Api::namespaced(client.clone(), namespace), cluster).await?;
    deleted +=
        delete_labelled::<RoleBinding>(Api::namespaced(client.clone(), namespace), cluster).await?;
    Ok(deleted)
}

/// Delete labelled ClusterRoleBindings and ClusterRoles
#[instrument(skip(client))]
pub async fn cleanup_cluster_scoped(client: &Client, cluster: &str) -> Result<usize> {
    let mut deleted = 0;
    deleted += delete_labelled::<ClusterRoleBinding>(Api::all(client.clone()), cluster).await?;
    deleted += delete_labelled::<ClusterRole>(Api::all(client.clone()), cluster).await?;
    Ok(deleted)
}

/// Clean the member and central namespaces, and the cluster-scoped grants, of
/// every cluster in the request. Namespaces themselves are kept.
pub async fn cleanup(clients: &ClusterClients, request: &ReconciliationRequest) -> Result<()> {
    for cluster in request.all_clusters() {
        let client = clients.get(cluster)?;
        let mut deleted = 0;
        for namespace in request.namespaces() {
            deleted += cleanup_namespace(client, cluster, namespace).await?;
        }
        deleted += cleanup_cluster_scoped(client, cluster).await?;
        info!("Removed {} labelled objects from cluster {}", deleted, cluster);
    }
    Ok(())
}
