// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Database workload identities in member clusters, installed from policy or
//! copied from a healthy source cluster

use crate::config::{DatabaseRoleMode, ReconciliationRequest};
use crate::constants::database;
use crate::error::{MultiClusterError, Result};
use crate::kubernetes::{ensure_resource, ClusterClients, ConflictPolicy};
use crate::provision::identity::{ensure_service_account, service_account};
use crate::rbac;
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use k8s_openapi::api::rbac::v1::{Role, RoleBinding};
use kube::{api::ObjectMeta, Api, Client, ResourceExt};
use tracing::{info, instrument, warn};

/// Create the three database service accounts and the app database Role/RoleBinding
#[instrument(skip(client))]
pub async fn install_database_roles(
    client: &Client,
    cluster: &str,
    namespace: &str,
    image_pull_secret: Option<&str>,
) -> Result<()> {
    for name in database::SERVICE_ACCOUNTS {
        ensure_service_account(
            client,
            cluster,
            &service_account(name, namespace, image_pull_secret),
        )
        .await?;
    }

    let roles: Api<Role> = Api::namespaced(client.clone(), namespace);
    ensure_resource(&roles, cluster, &rbac::database_role(namespace), ConflictPolicy::Ignore)
        .await?;

    let bindings: Api<RoleBinding> = Api::namespaced(client.clone(), namespace);
    ensure_resource(
        &bindings,
        cluster,
        &rbac::database_role_binding(namespace),
        ConflictPolicy::Ignore,
    )
    .await?;

    Ok(())
}

/// Copy of an object's identity for another cluster: name, namespace and labels only
fn copied_metadata(meta: &ObjectMeta, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: meta.name.clone(),
        namespace: Some(namespace.to_string()),
        labels: meta.labels.clone(),
        ..Default::default()
    }
}

/// Copy a Secret (data, type and labels) into the target cluster unless it already exists there
async fn copy_secret(
    source: &Client,
    source_cluster: &str,
    target: &Client,
    target_cluster: &str,
    namespace: &str,
    name: &str,
) -> Result<()> {
    let secret = Api::<Secret>::namespaced(source.clone(), namespace)
        .get(name)
        .await
        .map_err(MultiClusterError::api(source_cluster, "Secret", name))?;

    let copy = Secret {
        metadata: copied_metadata(&secret.metadata, namespace),
        data: secret.data.clone(),
        type_: secret.type_.clone(),
        ..Default::default()
    };
    let secrets: Api<Secret> = Api::namespaced(target.clone(), namespace);
    ensure_resource(&secrets, target_cluster, &copy, ConflictPolicy::Ignore).await?;
    Ok(())
}

/// Bring `target` to parity with `source`: its database service accounts,
/// their image pull secrets and the app database Role/RoleBinding.
///
/// Failing to read any of the five source objects is fatal. Failing to copy
/// an image pull secret is only logged.
#[instrument(skip(source, target))]
pub async fn recover_database_roles(
    source: &Client,
    source_cluster: &str,
    target: &Client,
    target_cluster: &str,
    namespace: &str,
) -> Result<()> {
    let source_accounts: Api<ServiceAccount> = Api::namespaced(source.clone(), namespace);
    let mut accounts = Vec::with_capacity(database::SERVICE_ACCOUNTS.len());
    for name in database::SERVICE_ACCOUNTS {
        let account = source_accounts
            .get(name)
            .await
            .map_err(MultiClusterError::api(source_cluster, "ServiceAccount", name))?;
        accounts.push(account);
    }
    let role = Api::<Role>::namespaced(source.clone(), namespace)
        .get(database::APPDB_ROLE)
        .await
        .map_err(MultiClusterError::api(source_cluster, "Role", database::APPDB_ROLE))?;
    let binding = Api::<RoleBinding>::namespaced(source.clone(), namespace)
        .get(database::APPDB_ROLE_BINDING)
        .await
        .map_err(MultiClusterError::api(
            source_cluster,
            "RoleBinding",
            database::APPDB_ROLE_BINDING,
        ))?;

    let mut pull_secrets: Vec<String> = accounts
        .iter()
        .flat_map(|sa| sa.image_pull_secrets.iter().flatten())
        .map(|reference| reference.name.clone())
        .collect();
    pull_secrets.sort();
    pull_secrets.dedup();
    for name in &pull_secrets {
        if let Err(e) =
            copy_secret(source, source_cluster, target, target_cluster, namespace, name).await
        {
            warn!(
                "Failed to copy image pull secret {} to cluster {}: {}",
                name, target_cluster, e
            );
        }
    }

    for account in &accounts {
        ensure_service_account(
            target,
            target_cluster,
            &ServiceAccount {
                metadata: copied_metadata(&account.metadata, namespace),
                image_pull_secrets: account.image_pull_secrets.clone(),
                ..Default::default()
            },
        )
        .await?;
    }

    let roles: Api<Role> = Api::namespaced(target.clone(), namespace);
    ensure_resource(
        &roles,
        target_cluster,
        &Role {
            metadata: copied_metadata(&role.metadata, namespace),
            rules: role.rules.clone(),
        },
        ConflictPolicy::Replace,
    )
    .await?;

    let bindings: Api<RoleBinding> = Api::namespaced(target.clone(), namespace);
    ensure_resource(
        &bindings,
        target_cluster,
        &RoleBinding {
            metadata: copied_metadata(&binding.metadata, namespace),
            role_ref: binding.role_ref.clone(),
            subjects: binding.subjects.clone(),
        },
        ConflictPolicy::Replace,
    )
    .await?;

    info!(
        "Copied database roles {} from cluster {} to cluster {}",
        role.name_any(),
        source_cluster,
        target_cluster
    );
    Ok(())
}

/// Provision database roles in every member cluster according to `mode`
pub async fn provision_database_roles(
    clients: &ClusterClients,
    request: &ReconciliationRequest,
    mode: &DatabaseRoleMode,
) -> Result<()> {
    let namespace = &request.member_namespace;
    match mode {
        DatabaseRoleMode::Install => {
            for cluster in &request.member_clusters {
                install_database_roles(
                    clients.get(cluster)?,
                    cluster,
                    namespace,
                    request.image_pull_secret.as_deref(),
                )
                .await?;
            }
        }
        DatabaseRoleMode::Recover { source } => {
            let source_client = clients.get(source)?;
            for cluster in request.member_clusters.iter().filter(|c| *c != source) {
                recover_database_roles(
                    source_client,
                    source,
                    clients.get(cluster)?,
                    cluster,
                    namespace,
                )
                .await?;
            }
        }
    }
    info!("Ensured database roles in member clusters");
    Ok(())
}
