// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Operator service accounts and their permission grants

use crate::config::ReconciliationRequest;
use crate::constants::token;
use crate::error::Result;
use crate::kubernetes::{ensure_resource, ClusterClients, ConflictPolicy};
use crate::rbac::{self, managed_labels};
use crate::types::{ClusterKind, PermissionScope};
use k8s_openapi::api::core::v1::{LocalObjectReference, Secret, ServiceAccount};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use kube::{api::ObjectMeta, Api, Client};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Labelled service account, optionally referencing an image pull secret
pub fn service_account(name: &str, namespace: &str, image_pull_secret: Option<&str>) -> ServiceAccount {
    ServiceAccount {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(managed_labels()),
            ..Default::default()
        },
        image_pull_secrets: image_pull_secret.map(|secret| {
            vec![LocalObjectReference {
                name: secret.to_string(),
            }]
        }),
        ..Default::default()
    }
}

/// Empty token secret for a service account. The platform fills in `ca.crt` and `token`.
pub fn token_secret(service_account: &str, namespace: &str) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(format!("{}{}", service_account, token::SECRET_SUFFIX)),
            namespace: Some(namespace.to_string()),
            labels: Some(managed_labels()),
            annotations: Some(BTreeMap::from([(
                token::SERVICE_ACCOUNT_ANNOTATION.to_string(),
                service_account.to_string(),
            )])),
            ..Default::default()
        },
        type_: Some(token::SECRET_TYPE.to_string()),
        ..Default::default()
    }
}

/// Ensure a service account exists, leaving an existing one alone
pub async fn ensure_service_account(
    client: &Client,
    cluster: &str,
    desired: &ServiceAccount,
) -> Result<()> {
    let namespace = desired.metadata.namespace.as_deref().unwrap_or_default();
    let api: Api<ServiceAccount> = Api::namespaced(client.clone(), namespace);
    ensure_resource(&api, cluster, desired, ConflictPolicy::Ignore).await?;
    Ok(())
}

/// Ensure the Role/RoleBinding or ClusterRole/ClusterRoleBinding pair granting
/// `service_account` its permissions in `namespace`.
///
/// Namespaced grants are replaced when they already exist; cluster-scoped ones
/// are created once and then left alone.
#[instrument(skip(client))]
pub async fn ensure_grant(
    client: &Client,
    cluster: &str,
    kind: ClusterKind,
    scope: PermissionScope,
    namespace: &str,
    service_account: &str,
    service_account_namespace: &str,
) -> Result<()> {
    match scope {
        PermissionScope::Namespace => {
            let roles: Api<Role> = Api::namespaced(client.clone(), namespace);
            ensure_resource(
                &roles,
                cluster,
                &rbac::operator_role(kind, namespace),
                ConflictPolicy::Replace,
            )
            .await?;

            let bindings: Api<RoleBinding> = Api::namespaced(client.clone(), namespace);
            ensure_resource(
                &bindings,
                cluster,
                &rbac::operator_role_binding(namespace, service_account, service_account_namespace),
                ConflictPolicy::Replace,
            )
            .await?;
        }
        PermissionScope::Cluster => {
            let roles: Api<ClusterRole> = Api::all(client.clone());
            ensure_resource(
                &roles,
                cluster,
                &rbac::operator_cluster_role(kind),
                ConflictPolicy::Ignore,
            )
            .await?;

            let bindings: Api<ClusterRoleBinding> = Api::all(client.clone());
            ensure_resource(
                &bindings,
                cluster,
                &rbac::operator_cluster_role_binding(service_account, service_account_namespace),
                ConflictPolicy::Ignore,
            )
            .await?;
        }
    }
    Ok(())
}

/// Provision the operator identity of one cluster: its service account (and
/// token secret) in the central namespace, plus grants in every namespace the
/// operator manages.
#[instrument(skip(client, request), fields(cluster = %cluster))]
pub async fn ensure_operator_identity(
    client: &Client,
    cluster: &str,
    kind: ClusterKind,
    request: &ReconciliationRequest,
) -> Result<()> {
    let sa_namespace = request.central_namespace.as_str();
    info!("Ensuring {} identity {} in cluster {}", kind, request.service_account, cluster);

    ensure_service_account(
        client,
        cluster,
        &service_account(
            &request.service_account,
            sa_namespace,
            request.image_pull_secret.as_deref(),
        ),
    )
    .await?;

    if request.create_service_account_secrets {
        let secrets: Api<Secret> = Api::namespaced(client.clone(), sa_namespace);
        ensure_resource(
            &secrets,
            cluster,
            &token_secret(&request.service_account, sa_namespace),
            ConflictPolicy::Ignore,
        )
        .await?;
    }

    let scope = kind.effective_scope(request.scope());
    if scope != request.scope() {
        info!(
            "Cluster-scoped grants are not applied to {} cluster {}, using namespaced grants",
            kind, cluster
        );
    }

    match scope {
        PermissionScope::Namespace => {
            for namespace in request.namespaces() {
                ensure_grant(
                    client,
                    cluster,
                    kind,
                    scope,
                    namespace,
                    &request.service_account,
                    sa_namespace,
                )
                .await?;
            }
        }
        PermissionScope::Cluster => {
            ensure_grant(
                client,
                cluster,
                kind,
                scope,
                sa_namespace,
                &request.service_account,
                sa_namespace,
            )
            .await?;
        }
    }

    Ok(())
}

/// Provision the central identity first, then every member that is not also the central cluster
pub async fn ensure_operator_identities(
    clients: &ClusterClients,
    request: &ReconciliationRequest,
) -> Result<()> {
    let central = &request.central_cluster;
    ensure_operator_identity(clients.get(central)?, central, ClusterKind::Central, request).await?;

    for member in &request.member_clusters {
        if member == central {
            continue;
        }
        ensure_operator_identity(clients.get(member)?, member, ClusterKind::Member, request)
            .await?;
    }

    info!("Ensured service accounts and roles in all clusters");
    Ok(())
}
