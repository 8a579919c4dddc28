// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace management utilities

use crate::error::{is_already_exists, is_not_found, MultiClusterError, Result};
use crate::rbac::managed_labels;
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Client,
};
use tracing::{debug, info, instrument};

/// Ensure a namespace exists in the cluster, create it labelled if it doesn't.
/// An existing namespace is left exactly as it is.
#[instrument(skip(client))]
pub async fn ensure_namespace_exists(client: &Client, cluster: &str, namespace: &str) -> Result<()> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    match namespaces.get(namespace).await {
        Ok(_) => {
            debug!("Namespace {} already exists in cluster {}", namespace, cluster);
            Ok(())
        }
        Err(e) if is_not_found(&e) => {
            info!("Creating namespace {} in cluster {}", namespace, cluster);
            let ns = Namespace {
                metadata: ObjectMeta {
                    name: Some(namespace.to_string()),
                    labels: Some(managed_labels()),
                    ..Default::default()
                },
                ..Default::default()
            };
            match namespaces.create(&PostParams::default(), &ns).await {
                Ok(_) => {
                    info!("Namespace {} created successfully", namespace);
                    Ok(())
                }
                Err(e) if is_already_exists(&e) => Ok(()),
                Err(e) => Err(MultiClusterError::api(cluster, "Namespace", namespace)(e)),
            }
        }
        Err(e) => Err(MultiClusterError::api(cluster, "Namespace", namespace)(e)),
    }
}
