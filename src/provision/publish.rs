// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Store the assembled kubeconfig in the central cluster

use crate::constants::central;
use crate::error::Result;
use crate::kubernetes::{ensure_resource, ConflictPolicy, Outcome};
use crate::rbac::managed_labels;
use crate::types::KubeconfigDocument;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::{api::ObjectMeta, Api, Client};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// The labelled Secret holding `document` under the kubeconfig key
pub fn kubeconfig_secret(namespace: &str, document: &KubeconfigDocument) -> Result<Secret> {
    let yaml = document.to_yaml()?;
    Ok(Secret {
        metadata: ObjectMeta {
            name: Some(central::KUBECONFIG_SECRET_NAME.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(managed_labels()),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(
            central::KUBECONFIG_SECRET_KEY.to_string(),
            ByteString(yaml.into_bytes()),
        )])),
        ..Default::default()
    })
}

/// Create or fully replace the kubeconfig Secret in the central namespace
#[instrument(skip(client, document))]
pub async fn publish_kubeconfig(
    client: &Client,
    cluster: &str,
    namespace: &str,
    document: &KubeconfigDocument,
) -> Result<Outcome> {
    let secret = kubeconfig_secret(namespace, document)?;
    info!(
        "Publishing kubeconfig secret {}/{} in cluster {}",
        namespace,
        central::KUBECONFIG_SECRET_NAME,
        cluster
    );

    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
    ensure_resource(&secrets, cluster, &secret, ConflictPolicy::Replace).await
}
