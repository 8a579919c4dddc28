// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Record the member clusters in a ConfigMap the operator reads

use crate::config::ReconciliationRequest;
use crate::constants::central;
use crate::error::Result;
use crate::kubernetes::{ensure_resource, ClusterClients, ConflictPolicy, Outcome};
use crate::rbac::managed_labels;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{api::ObjectMeta, Api};
use tracing::{info, instrument};

/// ConfigMap with one empty-valued key per member cluster
pub fn member_list_config_map(name: &str, namespace: &str, members: &[String]) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(managed_labels()),
            ..Default::default()
        },
        data: Some(members.iter().map(|m| (m.clone(), String::new())).collect()),
        ..Default::default()
    }
}

/// Keep every member already recorded and add the new ones. Members are never pruned.
fn union_members(existing: &ConfigMap, mut desired: ConfigMap) -> ConfigMap {
    let mut data = existing.data.clone().unwrap_or_default();
    data.extend(desired.data.take().unwrap_or_default());
    desired.data = Some(data);
    desired
}

/// Create the member-list ConfigMap in the central namespace, or merge the
/// current members into the existing one
#[instrument(skip(clients, request), fields(cluster = %request.central_cluster))]
pub async fn publish_member_list(
    clients: &ClusterClients,
    request: &ReconciliationRequest,
) -> Result<Outcome> {
    let name = central::MEMBER_LIST_CONFIG_MAP;
    let namespace = &request.central_namespace;
    let config_map = member_list_config_map(name, namespace, &request.member_clusters);

    info!(
        "Publishing member list {}/{} in cluster {}",
        namespace, name, request.central_cluster
    );
    let api: Api<ConfigMap> =
        Api::namespaced(clients.get(&request.central_cluster)?.clone(), namespace);
    ensure_resource(
        &api,
        &request.central_cluster,
        &config_map,
        ConflictPolicy::Merge(union_members),
    )
    .await
}
