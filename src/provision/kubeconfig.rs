// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Build the kubeconfig the operator uses to reach every member cluster

use crate::error::{MultiClusterError, Result};
use crate::provision::tokens::CredentialToken;
use crate::types::kubeconfig::{
    ClusterEntry, ContextEntry, KubeconfigDocument, NamedCluster, NamedContext, NamedUser,
    UserEntry,
};
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

/// Assemble one cluster/context/user triple per member, in member-list order.
///
/// `api_servers` is index-aligned with `members`. `namespace` goes into every
/// context and is empty for cluster-scoped setups. The result depends on
/// nothing but the arguments, so an unchanged member always yields an
/// identical entry.
pub fn assemble_kubeconfig(
    members: &[String],
    api_servers: &[String],
    tokens: &BTreeMap<String, CredentialToken>,
    namespace: &str,
) -> Result<KubeconfigDocument> {
    if api_servers.len() != members.len() {
        return Err(MultiClusterError::config(format!(
            "expected {} api server addresses but got {}",
            members.len(),
            api_servers.len()
        )));
    }

    let mut document = KubeconfigDocument::default();
    for (member, server) in members.iter().zip(api_servers) {
        let credential = tokens
            .get(member)
            .ok_or_else(|| MultiClusterError::TokenCountMismatch {
                expected: members.len(),
                found: tokens.len(),
            })?;

        document.clusters.push(NamedCluster {
            name: member.clone(),
            cluster: ClusterEntry {
                certificate_authority_data: ByteString(credential.ca.clone()),
                server: server.clone(),
            },
        });
        document.contexts.push(NamedContext {
            name: member.clone(),
            context: ContextEntry {
                cluster: member.clone(),
                namespace: namespace.to_string(),
                user: member.clone(),
            },
        });
        document.users.push(NamedUser {
            name: member.clone(),
            user: UserEntry {
                token: credential.token.clone(),
            },
        });
    }

    Ok(document)
}
