// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Read the service account tokens the platform issues in each member cluster

use crate::config::{PollConfig, ReconciliationRequest};
use crate::constants::token;
use crate::error::{is_not_found, MultiClusterError, Result};
use crate::kubernetes::{poll_until, ClusterClients, PollError};
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use kube::{api::ListParams, Api, Client, ResourceExt};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// CA bundle and bearer token of one service account
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialToken {
    /// Secret the credentials were read from
    pub secret_name: String,
    pub ca: Vec<u8>,
    pub token: String,
}

impl CredentialToken {
    /// Extract the credentials from a token secret. Both keys must be present
    /// and non-empty.
    pub fn from_secret(secret: &Secret) -> Result<Self> {
        let secret_name = secret.name_any();
        let field = |key: &'static str| {
            secret
                .data
                .as_ref()
                .and_then(|data| data.get(key))
                .map(|value| value.0.clone())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| MultiClusterError::MissingTokenField {
                    secret: secret_name.clone(),
                    key,
                })
        };

        let ca = field(token::CA_KEY)?;
        let token = String::from_utf8(field(token::TOKEN_KEY)?).map_err(|_| {
            MultiClusterError::InvalidToken {
                secret: secret_name.clone(),
            }
        })?;

        Ok(Self {
            secret_name,
            ca,
            token,
        })
    }
}

/// True when `secret` holds the token of `service_account`, either by the
/// `<sa>-token` name convention or by the service account annotation
pub fn is_token_secret_for(secret: &Secret, service_account: &str) -> bool {
    let by_name = secret
        .name_any()
        .starts_with(&format!("{}-token", service_account));
    let by_annotation = secret
        .annotations()
        .get(token::SERVICE_ACCOUNT_ANNOTATION)
        .is_some_and(|sa| sa == service_account);
    by_name || by_annotation
}

/// One poll attempt: the first populated token secret of the service account, if any.
/// A secret still missing a field is not ready yet; one holding a malformed token is an error.
async fn find_token(
    secrets: &Api<Secret>,
    cluster: &str,
    service_account: &str,
) -> Result<Option<CredentialToken>> {
    let list = match secrets.list(&ListParams::default()).await {
        Ok(list) => list,
        Err(e) if is_not_found(&e) => return Ok(None),
        Err(e) => return Err(MultiClusterError::api(cluster, "Secret", service_account)(e)),
    };

    for secret in list.items.iter().filter(|s| is_token_secret_for(s, service_account)) {
        match CredentialToken::from_secret(secret) {
            Ok(credential) => return Ok(Some(credential)),
            Err(MultiClusterError::MissingTokenField { .. }) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

/// Wait for the token of `service_account` in one cluster
#[instrument(skip(client, poll, cancel))]
pub async fn collect_token(
    client: &Client,
    cluster: &str,
    namespace: &str,
    service_account: &str,
    poll: &PollConfig,
    cancel: &CancellationToken,
) -> Result<CredentialToken> {
    let accounts: Api<ServiceAccount> = Api::namespaced(client.clone(), namespace);
    accounts
        .get(service_account)
        .await
        .map_err(MultiClusterError::api(cluster, "ServiceAccount", service_account))?;

    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let credential = poll_until(poll, cancel, || find_token(&secrets, cluster, service_account))
        .await
        .map_err(|e| {
            let what = format!("token secret of service account {}/{}", namespace, service_account);
            match e {
                PollError::Timeout => MultiClusterError::PollTimeout {
                    cluster: cluster.to_string(),
                    what,
                    timeout: poll.timeout,
                },
                PollError::Cancelled => MultiClusterError::Cancelled {
                    cluster: cluster.to_string(),
                    what,
                },
                PollError::Failed(e) => e,
            }
        })?;

    debug!(
        "Read token of {}/{} from secret {} in cluster {}",
        namespace, service_account, credential.secret_name, cluster
    );
    Ok(credential)
}

/// Collect the operator token of every member cluster, in member-list order
pub async fn collect_tokens(
    clients: &ClusterClients,
    request: &ReconciliationRequest,
    cancel: &CancellationToken,
) -> Result<BTreeMap<String, CredentialToken>> {
    let mut tokens = BTreeMap::new();
    for cluster in &request.member_clusters {
        let credential = collect_token(
            clients.get(cluster)?,
            cluster,
            &request.central_namespace,
            &request.service_account,
            &request.poll,
            cancel,
        )
        .await?;
        tokens.insert(cluster.clone(), credential);
    }

    ensure_token_count(request.member_clusters.len(), &tokens)?;
    info!("Collected {} service account tokens", tokens.len());
    Ok(tokens)
}

/// Fail unless exactly one token was collected per member cluster
pub fn ensure_token_count(
    expected: usize,
    tokens: &BTreeMap<String, CredentialToken>,
) -> Result<()> {
    if tokens.len() != expected {
        return Err(MultiClusterError::TokenCountMismatch {
            expected,
            found: tokens.len(),
        });
    }
    Ok(())
}
