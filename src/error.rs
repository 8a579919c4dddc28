// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MultiClusterError {
    #[error("{kind} '{name}' in cluster {cluster}: {source}")]
    Api {
        cluster: String,
        kind: &'static str,
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("timed out after {timeout:?} waiting for {what} in cluster {cluster}")]
    PollTimeout {
        cluster: String,
        what: String,
        timeout: Duration,
    },

    #[error("cancelled while waiting for {what} in cluster {cluster}")]
    Cancelled { cluster: String, what: String },

    #[error("required {expected} service account tokens but found only {found}")]
    TokenCountMismatch { expected: usize, found: usize },

    #[error("key '{key}' missing from token secret {secret}")]
    MissingTokenField { secret: String, key: &'static str },

    #[error("token in secret {secret} is not valid UTF-8")]
    InvalidToken { secret: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to load kubeconfig: {0}")]
    Kubeconfig(String),

    #[error("No client configured for cluster {0}")]
    UnknownCluster(String),

    #[error("Failed to serialize kubeconfig: {0}")]
    Serialization(#[from] serde_yaml::Error),

    #[error("{phase}: {source}")]
    Phase {
        phase: &'static str,
        #[source]
        source: Box<MultiClusterError>,
    },
}

impl MultiClusterError {
    /// Attach cluster and resource context to a raw API error, for use with `map_err`
    pub fn api(
        cluster: &str,
        kind: &'static str,
        name: &str,
    ) -> impl FnOnce(kube::Error) -> MultiClusterError {
        let cluster = cluster.to_string();
        let name = name.to_string();
        move |source| MultiClusterError::Api {
            cluster,
            kind,
            name,
            source,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap this error with the name of the phase that aborted
    pub fn in_phase(self, phase: &'static str) -> Self {
        Self::Phase {
            phase,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, MultiClusterError>;

/// True for an API `404 NotFound` response
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 404)
}

/// True for an API `409` response (`AlreadyExists` or `Conflict`)
pub fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 409)
}
