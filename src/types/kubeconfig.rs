// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Serializable kubeconfig document assembled from member cluster credentials.

use k8s_openapi::ByteString;
use serde::{Deserialize, Serialize};

/// A kubeconfig with one cluster, context and user entry per member cluster,
/// all three named after the member cluster and kept in member-list order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KubeconfigDocument {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    #[serde(default)]
    pub users: Vec<NamedUser>,
}

impl Default for KubeconfigDocument {
    fn default() -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "Config".to_string(),
            clusters: Vec::new(),
            contexts: Vec::new(),
            users: Vec::new(),
        }
    }
}

impl KubeconfigDocument {
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: ClusterEntry,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClusterEntry {
    /// Serialized as base64, like any kubeconfig
    #[serde(rename = "certificate-authority-data")]
    pub certificate_authority_data: ByteString,
    pub server: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextEntry,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ContextEntry {
    pub cluster: String,
    /// Empty when the operator's grants are cluster-scoped
    #[serde(default)]
    pub namespace: String,
    pub user: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NamedUser {
    pub name: String,
    pub user: UserEntry,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UserEntry {
    pub token: String,
}
