// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::fmt;

/// The part a cluster plays in the fleet. Exactly one cluster is central; any
/// number (possibly including the central one) are members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterKind {
    Central,
    Member,
}

/// Whether a permission grant is a Role/RoleBinding pair or a
/// ClusterRole/ClusterRoleBinding pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionScope {
    Namespace,
    Cluster,
}

impl PermissionScope {
    pub fn from_cluster_scoped(cluster_scoped: bool) -> Self {
        if cluster_scoped {
            PermissionScope::Cluster
        } else {
            PermissionScope::Namespace
        }
    }
}

impl ClusterKind {
    /// The scope actually provisioned for this kind of cluster.
    ///
    /// Central grants are always namespaced; a cluster-scoped request only
    /// applies to members.
    pub fn effective_scope(self, requested: PermissionScope) -> PermissionScope {
        match self {
            ClusterKind::Central => PermissionScope::Namespace,
            ClusterKind::Member => requested,
        }
    }
}

impl fmt::Display for ClusterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterKind::Central => write!(f, "central"),
            ClusterKind::Member => write!(f, "member"),
        }
    }
}
