// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Label stamped on every object this tool creates. Cleanup selects on it alone.
pub mod labels {
    pub const KEY: &str = "multi-cluster";
    pub const VALUE: &str = "true";
    /// `KEY=VALUE`, ready for a list selector
    pub const SELECTOR: &str = "multi-cluster=true";
}

/// Objects published in the central cluster
pub mod central {
    pub const KUBECONFIG_SECRET_NAME: &str =
        "mongodb-enterprise-operator-multi-cluster-kubeconfig";
    pub const KUBECONFIG_SECRET_KEY: &str = "kubeconfig";
    /// Fixed name the operator reads its member list from
    pub const MEMBER_LIST_CONFIG_MAP: &str = "mongodb-enterprise-operator-member-list";
}

/// Operator identity and its grants
pub mod operator {
    pub const DEFAULT_SERVICE_ACCOUNT: &str = "mongodb-enterprise-operator-multi-cluster";
    pub const ROLE: &str = "mongodb-enterprise-operator-multi-role";
    pub const ROLE_BINDING: &str = "mongodb-enterprise-operator-multi-role-binding";
    pub const CLUSTER_ROLE: &str = "mongodb-enterprise-operator-multi-cluster-role";
    pub const CLUSTER_ROLE_BINDING: &str = "mongodb-enterprise-operator-multi-cluster-role-binding";
}

/// Default workload identities installed (or copied) into member clusters
pub mod database {
    pub const APPDB_SERVICE_ACCOUNT: &str = "mongodb-enterprise-appdb";
    pub const DATABASE_PODS_SERVICE_ACCOUNT: &str = "mongodb-enterprise-database-pods";
    pub const OPS_MANAGER_SERVICE_ACCOUNT: &str = "mongodb-enterprise-ops-manager";
    pub const APPDB_ROLE: &str = "mongodb-enterprise-appdb";
    pub const APPDB_ROLE_BINDING: &str = "mongodb-enterprise-appdb";

    pub const SERVICE_ACCOUNTS: [&str; 3] = [
        APPDB_SERVICE_ACCOUNT,
        DATABASE_PODS_SERVICE_ACCOUNT,
        OPS_MANAGER_SERVICE_ACCOUNT,
    ];
}

/// Service account token secrets, populated by the platform
pub mod token {
    pub const CA_KEY: &str = "ca.crt";
    pub const TOKEN_KEY: &str = "token";
    pub const SECRET_TYPE: &str = "kubernetes.io/service-account-token";
    pub const SERVICE_ACCOUNT_ANNOTATION: &str = "kubernetes.io/service-account.name";
    pub const SECRET_SUFFIX: &str = "-token-secret";
}

/// Token polling configuration
pub mod poll {
    pub const INTERVAL_MS: u64 = 100;
    pub const TIMEOUT_SECS: u64 = 5;
    pub const INTERVAL_ENV: &str = "MULTICLUSTER_POLL_INTERVAL_MS";
    pub const TIMEOUT_ENV: &str = "MULTICLUSTER_POLL_TIMEOUT_SECS";
}

pub const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";
