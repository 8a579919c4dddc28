// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Policy table and builders for the permission grants this tool provisions

use crate::constants::{database, labels, operator, RBAC_API_GROUP};
use crate::types::{ClusterKind, PermissionScope};
use k8s_openapi::api::rbac::v1::{
    ClusterRole, ClusterRoleBinding, PolicyRule, Role, RoleBinding, RoleRef, Subject,
};
use kube::api::ObjectMeta;
use std::collections::BTreeMap;

const CORE_GROUP: &str = "";
const MONGODB_GROUP: &str = "mongodb.com";

const FULL_ACCESS: &[&str] = &[
    "get",
    "list",
    "create",
    "update",
    "delete",
    "watch",
    "deletecollection",
];

const MONGODB_RESOURCES: &[&str] = &[
    "mongodbmulticluster",
    "mongodbmulticluster/finalizers",
    "mongodbmulticluster/status",
    "mongodbusers",
    "mongodbusers/status",
    "opsmanagers",
    "opsmanagers/finalizers",
    "opsmanagers/status",
    "mongodb",
    "mongodb/finalizers",
    "mongodb/status",
];

/// Labels stamped on every object this tool creates
pub fn managed_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(labels::KEY.to_string(), labels::VALUE.to_string())])
}

fn rule(group: &str, resources: &[&str], verbs: &[&str]) -> PolicyRule {
    PolicyRule {
        api_groups: Some(vec![group.to_string()]),
        resources: Some(resources.iter().map(|r| r.to_string()).collect()),
        verbs: verbs.iter().map(|v| v.to_string()).collect(),
        ..Default::default()
    }
}

/// Core workload permissions every member identity needs
pub fn member_rules() -> Vec<PolicyRule> {
    vec![
        rule(CORE_GROUP, &["secrets", "configmaps", "services"], FULL_ACCESS),
        rule("apps", &["statefulsets"], FULL_ACCESS),
        rule(
            CORE_GROUP,
            &["persistentvolumeclaims"],
            &["get", "list", "create", "update", "watch", "patch"],
        ),
        rule(
            CORE_GROUP,
            &["pods"],
            &["get", "list", "watch", "delete", "deletecollection"],
        ),
    ]
}

/// Custom resource permissions followed by the member rules
pub fn central_rules() -> Vec<PolicyRule> {
    let mut rules = vec![rule(MONGODB_GROUP, MONGODB_RESOURCES, &["*"])];
    rules.extend(member_rules());
    rules
}

/// The rule set for a cluster kind at a given scope
pub fn rules_for(kind: ClusterKind, scope: PermissionScope) -> Vec<PolicyRule> {
    let mut rules = match kind {
        ClusterKind::Central => central_rules(),
        ClusterKind::Member => member_rules(),
    };
    if scope == PermissionScope::Cluster {
        rules.push(rule(CORE_GROUP, &["namespaces"], &["list", "watch"]));
    }
    rules
}

fn service_account_subject(name: &str, namespace: &str) -> Subject {
    Subject {
        kind: "ServiceAccount".to_string(),
        name: name.to_string(),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

fn role_ref(kind: &str, name: &str) -> RoleRef {
    RoleRef {
        api_group: RBAC_API_GROUP.to_string(),
        kind: kind.to_string(),
        name: name.to_string(),
    }
}

fn metadata(name: &str, namespace: Option<&str>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        labels: Some(managed_labels()),
        ..Default::default()
    }
}

/// Operator Role in `namespace`
pub fn operator_role(kind: ClusterKind, namespace: &str) -> Role {
    Role {
        metadata: metadata(operator::ROLE, Some(namespace)),
        rules: Some(rules_for(kind, PermissionScope::Namespace)),
    }
}

/// Binds the operator Role in `role.namespace` to a service account that may
/// live in another namespace
pub fn operator_role_binding(
    namespace: &str,
    service_account: &str,
    service_account_namespace: &str,
) -> RoleBinding {
    RoleBinding {
        metadata: metadata(operator::ROLE_BINDING, Some(namespace)),
        role_ref: role_ref("Role", operator::ROLE),
        subjects: Some(vec![service_account_subject(
            service_account,
            service_account_namespace,
        )]),
    }
}

pub fn operator_cluster_role(kind: ClusterKind) -> ClusterRole {
    ClusterRole {
        metadata: metadata(operator::CLUSTER_ROLE, None),
        rules: Some(rules_for(kind, PermissionScope::Cluster)),
        ..Default::default()
    }
}

pub fn operator_cluster_role_binding(
    service_account: &str,
    service_account_namespace: &str,
) -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: metadata(operator::CLUSTER_ROLE_BINDING, None),
        role_ref: role_ref("ClusterRole", operator::CLUSTER_ROLE),
        subjects: Some(vec![service_account_subject(
            service_account,
            service_account_namespace,
        )]),
    }
}

/// Role letting the app database read secrets and manage its pods
pub fn database_role(namespace: &str) -> Role {
    Role {
        metadata: metadata(database::APPDB_ROLE, Some(namespace)),
        rules: Some(vec![
            rule(CORE_GROUP, &["secrets"], &["get"]),
            rule(CORE_GROUP, &["pods"], &["patch", "delete", "get"]),
        ]),
    }
}

pub fn database_role_binding(namespace: &str) -> RoleBinding {
    RoleBinding {
        metadata: metadata(database::APPDB_ROLE_BINDING, Some(namespace)),
        role_ref: role_ref("Role", database::APPDB_ROLE),
        subjects: Some(vec![service_account_subject(
            database::APPDB_SERVICE_ACCOUNT,
            namespace,
        )]),
    }
}
