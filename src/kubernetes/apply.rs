// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Create-or-reconcile for any resource kind.

use crate::error::{is_already_exists, MultiClusterError, Result};
use kube::{api::PostParams, Api, Resource, ResourceExt};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use tracing::{debug, info, instrument};

/// What to do when the object being created already exists
pub enum ConflictPolicy<K> {
    /// Leave the existing object alone
    Ignore,
    /// Overwrite the existing object with the desired one
    Replace,
    /// Combine existing and desired, then overwrite
    Merge(fn(&K, K) -> K),
}

/// What `ensure_resource` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Unchanged,
    Updated,
}

/// Create `desired`, falling back to `policy` when an object of the same name exists.
///
/// Any error other than `AlreadyExists` on create is returned with cluster and
/// resource context; nothing is retried.
#[instrument(skip(api, desired, policy), fields(kind = %K::kind(&()), name = %desired.name_any()))]
pub async fn ensure_resource<K>(
    api: &Api<K>,
    cluster: &str,
    desired: &K,
    policy: ConflictPolicy<K>,
) -> Result<Outcome>
where
    K: Resource<DynamicType = ()> + Clone + Serialize + DeserializeOwned + Debug,
{
    let kind = kind_of::<K>();
    let name = desired.name_any();
    let context = || MultiClusterError::api(cluster, kind, &name);

    match api.create(&PostParams::default(), desired).await {
        Ok(_) => {
            info!("Created {} {} in cluster {}", kind, name, cluster);
            return Ok(Outcome::Created);
        }
        Err(e) if is_already_exists(&e) => {}
        Err(e) => return Err(context()(e)),
    }

    match policy {
        ConflictPolicy::Ignore => {
            debug!("{} {} already exists in cluster {}", kind, name, cluster);
            Ok(Outcome::Unchanged)
        }
        ConflictPolicy::Replace => {
            api.replace(&name, &PostParams::default(), desired)
                .await
                .map_err(context())?;
            info!("Updated {} {} in cluster {}", kind, name, cluster);
            Ok(Outcome::Updated)
        }
        ConflictPolicy::Merge(merge) => {
            let existing = api.get(&name).await.map_err(context())?;
            let mut merged = merge(&existing, desired.clone());
            merged.meta_mut().resource_version = existing.resource_version();
            api.replace(&name, &PostParams::default(), &merged)
                .await
                .map_err(context())?;
            info!("Merged {} {} in cluster {}", kind, name, cluster);
            Ok(Outcome::Updated)
        }
    }
}

/// Static kind name of a resource type, for error context
pub fn kind_of<K: Resource<DynamicType = ()>>() -> &'static str {
    match K::kind(&()) {
        std::borrow::Cow::Borrowed(kind) => kind,
        std::borrow::Cow::Owned(_) => "object",
    }
}
