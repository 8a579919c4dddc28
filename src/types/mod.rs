// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Domain types shared across the provisioning phases.

pub mod cluster;
pub mod kubeconfig;

pub use cluster::{ClusterKind, PermissionScope};
pub use kubeconfig::KubeconfigDocument;
