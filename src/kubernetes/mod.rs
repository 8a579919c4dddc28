// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for cluster clients, namespaces, reconciling objects and polling.

pub mod apply;
pub mod client;
pub mod namespaces;
pub mod poll;

pub use apply::{ensure_resource, ConflictPolicy, Outcome};
pub use client::{load_kubeconfig, member_api_server_urls, ClusterClients};
pub use namespaces::ensure_namespace_exists;
pub use poll::{poll_until, PollError};
