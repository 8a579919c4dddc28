// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! In-memory stand-in for a Kubernetes API server.
//!
//! `FakeCluster` keeps objects keyed by their collection path and answers the
//! create / get / list / replace / delete calls a `kube::Client` makes, with
//! real `Status` bodies for 404 and 409. Service account token secrets are
//! populated on read, the way the token controller fills them in after the
//! fact.

use crate::constants::token;
use futures::future::BoxFuture;
use http::{header::CONTENT_TYPE, Method, Request, Response};
use http_body_util::BodyExt;
use k8s_openapi::ByteString;
use kube::client::Body;
use kube::Client;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

#[derive(Default)]
struct State {
    /// collection path -> object name -> object
    objects: BTreeMap<String, BTreeMap<String, Value>>,
    failures: Vec<(String, String, u16)>,
    resource_version: u64,
    withhold_tokens: bool,
    token_delay: usize,
    secret_reads: usize,
    legacy_token_secrets: bool,
}

/// A fake API server for one named cluster
#[derive(Clone)]
pub struct FakeCluster {
    name: String,
    state: Arc<Mutex<State>>,
}

impl FakeCluster {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn client(&self) -> Client {
        Client::new(self.clone(), "default")
    }

    /// Answer every `method` request whose path starts with `path_prefix` with `code`
    pub fn fail(&self, method: &str, path_prefix: &str, code: u16) {
        self.state
            .lock()
            .unwrap()
            .failures
            .push((method.to_string(), path_prefix.to_string(), code));
    }

    /// Never populate service account token secrets
    pub fn withhold_tokens(&self) {
        self.state.lock().unwrap().withhold_tokens = true;
    }

    /// Populate token secrets only after this many secret reads
    pub fn delay_tokens(&self, reads: usize) {
        self.state.lock().unwrap().token_delay = reads;
    }

    /// Generate a `<sa>-token-<n>` secret whenever a service account is created,
    /// like clusters that still auto-create legacy token secrets
    pub fn legacy_token_secrets(&self) {
        self.state.lock().unwrap().legacy_token_secrets = true;
    }

    /// Every stored object keyed by `<collection>/<name>`, without server-assigned metadata
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        let state = self.state.lock().unwrap();
        state
            .objects
            .iter()
            .flat_map(|(collection, items)| {
                items.iter().map(move |(name, object)| {
                    let mut object = object.clone();
                    if let Some(meta) = object["metadata"].as_object_mut() {
                        meta.remove("resourceVersion");
                        meta.remove("uid");
                    }
                    (format!("{}/{}", collection, name), object)
                })
            })
            .collect()
    }

    fn handle(&self, method: &Method, path: &str, query: Option<&str>, body: &[u8]) -> (u16, Value) {
        let mut state = self.state.lock().unwrap();

        if let Some((_, _, code)) = state
            .failures
            .iter()
            .find(|(m, prefix, _)| m == method.as_str() && path.starts_with(prefix.as_str()))
        {
            return (*code, status(*code, &format!("injected failure for {} {}", method, path)));
        }

        let Some(route) = Route::parse(path) else {
            return (404, status(404, &format!("the server could not find {}", path)));
        };

        if route.resource == "secrets" && *method == Method::GET {
            state.secret_reads += 1;
            if !state.withhold_tokens && state.secret_reads > state.token_delay {
                populate_tokens(&self.name, &mut state, &route.collection);
            }
        }

        match (method.clone(), route.name.as_deref()) {
            (Method::POST, None) => {
                let Ok(mut object) = serde_json::from_slice::<Value>(body) else {
                    return (400, status(400, "invalid body"));
                };
                let Some(name) = object["metadata"]["name"].as_str().map(str::to_string) else {
                    return (422, status(422, "metadata.name is required"));
                };
                if state.get(&route.collection, &name).is_some() {
                    return (409, already_exists(&route.resource, &name));
                }
                stamp(&mut state, &mut object, route.namespace.as_deref());
                state.put(&route.collection, &name, object.clone());

                if state.legacy_token_secrets && route.resource == "serviceaccounts" {
                    create_legacy_token_secret(&mut state, &route, &name);
                }
                (201, object)
            }
            (Method::GET, Some(name)) => match state.get(&route.collection, name) {
                Some(object) => (200, object.clone()),
                None => (404, not_found(&route.resource, name)),
            },
            (Method::GET, None) => {
                let selector = query.and_then(label_selector);
                let items: Vec<Value> = state
                    .objects
                    .get(&route.collection)
                    .map(|items| {
                        items
                            .values()
                            .filter(|o| selector.as_ref().map_or(true, |s| matches_labels(o, s)))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                let list = json!({
                    "apiVersion": "v1",
                    "kind": "List",
                    "metadata": { "resourceVersion": state.resource_version.to_string() },
                    "items": items,
                });
                (200, list)
            }
            (Method::PUT, Some(name)) => {
                let Ok(mut object) = serde_json::from_slice::<Value>(body) else {
                    return (400, status(400, "invalid body"));
                };
                let Some(current) = state.get(&route.collection, name) else {
                    return (404, not_found(&route.resource, name));
                };
                let expected = object["metadata"]["resourceVersion"].as_str();
                if expected.is_some() && expected != current["metadata"]["resourceVersion"].as_str() {
                    return (409, status(409, "the object has been modified"));
                }
                stamp(&mut state, &mut object, route.namespace.as_deref());
                state.put(&route.collection, name, object.clone());
                (200, object)
            }
            (Method::DELETE, Some(name)) => {
                match state.objects.get_mut(&route.collection).and_then(|c| c.remove(name)) {
                    Some(object) => (200, object),
                    None => (404, not_found(&route.resource, name)),
                }
            }
            _ => (405, status(405, &format!("{} not supported on {}", method, path))),
        }
    }
}

impl State {
    fn get(&self, collection: &str, name: &str) -> Option<&Value> {
        self.objects.get(collection).and_then(|c| c.get(name))
    }

    fn put(&mut self, collection: &str, name: &str, object: Value) {
        self.objects
            .entry(collection.to_string())
            .or_default()
            .insert(name.to_string(), object);
    }
}

/// Parsed request path
struct Route {
    /// Path of the collection, e.g. `/api/v1/namespaces/ns/secrets`
    collection: String,
    resource: String,
    namespace: Option<String>,
    name: Option<String>,
}

impl Route {
    fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let prefix = match segments.first() {
            Some(&"api") => 2,
            Some(&"apis") => 3,
            _ => return None,
        };
        let rest = segments.get(prefix..).filter(|r| !r.is_empty())?;

        // collections have an odd number of segments, items an even one
        let (collection_segments, name) = if rest.len() % 2 == 1 {
            (segments.len(), None)
        } else {
            (segments.len() - 1, rest.last().map(|n| n.to_string()))
        };
        let collection_rest = &segments[prefix..collection_segments];
        let namespace = match collection_rest {
            ["namespaces", ns, _] => Some(ns.to_string()),
            _ => None,
        };

        Some(Self {
            collection: format!("/{}", segments[..collection_segments].join("/")),
            resource: collection_rest.last()?.to_string(),
            namespace,
            name,
        })
    }
}

fn stamp(state: &mut State, object: &mut Value, namespace: Option<&str>) {
    state.resource_version += 1;
    let meta = &mut object["metadata"];
    meta["resourceVersion"] = json!(state.resource_version.to_string());
    if meta["uid"].is_null() {
        meta["uid"] = json!(format!("uid-{}", state.resource_version));
    }
    if let Some(ns) = namespace {
        meta["namespace"] = json!(ns);
    }
}

fn create_legacy_token_secret(state: &mut State, route: &Route, service_account: &str) {
    let Some(ns) = route.namespace.as_deref() else {
        return;
    };
    let collection = route.collection.replace("/serviceaccounts", "/secrets");
    let name = format!("{}-token-{}", service_account, state.resource_version);
    let mut secret = json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "type": token::SECRET_TYPE,
        "metadata": { "name": name },
    });
    secret["metadata"]["annotations"][token::SERVICE_ACCOUNT_ANNOTATION] = json!(service_account);
    stamp(state, &mut secret, Some(ns));
    state.put(&collection, &name, secret);
}

/// Fill every unpopulated token secret in `collection`. The token embeds the
/// secret's resource version, so a recreated secret gets a new token.
fn populate_tokens(cluster: &str, state: &mut State, collection: &str) {
    let Some(secrets) = state.objects.get_mut(collection) else {
        return;
    };
    for secret in secrets.values_mut() {
        if secret["type"].as_str() != Some(token::SECRET_TYPE) || !secret["data"].is_null() {
            continue;
        }
        let version = secret["metadata"]["resourceVersion"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let data = &mut secret["data"];
        data[token::CA_KEY] = encode(format!("ca-{}", cluster));
        data[token::TOKEN_KEY] = encode(format!("token-{}-{}", cluster, version));
    }
}

fn encode(text: String) -> Value {
    serde_json::to_value(ByteString(text.into_bytes())).unwrap()
}

fn label_selector(query: &str) -> Option<Vec<(String, String)>> {
    let (_, selector) = url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "labelSelector")?;
    Some(
        selector
            .split(',')
            .filter_map(|term| term.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

fn matches_labels(object: &Value, selector: &[(String, String)]) -> bool {
    let labels = &object["metadata"]["labels"];
    selector
        .iter()
        .all(|(k, v)| labels[k.as_str()].as_str() == Some(v.as_str()))
}

fn status(code: u16, message: &str) -> Value {
    let reason = match code {
        400 => "BadRequest",
        403 => "Forbidden",
        404 => "NotFound",
        405 => "MethodNotAllowed",
        409 => "Conflict",
        422 => "Invalid",
        _ => "InternalError",
    };
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code,
    })
}

fn not_found(resource: &str, name: &str) -> Value {
    status(404, &format!("{} \"{}\" not found", resource, name))
}

fn already_exists(resource: &str, name: &str) -> Value {
    let mut body = status(409, &format!("{} \"{}\" already exists", resource, name));
    body["reason"] = json!("AlreadyExists");
    body
}

impl Service<Request<Body>> for FakeCluster {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let cluster = self.clone();
        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let bytes = body.collect().await?.to_bytes();
            let (code, value) =
                cluster.handle(&parts.method, parts.uri.path(), parts.uri.query(), &bytes);
            let response = Response::builder()
                .status(code)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&value)?))?;
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::Secret;
    use kube::api::{ListParams, ObjectMeta, PostParams};
    use kube::Api;

    fn token_secret(name: &str) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            type_: Some(token::SECRET_TYPE.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_route_parsing() {
        let item = Route::parse("/apis/rbac.authorization.k8s.io/v1/namespaces/ns/roles/r").unwrap();
        assert_eq!(item.collection, "/apis/rbac.authorization.k8s.io/v1/namespaces/ns/roles");
        assert_eq!(item.resource, "roles");
        assert_eq!(item.namespace.as_deref(), Some("ns"));
        assert_eq!(item.name.as_deref(), Some("r"));

        let cluster_scoped = Route::parse("/api/v1/namespaces/ns").unwrap();
        assert_eq!(cluster_scoped.collection, "/api/v1/namespaces");
        assert_eq!(cluster_scoped.namespace, None);
        assert_eq!(cluster_scoped.name.as_deref(), Some("ns"));

        assert!(Route::parse("/version").is_none());
    }

    #[tokio::test]
    async fn test_token_secret_populated_after_delay() {
        let cluster = FakeCluster::new("member-1");
        cluster.delay_tokens(1);
        let secrets: Api<Secret> = Api::namespaced(cluster.client(), "ns");
        secrets
            .create(&PostParams::default(), &token_secret("sa-token-secret"))
            .await
            .unwrap();

        let first = secrets.get("sa-token-secret").await.unwrap();
        assert!(first.data.is_none());

        let second = secrets.get("sa-token-secret").await.unwrap();
        let data = second.data.unwrap();
        assert_eq!(data[token::CA_KEY].0, b"ca-member-1".to_vec());
        assert!(String::from_utf8(data[token::TOKEN_KEY].0.clone())
            .unwrap()
            .starts_with("token-member-1-"));
    }

    #[tokio::test]
    async fn test_list_filters_on_labels() {
        let cluster = FakeCluster::new("c");
        let secrets: Api<Secret> = Api::namespaced(cluster.client(), "ns");
        let mut labelled = token_secret("labelled");
        labelled.metadata.labels = Some(BTreeMap::from([("a".to_string(), "b".to_string())]));
        secrets.create(&PostParams::default(), &labelled).await.unwrap();
        secrets
            .create(&PostParams::default(), &token_secret("plain"))
            .await
            .unwrap();

        let listed = secrets.list(&ListParams::default().labels("a=b")).await.unwrap();
        let names: Vec<_> = listed.items.iter().map(|s| s.metadata.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["labelled".to_string()]);
    }
}
