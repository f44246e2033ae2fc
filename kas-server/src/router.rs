//! The HTTP surface: path resolution, content negotiation and response assembly.
//!
//! Fixed discovery paths are plain axum routes. Everything below `/api/v1` and
//! `/apis/{group}/{version}` goes through [`Route::parse`] in the fallback handler,
//! since collection, object and subresource paths overlap in ways a path template
//! cannot tell apart.
use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, Request, Response, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::{stream, StreamExt};
use jiff::Timestamp;
use kas_core::{discovery::Scope, ApiResource, DynamicList, DynamicObject, GroupVersion, Table, WatchEvent};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::{
    aggregate,
    config::PrinterOptions,
    discovery::Discovery,
    filter::Filters,
    index::DumpIndex,
    logs::{self, is_true, LogOptions},
    printers::{requested_table_version, TableConvertor},
    reader, Error, Result,
};

const AUTHORIZATION_GROUP: &str = "authorization.k8s.io";
const ACCESS_REVIEWS: &str = "selfsubjectaccessreviews";
const VERSION_FILE: &str = "version.json";

/// Everything a request handler reads, shared by all requests
#[derive(Debug)]
pub struct AppState {
    index: DumpIndex,
    discovery: Discovery,
    printer_options: PrinterOptions,
}

impl AppState {
    /// Wrap a built index and precompute its discovery documents
    pub fn new(index: DumpIndex, printer_options: PrinterOptions) -> Self {
        let discovery = Discovery::new(&index);
        Self {
            index,
            discovery,
            printer_options,
        }
    }

    /// The catalog served
    pub fn index(&self) -> &DumpIndex {
        &self.index
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/version", get(version))
        .route("/api", get(api_versions))
        .route("/apis", get(api_groups))
        .fallback(dispatch)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        http.method = %req.method(),
                        http.url = %req.uri(),
                        http.status_code = tracing::field::Empty,
                    )
                })
                .on_request(())
                .on_response(|res: &Response<Body>, latency: Duration, span: &Span| {
                    span.record("http.status_code", res.status().as_u16());
                    tracing::info!(status = res.status().as_u16(), ?latency, "processed request");
                }),
        )
        .with_state(state)
}

/// A resolved request path below `/api/v1` or `/apis/{group}/{version}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// The resource list of a group version
    Resources(GroupVersion),
    /// Every object of a resource, optionally within one namespace
    Collection {
        /// Group version from the path
        gv: GroupVersion,
        /// Namespace, `None` for cluster scoped or all-namespaces requests
        namespace: Option<String>,
        /// Plural resource name
        resource: String,
    },
    /// One named object
    Object {
        /// Group version from the path
        gv: GroupVersion,
        /// Namespace, `None` for cluster scoped objects
        namespace: Option<String>,
        /// Plural resource name
        resource: String,
        /// Object name
        name: String,
    },
    /// Logs of a pod's container
    PodLog {
        /// Namespace of the pod
        namespace: String,
        /// Pod name
        name: String,
    },
    /// `selfsubjectaccessreviews` creation
    AccessReview {
        /// Requested `authorization.k8s.io` version
        version: String,
    },
}

impl Route {
    /// Resolve a request path, `None` when it is not part of the API
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        let (gv, rest) = match segments.as_slice() {
            ["api", "v1", rest @ ..] => (GroupVersion::core_v1(), rest),
            ["apis", group, version, rest @ ..] => (GroupVersion::gv(group, version), rest),
            _ => return None,
        };
        let owned = |s: &&str| s.to_string();
        Some(match rest {
            [] => Route::Resources(gv),
            ["namespaces", ns, "pods", name, "log"] if gv == GroupVersion::core_v1() => Route::PodLog {
                namespace: owned(ns),
                name: owned(name),
            },
            ["namespaces", ns, resource] => Route::Collection {
                gv,
                namespace: Some(owned(ns)),
                resource: owned(resource),
            },
            ["namespaces", ns, resource, name] => Route::Object {
                gv,
                namespace: Some(owned(ns)),
                resource: owned(resource),
                name: owned(name),
            },
            [resource] if gv.group == AUTHORIZATION_GROUP && *resource == ACCESS_REVIEWS => Route::AccessReview {
                version: gv.version,
            },
            [resource] => Route::Collection {
                gv,
                namespace: None,
                resource: owned(resource),
            },
            [resource, name] => Route::Object {
                gv,
                namespace: None,
                resource: owned(resource),
                name: owned(name),
            },
            _ => return None,
        })
    }

    fn allowed_method(&self) -> Method {
        match self {
            Route::AccessReview { .. } => Method::POST,
            _ => Method::GET,
        }
    }
}

/// Decoded query string and negotiated output of one request
struct RequestOptions {
    query: Vec<(String, String)>,
    watch: bool,
    table_version: Option<String>,
    now: Timestamp,
}

impl RequestOptions {
    fn new(uri: &Uri, headers: &HeaderMap) -> Self {
        let query: Vec<(String, String)> = form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes())
            .into_owned()
            .collect();
        let watch = query.iter().any(|(k, v)| k == "watch" && is_true(v));
        let table_version = headers
            .get(header::ACCEPT)
            .and_then(|accept| accept.to_str().ok())
            .and_then(requested_table_version);
        Self {
            query,
            watch,
            table_version,
            now: Timestamp::now(),
        }
    }
}

async fn version(State(state): State<Arc<AppState>>) -> Response<Body> {
    let path = state.index.root().join(VERSION_FILE);
    let body = match tokio::fs::read(&path).await {
        Ok(content) => Bytes::from(content),
        Err(err) => {
            if err.kind() == std::io::ErrorKind::NotFound {
                tracing::info!(path = %path.display(), "no version file found");
            } else {
                tracing::error!(path = %path.display(), error = %err, "failed to read version file, defaulting to empty");
            }
            Bytes::from_static(b"{}")
        }
    };
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn api_versions(State(state): State<Arc<AppState>>) -> Response<Body> {
    Json(state.discovery.api_versions()).into_response()
}

async fn api_groups(State(state): State<Arc<AppState>>) -> Response<Body> {
    Json(state.discovery.api_groups()).into_response()
}

async fn dispatch(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response<Body>> {
    let Some(route) = Route::parse(uri.path()) else {
        return Err(Error::NotFound(format!("path {:?}", uri.path())));
    };
    let allowed = route.allowed_method();
    if method != allowed && !(allowed == Method::GET && method == Method::HEAD) {
        return Err(Error::MethodNotAllowed(method));
    }
    let opts = RequestOptions::new(&uri, &headers);
    match route {
        Route::Resources(gv) => state
            .discovery
            .resources(&gv)
            .map(|list| Json(list).into_response())
            .ok_or_else(|| Error::NotFound(format!("group version {gv}"))),
        Route::Collection {
            gv,
            namespace,
            resource,
        } => list(&state, &opts, &gv, namespace.as_deref(), &resource).await,
        Route::Object {
            gv,
            namespace,
            resource,
            name,
        } => get_object(&state, &opts, &gv, namespace.as_deref(), &resource, &name).await,
        Route::PodLog { namespace, name } => pod_log(&state, &opts, &namespace, &name).await,
        Route::AccessReview { version } => access_review(&version, &body),
    }
}

/// The resource being served, made up for resources the dump does not have
fn resolve_resource(state: &AppState, gv: &GroupVersion, resource: &str, namespaced: bool) -> ApiResource {
    if let Some(found) = state.index.resource(gv, resource) {
        return found.clone();
    }
    let scope = if namespaced { Scope::Namespaced } else { Scope::Cluster };
    ApiResource::from_gv_with_plural(gv, "", resource, scope)
}

fn is_namespaces(gv: &GroupVersion, resource: &str) -> bool {
    gv.group.is_empty() && resource == "namespaces"
}

/// A table convertor and the version stamped on the tables it produces
struct TableOutput<'a> {
    convertor: TableConvertor,
    version: &'a str,
    now: Timestamp,
}

impl TableOutput<'_> {
    fn list(&self, items: &DynamicList) -> Result<Table> {
        self.convertor.convert_list(items, self.version, self.now)
    }

    fn object(&self, obj: &DynamicObject) -> Result<Table> {
        self.convertor.convert_object(obj, self.version, self.now)
    }
}

impl RequestOptions {
    fn table<'a>(&'a self, state: &AppState, resource: &ApiResource) -> Option<TableOutput<'a>> {
        let version = self.table_version.as_deref()?;
        Some(TableOutput {
            convertor: TableConvertor::new(resource, state.index.crds(), state.printer_options),
            version,
            now: self.now,
        })
    }
}

async fn list(
    state: &AppState,
    opts: &RequestOptions,
    gv: &GroupVersion,
    namespace: Option<&str>,
    resource: &str,
) -> Result<Response<Body>> {
    let filters = Filters::from_query(&opts.query)?;
    let api_resource = resolve_resource(state, gv, resource, namespace.is_some());
    let index = &state.index;
    let mut items = match namespace {
        Some(ns) => reader::read_list(&index.group_dir(Some(ns), gv), resource).await?,
        None if api_resource.namespaced() => aggregate::read_all_namespaces(index, gv, resource).await?,
        None => reader::read_list(&index.group_dir(None, gv), resource).await?,
    };
    if namespace.is_none() && is_namespaces(gv, resource) && items.is_empty() {
        items = index.namespace_list();
    }
    let items = filters.apply(&items);

    if opts.watch {
        return watch(items.items);
    }
    match opts.table(state, &api_resource) {
        Some(table) => json_response(&table.list(&items)?),
        None => json_response(&items),
    }
}

async fn get_object(
    state: &AppState,
    opts: &RequestOptions,
    gv: &GroupVersion,
    namespace: Option<&str>,
    resource: &str,
    name: &str,
) -> Result<Response<Body>> {
    let index = &state.index;
    let mut found = reader::read_object(&index.group_dir(namespace, gv), resource, name).await?;
    if found.is_none() && namespace.is_none() && is_namespaces(gv, resource) {
        found = index.namespace_list().find(name).cloned();
    }
    let Some(obj) = found else {
        return Err(Error::NotFound(format!("{resource} {name:?}")));
    };

    if opts.watch {
        return watch(vec![obj]);
    }
    let api_resource = resolve_resource(state, gv, resource, namespace.is_some());
    match opts.table(state, &api_resource) {
        Some(table) => json_response(&table.object(&obj)?),
        None => json_response(&obj),
    }
}

fn json_response<T: Serialize>(value: &T) -> Result<Response<Body>> {
    let body = serde_json::to_vec(value).map_err(Error::SerdeError)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Write `content` and then hold the connection open until the client goes away
fn hold_open(content: Vec<Bytes>, content_type: &'static str) -> Response<Body> {
    let stream = stream::iter(content)
        .map(Ok::<_, Infallible>)
        .chain(stream::pending());
    ([(header::CONTENT_TYPE, content_type)], Body::from_stream(stream)).into_response()
}

/// One `ADDED` event per object, then nothing ever again
///
/// Events always carry the plain object, whatever the `Accept` header asked for.
fn watch(objects: Vec<DynamicObject>) -> Result<Response<Body>> {
    let mut lines = Vec::with_capacity(objects.len());
    for obj in objects {
        let line = WatchEvent::Added(obj).to_line().map_err(Error::SerdeError)?;
        lines.push(Bytes::from(line));
    }
    tracing::debug!(events = lines.len(), "starting watch");
    Ok(hold_open(lines, "application/json"))
}

async fn pod_log(state: &AppState, opts: &RequestOptions, namespace: &str, name: &str) -> Result<Response<Body>> {
    let log_opts = LogOptions::from_query(&opts.query)?;
    let content = logs::read_log(&state.index, namespace, name, &log_opts).await?;
    if log_opts.follow {
        return Ok(hold_open(vec![content], "text/plain"));
    }
    Ok(([(header::CONTENT_TYPE, "text/plain")], content).into_response())
}

/// Every access review is allowed
fn access_review(version: &str, body: &[u8]) -> Result<Response<Body>> {
    let mut review: Value = serde_json::from_slice(body)
        .map_err(|e| Error::BadRequest(format!("failed to decode request body: {e}")))?;
    let Value::Object(fields) = &mut review else {
        return Err(Error::BadRequest("request body is not an object".into()));
    };
    for (key, default) in [
        ("apiVersion", format!("{AUTHORIZATION_GROUP}/{version}")),
        ("kind", "SelfSubjectAccessReview".to_string()),
    ] {
        if fields.get(key).and_then(Value::as_str).is_none_or(str::is_empty) {
            fields.insert(key.to_string(), Value::String(default));
        }
    }
    let status = fields.entry("status").or_insert_with(|| json!({}));
    if !status.is_object() {
        *status = json!({});
    }
    if let Value::Object(status) = status {
        status.insert("allowed".into(), Value::Bool(true));
    }
    Ok(Json(review).into_response())
}
