use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use azrest_core::{Context, Error, ErrorKind, Result};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, IF_MATCH};
use http::{HeaderMap, HeaderValue, Method};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::constants::*;
use crate::path::{needs_subscription, normalize_path};
use crate::subscription::Subscription;
use crate::token::TokenCache;
use crate::transport::CheckedHttpSend;
use crate::{api_version, error, lro, Config, Endpoints, Query, Token};

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Client of Azure Resource Manager and the other token authenticated Azure APIs.
///
/// Cloning is cheap, all clones share tokens, subscriptions and the http sender.
#[derive(Clone, Debug)]
pub struct AzureClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: Config,
    endpoints: Endpoints,
    ctx: Context,
    tokens: TokenCache,
    subscription_id: Mutex<Option<String>>,
    subscriptions: tokio::sync::Mutex<Option<Vec<Subscription>>>,
}

impl AzureClient {
    /// Create a client sending through `ctx`.
    pub fn new(ctx: Context, config: Config) -> Self {
        let endpoints = config.endpoints();
        let checked = CheckedHttpSend::new(ctx.clone(), config.read_only, config.debug);
        let ctx = ctx.with_http_send(checked);
        let tokens = TokenCache::new(ctx.clone(), &config, endpoints.clone());

        Self {
            inner: Arc::new(Inner {
                subscription_id: Mutex::new(config.subscription_id.clone()),
                subscriptions: tokio::sync::Mutex::new(None),
                config,
                endpoints,
                ctx,
                tokens,
            }),
        }
    }

    /// Create a client configured from the environment of `ctx`.
    pub fn from_env(ctx: Context) -> Result<Self> {
        let config = Config::default().from_env(&ctx)?;
        Ok(Self::new(ctx, config))
    }

    /// Config of this client.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Endpoints in use.
    pub fn endpoints(&self) -> &Endpoints {
        &self.inner.endpoints
    }

    /// Context used for every request, read-only gate included.
    pub fn context(&self) -> &Context {
        &self.inner.ctx
    }

    /// Use `token` for its audience instead of acquiring one.
    pub fn set_token(&self, token: Token) -> Result<()> {
        self.inner.tokens.insert_static(token)
    }

    /// Get a token for `audience`, for example a storage account url.
    pub async fn token(&self, audience: &str) -> Result<Token> {
        self.inner.tokens.token(audience).await
    }

    pub(crate) fn arm_audience(&self) -> &str {
        &self.inner.endpoints.resource_manager
    }

    pub(crate) fn selected_subscription(&self) -> Result<Option<String>> {
        Ok(self
            .inner
            .subscription_id
            .lock()
            .map_err(|_| Error::unexpected("subscription lock poisoned"))?
            .clone())
    }

    pub(crate) fn select_subscription(&self, id: Option<String>) -> Result<()> {
        *self
            .inner
            .subscription_id
            .lock()
            .map_err(|_| Error::unexpected("subscription lock poisoned"))? = id;
        Ok(())
    }

    pub(crate) fn subscription_cache(&self) -> &tokio::sync::Mutex<Option<Vec<Subscription>>> {
        &self.inner.subscriptions
    }

    /// Send one authorized request and return the response whatever its status.
    pub(crate) async fn send_raw(
        &self,
        method: Method,
        url: &str,
        audience: &str,
        body: Option<&Value>,
        headers: HeaderMap,
    ) -> Result<http::Response<Bytes>> {
        let body = match body {
            Some(v) => Bytes::from(serde_json::to_vec(v)?),
            None => Bytes::new(),
        };
        let mut req = http::Request::builder()
            .method(method)
            .uri(url)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .body(body)?;
        req.headers_mut().extend(headers);

        let (mut parts, body) = req.into_parts();
        self.inner.tokens.authorize(audience, &mut parts).await?;
        self.inner
            .ctx
            .http_send(http::Request::from_parts(parts, body))
            .await
    }

    /// Send one authorized request, turning error statuses into errors.
    ///
    /// A token rejected by Azure is dropped and the request sent once more
    /// with a freshly acquired one.
    pub(crate) async fn send(
        &self,
        method: Method,
        url: &str,
        audience: &str,
        body: Option<&Value>,
        headers: HeaderMap,
    ) -> Result<http::Response<Bytes>> {
        let mut refreshed = false;
        loop {
            let resp = self
                .send_raw(method.clone(), url, audience, body, headers.clone())
                .await?;
            if resp.status().is_success() {
                return Ok(resp);
            }

            let err = error::parse_error(resp.status(), resp.body());
            if !refreshed && err.kind() == ErrorKind::InvalidAccessKey {
                log::debug!("token for {audience} rejected, acquiring a new one");
                self.inner.tokens.invalidate(audience).await?;
                refreshed = true;
                continue;
            }
            if !err.is_not_found() {
                log::warn!("{method} {url} failed: {err}");
            }
            return Err(err.with_context(format!("{method} {url}")));
        }
    }

    /// Send a request to ARM and return the decoded JSON body.
    ///
    /// `path` is relative to the ARM root. Resource ids and other
    /// `subscriptions/...` paths are used as is, anything else is scoped to
    /// the subscription in use. The `api-version` is resolved from the path
    /// unless `query` carries one. Long-running operations are polled to
    /// completion, and missing provider registrations are fixed before the
    /// request is retried once.
    pub async fn json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: Query,
    ) -> Result<Value> {
        self.json_with_headers(method, path, body, query, HeaderMap::new())
            .await
    }

    pub(crate) async fn json_with_headers(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: Query,
        headers: HeaderMap,
    ) -> Result<Value> {
        self.request(method, path, body, query, headers, true).await
    }

    /// Send an ARM request, registering missing providers when `register` is set.
    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        mut query: Query,
        headers: HeaderMap,
        register: bool,
    ) -> Result<Value> {
        let path = path.trim_start_matches('/');
        let path = if needs_subscription(path) {
            let sub = self.subscription_id().await?;
            normalize_path(path, Some(&sub))?
        } else {
            path.to_string()
        };
        if !query.contains(API_VERSION) {
            query.set(API_VERSION, api_version::resolve(&path));
        }
        let url = format!(
            "{}/{path}?{query}",
            self.inner.endpoints.resource_manager.trim_end_matches('/')
        );

        let mut registered = !register;
        let resp = loop {
            let result = self
                .send(
                    method.clone(),
                    &url,
                    self.arm_audience(),
                    body,
                    headers.clone(),
                )
                .await;
            match result {
                Err(err) if !registered && err.code() == Some(SUBSCRIPTION_NOT_REGISTERED) => {
                    let Some(namespace) = crate::registrar::namespace_of(&path) else {
                        return Err(err);
                    };
                    self.register_service_boxed(namespace).await?;
                    registered = true;
                }
                Err(err)
                    if !registered && err.code() == Some(MISSING_SUBSCRIPTION_REGISTRATION) =>
                {
                    let mut targets: Vec<String> = err
                        .details()
                        .iter()
                        .map(|d| d.target.clone())
                        .filter(|t| !t.is_empty())
                        .collect();
                    if targets.is_empty() {
                        targets.extend(err.target().map(str::to_string));
                    }
                    if targets.is_empty() {
                        return Err(err);
                    }
                    for namespace in &targets {
                        self.register_service_boxed(namespace).await?;
                    }
                    registered = true;
                }
                other => break other?,
            }
        };

        let (parts, bytes) = resp.into_parts();
        let value = decode_json(&bytes)?;
        if let Some(poll_url) = lro::poll_url(&parts.headers) {
            if value.get("id").is_none() {
                return self
                    .wait_for_operation(&poll_url, query.get(API_VERSION), value)
                    .await;
            }
        }
        Ok(value)
    }

    /// GET a resource by id and deserialize it.
    ///
    /// An empty id is reported as not found without sending anything.
    pub async fn get<T: DeserializeOwned>(&self, id: &str, query: Query) -> Result<T> {
        if id.trim_matches('/').is_empty() {
            return Err(Error::not_found("empty resource id"));
        }
        let value = self.json(Method::GET, id, None, query).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// PUT `body` to `id`.
    pub async fn put(&self, id: &str, body: &Value) -> Result<Value> {
        self.json(Method::PUT, id, Some(body), Query::new()).await
    }

    /// PATCH `body` to `id`.
    pub async fn patch(&self, id: &str, body: &Value) -> Result<Value> {
        self.json(Method::PATCH, id, Some(body), Query::new()).await
    }

    /// POST `body` to `path`.
    pub async fn post(&self, path: &str, body: Option<&Value>) -> Result<Value> {
        self.json(Method::POST, path, body, Query::new()).await
    }

    /// DELETE the resource `id`.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.json(Method::DELETE, id, None, Query::new()).await?;
        Ok(())
    }

    /// POST `body` to the action `<id>/<action>`, e.g. `start` of a virtual machine.
    pub async fn perform(&self, id: &str, action: &str, body: Option<&Value>) -> Result<Value> {
        let path = format!("{}/{action}", id.trim_end_matches('/'));
        self.post(&path, body).await
    }

    /// PUT a new resource of `resource_type` named `name` into `resource_group`.
    pub async fn create(
        &self,
        resource_group: &str,
        resource_type: &str,
        name: &str,
        body: &Value,
    ) -> Result<Value> {
        let sub = self.subscription_id().await?;
        let path = format!(
            "/subscriptions/{sub}/resourceGroups/{resource_group}/providers/{resource_type}/{name}"
        );
        let query = Query::from([(API_VERSION, api_version::resolve(resource_type))]);
        self.json(Method::PUT, &path, Some(body), query).await
    }

    /// PUT `body` back to the id it carries under `id`, `Id` or `ID`.
    pub async fn update(&self, body: &Value) -> Result<Value> {
        let id = ["id", "Id", "ID"]
            .iter()
            .find_map(|k| body.get(*k).and_then(Value::as_str))
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::invalid_argument("resource body carries no id"))?;
        self.put(id, body).await
    }

    /// Check whether `name` is still free for `resource_type`.
    pub async fn check_name_availability(&self, resource_type: &str, name: &str) -> Result<bool> {
        let namespace = resource_type.split('/').next().unwrap_or(resource_type);
        let sub = self.subscription_id().await?;
        let path = format!("/subscriptions/{sub}/providers/{namespace}/checkNameAvailability");
        let body = json!({ "Name": name, "Type": resource_type });

        let resp = self.post(&path, Some(&body)).await?;
        let available = resp.get("nameAvailable").and_then(Value::as_bool);
        let reason = resp.get("reason").and_then(Value::as_str).unwrap_or_default();
        Ok(!(available == Some(false) && reason == "AlreadyExists"))
    }

    /// Find a free name derived from `name` in `resource_group`.
    ///
    /// Taken names get a `-<n>` suffix bumped, at most 20 names are tried.
    pub async fn unique_name(
        &self,
        resource_group: &str,
        resource_type: &str,
        name: &str,
    ) -> Result<String> {
        let sub = self.subscription_id().await?;
        let mut candidate = name.to_string();
        for _ in 0..20 {
            let id = format!(
                "/subscriptions/{sub}/resourceGroups/{resource_group}/providers/{resource_type}/{candidate}"
            );
            match self.get::<Value>(&id, Query::new()).await {
                Err(err) if err.is_not_found() => return Ok(candidate),
                Err(err) => return Err(err),
                Ok(_) => candidate = next_name(&candidate),
            }
        }
        Err(Error::duplicate(format!(
            "no free name found for {resource_type} {name}"
        )))
    }

    pub(crate) fn if_match(etag: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(IF_MATCH, HeaderValue::from_str(etag)?);
        Ok(headers)
    }
}

/// `vm` becomes `vm-1`, `vm-1` becomes `vm-2`.
fn next_name(name: &str) -> String {
    if let Some((base, n)) = name.rsplit_once('-') {
        if let Some(n) = n.parse::<u32>().ok().and_then(|n| n.checked_add(1)) {
            return format!("{base}-{n}");
        }
    }
    format!("{name}-1")
}

/// Decode a response body, an empty body is `null`.
pub(crate) fn decode_json(body: &[u8]) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(body)?)
}
