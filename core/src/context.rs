// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.


//! Runtime seams shared by every azrest client.
//!
//! A [`Context`] bundles the http sender and the environment reader. Clients
//! never reach for a global http client or `std::env` directly, so tests and
//! embedders swap both through the builder methods.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response};

use crate::{Error, Result};

/// Send one http request and wait for the full response.
///
/// Implementations own pooling and timeouts. Wrappers may inspect or reject a
/// request before delegating to an inner sender.
#[async_trait::async_trait]
pub trait HttpSend: Debug + Send + Sync + 'static {
    /// Send `req` and buffer the response body.
    async fn http_send(&self, req: Request<Bytes>) -> Result<Response<Bytes>>;
}

/// Read environment variables.
pub trait Env: Debug + Send + Sync + 'static {
    /// Value of `key`, `None` when unset or not valid utf-8.
    fn var(&self, key: &str) -> Option<String>;

    /// Every variable visible to this environment.
    fn vars(&self) -> HashMap<String, String>;
}

/// Runtime components every request is sent through.
///
/// A fresh context has no http sender and an empty environment; configure the
/// parts you need:
///
/// ```
/// use azrest_core::{Context, OsEnv};
///
/// let ctx = Context::new().with_env(OsEnv);
/// assert_eq!(ctx.env_value("AZREST_SURELY_UNSET"), None);
/// ```
#[derive(Clone)]
pub struct Context {
    http: Arc<dyn HttpSend>,
    env: Arc<dyn Env>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("http", &self.http)
            .field("env", &self.env)
            .finish()
    }
}

impl Context {
    /// Context that refuses to send and sees no variables.
    pub fn new() -> Self {
        Self {
            http: Arc::new(NoopHttpSend),
            env: Arc::new(NoopEnv),
        }
    }

    /// Send through `http` from now on.
    pub fn with_http_send(mut self, http: impl HttpSend) -> Self {
        self.http = Arc::new(http);
        self
    }

    /// Read variables from `env` from now on.
    pub fn with_env(mut self, env: impl Env) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Send `req` with the configured sender.
    #[inline]
    pub async fn http_send(&self, req: Request<Bytes>) -> Result<Response<Bytes>> {
        self.http.http_send(req).await
    }

    /// Send `req` and decode the body as utf-8, replacing invalid sequences.
    pub async fn http_send_as_string(&self, req: Request<Bytes>) -> Result<Response<String>> {
        let (parts, body) = self.http_send(req).await?.into_parts();
        Ok(Response::from_parts(
            parts,
            String::from_utf8_lossy(&body).into_owned(),
        ))
    }

    /// Raw value of `key`.
    #[inline]
    pub fn env_var(&self, key: &str) -> Option<String> {
        self.env.var(key)
    }

    /// Value of `key`, treating an empty value as unset.
    ///
    /// Azure tooling commonly exports `AZURE_*` variables as empty strings to
    /// clear them, loaders should read through this.
    pub fn env_value(&self, key: &str) -> Option<String> {
        self.env.var(key).filter(|v| !v.is_empty())
    }

    /// Snapshot of every variable.
    #[inline]
    pub fn env_vars(&self) -> HashMap<String, String> {
        self.env.vars()
    }
}

/// Process environment.
#[derive(Debug, Copy, Clone)]
pub struct OsEnv;

impl Env for OsEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var_os(key)?.into_string().ok()
    }

    fn vars(&self) -> HashMap<String, String> {
        std::env::vars().collect()
    }
}

/// Fixed set of variables, mostly for tests.
///
/// ```
/// use azrest_core::{Context, StaticEnv};
///
/// let env: StaticEnv = [("AZURE_TENANT_ID", "tenant")].into_iter().collect();
/// let ctx = Context::new().with_env(env);
/// assert_eq!(ctx.env_var("AZURE_TENANT_ID").as_deref(), Some("tenant"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    /// Variables by name.
    pub envs: HashMap<String, String>,
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            envs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Env for StaticEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.envs.get(key).cloned()
    }

    fn vars(&self) -> HashMap<String, String> {
        self.envs.clone()
    }
}

/// Sender of a context nobody configured, fails every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHttpSend;

#[async_trait::async_trait]
impl HttpSend for NoopHttpSend {
    async fn http_send(&self, req: Request<Bytes>) -> Result<Response<Bytes>> {
        Err(Error::unexpected(format!(
            "no http sender configured, cannot send {} {}",
            req.method(),
            req.uri()
        )))
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct NoopEnv;

impl Env for NoopEnv {
    fn var(&self, _: &str) -> Option<String> {
        None
    }

    fn vars(&self) -> HashMap<String, String> {
        HashMap::new()
    }
}
