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

use crate::constants::TOKEN_API_VERSION;
use crate::Token;
use async_trait::async_trait;
use azrest_core::time::{from_unix_timestamp, now};
use azrest_core::{Context, Error, ProvideCredential, Result};
use serde::Deserialize;

/// Where a token is requested and for what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenEndpoint {
    /// `<authority>/<tenant>/oauth2/token?api-version=1.0` with `resource=<resource>`.
    V1 {
        /// AAD login host.
        authority_host: String,
        /// Audience of the token.
        resource: String,
    },
    /// `<authority>/<tenant>/oauth2/v2.0/token` with `scope=<scope>`.
    V2 {
        /// Login host.
        authority_host: String,
        /// Scope, usually `<audience>/.default`.
        scope: String,
    },
}

impl TokenEndpoint {
    fn url(&self, tenant_id: &str) -> String {
        match self {
            TokenEndpoint::V1 { authority_host, .. } => format!(
                "{}/{tenant_id}/oauth2/token?api-version={TOKEN_API_VERSION}",
                authority_host.trim_end_matches('/')
            ),
            TokenEndpoint::V2 { authority_host, .. } => format!(
                "{}/{tenant_id}/oauth2/v2.0/token",
                authority_host.trim_end_matches('/')
            ),
        }
    }

    fn audience(&self) -> &str {
        match self {
            TokenEndpoint::V1 { resource, .. } => resource,
            TokenEndpoint::V2 { scope, .. } => scope,
        }
    }
}

/// Load token through the client credentials flow of a service principal.
///
/// Reference: <https://learn.microsoft.com/en-us/azure/active-directory/develop/v2-oauth2-client-creds-grant-flow>
#[derive(Debug, Clone)]
pub struct ClientSecretCredentialProvider {
    tenant_id: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    endpoint: TokenEndpoint,
}

impl ClientSecretCredentialProvider {
    /// Create a new client secret provider requesting tokens from `endpoint`.
    pub fn new(endpoint: TokenEndpoint) -> Self {
        Self {
            tenant_id: None,
            client_id: None,
            client_secret: None,
            endpoint,
        }
    }

    /// Set the tenant ID.
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the client ID.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the client secret.
    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::config_invalid(format!(
            "{name} is required to acquire azure token"
        ))),
    }
}

#[async_trait]
impl ProvideCredential for ClientSecretCredentialProvider {
    type Credential = Token;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let tenant_id = required(&self.tenant_id, "tenant_id")?;
        let client_id = required(&self.client_id, "client_id")?;
        let client_secret = required(&self.client_secret, "client_secret")?;

        let body = {
            let mut form = form_urlencoded::Serializer::new(String::new());
            form.append_pair("grant_type", "client_credentials")
                .append_pair("client_id", client_id)
                .append_pair("client_secret", client_secret);
            match &self.endpoint {
                TokenEndpoint::V1 { resource, .. } => form.append_pair("resource", resource),
                TokenEndpoint::V2 { scope, .. } => form.append_pair("scope", scope),
            };
            form.finish()
        };

        let url = self.endpoint.url(tenant_id);
        let req = http::Request::builder()
            .method(http::Method::POST)
            .uri(&url)
            .header(
                http::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(bytes::Bytes::from(body))?;

        let resp = ctx.http_send(req).await.map_err(|e| {
            Error::auth_failed(format!("failed to request token from {url}")).with_source(e)
        })?;
        let status = resp.status();
        let text = String::from_utf8_lossy(resp.body());
        let token: TokenResponse = serde_json::from_str(&text).map_err(|e| {
            Error::auth_failed(format!(
                "token request failed with status {status}: {text}"
            ))
            .with_status(status)
            .with_source(e)
        })?;

        if !status.is_success() || token.error.is_some() {
            return Err(Error::auth_failed(format!(
                "token request failed with status {status}: {} {}",
                token.error.unwrap_or_default(),
                token.error_description.unwrap_or_default()
            ))
            .with_status(status));
        }

        log::debug!(
            "acquired azure token for {} expiring on {:?}",
            self.endpoint.audience(),
            token.expires_on
        );
        Ok(Some(token.into_token(self.endpoint.audience())?))
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    #[serde(deserialize_with = "de_opt_i64")]
    expires_in: Option<i64>,
    #[serde(deserialize_with = "de_opt_i64")]
    expires_on: Option<i64>,
    #[serde(deserialize_with = "de_opt_i64")]
    not_before: Option<i64>,
    resource: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl TokenResponse {
    fn into_token(self, audience: &str) -> Result<Token> {
        if self.access_token.is_empty() {
            return Err(Error::auth_failed("token response carries no access_token"));
        }

        let expires_on = match (self.expires_on, self.expires_in) {
            (Some(on), _) => from_unix_timestamp(on)?,
            (None, Some(secs)) => {
                now()
                    + chrono::TimeDelta::try_seconds(secs).ok_or_else(|| {
                        Error::auth_failed(format!("invalid token expires_in {secs}"))
                    })?
            }
            (None, None) => {
                return Err(Error::auth_failed(
                    "token response carries neither expires_on nor expires_in",
                ))
            }
        };
        let not_before = self.not_before.map(from_unix_timestamp).transpose()?;

        Ok(Token {
            access_token: self.access_token,
            token_type: self.token_type,
            not_before,
            expires_on,
            audience: self.resource.unwrap_or_else(|| audience.to_string()),
        })
    }
}

/// The v1 endpoint sends numbers as strings, the v2 endpoint as numbers.
fn de_opt_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => Ok(n.as_i64()),
        Some(serde_json::Value::String(s)) if s.is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => s
            .parse::<i64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(v) => Err(serde::de::Error::custom(format!(
            "expected number, got {v}"
        ))),
    }
}
