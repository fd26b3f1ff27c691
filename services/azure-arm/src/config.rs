use std::fmt::{Debug, Formatter};
use std::time::Duration;

use azrest_core::utils::Redact;
use azrest_core::{Context, Result};

use crate::constants::*;
use crate::environment::{AzureEnvironment, Endpoints};

/// Config carries all the configuration of an [`AzureClient`](crate::AzureClient).
#[derive(Clone)]
pub struct Config {
    /// `environment` will be loaded from
    ///
    /// - this field
    /// - env value: [`AZURE_ENVIRONMENT`]
    pub environment: AzureEnvironment,
    /// `tenant_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZURE_TENANT_ID`]
    pub tenant_id: Option<String>,
    /// `client_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZURE_CLIENT_ID`]
    pub client_id: Option<String>,
    /// `client_secret` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZURE_CLIENT_SECRET`]
    pub client_secret: Option<String>,
    /// Subscription used for subscription scoped paths.
    ///
    /// When unset, the first enabled subscription of the account is picked.
    pub subscription_id: Option<String>,
    /// Reject every request that could mutate state.
    pub read_only: bool,
    /// Log requests and responses at `debug` level.
    pub debug: bool,
    /// Override the endpoints of `environment`.
    pub endpoints: Option<Endpoints>,
    /// Sleep between two polls of a long-running operation unless `Retry-After` says otherwise.
    pub lro_poll_interval: Duration,
    /// Give up waiting for a long-running operation after this long.
    pub lro_timeout: Duration,
    /// Sleep between two checks of a provider registration.
    pub register_poll_interval: Duration,
    /// Give up waiting for a provider registration after this long.
    pub register_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: AzureEnvironment::default(),
            tenant_id: None,
            client_id: None,
            client_secret: None,
            subscription_id: None,
            read_only: false,
            debug: false,
            endpoints: None,
            lro_poll_interval: Duration::from_secs(10),
            lro_timeout: Duration::from_secs(30 * 60),
            register_poll_interval: Duration::from_secs(10),
            register_timeout: Duration::from_secs(5 * 60),
        }
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("environment", &self.environment)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &Redact::from(&self.client_secret))
            .field("subscription_id", &self.subscription_id)
            .field("read_only", &self.read_only)
            .field("debug", &self.debug)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load config from the environment of `ctx`.
    ///
    /// Credentials and the subscription already set on this config are kept.
    /// The environment, read only and debug switches are only changed by env
    /// values that are present and not empty.
    pub fn from_env(mut self, ctx: &Context) -> Result<Self> {
        if let Some(v) = ctx.env_value(AZURE_ENVIRONMENT) {
            self.environment = v.parse()?;
        }
        if self.tenant_id.is_none() {
            self.tenant_id = ctx.env_value(AZURE_TENANT_ID);
        }
        if self.client_id.is_none() {
            self.client_id = ctx.env_value(AZURE_CLIENT_ID);
        }
        if self.client_secret.is_none() {
            self.client_secret = ctx.env_value(AZURE_CLIENT_SECRET);
        }
        if self.subscription_id.is_none() {
            self.subscription_id = ctx.env_value(AZURE_SUBSCRIPTION_ID);
        }
        if let Some(v) = ctx.env_value(AZURE_READ_ONLY) {
            self.read_only = parse_bool(&v);
        }
        if let Some(v) = ctx.env_value(AZURE_DEBUG) {
            self.debug = parse_bool(&v);
        }

        Ok(self)
    }

    /// Set the cloud.
    pub fn with_environment(mut self, environment: AzureEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Set the service principal used to acquire tokens.
    pub fn with_client_secret(
        mut self,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Set the subscription.
    pub fn with_subscription_id(mut self, subscription_id: impl Into<String>) -> Self {
        self.subscription_id = Some(subscription_id.into());
        self
    }

    /// Toggle read only mode.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Toggle debug logging of requests.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Override all endpoints.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Set how long-running operations are polled.
    pub fn with_lro_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.lro_poll_interval = interval;
        self.lro_timeout = timeout;
        self
    }

    /// Set how provider registrations are awaited.
    pub fn with_register_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.register_poll_interval = interval;
        self.register_timeout = timeout;
        self
    }

    /// Endpoints in effect: the override if any, else those of `environment`.
    pub fn endpoints(&self) -> Endpoints {
        self.endpoints
            .clone()
            .unwrap_or_else(|| self.environment.endpoints())
    }
}

fn parse_bool(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
