use azrest_core::{Context, OsEnv};
use azrest_http_send_reqwest::ReqwestHttpSend;

/// Build a [`Context`] sending with reqwest and reading the process environment.
pub fn default_context() -> Context {
    Context::new()
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv)
}
