use azrest_core::time::{format_sas_time, now, DateTime};
use azrest_core::{Error, Result};
use http::Method;
use serde::Deserialize;
use serde_json::json;

use crate::blob::encode_path;
use crate::StorageAccount;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AccountSasResponse {
    account_sas_token: String,
}

fn permission_of(method: &Method) -> Result<&'static str> {
    match *method {
        Method::GET => Ok("r"),
        Method::PUT => Ok("rwca"),
        Method::DELETE => Ok("rwd"),
        _ => Err(Error::not_supported(format!(
            "no SAS permission for method {method}"
        ))),
    }
}

impl StorageAccount {
    /// Presign the url of a blob for `method` until `expire`.
    ///
    /// The token is minted by the control plane with `listAccountSas`, the
    /// account key never leaves Azure.
    pub async fn sign_url(
        &self,
        method: Method,
        container: &str,
        blob: &str,
        expire: DateTime,
    ) -> Result<String> {
        let permission = permission_of(&method)?;
        let body = json!({
            "signedServices": "b",
            "signedResourceTypes": "co",
            "signedPermission": permission,
            "signedProtocol": "https,http",
            "signedStart": format_sas_time(now()),
            "signedExpiry": format_sas_time(expire),
        });

        let path = format!("{}/listAccountSas", self.id().trim_end_matches('/'));
        let resp: AccountSasResponse =
            serde_json::from_value(self.client().post(&path, Some(&body)).await?)?;
        if resp.account_sas_token.is_empty() {
            return Err(Error::unexpected(format!(
                "no SAS token returned for storage account {}",
                self.name()
            )));
        }

        Ok(format!(
            "{}{}?{}",
            self.blob_endpoint(),
            encode_path(container, blob),
            resp.account_sas_token.trim_start_matches('?')
        ))
    }
}
