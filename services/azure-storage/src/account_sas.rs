use azrest_core::hash;
use azrest_core::time::{self, DateTime};
use azrest_core::Result;

/// The default parameters that make up an account SAS token
/// https://learn.microsoft.com/en-us/rest/api/storageservices/create-account-sas#specify-the-account-sas-parameters
const ACCOUNT_SAS_VERSION: &str = "2018-11-09";
const ACCOUNT_SAS_SERVICES: &str = "bqtf";
const ACCOUNT_SAS_RESOURCE_TYPES: &str = "sco";
const ACCOUNT_SAS_PERMISSIONS: &str = "rwdlacu";

/// Account SAS signed locally with the account key.
pub(crate) struct AccountSharedAccessSignature {
    account: String,
    key: String,
    expiry: DateTime,
}

impl AccountSharedAccessSignature {
    /// Create a SAS token signer with default parameters
    pub(crate) fn new(account: &str, key: &str, expiry: DateTime) -> Self {
        Self {
            account: account.to_string(),
            key: key.to_string(),
            expiry,
        }
    }

    // Azure documentation: https://learn.microsoft.com/en-us/rest/api/storageservices/create-account-sas#construct-the-signature-string
    fn signature(&self) -> Result<String> {
        // Start time, ip and protocol are left empty.
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}\n\n{}\n\n\n{}\n",
            self.account,
            ACCOUNT_SAS_PERMISSIONS,
            ACCOUNT_SAS_SERVICES,
            ACCOUNT_SAS_RESOURCE_TYPES,
            time::format_rfc3339(self.expiry),
            ACCOUNT_SAS_VERSION,
        );

        let key = hash::base64_decode(&self.key)?;
        Ok(hash::base64_hmac_sha256(&key, string_to_sign.as_bytes()))
    }

    /// Query pairs of the token, values not yet percent encoded.
    pub(crate) fn token(&self) -> Result<Vec<(String, String)>> {
        Ok(vec![
            ("sv".to_string(), ACCOUNT_SAS_VERSION.to_string()),
            ("ss".to_string(), ACCOUNT_SAS_SERVICES.to_string()),
            ("srt".to_string(), ACCOUNT_SAS_RESOURCE_TYPES.to_string()),
            ("se".to_string(), time::format_rfc3339(self.expiry)),
            ("sp".to_string(), ACCOUNT_SAS_PERMISSIONS.to_string()),
            ("sig".to_string(), self.signature()?),
        ])
    }
}
