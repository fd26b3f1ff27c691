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


use std::fmt::{Debug, Formatter};

use azrest_core::time::{now, DateTime};
use azrest_core::utils::Redact;
use azrest_core::SigningCredential;
use chrono::TimeDelta;

/// Bearer tokens this close to expiry are refreshed before use.
const EXPIRY_GRACE_SECS: i64 = 20;

/// Credential accepted by the blob endpoint of a storage account.
#[derive(Clone)]
pub enum Credential {
    /// Account name and base64 account key, signs every request with
    /// `SharedKey`.
    SharedKey {
        /// Storage account name.
        account_name: String,
        /// Base64 account key.
        account_key: String,
    },
    /// Pre-minted SAS token, appended to every url.
    SasToken {
        /// Encoded query string without the leading `?`.
        token: String,
    },
    /// AAD token for `https://storage.azure.com/`.
    BearerToken {
        /// Access token.
        token: String,
        /// `None` for tokens that never expire.
        expires_on: Option<DateTime>,
    },
}

impl Credential {
    /// SharedKey credential for `account_name`.
    pub fn with_shared_key(account_name: &str, account_key: &str) -> Self {
        Self::SharedKey {
            account_name: account_name.to_string(),
            account_key: account_key.to_string(),
        }
    }

    /// SAS credential, a leading `?` is dropped.
    pub fn with_sas_token(sas_token: &str) -> Self {
        Self::SasToken {
            token: sas_token.trim_start_matches('?').to_string(),
        }
    }

    /// Bearer credential.
    pub fn with_bearer_token(bearer_token: &str, expires_on: Option<DateTime>) -> Self {
        Self::BearerToken {
            token: bearer_token.to_string(),
            expires_on,
        }
    }
}

impl SigningCredential for Credential {
    fn is_valid(&self) -> bool {
        match self {
            Self::SharedKey {
                account_name,
                account_key,
            } => !account_name.is_empty() && !account_key.is_empty(),
            Self::SasToken { token } => !token.is_empty(),
            Self::BearerToken { token, expires_on } => {
                let fresh = |t: &DateTime| *t > now() + TimeDelta::seconds(EXPIRY_GRACE_SECS);
                !token.is_empty() && expires_on.as_ref().map_or(true, fresh)
            }
        }
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SharedKey {
                account_name,
                account_key,
            } => f
                .debug_struct("SharedKey")
                .field("account_name", account_name)
                .field("account_key", &Redact::from(account_key))
                .finish(),
            Self::SasToken { token } => f
                .debug_struct("SasToken")
                .field("token", &Redact::from(token))
                .finish(),
            Self::BearerToken { token, expires_on } => f
                .debug_struct("BearerToken")
                .field("token", &Redact::from(token))
                .field("expires_on", expires_on)
                .finish(),
        }
    }
}
