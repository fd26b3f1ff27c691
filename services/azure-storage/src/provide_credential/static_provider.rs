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
use async_trait::async_trait;
use azrest_core::time::DateTime;
use azrest_core::{Context, ProvideCredential, Result};

use crate::credential::Credential;

/// Hands out the same credential on every call.
#[derive(Clone, Debug)]
pub struct StaticCredentialProvider {
    credential: Credential,
}

impl StaticCredentialProvider {
    /// Provide `credential` as is.
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    /// Shorthand for [`Credential::with_shared_key`].
    pub fn new_shared_key(account_name: &str, account_key: &str) -> Self {
        Self::new(Credential::with_shared_key(account_name, account_key))
    }

    /// Shorthand for [`Credential::with_sas_token`].
    pub fn new_sas_token(sas_token: &str) -> Self {
        Self::new(Credential::with_sas_token(sas_token))
    }

    /// Shorthand for [`Credential::with_bearer_token`].
    pub fn new_bearer_token(bearer_token: &str, expires_on: Option<DateTime>) -> Self {
        Self::new(Credential::with_bearer_token(bearer_token, expires_on))
    }
}

impl From<Credential> for StaticCredentialProvider {
    fn from(credential: Credential) -> Self {
        Self::new(credential)
    }
}

#[async_trait]
impl ProvideCredential for StaticCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
        Ok(Some(self.credential.clone()))
    }
}
