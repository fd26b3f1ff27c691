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

use azrest_core::time::{now, DateTime};
use azrest_core::utils::Redact;
use azrest_core::SigningCredential;
use std::fmt::{Debug, Formatter};

/// OAuth2 access token issued by Azure AD for one audience.
#[derive(Clone)]
pub struct Token {
    /// The token itself.
    pub access_token: String,
    /// Usually `Bearer`.
    pub token_type: String,
    /// Token is not valid before this time.
    pub not_before: Option<DateTime>,
    /// Absolute expiry of the token.
    pub expires_on: DateTime,
    /// Audience (resource) the token was issued for.
    pub audience: String,
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &Redact::from(&self.access_token))
            .field("token_type", &self.token_type)
            .field("not_before", &self.not_before)
            .field("expires_on", &self.expires_on)
            .field("audience", &self.audience)
            .finish()
    }
}

impl SigningCredential for Token {
    fn is_valid(&self) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        // Expired once within one second of `expires_on`.
        self.expires_on > now() + chrono::TimeDelta::seconds(1)
    }
}

impl Token {
    /// Value of the `Authorization` header: `<token_type> <access_token>`.
    pub fn authorization(&self) -> String {
        let token_type = if self.token_type.is_empty() {
            "Bearer"
        } else {
            &self.token_type
        };
        format!("{token_type} {}", self.access_token)
    }
}
