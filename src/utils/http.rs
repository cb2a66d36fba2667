// src/utils/http.rs

//! Plumbing shared by the outbound provider clients.

use std::time::Duration;

use reqwest::Client;

/// A provider URL with its credential.
#[derive(Clone, Debug)]
pub(crate) struct Endpoint {
    pub url: String,
    pub api_key: String,
}

impl Endpoint {
    /// Both values must be present and non-blank.
    pub fn from_parts(url: Option<&str>, api_key: Option<&str>) -> Option<Self> {
        let url = url.map(str::trim).filter(|u| !u.is_empty())?;
        let api_key = api_key.map(str::trim).filter(|k| !k.is_empty())?;
        Some(Self {
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

pub(crate) fn client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}
