use std::time::Duration;

use reqwest::blocking::Client;

use super::languages::RemoteLanguage;
use super::protocol::{RemoteReply, RemoteSubmission};
use crate::error::{Error, Result};

/// The HTTP exchange with the remote service.
pub trait RemoteTransport: Send + Sync {
    /// One synchronous submission; the reply is returned whatever its HTTP
    /// status. `Err` means the service could not be reached at all.
    fn submit(&self, submission: &RemoteSubmission, base64_encoded: bool) -> Result<RemoteReply>;
    fn languages(&self) -> Result<Vec<RemoteLanguage>>;
}

pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl RemoteTransport for HttpTransport {
    fn submit(&self, submission: &RemoteSubmission, base64_encoded: bool) -> Result<RemoteReply> {
        let res = self
            .client
            .post(&format!(
                "{}/submissions/?wait=true&base64_encoded={}",
                self.base_url, base64_encoded
            ))
            .json(submission)
            .send()?;

        let status = res.status().as_u16();
        let body = res.text()?;
        Ok(RemoteReply { status, body })
    }

    fn languages(&self) -> Result<Vec<RemoteLanguage>> {
        let res = self
            .client
            .get(&format!("{}/languages", self.base_url))
            .send()?;
        if !res.status().is_success() {
            return Err(Error::Judge {
                judge_name: self.base_url.clone(),
                msg: format!("language catalog answered HTTP {}", res.status()),
            });
        }
        Ok(res.json()?)
    }
}
