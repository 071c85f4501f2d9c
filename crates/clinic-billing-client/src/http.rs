//! reqwest-backed [`BillingBackend`].

use std::future::Future;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use clinic_billing_core::models::PatientInput;
use clinic_billing_core::{Invoice, InvoiceRequest, LabTest, Patient};

use crate::backend::BillingBackend;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Deserialize)]
struct InvoiceCreated {
    invoice: Invoice,
}

/// HTTP client for the billing API with a per-request timeout and retry with
/// exponential backoff on transient failures.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: ClientConfig,
    session: Session,
}

impl HttpBackend {
    pub fn new(config: ClientConfig, session: Session) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            config,
            session,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.bearer() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send the request built by `build`, retrying retryable failures per the
    /// configured policy. `build` runs once per attempt.
    async fn call<T, F>(&self, what: &str, build: F) -> ClientResult<T>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let policy = self.config.retry;
        let mut attempt = 1;
        loop {
            let result = match self.authorize(build(&self.client)).send().await {
                Ok(response) => decode(response).await,
                Err(e) => Err(ClientError::from(e)),
            };

            match result {
                Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                    let delay = policy.backoff(attempt);
                    warn!(call = what, attempt, error = %e, ?delay, "Retrying request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(ClientError::from)?;
    if status.is_success() {
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    } else {
        Err(ClientError::from_status(status.as_u16(), &bytes))
    }
}

impl BillingBackend for HttpBackend {
    fn find_patient_by_phone(
        &self,
        phone: &str,
    ) -> impl Future<Output = ClientResult<Option<Patient>>> + Send {
        let url = self.config.endpoint("/patient");
        let phone = phone.to_string();
        async move {
            let matches: Vec<Patient> = self
                .call("find_patient_by_phone", |client| {
                    client.get(&url).query(&[("search", phone.as_str())])
                })
                .await?;
            debug!(matches = matches.len(), "Phone lookup finished");
            Ok(matches.into_iter().find(|p| p.phone == phone))
        }
    }

    fn list_tests(&self) -> impl Future<Output = ClientResult<Vec<LabTest>>> + Send {
        let url = self.config.endpoint("/get-all-test");
        async move { self.call("list_tests", |client| client.get(&url)).await }
    }

    fn resolve_patient(
        &self,
        input: &PatientInput,
    ) -> impl Future<Output = ClientResult<Patient>> + Send {
        let url = self.config.endpoint("/patient");
        let input = input.clone();
        async move {
            self.call("resolve_patient", |client| client.post(&url).json(&input))
                .await
        }
    }

    fn create_invoice(
        &self,
        request: &InvoiceRequest,
        idempotency_key: &str,
    ) -> impl Future<Output = ClientResult<Invoice>> + Send {
        let url = self.config.endpoint("/invoice");
        let request = request.clone();
        let key = idempotency_key.to_string();
        async move {
            let created: InvoiceCreated = self
                .call("create_invoice", |client| {
                    client
                        .post(&url)
                        .header(IDEMPOTENCY_KEY_HEADER, key.as_str())
                        .json(&request)
                })
                .await?;
            Ok(created.invoice)
        }
    }
}
