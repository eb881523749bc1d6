//! Remote operation client
//!
//! Every operation is a single JSON POST to the configured endpoint. Arguments
//! are validated before anything is sent; failures are returned, never retried.

use reqwest::Url;
use serde_json::Value;

use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::models::{CodeResult, Operation, ServiceRequest, ServiceResponse, is_valid_amount};

/// HTTP client bound to one service key and project
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    uri: Option<Url>,
    service_key: String,
    project: String,
}

impl ServiceClient {
    /// Create a client for a configuration
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            uri: config.uri.clone(),
            service_key: config.service_key.clone(),
            project: config.project.clone(),
        })
    }

    /// The endpoint requests are sent to
    #[must_use]
    pub const fn uri(&self) -> Option<&Url> {
        self.uri.as_ref()
    }

    fn request(&self, operation: Operation) -> ServiceRequest {
        ServiceRequest::new(operation, &self.service_key, &self.project)
    }

    /// Connectivity check
    pub async fn hello_world(&self) -> Result<ServiceResponse> {
        self.exchange(self.request(Operation::HelloWorld)).await
    }

    /// Fetch the project's access codes
    pub async fn get_codes(&self) -> Result<ServiceResponse> {
        self.exchange(self.request(Operation::GetCodes)).await
    }

    /// Report the start of a session
    pub async fn check_in(&self, access_code: &str) -> Result<ServiceResponse> {
        validate_access_code(access_code, Operation::CheckIn)?;
        self.exchange(self.request(Operation::CheckIn).access_code(access_code))
            .await
    }

    /// Report a completed session with its exit code and bonus
    pub async fn check_out(
        &self,
        access_code: &str,
        exit_code: &str,
        bonus: f64,
    ) -> Result<ServiceResponse> {
        validate_session_end(access_code, exit_code, bonus, Operation::CheckOut)?;
        self.exchange(
            self.request(Operation::CheckOut)
                .access_code(access_code)
                .exit(exit_code, bonus),
        )
        .await
    }

    /// Report an abandoned session with its exit code and bonus
    pub async fn drop_out(
        &self,
        access_code: &str,
        exit_code: &str,
        bonus: f64,
    ) -> Result<ServiceResponse> {
        validate_session_end(access_code, exit_code, bonus, Operation::DropOut)?;
        self.exchange(
            self.request(Operation::DropOut)
                .access_code(access_code)
                .exit(exit_code, bonus),
        )
        .await
    }

    /// Post a batch of session results in one request
    pub async fn post_codes(&self, codes: &[CodeResult]) -> Result<ServiceResponse> {
        if codes.is_empty() {
            return Err(Error::validation("PostCodes: no codes to post"));
        }
        for code in codes {
            validate_session_end(
                &code.access_code,
                &code.exit_code,
                code.bonus,
                Operation::PostCodes,
            )?;
        }
        self.exchange(self.request(Operation::PostCodes).codes(codes.to_vec()))
            .await
    }

    /// Fetch payoff records
    pub async fn get_payoffs(&self) -> Result<ServiceResponse> {
        self.exchange(self.request(Operation::GetPayoffs)).await
    }

    /// Post payoff records
    pub async fn post_payoffs(&self, payoffs: &[Value]) -> Result<ServiceResponse> {
        if payoffs.is_empty() {
            return Err(Error::validation("PostPayoffs: no payoffs to post"));
        }
        if let Some(bad) = payoffs.iter().find(|p| !p.is_object()) {
            return Err(Error::validation(format!(
                "PostPayoffs: payoff must be an object, got {bad}"
            )));
        }
        self.exchange(self.request(Operation::PostPayoffs).payoffs(payoffs.to_vec()))
            .await
    }

    /// Send one request and decode the reply
    pub async fn exchange(&self, request: ServiceRequest) -> Result<ServiceResponse> {
        let operation = request.operation;
        let uri = self.uri.as_ref().ok_or_else(|| {
            Error::configuration(format!("{operation}: no service uri configured"))
        })?;

        log::debug!("{operation} request: {}", request.redacted());

        let response = self
            .http
            .post(uri.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                log::error!("{operation}: request failed: {e}");
                Error::from(e)
            })?;

        let status = response.status();
        log::info!("{operation} response code: {status}");

        let body = response.text().await.map_err(|e| {
            log::error!("{operation}: failed to read response body: {e}");
            Error::from(e)
        })?;

        if !status.is_success() {
            log::error!("{operation} failed with {status}: {body}");
            return Err(Error::Transport {
                status: Some(status.as_u16()),
                message: body,
            });
        }

        log::debug!("{operation} response body: {body}");

        if body.trim().is_empty() {
            return Ok(ServiceResponse::default());
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!("{operation}: undecodable response body: {e}");
            Error::Transport {
                status: Some(status.as_u16()),
                message: format!("undecodable response body: {e}"),
            }
        })
    }
}

fn require(value: &str, what: &str, operation: Operation) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!(
            "{operation}: {what} must be a non-empty string"
        )));
    }
    Ok(())
}

fn validate_bonus(bonus: f64, operation: Operation) -> Result<()> {
    if !is_valid_amount(bonus) {
        return Err(Error::validation(format!(
            "{operation}: bonus must be a non-negative number, got {bonus}"
        )));
    }
    Ok(())
}

/// Check the arguments of a check-out or drop-out without sending anything
pub fn validate_session_end(
    access_code: &str,
    exit_code: &str,
    bonus: f64,
    operation: Operation,
) -> Result<()> {
    require(access_code, "access code", operation)?;
    require(exit_code, "exit code", operation)?;
    validate_bonus(bonus, operation)
}

/// Check the access code of a check-in without sending anything
pub fn validate_access_code(access_code: &str, operation: Operation) -> Result<()> {
    require(access_code, "access code", operation)
}
