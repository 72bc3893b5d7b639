// Story backend HTTP client.
// Handles the cookie session, request timeouts, and the success/error response envelope.

use std::time::Duration;

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use url::Url;

use crate::error::{EchoesError, Result};

/// Empty query string.
pub const NO_PARAMS: &[(&str, &str)] = &[];

/// HTTP client for the diary backend with a persistent cookie session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new client against the given base URL.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("echoes-tui"));

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(EchoesError::Http)?;

        Ok(Self { client, base_url })
    }

    /// Base URL of the backend, used when sharing links.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> Result<Url> {
        self.base_url
            .join(endpoint)
            .map_err(|e| EchoesError::Other(format!("bad endpoint {}: {}", endpoint, e)))
    }

    /// GET an endpoint with query parameters and decode the envelope payload.
    pub async fn get<T, P>(&self, endpoint: &str, params: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let url = self.url(endpoint)?;
        let response = self
            .client
            .get(url.clone())
            .query(params)
            .send()
            .await
            .map_err(EchoesError::Http)?;
        self.decode(&url, response).await
    }

    /// GET an endpoint whose body has no success/error envelope.
    pub async fn get_raw<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = self.url(endpoint)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(EchoesError::Http)?;
        let response = check_login_redirect(&url, response)?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(EchoesError::Unauthorized);
        }
        response.json().await.map_err(EchoesError::Http)
    }

    /// POST a JSON body and decode the envelope payload.
    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(endpoint)?;
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(EchoesError::Http)?;
        self.decode(&url, response).await
    }

    /// DELETE a resource and decode the envelope payload.
    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = self.url(endpoint)?;
        let response = self
            .client
            .delete(url.clone())
            .send()
            .await
            .map_err(EchoesError::Http)?;
        self.decode(&url, response).await
    }

    async fn decode<T: DeserializeOwned>(&self, requested: &Url, response: Response) -> Result<T> {
        let response = check_login_redirect(requested, response)?;
        let status = response.status();
        let value: Value = match response.json().await {
            Ok(value) => value,
            Err(e) if e.is_decode() && status == StatusCode::UNAUTHORIZED => {
                return Err(EchoesError::Unauthorized);
            }
            Err(e) if e.is_decode() => {
                return Err(EchoesError::MalformedResponse(format!(
                    "HTTP {} body is not JSON",
                    status
                )));
            }
            Err(e) => return Err(EchoesError::Http(e)),
        };
        // Error statuses still carry an envelope with the reason (e.g. a 401 for a wrong password)
        open_envelope(value)
    }
}

/// Map a redirect to the login page onto an authentication failure.
///
/// `login_required` endpoints answer anonymous requests by redirecting, and
/// reqwest follows the redirect to an HTML page.
fn check_login_redirect(requested: &Url, response: Response) -> Result<Response> {
    let landed = response.url().path();
    if landed != requested.path() && landed.starts_with("/auth/login") {
        return Err(EchoesError::Unauthorized);
    }
    Ok(response)
}

/// Interpret the `success` / `error` discriminator of a response body.
///
/// `error` wins over everything, `success: false` is a rejection, and a body
/// with neither field is malformed.
pub fn open_envelope<T: DeserializeOwned>(value: Value) -> Result<T> {
    let Some(object) = value.as_object() else {
        return Err(EchoesError::MalformedResponse(
            "expected a JSON object".to_string(),
        ));
    };

    if let Some(error) = object.get("error").filter(|e| !e.is_null()) {
        let message = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(EchoesError::Api(message));
    }

    match object.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(serde_json::from_value(value)?),
        Some(false) => Err(EchoesError::Rejected(rejection_reason(object))),
        None => Err(EchoesError::MalformedResponse(
            "missing success or error field".to_string(),
        )),
    }
}

fn rejection_reason(object: &serde_json::Map<String, Value>) -> String {
    if let Some(message) = object.get("message").and_then(Value::as_str) {
        return message.to_string();
    }
    if let Some(errors) = object.get("errors").and_then(Value::as_array) {
        let joined: Vec<&str> = errors.iter().filter_map(Value::as_str).collect();
        if !joined.is_empty() {
            return joined.join("; ");
        }
    }
    "Request was rejected".to_string()
}
