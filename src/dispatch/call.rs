//! Call descriptors: one outbound request plus its completion sinks.

use http::header::{ACCEPT, CONTENT_TYPE, HeaderName, HeaderValue};
use serde::Serialize;

use crate::transport::{HttpRequest, HttpResponse};

use super::router::CallbackRouter;
use super::{ErrorKind, Outcome, RequestError, RetryPredicate};

/// HTTP method of a dispatched call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallMethod {
    /// `POST`
    #[default]
    Post,
    /// `PUT`
    Put,
}

impl From<CallMethod> for http::Method {
    fn from(method: CallMethod) -> Self {
        match method {
            CallMethod::Post => Self::POST,
            CallMethod::Put => Self::PUT,
        }
    }
}

impl std::fmt::Display for CallMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Post => "POST",
            Self::Put => "PUT",
        })
    }
}

/// One queued unit of work.
///
/// The body is opaque and immutable once the call is submitted. The URL is
/// validated on the worker; an invalid URL yields
/// [`ErrorKind::Malformed`] rather than an error at construction time.
///
/// # Example
///
/// ```
/// use rest_dispatch::dispatch::Call;
///
/// let call = Call::post("https://api.example.com/items", br#"{"id":7}"#.to_vec())
///     .with_credentials("robot:secret")
///     .on_success(|response| println!("stored: {}", response.status))
///     .on_error(|kind, _body| eprintln!("failed: {kind}"))
///     .should_retry(|status, _body| status.is_none_or(|s| s.is_server_error()));
///
/// assert_eq!(call.url(), "https://api.example.com/items");
/// ```
pub struct Call {
    method: CallMethod,
    url: String,
    credentials: Option<String>,
    body: Vec<u8>,
    should_retry: Option<RetryPredicate>,
    router: CallbackRouter,
}

impl Call {
    /// Creates a call with no credentials, callbacks or predicate.
    pub fn new(method: CallMethod, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method,
            url: url.into(),
            credentials: None,
            body: body.into(),
            should_retry: None,
            router: CallbackRouter::default(),
        }
    }

    /// Creates a POST call.
    pub fn post(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self::new(CallMethod::Post, url, body)
    }

    /// Creates a PUT call.
    pub fn put(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self::new(CallMethod::Put, url, body)
    }

    /// Creates a call whose body is `payload` serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if `payload` cannot be represented as JSON.
    pub fn json<T: Serialize + ?Sized>(
        method: CallMethod,
        url: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(method, url, serde_json::to_vec(payload)?))
    }

    /// Sets the credential string handed to the transport for basic auth.
    #[must_use]
    pub fn with_credentials(mut self, credentials: impl Into<String>) -> Self {
        self.credentials = Some(credentials.into());
        self
    }

    /// Registers the success callback.
    #[must_use]
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&HttpResponse) + Send + 'static,
    {
        self.router.on_success = Some(Box::new(callback));
        self
    }

    /// Registers the error callback.
    #[must_use]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(ErrorKind, &[u8]) + Send + 'static,
    {
        self.router.on_error = Some(Box::new(callback));
        self
    }

    /// Registers the retry predicate (see [`RetryPredicate`]).
    #[must_use]
    pub fn should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(Option<http::StatusCode>, &[u8]) -> bool + Send + 'static,
    {
        self.should_retry = Some(RetryPredicate::new(predicate));
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> CallMethod {
        self.method
    }

    /// Returns the target URL as given.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns true if a credential string is set.
    #[must_use]
    pub const fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Builds the transport request with the fixed JSON headers.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] if the URL does not parse or is not HTTP(S).
    pub fn build_request(&self) -> Result<HttpRequest, RequestError> {
        let url = url::Url::parse(&self.url).map_err(|e| RequestError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(RequestError::UnsupportedScheme(url.scheme().to_string()));
        }

        let mut request = HttpRequest::new(self.method.into(), url)
            .with_header(ACCEPT, HeaderValue::from_static("application/json"))
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_header(HeaderName::from_static("charset"), HeaderValue::from_static("utf-8"))
            .with_body(self.body.clone());

        if let Some(credentials) = &self.credentials {
            request = request.with_credentials(credentials.clone());
        }

        Ok(request)
    }

    pub(crate) fn attach_completion(&mut self, sender: tokio::sync::oneshot::Sender<Outcome>) {
        self.router.completion = Some(sender);
    }

    pub(crate) fn into_parts(self) -> (Option<RetryPredicate>, CallbackRouter) {
        (self.should_retry, self.router)
    }
}

impl std::fmt::Debug for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Call")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("body_len", &self.body.len())
            .field("has_credentials", &self.credentials.is_some())
            .field("has_predicate", &self.should_retry.is_some())
            .field("router", &self.router)
            .finish()
    }
}
