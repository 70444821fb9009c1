use crate::{
    time::Milliseconds,
    Result,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::hash_map,
    collections::HashMap,
    fmt::{self, Display, Formatter},
    thread,
};

/// A trait for the HTTP protocol. Implementors accept a `Request` wrapping
/// method, URL and headers and produce a `Response`. Any HTTP status is a
/// successful fetch; only transport level failures (DNS, connection, timeout)
/// surface as errors. Clients can do HTTP calls against a remote origin or
/// mock the responses for testing purposes.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, request: &Request) -> Result<Response>;
    /// Milliseconds to wait before executing the next request
    fn throttle(&self, milliseconds: Milliseconds) {
        thread::sleep(std::time::Duration::from_millis(*milliseconds));
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Method {
    #[default]
    GET,
    HEAD,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Destination hint carried by the requesting runtime, equivalent to the
/// fetch destination of a browser request. The router only cares about
/// `Image`; the other variants classify by path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Destination {
    Document,
    Image,
    Script,
    Style,
    Font,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Headers(HashMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Headers(HashMap::new())
    }

    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.0.get(key)
    }

    pub fn iter(&self) -> hash_map::Iter<String, String> {
        self.0.iter()
    }
}

#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned")]
pub struct Request {
    #[builder(setter(into))]
    url: String,
    #[builder(default)]
    method: Method,
    #[builder(default)]
    headers: Headers,
    /// Optional destination hint. Absent for plain HTTP hosts that do not
    /// carry one.
    #[builder(setter(strip_option), default)]
    destination: Option<Destination>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    pub fn new(url: &str, method: Method) -> Self {
        Request {
            url: url.to_string(),
            method,
            headers: Headers::new(),
            destination: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn set_header(&mut self, key: &str, value: &str) {
        self.headers.set(key, value);
    }

    pub fn destination(&self) -> Option<Destination> {
        self.destination
    }

    /// Identity of the request inside a partition: method plus absolute URL.
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// A response as captured at fetch time: status, headers and raw body bytes.
/// Entries stored in a partition are whole-entry replaced, never patched.
#[derive(Clone, Debug, Default, PartialEq, Builder)]
pub struct Response {
    #[builder(default)]
    pub status: i32,
    #[builder(default)]
    pub headers: Headers,
    #[builder(setter(into), default)]
    pub body: Vec<u8>,
}

impl Response {
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|s| s.as_str())
    }

    pub fn is_ok(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Deterministic worst-case fallback when both network and cache miss.
    /// Plain text, no stack traces or internal errors reach the client.
    pub fn service_unavailable() -> Self {
        let mut headers = Headers::new();
        headers.set("content-type", "text/plain");
        headers.set("date", chrono::Utc::now().to_rfc2822());
        Response {
            status: 503,
            headers,
            body: b"Offline".to_vec(),
        }
    }
}
