use std::io::Read;

use crate::error::FcError;
use crate::io::{Fetcher, Headers, Request, Response};
use crate::time::{self, Milliseconds};
use crate::{log_debug, Result};

/// Blocking network client over ureq. Any HTTP status becomes a successful
/// `Response` (4xx/5xx included); only transport level failures surface as
/// errors. Strategies never talk to ureq directly.
pub struct NetClient {
    now: fn() -> Milliseconds,
}

impl NetClient {
    pub fn new() -> Self {
        NetClient {
            now: time::now_epoch_milliseconds,
        }
    }

    fn read_response(&self, response: ureq::Response) -> Result<Response> {
        let status: i32 = response.status().into();
        // Internal header processing is all in lowercase.
        let headers = response
            .headers_names()
            .iter()
            .fold(Headers::new(), |mut headers, name| {
                if let Some(value) = response.header(name.as_str()) {
                    headers.set(name.to_lowercase(), value.to_string());
                }
                headers
            });
        let mut body = Vec::new();
        response.into_reader().read_to_end(&mut body)?;
        let response = Response::builder()
            .status(status)
            .headers(headers)
            .body(body)
            .build()?;
        Ok(response)
    }
}

impl Default for NetClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for NetClient {
    fn fetch(&self, request: &Request) -> Result<Response> {
        let start = (self.now)();
        let ureq_req = ureq::request(request.method().as_str(), request.url());
        let ureq_req = request
            .headers()
            .iter()
            .fold(ureq_req, |req, (key, value)| req.set(key, value));
        let result = ureq_req.call();
        let elapsed = (self.now)() - start;
        match result {
            Ok(response) => {
                let response = self.read_response(response)?;
                log_debug!(
                    "{} {} -> {} in {} ms",
                    request.method(),
                    request.url(),
                    response.status,
                    elapsed
                );
                Ok(response)
            }
            // ureq returns error on status codes >= 400, handled separately.
            // https://docs.rs/ureq/latest/ureq/#error-handling
            Err(ureq::Error::Status(_, response)) => {
                let response = self.read_response(response)?;
                log_debug!(
                    "{} {} -> {} in {} ms",
                    request.method(),
                    request.url(),
                    response.status,
                    elapsed
                );
                Ok(response)
            }
            Err(err) => Err(FcError::HttpTransportError(err.to_string()).into()),
        }
    }
}
