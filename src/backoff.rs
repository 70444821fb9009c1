use std::sync::Arc;

use rand::Rng;

use crate::defaults::{DEFAULT_JITTER_MAX_MILLISECONDS, DEFAULT_JITTER_MIN_MILLISECONDS};
use crate::error::{AddContext, FcError};
use crate::io::{Fetcher, Request, Response};
use crate::time::Milliseconds;
use crate::{log_info, Result};

/// ExponentialBackoff wraps a Fetcher and retries requests that fail at the
/// transport level, waiting 2^n seconds plus jitter between attempts. Used by
/// background sync reconciliation, where the endpoint is idempotent and the
/// host redelivers the tag on connectivity changes.
pub struct ExponentialBackoff<'a, F: ?Sized> {
    fetcher: &'a Arc<F>,
    max_retries: u32,
    num_retries: u32,
    jitter_min: Milliseconds,
    jitter_max: Milliseconds,
}

impl<'a, F: ?Sized> ExponentialBackoff<'a, F> {
    pub fn new(fetcher: &'a Arc<F>, max_retries: u32) -> Self {
        ExponentialBackoff {
            fetcher,
            max_retries,
            num_retries: 0,
            jitter_min: Milliseconds::from(DEFAULT_JITTER_MIN_MILLISECONDS),
            jitter_max: Milliseconds::from(DEFAULT_JITTER_MAX_MILLISECONDS),
        }
    }

    fn wait_time(&self) -> Milliseconds {
        let base_wait_time = Milliseconds::from(2u64.pow(self.num_retries) * 1000);
        let jitter = rand::thread_rng().gen_range(*self.jitter_min..=*self.jitter_max);
        let wait_time = base_wait_time + Milliseconds::from(jitter);
        log_info!("Waiting for {} ms before retrying", wait_time);
        wait_time
    }
}

impl<'a, F: Fetcher + ?Sized> ExponentialBackoff<'a, F> {
    pub fn retry_on_error(&mut self, request: &Request) -> Result<Response> {
        loop {
            match self.fetcher.fetch(request) {
                Ok(response) => return Ok(response),
                Err(err) => {
                    if self.max_retries == 0 {
                        return Err(err);
                    }
                    // Only transport outages are worth retrying. HTTP error
                    // statuses come back as Ok responses and the caller
                    // decides what they mean.
                    match err.downcast_ref::<FcError>() {
                        Some(FcError::HttpTransportError(_)) => {}
                        _ => return Err(err),
                    }
                    self.num_retries += 1;
                    if self.num_retries <= self.max_retries {
                        self.fetcher.throttle(self.wait_time());
                        continue;
                    }
                    return Err(FcError::MaxRetriesReached(format!(
                        "Retried the request {} times",
                        self.max_retries
                    )))
                    .err_context(err);
                }
            };
        }
    }
}
