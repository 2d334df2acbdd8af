use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::sleep;
use url::Url;

use crate::{
    error::NetError,
    traits::Net,
    types::{Headers, RetryPolicy},
};

pub trait RetryClassifier {
    fn should_retry(&self, error: &NetError) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultRetryClassifier;

impl RetryClassifier for DefaultRetryClassifier {
    fn should_retry(&self, error: &NetError) -> bool {
        error.is_retryable()
    }
}

pub struct DefaultRetryPolicy {
    classifier: DefaultRetryClassifier,
    policy: RetryPolicy,
}

impl DefaultRetryPolicy {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            classifier: DefaultRetryClassifier,
            policy,
        }
    }
}

pub trait RetryPolicyTrait: Send + Sync {
    fn should_retry(&self, error: &NetError, attempt: u32) -> bool;
    fn delay_for_attempt(&self, attempt: u32) -> Duration;
    fn max_attempts(&self) -> u32;
}

impl RetryPolicyTrait for DefaultRetryPolicy {
    fn should_retry(&self, error: &NetError, attempt: u32) -> bool {
        if attempt >= self.policy.max_retries {
            return false;
        }

        self.classifier.should_retry(error)
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.policy.delay_for_attempt(attempt)
    }

    fn max_attempts(&self) -> u32 {
        self.policy.max_retries
    }
}

/// Retry decorator for Net implementations
pub struct RetryNet<N, P> {
    inner: N,
    retry_policy: P,
}

impl<N: Net, P: RetryPolicyTrait> RetryNet<N, P> {
    pub fn new(inner: N, retry_policy: P) -> Self {
        Self {
            inner,
            retry_policy,
        }
    }

    /// Retry loop shared by both trait methods. Non-retryable errors are
    /// returned unwrapped; an exhausted budget wraps the last error in
    /// `RetryExhausted`.
    async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, NetError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, NetError>>,
    {
        let mut attempt: u32 = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if self.retry_policy.should_retry(&error, attempt) {
                        attempt += 1;
                        sleep(self.retry_policy.delay_for_attempt(attempt)).await;
                        continue;
                    }
                    if attempt >= self.retry_policy.max_attempts() {
                        return Err(NetError::RetryExhausted {
                            max_retries: self.retry_policy.max_attempts(),
                            source: Box::new(error),
                        });
                    }
                    return Err(error);
                }
            }
        }
    }
}

#[async_trait]
impl<N: Net, P: RetryPolicyTrait> Net for RetryNet<N, P> {
    async fn get_bytes(&self, url: Url, headers: Option<Headers>) -> Result<Bytes, NetError> {
        self.run(|| self.inner.get_bytes(url.clone(), headers.clone()))
            .await
    }

    async fn get_with_headers(
        &self,
        url: Url,
        headers: Option<Headers>,
    ) -> Result<(Bytes, Headers), NetError> {
        self.run(|| self.inner.get_with_headers(url.clone(), headers.clone()))
            .await
    }
}
