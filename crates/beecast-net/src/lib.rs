#![forbid(unsafe_code)]

mod client;
mod error;
mod retry;
mod timeout;
mod traits;
mod types;

pub use crate::{
    client::HttpClient,
    error::{NetError, NetResult},
    retry::{DefaultRetryPolicy, RetryNet, RetryPolicyTrait},
    timeout::TimeoutNet,
    traits::{Net, NetExt},
    types::{Headers, NetOptions, RetryPolicy},
};

/// Mock surface for downstream crates' tests.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    pub use crate::traits::NetMock;
}
