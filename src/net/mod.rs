pub mod executor;
pub mod transport;

pub use executor::{RequestExecutor, RetryConfig};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
