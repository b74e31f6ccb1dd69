//! Rate-paced request dispatch and the HTTP transport it drives.
mod dispatcher;
mod rate;
mod transport;

#[cfg(test)]
mod tests;

pub use dispatcher::Dispatcher;
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportSettings};
