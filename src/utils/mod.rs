pub mod http_client;
#[cfg(test)]
pub(crate) mod test_server;

pub use http_client::ProviderHttpClient;
