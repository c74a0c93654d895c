// # IP Resolver Trait
//
// Defines the interface for determining the current public address.
//
// ## Implementations
//
// - HTTP address-reporting service: `updateip-resolver-http` crate
//
// ## Usage
//
// ```rust,ignore
// use updateip_core::IpResolver;
//
// #[tokio::main]
// async fn main() -> updateip_core::Result<()> {
//     let resolver = /* IpResolver implementation */;
//     let ip = resolver.resolve().await?;
//     println!("public address: {ip}");
//     Ok(())
// }
// ```

use crate::ip::IpAddress;
use async_trait::async_trait;

/// Trait for resolver implementations
///
/// A resolver performs one lookup per call. It must not cache, retry or
/// sleep: the [`Poller`](crate::Poller) owns scheduling and the next cycle is
/// the retry.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Look up the current public address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddress)`: The first IPv4-shaped literal reported
    /// - `Err(Error::UnreachableService)`: No response
    /// - `Err(Error::NoAddressFound)`: Response without an address
    async fn resolve(&self) -> Result<IpAddress, crate::Error>;

    /// Identity of the service queried (for logging)
    fn endpoint(&self) -> &str;
}

/// Helper trait for constructing resolvers from configuration
pub trait ResolverFactory: Send + Sync {
    /// Create an IpResolver instance from configuration
    fn create(
        &self,
        config: &crate::config::ResolverConfig,
    ) -> Result<Box<dyn IpResolver>, crate::Error>;
}
