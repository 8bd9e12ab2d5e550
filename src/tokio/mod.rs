mod java;

use std::{net::IpAddr, sync::OnceLock};

use hickory_resolver::{
    config::{ResolverConfig, ResolverOpts},
    TokioAsyncResolver,
};

use crate::Error;

/// Represents a pingable entity.
pub trait AsyncPingable {
    /// The type of response that is expected in reply to the ping.
    type Response;

    /// Ping the entity, gathering its response.
    fn ping(self) -> impl std::future::Future<Output = Result<Self::Response, Error>> + Send;
}

/// Retrieve the status of a given Minecraft server using a `AsyncPingable` configuration.
///
/// # Examples
///
/// Ping a Java Server with a ten second timeout:
///
/// ```no_run
/// # async {
/// use std::time::Duration;
///
/// let response = slping::tokio::get_status(slping::Java {
///     server_address: "mc.hypixel.net".into(),
///     timeout: Duration::from_secs(10),
///     ..Default::default()
/// }).await?;
/// # Ok::<(), slping::Error>(())
/// # };
/// ```
///
/// # Errors
/// If the server status cannot be recieved
pub async fn get_status<P: AsyncPingable + Send>(pingable: P) -> Result<P::Response, Error> {
    pingable.ping().await
}

fn new_resolver() -> TokioAsyncResolver {
    let config = ResolverConfig::cloudflare();
    let mut opts = ResolverOpts::default();
    opts.cache_size = 64;
    opts.attempts = 3;
    TokioAsyncResolver::tokio(config, opts)
}

pub fn resolver() -> &'static TokioAsyncResolver {
    static RESOLVER: OnceLock<TokioAsyncResolver> = OnceLock::new();
    RESOLVER.get_or_init(new_resolver)
}

/// Resolves `host` to the first address it maps to. IP literals are returned
/// as-is without touching the resolver.
pub(crate) async fn lookup(host: &str) -> Result<IpAddr, Error> {
    if let Ok(ip) = host.parse() {
        return Ok(ip);
    }

    let lookup = resolver().lookup_ip(host).await.map_err(|e| {
        Error::ConnectionFailed(std::io::Error::new(std::io::ErrorKind::NotFound, e))
    })?;
    lookup.iter().next().ok_or_else(|| {
        Error::ConnectionFailed(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no addresses found for {host}"),
        ))
    })
}
