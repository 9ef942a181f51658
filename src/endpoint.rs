//! Endpoint strings: `pf://[host[:port]/]routing-key/index-name`.

use std::fmt;
use std::str::FromStr;

use crate::error::IndexError;

/// Only scheme the resolver accepts.
pub const SCHEME: &str = "pf";
/// Host used when the endpoint omits one.
pub const DEFAULT_HOST: &str = "localhost";
/// Standard AMQP broker port, used when the endpoint omits one.
pub const DEFAULT_PORT: u16 = 5672;

/// A resolved index endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    /// Queue the index service listens on.
    pub routing_key: String,
    /// Logical platefile name, e.g. `mars.plate`.
    pub index_name: String,
}

impl Endpoint {
    /// Resolve an endpoint string.
    ///
    /// ```
    /// use platefile_index::Endpoint;
    ///
    /// let endpoint = Endpoint::parse("pf://orbit1/mars.plate").unwrap();
    /// assert_eq!(endpoint.host, "localhost");
    /// assert_eq!(endpoint.port, 5672);
    /// assert_eq!(endpoint.routing_key, "orbit1");
    /// assert_eq!(endpoint.index_name, "mars.plate");
    /// ```
    pub fn parse(url: &str) -> Result<Self, IndexError> {
        let rest = url
            .strip_prefix(SCHEME)
            .and_then(|s| s.strip_prefix("://"))
            .ok_or_else(|| {
                IndexError::Argument(format!("not a well-formed platefile URL: {}", url))
            })?;

        let segments: Vec<&str> = rest.split('/').collect();
        let (host, port, routing_key, index_name) = match segments.as_slice() {
            [routing_key, index_name] => (
                DEFAULT_HOST.to_string(),
                DEFAULT_PORT,
                *routing_key,
                *index_name,
            ),
            [authority, routing_key, index_name] => {
                let (host, port) = parse_authority(authority, url)?;
                (host, port, *routing_key, *index_name)
            }
            _ => {
                return Err(IndexError::Argument(format!(
                    "could not parse URL string: {}",
                    url
                )))
            }
        };

        if routing_key.is_empty() || index_name.is_empty() {
            return Err(IndexError::Argument(format!(
                "URL is missing a routing key or index name: {}",
                url
            )));
        }

        Ok(Self {
            host,
            port,
            routing_key: routing_key.to_string(),
            index_name: index_name.to_string(),
        })
    }
}

fn parse_authority(authority: &str, url: &str) -> Result<(String, u16), IndexError> {
    let parts: Vec<&str> = authority.split(':').collect();
    let (host, port) = match parts.as_slice() {
        [host] => (*host, DEFAULT_PORT),
        [host, port] => {
            let port = port.parse::<u16>().map_err(|_| {
                IndexError::Argument(format!("could not parse port from URL string: {}", url))
            })?;
            (*host, port)
        }
        _ => {
            return Err(IndexError::Argument(format!(
                "could not parse hostname and port from URL string: {}",
                url
            )))
        }
    };

    if host.is_empty() {
        return Err(IndexError::Argument(format!(
            "URL has an empty hostname: {}",
            url
        )));
    }
    Ok((host.to_string(), port))
}

impl FromStr for Endpoint {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}:{}/{}/{}",
            SCHEME, self.host, self.port, self.routing_key, self.index_name
        )
    }
}
