//! `local:remote` port mapping entries carried by expose requests.

use std::fmt;
use std::str::FromStr;

/// Error parsing a port map entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortMapError {
    /// The entry is not of the form `local:remote`.
    #[error("invalid port map entry '{entry}': expected 'local:remote'")]
    Malformed {
        /// Offending entry.
        entry: String,
    },

    /// One side is not a port number in 1..=65535.
    #[error("invalid port map entry '{entry}': '{port}' is not a valid port")]
    InvalidPort {
        /// Offending entry.
        entry: String,
        /// The side that failed to parse.
        port: String,
    },
}

/// A requested mapping from a local port to a remote service port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortMapping {
    /// Port bound on the local side.
    pub local: u16,
    /// Port on the remote service.
    pub remote: u16,
}

impl FromStr for PortMapping {
    type Err = PortMapError;

    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let (local, remote) = entry.split_once(':').ok_or_else(|| PortMapError::Malformed {
            entry: entry.to_string(),
        })?;

        let parse = |side: &str| -> Result<u16, PortMapError> {
            match side.trim().parse::<u16>() {
                Ok(port) if port != 0 => Ok(port),
                _ => Err(PortMapError::InvalidPort {
                    entry: entry.to_string(),
                    port: side.trim().to_string(),
                }),
            }
        };

        Ok(Self {
            local: parse(local)?,
            remote: parse(remote)?,
        })
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.local, self.remote)
    }
}

/// Parse every entry, failing on the first malformed one.
pub fn parse_port_map<S: AsRef<str>>(entries: &[S]) -> Result<Vec<PortMapping>, PortMapError> {
    entries.iter().map(|e| e.as_ref().parse()).collect()
}
