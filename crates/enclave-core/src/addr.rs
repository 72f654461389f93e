//! Transport channel addresses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `(context-id, port)` pair naming one end of a transport channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelAddr {
    /// Context id of the endpoint (the VM the socket lives in).
    pub cid: u32,
    /// Port within that context.
    pub port: u32,
}

impl ChannelAddr {
    pub const fn new(cid: u32, port: u32) -> Self {
        Self { cid, port }
    }
}

impl fmt::Display for ChannelAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.cid, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(ChannelAddr::new(3, 9000).to_string(), "3:9000");
    }

    #[test]
    fn serde_shape() {
        let addr: ChannelAddr = serde_json::from_str(r#"{"cid":2,"port":8000}"#).unwrap();
        assert_eq!(addr, ChannelAddr::new(2, 8000));
    }
}
