//! Channel addresses: one data point on an edge, written `component/channel`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelAddress {
    component_id: String,
    channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid channel address [{0}], expected 'component/channel'")]
pub struct InvalidChannelAddress(pub String);

impl ChannelAddress {
    pub fn new(component_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            channel_id: channel_id.into(),
        }
    }

    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }
}

impl fmt::Display for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.component_id, self.channel_id)
    }
}

impl FromStr for ChannelAddress {
    type Err = InvalidChannelAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((component, channel))
                if !component.is_empty() && !channel.is_empty() && !channel.contains('/') =>
            {
                Ok(Self::new(component, channel))
            }
            _ => Err(InvalidChannelAddress(s.to_string())),
        }
    }
}

impl TryFrom<String> for ChannelAddress {
    type Error = InvalidChannelAddress;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChannelAddress> for String {
    fn from(address: ChannelAddress) -> Self {
        address.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let address: ChannelAddress = "ess0/Soc".parse().unwrap();
        assert_eq!(address.component_id(), "ess0");
        assert_eq!(address.channel_id(), "Soc");
        assert_eq!(address.to_string(), "ess0/Soc");
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["ess0", "/Soc", "ess0/", "a/b/c", ""] {
            assert!(bad.parse::<ChannelAddress>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_serde_as_string() {
        let address: ChannelAddress = serde_json::from_str(r#""meter0/ActivePower""#).unwrap();
        assert_eq!(address, ChannelAddress::new("meter0", "ActivePower"));
        assert_eq!(serde_json::to_string(&address).unwrap(), r#""meter0/ActivePower""#);
        assert!(serde_json::from_str::<ChannelAddress>(r#""nope""#).is_err());
    }
}
