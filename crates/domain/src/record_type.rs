use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigError;

/// DNS record types the resolver pool and scheduler are aware of (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Ptr,
    Ns,
    Mx,
    Txt,
    Soa,
    Spf,
    Srv,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Ptr => "PTR",
            RecordType::Ns => "NS",
            RecordType::Mx => "MX",
            RecordType::Txt => "TXT",
            RecordType::Soa => "SOA",
            RecordType::Spf => "SPF",
            RecordType::Srv => "SRV",
        }
    }

    /// Default probe order: CNAME first so it can short-circuit remaining
    /// type probes with an answer (§4.6 stage 4).
    pub fn default_order() -> &'static [RecordType] {
        &[
            RecordType::Cname,
            RecordType::A,
            RecordType::Aaaa,
            RecordType::Ns,
            RecordType::Mx,
            RecordType::Srv,
        ]
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "CNAME" => Ok(RecordType::Cname),
            "PTR" => Ok(RecordType::Ptr),
            "NS" => Ok(RecordType::Ns),
            "MX" => Ok(RecordType::Mx),
            "TXT" => Ok(RecordType::Txt),
            "SOA" => Ok(RecordType::Soa),
            "SPF" => Ok(RecordType::Spf),
            "SRV" => Ok(RecordType::Srv),
            other => Err(ConfigError::UnknownRecordType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for rt in [
            RecordType::A,
            RecordType::Aaaa,
            RecordType::Cname,
            RecordType::Srv,
        ] {
            let parsed: RecordType = rt.as_str().parse().unwrap();
            assert_eq!(parsed, rt);
        }
    }

    #[test]
    fn rejects_unknown_type() {
        assert!("WKS".parse::<RecordType>().is_err());
    }

    #[test]
    fn cname_leads_default_order() {
        assert_eq!(RecordType::default_order()[0], RecordType::Cname);
    }
}
