use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use uuid::Uuid;

use crate::names;

/// Opaque node identifier (§9 "store nodes in an arena keyed by identifier").
pub type NodeId = u64;

/// A lowercased DNS name (§3 FQDN).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fqdn {
    pub name: String,
    pub tld: String,
    pub registered_domain: String,
}

impl Fqdn {
    pub fn new(raw: &str) -> Self {
        let name = names::normalize(raw);
        let tld = names::tld(&name);
        let registered_domain = names::registered_domain(&name);
        Self {
            name,
            tld,
            registered_domain,
        }
    }
}

/// An IPv4 or IPv6 address (§3 Address).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub value: IpAddr,
}

impl Address {
    pub fn new(value: IpAddr) -> Self {
        Self { value }
    }

    pub fn is_ipv4(&self) -> bool {
        self.value.is_ipv4()
    }
}

/// A CIDR block (§3 Netblock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Netblock {
    pub cidr: IpNetwork,
}

impl Netblock {
    pub fn new(cidr: IpNetwork) -> Self {
        Self { cidr }
    }

    pub fn contains(&self, addr: &Address) -> bool {
        self.cidr.contains(addr.value)
    }

    pub fn prefix_len(&self) -> u8 {
        self.cidr.prefix()
    }
}

/// An autonomous system (§3 AutonomousSystem).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutonomousSystem {
    pub asn: u32,
    pub description: String,
}

/// A data-source identity and its provenance tag (§3 Source).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    Api,
    Scrape,
    Cert,
    Dns,
    Axfr,
    Crawl,
    Archive,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Api => "api",
            SourceTag::Scrape => "scrape",
            SourceTag::Cert => "cert",
            SourceTag::Dns => "dns",
            SourceTag::Axfr => "axfr",
            SourceTag::Crawl => "crawl",
            SourceTag::Archive => "archive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub tag: SourceTag,
}

/// The default set of tags considered authoritative for provenance (§4.8
/// tag selection, §GLOSSARY "Trusted tag").
pub fn default_trusted_tags() -> &'static [SourceTag] {
    &[SourceTag::Dns, SourceTag::Axfr, SourceTag::Cert]
}

/// A discovery run (§3 Event).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub uuid: Uuid,
    pub start: DateTime<Utc>,
    pub finish: DateTime<Utc>,
    pub scope: EventScope,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventScope {
    pub domains: Vec<String>,
    pub asns: Vec<u32>,
    pub cidrs: Vec<String>,
    pub ports: Vec<u16>,
    pub blacklist: Vec<String>,
}

impl Event {
    pub fn new(uuid: Uuid, scope: EventScope) -> Self {
        let now = Utc::now();
        Self {
            uuid,
            start: now,
            finish: now,
            scope,
        }
    }
}

/// Edge predicates from §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Predicate {
    ARecord,
    AaaaRecord,
    CnameRecord,
    PtrRecord,
    MxRecord,
    NsRecord,
    SrvRecord,
    Service,
    Contains,
    Prefix,
    Root,
    Tld,
    Used,
    Domain,
    /// Source-name predicate (Event→Node); carries the source's own name so
    /// multiple sources can each attach their own attribution edge.
    Source(String),
}

impl Predicate {
    pub fn as_str(&self) -> &str {
        match self {
            Predicate::ARecord => "a_record",
            Predicate::AaaaRecord => "aaaa_record",
            Predicate::CnameRecord => "cname_record",
            Predicate::PtrRecord => "ptr_record",
            Predicate::MxRecord => "mx_record",
            Predicate::NsRecord => "ns_record",
            Predicate::SrvRecord => "srv_record",
            Predicate::Service => "service",
            Predicate::Contains => "contains",
            Predicate::Prefix => "prefix",
            Predicate::Root => "root",
            Predicate::Tld => "tld",
            Predicate::Used => "used",
            Predicate::Domain => "domain",
            Predicate::Source(name) => name,
        }
    }
}

/// A single reported address within a `Finding` (§4.8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingAddress {
    pub ip: IpAddr,
    pub asn: Option<u32>,
    pub cidr: Option<String>,
    pub desc: Option<String>,
}

/// A confirmed (name, address set, source set, tag) tuple exposed to
/// consumers (§4.8, §GLOSSARY "Finding").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub name: String,
    pub registered_domain: String,
    pub addresses: Vec<FindingAddress>,
    pub sources: Vec<String>,
    pub tag: SourceTag,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fqdn_derives_tld_and_registered_domain() {
        let f = Fqdn::new("Foo.Example.COM.");
        assert_eq!(f.name, "foo.example.com");
        assert_eq!(f.tld, "com");
        assert_eq!(f.registered_domain, "example.com");
    }

    #[test]
    fn netblock_contains_address() {
        let nb = Netblock::new("10.0.0.0/24".parse().unwrap());
        assert!(nb.contains(&Address::new("10.0.0.5".parse().unwrap())));
        assert!(!nb.contains(&Address::new("10.0.1.5".parse().unwrap())));
    }
}
