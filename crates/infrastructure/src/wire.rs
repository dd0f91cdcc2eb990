//! DNS wire message building and parsing on top of `hickory-proto`.
//!
//! Mirrors the teacher's `forwarding::{MessageBuilder, ResponseParser}`
//! pair: queries are recursion-desired `Message`s with a random 16-bit ID,
//! responses are decoded into a small typed summary rather than exposing
//! `hickory_proto::op::Message` past this module.

use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType as HickoryRecordType};
use hickory_proto::serialize::binary::{BinDecodable, BinEncodable, BinEncoder};
use std::net::IpAddr;
use std::str::FromStr;

use surveyor_domain::errors::EngineError;
use surveyor_domain::record_type::RecordType;

fn to_hickory(rt: RecordType) -> HickoryRecordType {
    match rt {
        RecordType::A => HickoryRecordType::A,
        RecordType::Aaaa => HickoryRecordType::AAAA,
        RecordType::Cname => HickoryRecordType::CNAME,
        RecordType::Ptr => HickoryRecordType::PTR,
        RecordType::Ns => HickoryRecordType::NS,
        RecordType::Mx => HickoryRecordType::MX,
        RecordType::Txt => HickoryRecordType::TXT,
        RecordType::Soa => HickoryRecordType::SOA,
        RecordType::Spf => HickoryRecordType::TXT,
        RecordType::Srv => HickoryRecordType::SRV,
    }
}

/// Builds a recursion-desired query message and serializes it to wire bytes.
pub fn build_query(name: &str, record_type: RecordType) -> Result<Vec<u8>, EngineError> {
    let parsed = Name::from_str(name)
        .map_err(|e| EngineError::InvalidDomainName(format!("{name}: {e}")))?;

    let mut query = Query::new();
    query.set_name(parsed);
    query.set_query_type(to_hickory(record_type));
    query.set_query_class(DNSClass::IN);

    let mut message = Message::new(fastrand::u16(..), MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);

    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    message
        .emit(&mut encoder)
        .map_err(|e| EngineError::Io(format!("failed to serialize query: {e}")))?;
    Ok(buf)
}

/// A decoded response, reduced to what the resolver pool and scheduler need.
#[derive(Debug, Clone)]
pub struct DecodedResponse {
    pub rcode: ResponseCode,
    pub truncated: bool,
    pub addresses: Vec<IpAddr>,
    pub cnames: Vec<String>,
    pub names: Vec<String>,
    pub soa_min_ttl: Option<u32>,
}

impl DecodedResponse {
    pub fn is_nxdomain(&self) -> bool {
        self.rcode == ResponseCode::NXDomain
    }

    pub fn is_server_error(&self) -> bool {
        matches!(
            self.rcode,
            ResponseCode::ServFail | ResponseCode::Refused | ResponseCode::NotImp
        )
    }
}

pub fn parse_response(bytes: &[u8]) -> Result<DecodedResponse, EngineError> {
    let message = Message::from_bytes(bytes)
        .map_err(|e| EngineError::Io(format!("failed to parse DNS response: {e}")))?;

    let rcode = message.response_code();
    let truncated = message.truncated();
    let mut addresses = Vec::new();
    let mut cnames = Vec::new();
    let mut names = Vec::new();

    for record in message.answers() {
        record_into(record, &mut addresses, &mut cnames, &mut names);
    }

    let soa_min_ttl = message.name_servers().iter().find_map(|r| match r.data() {
        RData::SOA(soa) => Some(soa.minimum().min(r.ttl())),
        _ => None,
    });

    Ok(DecodedResponse {
        rcode,
        truncated,
        addresses,
        cnames,
        names,
        soa_min_ttl,
    })
}

fn record_into(
    record: &Record,
    addresses: &mut Vec<IpAddr>,
    cnames: &mut Vec<String>,
    names: &mut Vec<String>,
) {
    match record.data() {
        RData::A(a) => addresses.push(IpAddr::V4(a.0)),
        RData::AAAA(aaaa) => addresses.push(IpAddr::V6(aaaa.0)),
        RData::CNAME(name) => cnames.push(normalize_hickory_name(&name.0)),
        RData::NS(name) => names.push(normalize_hickory_name(&name.0)),
        RData::MX(mx) => names.push(normalize_hickory_name(mx.exchange())),
        RData::PTR(name) => names.push(normalize_hickory_name(&name.0)),
        RData::SRV(srv) => names.push(normalize_hickory_name(srv.target())),
        _ => {}
    }
}

fn normalize_hickory_name(name: &Name) -> String {
    name.to_utf8().trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_query_for_valid_name() {
        let bytes = build_query("example.com", RecordType::A).unwrap();
        assert!(!bytes.is_empty());
        let msg = Message::from_bytes(&bytes).unwrap();
        assert_eq!(msg.queries().len(), 1);
        assert!(msg.recursion_desired());
    }

    #[test]
    fn rejects_malformed_name() {
        assert!(build_query("..bad..", RecordType::A).is_err());
    }
}
