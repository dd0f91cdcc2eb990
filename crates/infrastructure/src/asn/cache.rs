use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::IpAddr;
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::{info, warn};

use surveyor_application::ports::asn_cache::{AsnCache, AsnInfo};
use surveyor_domain::errors::EngineError;

struct Range {
    first: IpAddr,
    last: IpAddr,
    info: AsnInfo,
}

/// In-memory ASN/CIDR lookup table seeded from a gzipped `ip2asn`-format TSV
/// (`range_start\trange_end\tasn\tcountry\tdescription`), grounded on the
/// teacher's `SubnetMatcherService` cached-lookup shape. Ranges are sorted by
/// `first` so lookups are a binary search rather than a linear scan.
pub struct AsnCacheImpl {
    ranges: Vec<Range>,
}

impl AsnCacheImpl {
    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    pub fn load_from_gzip(path: &Path) -> Result<Self, EngineError> {
        let file = File::open(path).map_err(|e| EngineError::Io(e.to_string()))?;
        let reader = BufReader::new(GzDecoder::new(file));
        Self::load_from_reader(reader)
    }

    fn load_from_reader<R: BufRead>(reader: R) -> Result<Self, EngineError> {
        let mut ranges = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| EngineError::Io(e.to_string()))?;
            match parse_line(&line) {
                Some(range) => ranges.push(range),
                None => warn!(lineno, "skipping malformed ip2asn row"),
            }
        }
        ranges.sort_by(|a, b| ip_key(a.first).cmp(&ip_key(b.first)));
        info!(count = ranges.len(), "loaded ASN range table");
        Ok(Self { ranges })
    }
}

impl Default for AsnCacheImpl {
    fn default() -> Self {
        Self::empty()
    }
}

fn ip_key(addr: IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u32::from(v4) as u128,
        IpAddr::V6(v6) => u128::from(v6),
    }
}

fn parse_line(line: &str) -> Option<Range> {
    let mut fields = line.split('\t');
    let first: IpAddr = fields.next()?.trim().parse().ok()?;
    let last: IpAddr = fields.next()?.trim().parse().ok()?;
    let asn: u32 = fields.next()?.trim().parse().ok()?;
    let _country = fields.next()?;
    let description = fields.next().unwrap_or("").trim().to_string();
    if asn == 0 {
        return None;
    }
    Some(Range {
        first,
        last,
        info: AsnInfo {
            asn,
            cidr: format!("{first}/{}", prefix_guess(first, last)),
            description,
        },
    })
}

/// ip2asn ranges aren't always CIDR-aligned; this is a best-effort prefix
/// derived from the range width, good enough for the `heal_address_nodes`
/// containment edge it feeds.
fn prefix_guess(first: IpAddr, last: IpAddr) -> u8 {
    let width = ip_key(last).saturating_sub(ip_key(first)) + 1;
    let bits = match first {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    let host_bits = (128 - width.leading_zeros().min(128)) as u8;
    bits.saturating_sub(host_bits.min(bits))
}

impl AsnCache for AsnCacheImpl {
    fn lookup(&self, addr: IpAddr) -> Option<AsnInfo> {
        let key = ip_key(addr);
        let idx = self
            .ranges
            .partition_point(|r| ip_key(r.first) <= key)
            .checked_sub(1)?;
        let candidate = self.ranges.get(idx)?;
        if ip_key(candidate.first) <= key && key <= ip_key(candidate.last) {
            Some(candidate.info.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn table() -> AsnCacheImpl {
        let data = "1.0.0.0\t1.0.0.255\t13335\tUS\tCLOUDFLARENET\n\
                     8.8.8.0\t8.8.8.255\t15169\tUS\tGOOGLE\n";
        AsnCacheImpl::load_from_reader(Cursor::new(data)).unwrap()
    }

    #[test]
    fn finds_containing_range() {
        let cache = table();
        let info = cache.lookup("8.8.8.8".parse().unwrap()).unwrap();
        assert_eq!(info.asn, 15169);
        assert_eq!(info.description, "GOOGLE");
    }

    #[test]
    fn misses_outside_any_range() {
        let cache = table();
        assert!(cache.lookup("9.9.9.9".parse().unwrap()).is_none());
    }

    #[test]
    fn empty_cache_always_misses() {
        let cache = AsnCacheImpl::empty();
        assert!(cache.lookup("1.1.1.1".parse().unwrap()).is_none());
    }
}
