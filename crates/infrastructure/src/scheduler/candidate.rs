use surveyor_application::ports::resolver::QueryOutcome;
use surveyor_domain::nodes::Source;
use surveyor_domain::record_type::RecordType;

/// One name moving through the pipeline (§4.6). Carries its provenance so
/// every later stage, including persistence, can attribute it without a
/// side lookup.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub source: Source,
    /// Set by the wildcard-probe stage when the owning domain is a `static`
    /// wildcard; the dispatch stage then drops answers matching the cached
    /// wildcard address set instead of persisting them (§4.6 stage 3/5).
    pub check_static_wildcard: bool,
}

impl Candidate {
    pub fn new(name: impl Into<String>, source: Source) -> Self {
        Self {
            name: name.into(),
            source,
            check_static_wildcard: false,
        }
    }
}

/// A resolved candidate ready for the persist/feedback stage.
pub struct Resolved {
    pub candidate: Candidate,
    pub outcomes: Vec<(RecordType, QueryOutcome)>,
}
