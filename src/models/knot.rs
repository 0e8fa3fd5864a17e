//! Knot identity model.
//!
//! A knot identity is an ordered multiset of prime factors. Upstream tools
//! do not guarantee factor order for composites, so the components are held
//! sorted at all times; two equal factor multisets always compare equal and
//! hash identically, which makes `KnotIdentity` usable as the frequency
//! table key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One irreducible knot factor.
///
/// Knots with at most 10 crossings are named by their index in the standard
/// tables (`3_1`); knots above 10 crossings follow the catalogue naming
/// convention with an alternating flag (`K11n169`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimeComponent {
    Tabulated {
        crossings: u32,
        index: u32,
    },
    Cataloged {
        crossings: u32,
        alternating: bool,
        index: u32,
    },
}

impl PrimeComponent {
    pub fn crossings(&self) -> u32 {
        match self {
            Self::Tabulated { crossings, .. } | Self::Cataloged { crossings, .. } => *crossings,
        }
    }

    pub fn index(&self) -> u32 {
        match self {
            Self::Tabulated { index, .. } | Self::Cataloged { index, .. } => *index,
        }
    }

    /// Total order: crossing number, then naming shape (`a` sorts before
    /// `n`), then table index.
    fn order_key(&self) -> (u32, u8, u32) {
        match self {
            Self::Tabulated { crossings, index } => (*crossings, 0, *index),
            Self::Cataloged {
                crossings,
                alternating,
                index,
            } => (*crossings, if *alternating { 1 } else { 2 }, *index),
        }
    }

    /// Render this component in its canonical string form.
    pub fn encode(&self) -> String {
        match self {
            Self::Tabulated { crossings, index } => format!("{crossings}_{index}"),
            Self::Cataloged {
                crossings,
                alternating,
                index,
            } => format!(
                "K{crossings}{}{index}",
                if *alternating { 'a' } else { 'n' }
            ),
        }
    }

    /// Parse one component token. Returns `None` for anything malformed.
    pub fn decode(token: &str) -> Option<Self> {
        if let Some(rest) = token.strip_prefix('K') {
            let (alternating, (crossings, index)) = if let Some(parts) = rest.split_once('a') {
                (true, parts)
            } else if let Some(parts) = rest.split_once('n') {
                (false, parts)
            } else {
                return None;
            };
            Some(Self::Cataloged {
                crossings: crossings.parse().ok()?,
                alternating,
                index: index.parse().ok()?,
            })
        } else {
            let (crossings, index) = token.split_once('_')?;
            Some(Self::Tabulated {
                crossings: crossings.parse().ok()?,
                index: index.parse().ok()?,
            })
        }
    }
}

impl Ord for PrimeComponent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

impl PartialOrd for PrimeComponent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PrimeComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Canonical identity of a (possibly composite) knot.
///
/// One component is a prime knot, two or more a connect-sum. The primary
/// classifier reports the unknot as an empty factor list; construction
/// normalizes that to the tabulated unknot component `0_1`, so no empty
/// identity exists after `new`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KnotIdentity {
    components: Vec<PrimeComponent>,
}

/// Separator between components of a composite identity.
pub const COMPOSITE_SEPARATOR: &str = " # ";

impl KnotIdentity {
    pub fn new(mut components: Vec<PrimeComponent>) -> Self {
        if components.is_empty() {
            return Self::unknot();
        }
        components.sort();
        Self { components }
    }

    pub fn unknot() -> Self {
        Self {
            components: vec![PrimeComponent::Tabulated {
                crossings: 0,
                index: 1,
            }],
        }
    }

    pub fn components(&self) -> &[PrimeComponent] {
        &self.components
    }

    pub fn factor_count(&self) -> usize {
        self.components.len()
    }

    pub fn is_composite(&self) -> bool {
        self.components.len() >= 2
    }

    /// The single prime component, if this identity is prime.
    pub fn as_prime(&self) -> Option<&PrimeComponent> {
        match self.components.as_slice() {
            [single] => Some(single),
            _ => None,
        }
    }

    /// Render the canonical string form, components joined by `" # "`.
    pub fn encode(&self) -> String {
        self.components
            .iter()
            .map(PrimeComponent::encode)
            .collect::<Vec<_>>()
            .join(COMPOSITE_SEPARATOR)
    }

    /// Parse an encoded identity. Returns `None` if any token is malformed.
    pub fn decode(encoded: &str) -> Option<Self> {
        let components: Option<Vec<_>> = encoded
            .split(COMPOSITE_SEPARATOR)
            .map(PrimeComponent::decode)
            .collect();
        Some(Self::new(components?))
    }
}

impl fmt::Display for KnotIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Tentative identities returned by the fallback classifier when ambiguity
/// prevents a single resolution. Not an identity; carried only into the
/// unclassifiable log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSet {
    pub candidates: Vec<String>,
}

impl CandidateSet {
    pub fn new(candidates: Vec<String>) -> Self {
        Self { candidates }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Classification tag attached to a logged sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordTag {
    /// Fewer edges than the best known stick number: a new record
    Best,
    /// Matches the best known stick number
    Equiv,
    /// More edges than the best known stick number
    Worse,
    /// Resolved composite knot
    Nonprime,
    /// Could not be classified
    Uncl,
}

impl fmt::Display for RecordTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Best => "BEST",
            Self::Equiv => "EQUIV",
            Self::Worse => "WORSE",
            Self::Nonprime => "NONPRIME",
            Self::Uncl => "UNCL",
        };
        f.write_str(s)
    }
}

/// One logged observation of an interesting sample. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Sampler iteration that produced this polygon
    pub iteration: u64,

    /// Seed of the run that produced this polygon
    pub random_seed: u64,

    /// Classification tag
    pub is_best: RecordTag,

    /// Encoded knot identity, or the candidate list for `UNCL` records
    pub knot: String,

    /// Edge count of the polygon
    pub num_edges: u32,

    /// Confinement radius of the run
    pub confinement_radius: f64,

    /// Raw vertex sequence, whitespace/tab-delimited coordinate rows
    pub string_repr: String,
}

/// Key of the knot frequency table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FrequencyKey {
    Identity(KnotIdentity),
    Unclassifiable,
}

impl FrequencyKey {
    pub fn label(&self) -> String {
        match self {
            Self::Identity(identity) => identity.encode(),
            Self::Unclassifiable => "Unclassifiable".to_string(),
        }
    }
}

impl fmt::Display for FrequencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tabulated(crossings: u32, index: u32) -> PrimeComponent {
        PrimeComponent::Tabulated { crossings, index }
    }

    #[test]
    fn encodes_low_crossing_components() {
        assert_eq!(tabulated(3, 1).encode(), "3_1");
        assert_eq!(tabulated(10, 139).encode(), "10_139");
    }

    #[test]
    fn encodes_high_crossing_components() {
        let knot = PrimeComponent::Cataloged {
            crossings: 11,
            alternating: false,
            index: 169,
        };
        assert_eq!(knot.encode(), "K11n169");
    }

    #[test]
    fn round_trips_every_component_shape() {
        for encoded in ["0_1", "3_1", "9_42", "10_165", "K11a367", "K13n1234"] {
            let component = PrimeComponent::decode(encoded).unwrap();
            assert_eq!(component.encode(), encoded);
        }
    }

    #[test]
    fn rejects_malformed_components() {
        for bad in ["", "3", "3_", "_1", "K11", "K11x3", "Kan", "3_one", "3_1_2"] {
            assert!(PrimeComponent::decode(bad).is_none(), "accepted {bad:?}");
        }
    }

    #[test]
    fn identity_round_trip() {
        for encoded in ["3_1", "3_1 # 3_1", "3_1 # 10_139 # K11n169"] {
            let identity = KnotIdentity::decode(encoded).unwrap();
            assert_eq!(identity.encode(), encoded);
        }
    }

    #[test]
    fn identity_rejects_malformed_tokens() {
        assert!(KnotIdentity::decode("").is_none());
        assert!(KnotIdentity::decode("3_1 # nope").is_none());
        assert!(KnotIdentity::decode("3_1 #").is_none());
    }

    #[test]
    fn components_sort_identically_regardless_of_input_order() {
        let forward = KnotIdentity::new(vec![tabulated(3, 1), tabulated(10, 139)]);
        let reversed = KnotIdentity::new(vec![tabulated(10, 139), tabulated(3, 1)]);
        assert_eq!(forward, reversed);
        assert_eq!(forward.encode(), "3_1 # 10_139");
    }

    #[test]
    fn ordering_is_crossings_then_shape_then_index() {
        let low = tabulated(10, 165);
        let alternating = PrimeComponent::Cataloged {
            crossings: 11,
            alternating: true,
            index: 1,
        };
        let nonalternating = PrimeComponent::Cataloged {
            crossings: 11,
            alternating: false,
            index: 1,
        };
        assert!(low < alternating);
        assert!(alternating < nonalternating);
    }

    #[test]
    fn empty_factor_list_normalizes_to_unknot() {
        let identity = KnotIdentity::new(Vec::new());
        assert_eq!(identity, KnotIdentity::unknot());
        assert_eq!(identity.encode(), "0_1");
        assert_eq!(KnotIdentity::decode("0_1"), Some(identity));
    }

    #[test]
    fn record_tags_serialize_uppercase() {
        assert_eq!(
            serde_json::to_string(&RecordTag::Nonprime).unwrap(),
            "\"NONPRIME\""
        );
        assert_eq!(RecordTag::Uncl.to_string(), "UNCL");
    }
}
