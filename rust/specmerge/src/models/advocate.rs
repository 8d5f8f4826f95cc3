use serde::{
    Deserialize,
    Serialize,
};

/// Numeric identifier of an identification algorithm (search engine or
/// de-novo tool) contributing candidate matches.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AdvocateId(pub u32);

impl AdvocateId {
    pub const XTANDEM: AdvocateId = AdvocateId(1);
    pub const OMSSA: AdvocateId = AdvocateId(2);
    pub const MSGF: AdvocateId = AdvocateId(3);
    pub const MASCOT: AdvocateId = AdvocateId(4);
    pub const COMET: AdvocateId = AdvocateId(5);
    pub const NOVOR: AdvocateId = AdvocateId(20);
    pub const PEPNOVO: AdvocateId = AdvocateId(21);
    pub const DIRECTAG: AdvocateId = AdvocateId(22);
}

impl std::fmt::Display for AdvocateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An identification engine as declared by a decoded result file.
///
/// Files declare the engines they carry results for; an assumption that
/// references an undeclared advocate is a structural error of the input
/// (the run aborts, see the pipeline module).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advocate {
    pub id: AdvocateId,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    /// True for de-novo tools that report tag assumptions.
    #[serde(default)]
    pub de_novo: bool,
}

impl Advocate {
    pub fn new(id: AdvocateId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            version: None,
            de_novo: false,
        }
    }

    pub fn de_novo(id: AdvocateId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            version: None,
            de_novo: true,
        }
    }
}
