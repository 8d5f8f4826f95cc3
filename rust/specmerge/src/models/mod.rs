pub mod advocate;
pub mod assumption;
pub mod modification;
pub mod spectrum_match;

pub use advocate::{
    Advocate,
    AdvocateId,
};
pub use assumption::{
    ModificationMatch,
    PeptideAssumption,
    ProteinHit,
    TagAssumption,
    UNKNOWN_MODIFICATION,
};
pub use modification::{
    ModificationCatalog,
    ModificationEntry,
    SiteSpecificity,
};
pub use spectrum_match::{
    SpectrumKey,
    SpectrumMatch,
};
