pub mod result_file;
pub mod sequence_index;

pub use result_file::{
    ResultFile,
    SerResultFile,
};
pub use sequence_index::{
    SequenceIndex,
    SerProteinEntry,
};
