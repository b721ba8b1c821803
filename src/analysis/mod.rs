mod batch;
mod diversity;
mod error;
mod nucleotide;
mod records;
mod regions;
mod report;
mod types;

pub use batch::*;
pub use diversity::*;
pub use error::*;
pub use nucleotide::*;
pub use records::*;
pub use regions::*;
pub use report::*;
pub use types::*;
