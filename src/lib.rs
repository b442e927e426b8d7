// Library exports for bamprobe
pub mod error;
pub mod extract;
pub mod probe;
pub mod region;
pub mod report;
pub mod sam;
pub mod source;

pub use error::{ExtractError, Result};
pub use extract::{extract, SelectionCriteria};
pub use probe::{run, ProbeConfig};
pub use region::Region;
pub use report::{Report, Section};
pub use source::{AlignmentSource, BamSource, MemorySource};
