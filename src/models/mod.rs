pub mod analysis;
pub mod enums;
pub mod feedback;
pub mod filters;
pub mod finding;
pub mod medication;
pub mod patient;

pub use analysis::*;
pub use enums::*;
pub use feedback::*;
pub use filters::*;
pub use finding::*;
pub use medication::*;
pub use patient::*;
