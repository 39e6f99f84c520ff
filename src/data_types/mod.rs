pub mod axis;
pub mod metadata;
pub mod series;
pub mod state;

pub use axis::*;
pub use metadata::*;
pub use series::*;
pub use state::*;
