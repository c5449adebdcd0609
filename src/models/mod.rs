pub mod quote;
pub mod portfolio;
pub mod market;
pub mod response;

pub use quote::*;
pub use portfolio::*;
pub use market::*;
pub use response::*;
