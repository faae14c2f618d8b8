//! Data models for the exam preparation content hub.
//!
//! Wire names match the frontend contract exactly (camelCase) for seamless
//! interoperability.

mod daily;
mod material;
mod paper;
mod subject;
mod user;

pub use daily::*;
pub use material::*;
pub use paper::*;
pub use subject::*;
pub use user::*;
