pub mod capture;
pub mod decoder;
pub mod error;
pub mod session;
pub mod tap;

pub use crate::error::{DecodeError, Result};
pub use crate::session::{decode, DecodeConfig, DecodeSummary, StartMode};
