//! Transfer policy
//!
//! Only USDG is limited; see [`usdg_limit`].

pub mod usdg_limit;

pub use usdg_limit::{decide, evaluate, RejectionReason, TransferDecision};
