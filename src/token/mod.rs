//! Token registry and unit conversion

pub mod registry;
pub mod units;

pub use registry::{
    decimals, is_rate_limited, lookup, supported_symbols, token_info, Chain, Token, TokenInfo,
};
pub use units::{from_base_units, to_base_units, to_base_units_u64};
