//! Static token table
//!
//! One plain record per (chain, token). Lookups are free functions over the
//! tables below; nothing here talks to the network.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Supported networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chain {
    /// Solana devnet
    Solana,
    /// EVM testnet (Sepolia)
    Evm,
}

impl Chain {
    pub const ALL: [Chain; 2] = [Chain::Solana, Chain::Evm];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Solana => "solana",
            Chain::Evm => "evm",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "solana" | "sol" => Ok(Chain::Solana),
            "evm" | "ethereum" | "eth" => Ok(Chain::Evm),
            other => Err(Error::Config(format!("Unknown chain: {}", other))),
        }
    }
}

/// Closed set of tokens, identical across chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Token {
    /// SOL on Solana, ETH on EVM
    Native,
    Usdc,
    Pyusd,
    /// The only token with transfer limits
    Usdg,
}

impl Token {
    pub fn is_native(&self) -> bool {
        matches!(self, Token::Native)
    }
}

/// Per-chain token metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub chain: Chain,
    pub token: Token,
    /// Display symbol ("SOL", "ETH", "USDC", ...)
    pub symbol: &'static str,
    /// Base-unit precision
    pub decimals: u32,
    /// Mint (Solana) or contract (EVM) address; `None` for native assets
    pub address: Option<&'static str>,
    /// Owning token program on Solana; `None` on EVM
    pub program: Option<&'static str>,
}

/// System program
pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";
/// Legacy SPL Token program
pub const SPL_TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
/// Token-2022 program
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";
/// Associated token account program
pub const ASSOCIATED_TOKEN_PROGRAM_ID: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";

// USDG and PYUSD live under Token-2022, USDC under the legacy program.
static SOLANA_TOKENS: [TokenInfo; 4] = [
    TokenInfo {
        chain: Chain::Solana,
        token: Token::Native,
        symbol: "SOL",
        decimals: 9,
        address: None,
        program: Some(SYSTEM_PROGRAM_ID),
    },
    TokenInfo {
        chain: Chain::Solana,
        token: Token::Usdc,
        symbol: "USDC",
        decimals: 6,
        address: Some("4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU"),
        program: Some(SPL_TOKEN_PROGRAM_ID),
    },
    TokenInfo {
        chain: Chain::Solana,
        token: Token::Pyusd,
        symbol: "PYUSD",
        decimals: 6,
        address: Some("CXk2AMBfi3TwaEL2468s6zP8xq9NxTXjp9gjMgzeUynM"),
        program: Some(TOKEN_2022_PROGRAM_ID),
    },
    TokenInfo {
        chain: Chain::Solana,
        token: Token::Usdg,
        symbol: "USDG",
        decimals: 6,
        address: Some("4F6PM96JJxngmHnZLBh9n58RH4aTVNWvDs2nuwrT5BP7"),
        program: Some(TOKEN_2022_PROGRAM_ID),
    },
];

static EVM_TOKENS: [TokenInfo; 4] = [
    TokenInfo {
        chain: Chain::Evm,
        token: Token::Native,
        symbol: "ETH",
        decimals: 18,
        address: None,
        program: None,
    },
    TokenInfo {
        chain: Chain::Evm,
        token: Token::Usdc,
        symbol: "USDC",
        decimals: 6,
        address: Some("0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"),
        program: None,
    },
    TokenInfo {
        chain: Chain::Evm,
        token: Token::Pyusd,
        symbol: "PYUSD",
        decimals: 6,
        address: Some("0xCaC524BcA292aaade2DF8A05cC58F0a65B1B3bB9"),
        program: None,
    },
    TokenInfo {
        chain: Chain::Evm,
        token: Token::Usdg,
        symbol: "USDG",
        decimals: 6,
        address: Some("0xfBb2A78CceEb415b00300925e464C3E44E6e06b0"),
        program: None,
    },
];

fn table(chain: Chain) -> &'static [TokenInfo] {
    match chain {
        Chain::Solana => &SOLANA_TOKENS,
        Chain::Evm => &EVM_TOKENS,
    }
}

/// Look up a token by symbol (case-insensitive)
pub fn lookup(chain: Chain, symbol: &str) -> Result<&'static TokenInfo> {
    let wanted = symbol.trim();
    table(chain)
        .iter()
        .find(|info| info.symbol.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| {
            Error::UnknownToken(format!(
                "{} on {}. Supported types are {}",
                wanted,
                chain,
                supported_symbols(chain).join(", ")
            ))
        })
}

/// Metadata for a known token
pub fn token_info(chain: Chain, token: Token) -> &'static TokenInfo {
    // Tables are ordered by Token variant
    let index = match token {
        Token::Native => 0,
        Token::Usdc => 1,
        Token::Pyusd => 2,
        Token::Usdg => 3,
    };
    &table(chain)[index]
}

/// Decimal precision for a token by symbol
pub fn decimals(chain: Chain, symbol: &str) -> Result<u32> {
    lookup(chain, symbol).map(|info| info.decimals)
}

/// All symbols supported on a chain
pub fn supported_symbols(chain: Chain) -> Vec<&'static str> {
    table(chain).iter().map(|info| info.symbol).collect()
}

/// Whether transfers of this token go through the USDG limiter
pub fn is_rate_limited(token: Token) -> bool {
    token == Token::Usdg
}
