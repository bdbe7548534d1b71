//! USDG transfer limits
//!
//! Two checks, always in this order:
//! 1. a single transfer must be strictly below 4.0 USDG
//! 2. the destination's balance after the transfer must not exceed 5.0 USDG
//!
//! The second check reads the destination's current on-chain balance and is
//! skipped entirely when the first one rejects. Approval is advisory: nothing
//! here submits or blocks a transaction, and the balance read is not atomic
//! with the transfer that follows it.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::token::{from_base_units, is_rate_limited, lookup, TokenInfo};
use crate::wallet::WalletOps;

/// Transfers of this size or more are refused outright
pub const SINGLE_TRANSFER_CAP: Decimal = Decimal::from_parts(4, 0, 0, false, 0);

/// Maximum balance a destination may reach
pub const TOTAL_BALANCE_CAP: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

pub const SINGLE_TRANSFER_MESSAGE: &str =
    "You are a thief. You cannot transfer 4.0 or more USDG at once.";
pub const TOTAL_BALANCE_MESSAGE: &str =
    "You are being greedy. You cannot have more than 5.0 USDG total.";

/// Why a USDG transfer was refused
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RejectionReason {
    /// Requested amount is at or above the single transfer cap
    SingleTransferLimitExceeded { requested: Decimal },

    /// Balance after the transfer would exceed the total cap
    TotalBalanceLimitExceeded {
        current: Decimal,
        requested: Decimal,
        projected: Decimal,
    },
}

impl RejectionReason {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::SingleTransferLimitExceeded { .. } => {
                "SINGLE_TRANSFER_LIMIT_EXCEEDED"
            }
            RejectionReason::TotalBalanceLimitExceeded { .. } => "TOTAL_BALANCE_LIMIT_EXCEEDED",
        }
    }

    /// User-facing message, to be shown verbatim
    pub fn message(&self) -> &'static str {
        match self {
            RejectionReason::SingleTransferLimitExceeded { .. } => SINGLE_TRANSFER_MESSAGE,
            RejectionReason::TotalBalanceLimitExceeded { .. } => TOTAL_BALANCE_MESSAGE,
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of a limit check. A rejection is a normal value, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TransferDecision {
    /// `projected_total` is `None` when the token is not limited
    Approved { projected_total: Option<Decimal> },
    Rejected(RejectionReason),
}

impl TransferDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, TransferDecision::Approved { .. })
    }

    pub fn rejection(&self) -> Option<&RejectionReason> {
        match self {
            TransferDecision::Rejected(reason) => Some(reason),
            TransferDecision::Approved { .. } => None,
        }
    }
}

fn ensure_non_negative(requested: Decimal) -> Result<()> {
    if requested.is_sign_negative() && !requested.is_zero() {
        return Err(Error::InvalidAmount(format!("{} is negative", requested)));
    }
    Ok(())
}

/// Per-transfer check alone
pub fn check_single_transfer(requested: Decimal) -> Option<RejectionReason> {
    (requested >= SINGLE_TRANSFER_CAP)
        .then_some(RejectionReason::SingleTransferLimitExceeded { requested })
}

/// Both checks against an already known balance, in human units
pub fn evaluate(
    info: &TokenInfo,
    requested: Decimal,
    current_balance: Decimal,
) -> Result<TransferDecision> {
    ensure_non_negative(requested)?;

    if !is_rate_limited(info.token) {
        return Ok(TransferDecision::Approved {
            projected_total: None,
        });
    }

    if let Some(reason) = check_single_transfer(requested) {
        return Ok(TransferDecision::Rejected(reason));
    }

    Ok(check_total(current_balance, requested))
}

fn check_total(current: Decimal, requested: Decimal) -> TransferDecision {
    let projected = current + requested;
    if projected > TOTAL_BALANCE_CAP {
        TransferDecision::Rejected(RejectionReason::TotalBalanceLimitExceeded {
            current,
            requested,
            projected,
        })
    } else {
        TransferDecision::Approved {
            projected_total: Some(projected),
        }
    }
}

/// Decide whether `requested` of `token` may be sent to `destination`
///
/// Reads the destination's balance through `wallet` only when the single
/// transfer check has passed. Tokens other than USDG are approved without
/// any network call.
pub async fn decide(
    wallet: &dyn WalletOps,
    destination: &str,
    token: &str,
    requested: Decimal,
) -> Result<TransferDecision> {
    ensure_non_negative(requested)?;
    let info = lookup(wallet.chain(), token)?;

    if !is_rate_limited(info.token) {
        return Ok(TransferDecision::Approved {
            projected_total: None,
        });
    }

    if let Some(reason) = check_single_transfer(requested) {
        warn!(
            "{} rejected for {} {} to {}",
            reason.code(),
            requested,
            info.symbol,
            destination
        );
        return Ok(TransferDecision::Rejected(reason));
    }

    let raw = wallet.get_balance(destination, info.symbol).await?;
    let current = from_base_units(info, raw)?;
    let decision = check_total(current, requested);

    match &decision {
        TransferDecision::Rejected(reason) => warn!(
            "{} rejected for {} {} to {} (holds {})",
            reason.code(),
            requested,
            info.symbol,
            destination,
            current
        ),
        TransferDecision::Approved { projected_total } => debug!(
            "Approved {} {} to {}, projected {:?}",
            requested, info.symbol, destination, projected_total
        ),
    }

    Ok(decision)
}
