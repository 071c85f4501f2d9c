//! Invoice computation and persistence.
//!
//! [`compute_totals`] is pure and shared with the client wizard for live
//! previews; [`InvoiceLedger`] re-runs it against catalog prices before
//! anything is written.

mod ledger;
mod number;
mod totals;

pub use ledger::*;
pub use number::*;
pub use totals::*;
