pub mod ledger;
pub mod rules;

pub use ledger::{AdCredit, AdWatch, CreditOutcome, LedgerStats, LedgerUser};
pub use rules::EarnRules;
