pub mod capture;
pub mod ledger;
pub mod present;
pub mod protocol;
pub mod rules;
pub mod session;
pub mod snapshot;
pub mod specificity;
