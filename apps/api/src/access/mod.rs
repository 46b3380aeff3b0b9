// Access control and monetisation: the export gate, credit consumption,
// plans, the paywall flow and manual subscription approval.

pub mod export;
pub mod gate;
pub mod handlers;
pub mod paywall;
pub mod plans;
pub mod receipts;
pub mod subscriptions;
