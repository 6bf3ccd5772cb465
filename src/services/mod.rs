pub mod ledger_reconciler;
pub mod notifier;
