//! The ledger transaction coordinator.
//!
//! Turns one inbound message into at most one committed balance delta. Every
//! call runs as a single all-or-nothing unit of work: provisioning, parsing,
//! validation and the balance update either all take effect or none do.

use std::sync::Arc;
use tracing::{info, warn};

use crate::storage::DbConnection;
use super::currency::Currency;
use super::errors::LedgerError;
use super::parser::{parse_message, ParseMode, ParseOutcome, RejectReason};
use super::registration_service::RegistrationService;
use super::validation::validate_amount;
use shared::ChatAccount;

/// Result of one processed message.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// A validated delta was committed; `new_balance` is the group balance
    /// after it.
    Applied { new_balance: f64 },
    /// The message carried no applicable transaction; nothing was written to
    /// the group balance.
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Ordinary chatter without a transaction pattern
    NoMatch,
    /// Screened out for safety before matching
    Unsafe(RejectReason),
}

/// Service applying signed monetary deltas to per-group balances.
#[derive(Clone)]
pub struct LedgerService {
    db: Arc<DbConnection>,
}

impl LedgerService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    /// Process one inbound message against a group's balance.
    ///
    /// Steps: begin a unit of work, provision the user, parse, normalize and
    /// validate the scaled amount, fetch-or-create the chat account, apply the
    /// delta in place, commit. Any failure aborts the unit of work and leaves
    /// the stored balance exactly as it was.
    pub async fn process_message(
        &self,
        user_id: i64,
        group_id: i64,
        text: &str,
        mode: ParseMode,
    ) -> Result<ProcessOutcome, LedgerError> {
        let mut tx = self.db.begin().await?;

        if let Err(err) = RegistrationService::ensure_user_in(&mut *tx, user_id).await {
            warn!("registration failed for user {}: {}", user_id, err);
            DbConnection::rollback(tx).await;
            return Err(err);
        }

        let (amount, currency_token) = match parse_message(text, mode) {
            ParseOutcome::Transaction { amount, currency_token } => (amount, currency_token),
            ParseOutcome::NoMatch => {
                // Not an error: the idempotent user provisioning stands, the
                // balance is untouched.
                tx.commit().await?;
                return Ok(ProcessOutcome::Ignored(IgnoreReason::NoMatch));
            }
            ParseOutcome::Rejected(reason) => {
                tx.commit().await?;
                return Ok(ProcessOutcome::Ignored(IgnoreReason::Unsafe(reason)));
            }
        };

        let currency = match Currency::from_token(&currency_token) {
            Ok(currency) => currency,
            Err(err) => {
                DbConnection::rollback(tx).await;
                return Err(err);
            }
        };

        // Scaling happens before bounds checking: dollar/euro messages are
        // bounded on the scaled value.
        let scaled_amount = amount * currency.scale();
        if let Err(err) = validate_amount(scaled_amount) {
            DbConnection::rollback(tx).await;
            return Err(err);
        }

        if let Err(err) = RegistrationService::ensure_chat_in(&mut *tx, group_id, user_id).await {
            DbConnection::rollback(tx).await;
            return Err(err);
        }

        let new_balance = match DbConnection::add_to_balance(&mut *tx, group_id, scaled_amount).await
        {
            Ok(balance) => balance,
            Err(err) => {
                DbConnection::rollback(tx).await;
                return Err(err.into());
            }
        };

        tx.commit().await?;

        info!(
            "applied {} to group {} for user {}, new balance {}",
            scaled_amount, group_id, user_id, new_balance
        );
        Ok(ProcessOutcome::Applied { new_balance })
    }

    /// Current balance of a group; `ChatNotFound` for unregistered groups.
    pub async fn get_chat_balance(&self, group_id: i64) -> Result<f64, LedgerError> {
        match self.db.get_chat_account(group_id).await? {
            Some(chat) => Ok(chat.balance),
            None => Err(LedgerError::ChatNotFound(group_id)),
        }
    }

    /// Chat accounts a user belongs to, in insertion order.
    pub async fn list_user_chats(&self, user_id: i64) -> Result<Vec<ChatAccount>, LedgerError> {
        Ok(self.db.list_chats_for_user(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test() -> LedgerService {
        let db = Arc::new(DbConnection::init_test().await.expect("Failed to create test database"));
        LedgerService::new(db)
    }

    async fn apply(service: &LedgerService, text: &str) -> Result<ProcessOutcome, LedgerError> {
        service.process_message(100, 42, text, ParseMode::ChatMessage).await
    }

    #[tokio::test]
    async fn test_end_to_end_balance_flow() {
        let service = setup_test().await;

        let outcome = apply(&service, "+100руб").await.expect("Failed to apply");
        assert_eq!(outcome, ProcessOutcome::Applied { new_balance: 100.0 });

        let outcome = apply(&service, "-30руб").await.expect("Failed to apply");
        assert_eq!(outcome, ProcessOutcome::Applied { new_balance: 70.0 });

        // 5000 × 100 = 500000 is far beyond the limit; the balance must not move
        let result = apply(&service, "+5000$").await;
        assert!(matches!(result, Err(LedgerError::AmountOutOfRange { .. })));

        assert_eq!(service.get_chat_balance(42).await.expect("Failed to get balance"), 70.0);
    }

    #[tokio::test]
    async fn test_dollar_and_euro_deltas_are_scaled() {
        let service = setup_test().await;

        let outcome = apply(&service, "+10$").await.expect("Failed to apply");
        assert_eq!(outcome, ProcessOutcome::Applied { new_balance: 1000.0 });

        let outcome = apply(&service, "+10€").await.expect("Failed to apply");
        assert_eq!(outcome, ProcessOutcome::Applied { new_balance: 2000.0 });

        let outcome = apply(&service, "+10руб").await.expect("Failed to apply");
        assert_eq!(outcome, ProcessOutcome::Applied { new_balance: 2010.0 });
    }

    #[tokio::test]
    async fn test_dollar_amount_is_bounded_after_scaling() {
        let service = setup_test().await;

        // Raw 150 is within ±10000, scaled 15000 is not; the bound applies to
        // the scaled value.
        let result = apply(&service, "+150$").await;
        assert!(matches!(result, Err(LedgerError::AmountOutOfRange { .. })));

        // Exactly 100 dollars scales to exactly the limit and is accepted.
        let outcome = apply(&service, "+100$").await.expect("Failed to apply");
        assert_eq!(outcome, ProcessOutcome::Applied { new_balance: 10_000.0 });
    }

    #[tokio::test]
    async fn test_boundary_amounts() {
        let service = setup_test().await;

        let outcome = apply(&service, "+10000руб").await.expect("Failed to apply");
        assert_eq!(outcome, ProcessOutcome::Applied { new_balance: 10_000.0 });

        let outcome = apply(&service, "-10000руб").await.expect("Failed to apply");
        assert_eq!(outcome, ProcessOutcome::Applied { new_balance: 0.0 });

        let result = apply(&service, "+10000.01руб").await;
        assert!(matches!(result, Err(LedgerError::AmountOutOfRange { .. })));
    }

    #[tokio::test]
    async fn test_chatter_is_silently_ignored() {
        let service = setup_test().await;

        let outcome = apply(&service, "привет, как дела?").await.expect("Failed to process");
        assert_eq!(outcome, ProcessOutcome::Ignored(IgnoreReason::NoMatch));

        // No chat account was provisioned for a non-transaction message
        let result = service.get_chat_balance(42).await;
        assert!(matches!(result, Err(LedgerError::ChatNotFound(42))));
    }

    #[tokio::test]
    async fn test_unsafe_inputs_mutate_nothing() {
        let service = setup_test().await;

        apply(&service, "+100руб").await.expect("Failed to apply");

        for text in [
            "0+0",
            "+0",
            "check http://example.com",
            "'; DROP TABLE chats; --",
        ] {
            let outcome = apply(&service, text).await.expect("Failed to process");
            assert!(matches!(outcome, ProcessOutcome::Ignored(IgnoreReason::Unsafe(_))), "{text}");
        }

        assert_eq!(service.get_chat_balance(42).await.expect("Failed to get balance"), 100.0);
    }

    #[tokio::test]
    async fn test_invalid_currency_is_rejected_without_writes() {
        let service = setup_test().await;

        let result = apply(&service, "+50биткоин").await;
        assert!(matches!(result, Err(LedgerError::InvalidCurrency(_))));

        let result = service.get_chat_balance(42).await;
        assert!(matches!(result, Err(LedgerError::ChatNotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_currency_in_inline_query() {
        let service = setup_test().await;

        let result = service.process_message(100, 42, "+50", ParseMode::InlineQuery).await;
        assert!(matches!(result, Err(LedgerError::MissingCurrency)));
    }

    #[tokio::test]
    async fn test_inline_query_defaults_to_positive_sign() {
        let service = setup_test().await;

        let outcome = service
            .process_message(100, 42, "50руб", ParseMode::InlineQuery)
            .await
            .expect("Failed to process");
        assert_eq!(outcome, ProcessOutcome::Applied { new_balance: 50.0 });
    }

    #[tokio::test]
    async fn test_first_transaction_provisions_user_and_chat() {
        let service = setup_test().await;

        apply(&service, "+50руб").await.expect("Failed to apply");

        let chats = service.list_user_chats(100).await.expect("Failed to list chats");
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].group_id, 42);
        assert_eq!(chats[0].balance, 50.0);
    }

    #[tokio::test]
    async fn test_list_user_chats_insertion_order() {
        let service = setup_test().await;

        service
            .process_message(100, 7, "+10руб", ParseMode::ChatMessage)
            .await
            .expect("Failed to apply");
        service
            .process_message(100, 3, "+20руб", ParseMode::ChatMessage)
            .await
            .expect("Failed to apply");

        let chats = service.list_user_chats(100).await.expect("Failed to list chats");
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].group_id, 7);
        assert_eq!(chats[1].group_id, 3);
    }

    #[tokio::test]
    async fn test_groups_are_independent() {
        let service = setup_test().await;

        service
            .process_message(100, 1, "+10руб", ParseMode::ChatMessage)
            .await
            .expect("Failed to apply");
        service
            .process_message(200, 2, "+20руб", ParseMode::ChatMessage)
            .await
            .expect("Failed to apply");

        assert_eq!(service.get_chat_balance(1).await.expect("Failed to get balance"), 10.0);
        assert_eq!(service.get_chat_balance(2).await.expect("Failed to get balance"), 20.0);
    }

    #[tokio::test]
    async fn test_concurrent_transactions_do_not_lose_updates() {
        let service = setup_test().await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.process_message(100, 42, "+10руб", ParseMode::ChatMessage).await
            }));
        }
        for handle in handles {
            handle
                .await
                .expect("Task panicked")
                .expect("Transaction failed");
        }

        assert_eq!(
            service.get_chat_balance(42).await.expect("Failed to get balance"),
            100.0
        );
    }

    #[tokio::test]
    async fn test_get_balance_for_unknown_group() {
        let service = setup_test().await;

        let result = service.get_chat_balance(999).await;
        assert!(matches!(result, Err(LedgerError::ChatNotFound(999))));
    }
}
