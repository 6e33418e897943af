use super::retry::RetryPolicy;
use crate::domain::account::{Account, AccountId, Amount, Balance};
use crate::domain::operation::{OperationKind, OperationRequest};
use crate::domain::ports::{LedgerStoreBox, WriteOutcome};
use crate::domain::validator::validate;
use crate::error::{Result, WalletError};
use tokio::time::Instant;
use tracing::{debug, warn};

/// The only write path to wallet balances.
///
/// Each operation re-reads the authoritative balance together with its
/// version, validates against that fresh value, and writes conditionally on
/// the version being unchanged. A lost race restarts the whole sequence after
/// a backoff, so two operations never both commit a balance computed from the
/// same prior value.
///
/// `BalanceGuard` holds no per-wallet state and is meant to be shared behind
/// an `Arc` by every task submitting operations.
pub struct BalanceGuard {
    store: LedgerStoreBox,
    policy: RetryPolicy,
}

impl BalanceGuard {
    pub fn new(store: LedgerStoreBox, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Applies a decoded gateway request.
    pub async fn apply(&self, request: OperationRequest) -> Result<Balance> {
        self.apply_operation(request.wallet_id, request.operation_type, request.amount)
            .await
    }

    /// Applies `kind`/`amount` to the wallet and returns the committed balance.
    ///
    /// The retry budget is bounded by the policy's attempt count and, when
    /// configured, its deadline.
    pub async fn apply_operation(
        &self,
        account_id: AccountId,
        kind: OperationKind,
        amount: Amount,
    ) -> Result<Balance> {
        let deadline = self.policy.deadline.map(|limit| Instant::now() + limit);
        self.apply_operation_until(account_id, kind, amount, deadline)
            .await
    }

    /// Like [`Self::apply_operation`], with an explicit deadline for retrying.
    ///
    /// The deadline is checked between attempts only: a write already sent to
    /// the store is never abandoned half-way.
    pub async fn apply_operation_until(
        &self,
        account_id: AccountId,
        kind: OperationKind,
        amount: Amount,
        deadline: Option<Instant>,
    ) -> Result<Balance> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let locked = self
                .store
                .locked_read(account_id)
                .await?
                .ok_or(WalletError::AccountNotFound(account_id))?;

            let new_balance = validate(account_id, locked.balance, kind, amount)?;

            match self
                .store
                .conditional_write(account_id, locked.token, new_balance)
                .await?
            {
                WriteOutcome::Committed => {
                    debug!(
                        %account_id,
                        %kind,
                        %amount,
                        balance = %new_balance,
                        attempt,
                        "operation committed"
                    );
                    return Ok(new_balance);
                }
                WriteOutcome::Conflict => {
                    if attempt >= self.policy.max_attempts {
                        warn!(%account_id, attempts = attempt, "retry budget exhausted");
                        return Err(WalletError::ContentionExhausted {
                            account_id,
                            attempts: attempt,
                        });
                    }

                    let delay = self.policy.backoff(attempt);
                    if let Some(deadline) = deadline
                        && Instant::now() + delay >= deadline
                    {
                        warn!(%account_id, attempts = attempt, "deadline reached while contended");
                        return Err(WalletError::ContentionExhausted {
                            account_id,
                            attempts: attempt,
                        });
                    }

                    debug!(%account_id, attempt, ?delay, "version conflict, retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Current balance, read without taking part in the write protocol.
    ///
    /// May trail an operation that is committing at the same moment, but never
    /// observes a half-applied one.
    pub async fn balance(&self, account_id: AccountId) -> Result<Balance> {
        self.store
            .read_balance(account_id)
            .await?
            .ok_or(WalletError::AccountNotFound(account_id))
    }

    /// Creates a wallet with an initial balance; refuses to replace one.
    pub async fn open_account(&self, account_id: AccountId, initial: Balance) -> Result<()> {
        self.store
            .open_account(Account::new(account_id, initial))
            .await
    }

    /// Consumes the guard and returns every wallet's final state.
    pub async fn into_accounts(self) -> Result<Vec<Account>> {
        self.store.all_accounts().await
    }
}
