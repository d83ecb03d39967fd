//! Budget and goal progress, account balances.
//!
//! Everything here is a pure function over the transaction list; nothing is
//! cached, callers recompute on every read.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::models::{
    BankAccount, Budget, FinancialGoal, FinancialTransaction, Progress, TransactionType,
};

/// Sum the transactions of `kind` (restricted to `category_id` when given) and
/// compare the total against `target`.
///
/// The percentage is capped at 100 and is 0 for a non-positive target.
pub fn progress(
    kind: TransactionType,
    category_id: Option<&str>,
    target: Decimal,
    transactions: &[FinancialTransaction],
) -> Progress {
    let current: Decimal = transactions
        .iter()
        .filter(|tx| tx.kind == kind)
        .filter(|tx| category_id.map_or(true, |c| tx.category_id == c))
        .fold(Decimal::ZERO, |acc, tx| acc.saturating_add(tx.amount));

    Progress {
        current,
        percentage: percentage_of(current, target),
    }
}

/// Budget progress. The budget period is not taken into account: every
/// matching transaction ever recorded is summed.
pub fn budget_progress(budget: &Budget, transactions: &[FinancialTransaction]) -> Progress {
    progress(
        budget.kind,
        budget.category_id.as_deref(),
        budget.amount,
        transactions,
    )
}

/// Goals always track revenue, optionally narrowed to one income category.
pub fn goal_progress(goal: &FinancialGoal, transactions: &[FinancialTransaction]) -> Progress {
    progress(
        TransactionType::Income,
        goal.category_id.as_deref(),
        goal.target_amount,
        transactions,
    )
}

/// Initial balance plus income minus expenses booked on the account.
///
/// Saturates at the `Decimal` bounds instead of overflowing.
pub fn account_balance(account: &BankAccount, transactions: &[FinancialTransaction]) -> Decimal {
    transactions
        .iter()
        .filter(|tx| tx.bank_account_id.as_deref() == Some(account.id.as_str()))
        .fold(account.initial_balance, |acc, tx| match tx.kind {
            TransactionType::Income => acc.saturating_add(tx.amount),
            TransactionType::Expense => acc.saturating_sub(tx.amount),
        })
}

fn percentage_of(current: Decimal, target: Decimal) -> f64 {
    if target <= Decimal::ZERO {
        return 0.0;
    }
    // A quotient too large to represent is far past the target.
    let ratio = current
        .checked_div(target)
        .unwrap_or(Decimal::ONE)
        .clamp(Decimal::ZERO, Decimal::ONE);
    (ratio * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0)
}
