//! Finance API endpoints: categories, bank accounts, transactions, budgets
//! and goals.

use axum::extract::State;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{not_found, require, require_if_present, success, ApiResult, Json, Path, Query};
use crate::errors::AppError;
use crate::finance::{account_balance, budget_progress, goal_progress};
use crate::models::{
    BankAccountWithBalance, BudgetWithProgress, CreateBankAccountRequest, CreateBudgetRequest,
    CreateCategoryRequest, CreateGoalRequest, CreateTransactionRequest, FinancialCategory,
    FinancialTransaction, GoalWithProgress, TransactionFilter, TransactionType,
    UpdateBankAccountRequest, UpdateBudgetRequest, UpdateGoalRequest, UpdateTransactionRequest,
};
use crate::reports::format_brl;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    #[serde(default, rename = "type")]
    pub kind: Option<TransactionType>,
}

/// Largest amount accepted anywhere in the ledger: 10^15.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Round `amount` to cents and check it lies in `(0, MAX_AMOUNT]`.
///
/// The check runs on the rounded value, the one that gets stored.
fn positive_amount(amount: Decimal, field: &str) -> Result<Decimal, AppError> {
    let cents = amount.round_dp(2);
    if cents <= Decimal::ZERO {
        return Err(AppError::Validation(format!(
            "{} must be greater than zero",
            field
        )));
    }
    if cents > MAX_AMOUNT {
        return Err(AppError::Validation(format!(
            "{} must not exceed {}",
            field, MAX_AMOUNT
        )));
    }
    Ok(cents)
}

async fn all_transactions(state: &AppState) -> Result<Vec<FinancialTransaction>, AppError> {
    state
        .repo
        .list_transactions(&TransactionFilter::default())
        .await
}

// ==================== CATEGORIES ====================

/// GET /api/finance/categories
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<Vec<FinancialCategory>> {
    success(state.repo.list_categories(query.kind).await?)
}

/// POST /api/finance/categories
pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> ApiResult<FinancialCategory> {
    require(&request.name, "Name")?;
    success(state.repo.create_category(&request).await?)
}

/// DELETE /api/finance/categories/{id}
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_category(&id).await?;
    success(())
}

// ==================== BANK ACCOUNTS ====================

fn with_balance(
    account: crate::models::BankAccount,
    transactions: &[FinancialTransaction],
) -> BankAccountWithBalance {
    let current_balance = account_balance(&account, transactions);
    BankAccountWithBalance {
        account,
        current_balance,
        current_balance_formatted: format_brl(current_balance),
    }
}

/// GET /api/finance/accounts - Accounts with their current balance.
pub async fn list_bank_accounts(
    State(state): State<AppState>,
) -> ApiResult<Vec<BankAccountWithBalance>> {
    let accounts = state.repo.list_bank_accounts().await?;
    let transactions = all_transactions(&state).await?;

    success(
        accounts
            .into_iter()
            .map(|a| with_balance(a, &transactions))
            .collect(),
    )
}

/// GET /api/finance/accounts/{id}
pub async fn get_bank_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<BankAccountWithBalance> {
    let account = state
        .repo
        .get_bank_account(&id)
        .await?
        .ok_or_else(|| not_found("Bank account", &id))?;
    let transactions = all_transactions(&state).await?;
    success(with_balance(account, &transactions))
}

/// POST /api/finance/accounts
pub async fn create_bank_account(
    State(state): State<AppState>,
    Json(request): Json<CreateBankAccountRequest>,
) -> ApiResult<BankAccountWithBalance> {
    require(&request.name, "Name")?;
    let account = state.repo.create_bank_account(&request).await?;
    success(with_balance(account, &[]))
}

/// PUT /api/finance/accounts/{id}
pub async fn update_bank_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateBankAccountRequest>,
) -> ApiResult<BankAccountWithBalance> {
    require_if_present(&request.name, "Name")?;
    let account = state.repo.update_bank_account(&id, &request).await?;
    let transactions = all_transactions(&state).await?;
    success(with_balance(account, &transactions))
}

/// DELETE /api/finance/accounts/{id}
pub async fn delete_bank_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_bank_account(&id).await?;
    success(())
}

// ==================== TRANSACTIONS ====================

/// GET /api/finance/transactions - Filter by `type`, `categoryId`,
/// `bankAccountId`, `from` and `to`.
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(filter): Query<TransactionFilter>,
) -> ApiResult<Vec<FinancialTransaction>> {
    success(state.repo.list_transactions(&filter).await?)
}

/// GET /api/finance/transactions/{id}
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<FinancialTransaction> {
    match state.repo.get_transaction(&id).await? {
        Some(tx) => success(tx),
        None => Err(not_found("Transaction", &id)),
    }
}

/// POST /api/finance/transactions
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(mut request): Json<CreateTransactionRequest>,
) -> ApiResult<FinancialTransaction> {
    request.amount = positive_amount(request.amount, "Amount")?;
    require(&request.category, "Category")?;

    let tx = state.repo.create_transaction(&request).await?;
    tracing::info!(
        "{} of {} booked under {}",
        tx.kind.as_str(),
        tx.amount_formatted,
        tx.category
    );
    success(tx)
}

/// PUT /api/finance/transactions/{id}
pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut request): Json<UpdateTransactionRequest>,
) -> ApiResult<FinancialTransaction> {
    if let Some(amount) = request.amount {
        request.amount = Some(positive_amount(amount, "Amount")?);
    }
    require_if_present(&request.category, "Category")?;
    success(state.repo.update_transaction(&id, &request).await?)
}

/// DELETE /api/finance/transactions/{id}
pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_transaction(&id).await?;
    success(())
}

// ==================== BUDGETS ====================

/// GET /api/finance/budgets - Budgets with progress recomputed from the
/// current transactions.
pub async fn list_budgets(State(state): State<AppState>) -> ApiResult<Vec<BudgetWithProgress>> {
    let budgets = state.repo.list_budgets().await?;
    let transactions = all_transactions(&state).await?;

    success(
        budgets
            .into_iter()
            .map(|budget| BudgetWithProgress {
                progress: budget_progress(&budget, &transactions),
                budget,
            })
            .collect(),
    )
}

/// GET /api/finance/budgets/{id}
pub async fn get_budget(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<BudgetWithProgress> {
    let budget = state
        .repo
        .get_budget(&id)
        .await?
        .ok_or_else(|| not_found("Budget", &id))?;
    let transactions = all_transactions(&state).await?;
    success(BudgetWithProgress {
        progress: budget_progress(&budget, &transactions),
        budget,
    })
}

/// POST /api/finance/budgets
pub async fn create_budget(
    State(state): State<AppState>,
    Json(mut request): Json<CreateBudgetRequest>,
) -> ApiResult<BudgetWithProgress> {
    require(&request.name, "Name")?;
    request.amount = positive_amount(request.amount, "Amount")?;

    let budget = state.repo.create_budget(&request).await?;
    let transactions = all_transactions(&state).await?;
    success(BudgetWithProgress {
        progress: budget_progress(&budget, &transactions),
        budget,
    })
}

/// PUT /api/finance/budgets/{id}
pub async fn update_budget(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut request): Json<UpdateBudgetRequest>,
) -> ApiResult<BudgetWithProgress> {
    require_if_present(&request.name, "Name")?;
    if let Some(amount) = request.amount {
        request.amount = Some(positive_amount(amount, "Amount")?);
    }

    let budget = state.repo.update_budget(&id, &request).await?;
    let transactions = all_transactions(&state).await?;
    success(BudgetWithProgress {
        progress: budget_progress(&budget, &transactions),
        budget,
    })
}

/// DELETE /api/finance/budgets/{id}
pub async fn delete_budget(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.repo.delete_budget(&id).await?;
    success(())
}

// ==================== GOALS ====================

/// GET /api/finance/goals
pub async fn list_goals(State(state): State<AppState>) -> ApiResult<Vec<GoalWithProgress>> {
    let goals = state.repo.list_goals().await?;
    let transactions = all_transactions(&state).await?;

    success(
        goals
            .into_iter()
            .map(|goal| GoalWithProgress {
                progress: goal_progress(&goal, &transactions),
                goal,
            })
            .collect(),
    )
}

/// GET /api/finance/goals/{id}
pub async fn get_goal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<GoalWithProgress> {
    let goal = state
        .repo
        .get_goal(&id)
        .await?
        .ok_or_else(|| not_found("Goal", &id))?;
    let transactions = all_transactions(&state).await?;
    success(GoalWithProgress {
        progress: goal_progress(&goal, &transactions),
        goal,
    })
}

/// POST /api/finance/goals
pub async fn create_goal(
    State(state): State<AppState>,
    Json(mut request): Json<CreateGoalRequest>,
) -> ApiResult<GoalWithProgress> {
    require(&request.name, "Name")?;
    request.target_amount = positive_amount(request.target_amount, "Target amount")?;

    let goal = state.repo.create_goal(&request).await?;
    let transactions = all_transactions(&state).await?;
    success(GoalWithProgress {
        progress: goal_progress(&goal, &transactions),
        goal,
    })
}

/// PUT /api/finance/goals/{id}
pub async fn update_goal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut request): Json<UpdateGoalRequest>,
) -> ApiResult<GoalWithProgress> {
    require_if_present(&request.name, "Name")?;
    if let Some(target) = request.target_amount {
        request.target_amount = Some(positive_amount(target, "Target amount")?);
    }

    let goal = state.repo.update_goal(&id, &request).await?;
    let transactions = all_transactions(&state).await?;
    success(GoalWithProgress {
        progress: goal_progress(&goal, &transactions),
        goal,
    })
}

/// DELETE /api/finance/goals/{id}
pub async fn delete_goal(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.repo.delete_goal(&id).await?;
    success(())
}
