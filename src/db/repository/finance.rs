use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use super::{decimal_column, decode_all, enum_column, money, new_id, non_empty, now, Repository};
use crate::errors::AppError;
use crate::models::{
    BankAccount, Budget, BudgetPeriod, CreateBankAccountRequest, CreateBudgetRequest,
    CreateCategoryRequest, CreateGoalRequest, CreateTransactionRequest, FinancialCategory,
    FinancialGoal, FinancialTransaction, TransactionFilter, TransactionType,
    UpdateBankAccountRequest, UpdateBudgetRequest, UpdateGoalRequest, UpdateTransactionRequest,
};
use crate::reports::format_brl;

const TRANSACTION_SELECT: &str = "SELECT t.id, t.type, t.amount, t.date, t.description, \
     t.category_id, c.name AS category_name, t.bank_account_id, t.created_at, t.updated_at \
     FROM financial_transactions t JOIN financial_categories c ON c.id = t.category_id";

const BANK_ACCOUNT_COLUMNS: &str = "id, name, bank, agency, account_number, initial_balance, \
     active, created_at, updated_at";

const BUDGET_COLUMNS: &str = "id, name, type, category_id, amount, period, start_date, end_date, \
     created_at, updated_at";

const GOAL_COLUMNS: &str = "id, name, target_amount, deadline, category_id, description, \
     created_at, updated_at";

impl Repository {
    // ==================== CATEGORY OPERATIONS ====================

    pub async fn list_categories(
        &self,
        kind: Option<TransactionType>,
    ) -> Result<Vec<FinancialCategory>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, type, created_at FROM financial_categories \
             WHERE (?1 IS NULL OR type = ?1) ORDER BY type DESC, name",
        )
        .bind(kind.map(|k| k.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_all(&rows, category_from_row)?)
    }

    pub async fn create_category(
        &self,
        request: &CreateCategoryRequest,
    ) -> Result<FinancialCategory, AppError> {
        let category = FinancialCategory {
            id: new_id(),
            name: request.name.trim().to_string(),
            kind: request.kind,
            created_at: now(),
        };

        sqlx::query(
            "INSERT INTO financial_categories (id, name, type, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(category.kind.as_str())
        .bind(&category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(category)
    }

    /// Delete a category. Fails with a conflict while transactions still use it.
    pub async fn delete_category(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM financial_categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        Ok(())
    }

    // ==================== BANK ACCOUNT OPERATIONS ====================

    pub async fn list_bank_accounts(&self) -> Result<Vec<BankAccount>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM bank_accounts ORDER BY name",
            BANK_ACCOUNT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_all(&rows, bank_account_from_row)?)
    }

    pub async fn get_bank_account(&self, id: &str) -> Result<Option<BankAccount>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM bank_accounts WHERE id = ?",
            BANK_ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(bank_account_from_row).transpose()?)
    }

    pub async fn create_bank_account(
        &self,
        request: &CreateBankAccountRequest,
    ) -> Result<BankAccount, AppError> {
        let account = BankAccount {
            id: new_id(),
            name: request.name.trim().to_string(),
            bank: non_empty(&request.bank),
            agency: non_empty(&request.agency),
            account_number: non_empty(&request.account_number),
            initial_balance: request.initial_balance.round_dp(2),
            active: request.active,
            created_at: now(),
            updated_at: now(),
        };

        sqlx::query(&format!(
            "INSERT INTO bank_accounts ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            BANK_ACCOUNT_COLUMNS
        ))
        .bind(&account.id)
        .bind(&account.name)
        .bind(&account.bank)
        .bind(&account.agency)
        .bind(&account.account_number)
        .bind(money(account.initial_balance))
        .bind(account.active)
        .bind(&account.created_at)
        .bind(&account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn update_bank_account(
        &self,
        id: &str,
        request: &UpdateBankAccountRequest,
    ) -> Result<BankAccount, AppError> {
        let existing = self
            .get_bank_account(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Bank account {} not found", id)))?;

        let account = BankAccount {
            id: existing.id,
            name: request
                .name
                .as_deref()
                .map(str::trim)
                .map(String::from)
                .unwrap_or(existing.name),
            bank: request.bank.as_ref().map_or(existing.bank, |_| non_empty(&request.bank)),
            agency: request
                .agency
                .as_ref()
                .map_or(existing.agency, |_| non_empty(&request.agency)),
            account_number: request
                .account_number
                .as_ref()
                .map_or(existing.account_number, |_| non_empty(&request.account_number)),
            initial_balance: request
                .initial_balance
                .map(|b| b.round_dp(2))
                .unwrap_or(existing.initial_balance),
            active: request.active.unwrap_or(existing.active),
            created_at: existing.created_at,
            updated_at: now(),
        };

        sqlx::query(
            "UPDATE bank_accounts SET name = ?, bank = ?, agency = ?, account_number = ?, \
             initial_balance = ?, active = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&account.name)
        .bind(&account.bank)
        .bind(&account.agency)
        .bind(&account.account_number)
        .bind(money(account.initial_balance))
        .bind(account.active)
        .bind(&account.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn delete_bank_account(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM bank_accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Bank account {} not found", id)));
        }
        Ok(())
    }

    // ==================== TRANSACTION OPERATIONS ====================

    /// List transactions, newest first.
    pub async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<FinancialTransaction>, AppError> {
        let rows = sqlx::query(&format!(
            "{} WHERE (?1 IS NULL OR t.type = ?1) \
               AND (?2 IS NULL OR t.category_id = ?2) \
               AND (?3 IS NULL OR t.bank_account_id = ?3) \
               AND (?4 IS NULL OR t.date >= ?4) \
               AND (?5 IS NULL OR t.date <= ?5) \
             ORDER BY t.date DESC, t.created_at DESC",
            TRANSACTION_SELECT
        ))
        .bind(filter.kind.map(|k| k.as_str()))
        .bind(&filter.category_id)
        .bind(&filter.bank_account_id)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_all(&rows, transaction_from_row)?)
    }

    pub async fn get_transaction(
        &self,
        id: &str,
    ) -> Result<Option<FinancialTransaction>, AppError> {
        let row = sqlx::query(&format!("{} WHERE t.id = ?", TRANSACTION_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(transaction_from_row).transpose()?)
    }

    /// Create a transaction, creating its category first when needed.
    ///
    /// Both writes share one database transaction.
    pub async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> Result<FinancialTransaction, AppError> {
        let id = new_id();
        let timestamp = now();

        let mut tx = self.pool.begin().await?;
        let category_id = category_id_for(&mut tx, request.category.trim(), request.kind).await?;

        sqlx::query(
            "INSERT INTO financial_transactions (id, type, amount, date, description, category_id, \
             bank_account_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(request.kind.as_str())
        .bind(money(request.amount))
        .bind(request.date)
        .bind(non_empty(&request.description))
        .bind(&category_id)
        .bind(non_empty(&request.bank_account_id))
        .bind(&timestamp)
        .bind(&timestamp)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_transaction(&id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Transaction {} vanished after insert", id)))
    }

    pub async fn update_transaction(
        &self,
        id: &str,
        request: &UpdateTransactionRequest,
    ) -> Result<FinancialTransaction, AppError> {
        let existing = self
            .get_transaction(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;

        let kind = request.kind.unwrap_or(existing.kind);
        let amount = request.amount.unwrap_or(existing.amount);
        let date = request.date.unwrap_or(existing.date);
        let description = request
            .description
            .as_ref()
            .map_or(existing.description, |_| non_empty(&request.description));
        let bank_account_id = request
            .bank_account_id
            .as_ref()
            .map_or(existing.bank_account_id, |_| {
                non_empty(&request.bank_account_id)
            });

        let mut tx = self.pool.begin().await?;
        // A type change moves the transaction to the same-named category of the new type.
        let category_name = request
            .category
            .as_deref()
            .map(str::trim)
            .unwrap_or(existing.category.as_str())
            .to_string();
        let category_id = if category_name == existing.category && kind == existing.kind {
            existing.category_id
        } else {
            category_id_for(&mut tx, &category_name, kind).await?
        };

        sqlx::query(
            "UPDATE financial_transactions SET type = ?, amount = ?, date = ?, description = ?, \
             category_id = ?, bank_account_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(kind.as_str())
        .bind(money(amount))
        .bind(date)
        .bind(&description)
        .bind(&category_id)
        .bind(&bank_account_id)
        .bind(now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_transaction(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))
    }

    pub async fn delete_transaction(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM financial_transactions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Transaction {} not found", id)));
        }
        Ok(())
    }

    // ==================== BUDGET OPERATIONS ====================

    pub async fn list_budgets(&self) -> Result<Vec<Budget>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM budgets ORDER BY name",
            BUDGET_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_all(&rows, budget_from_row)?)
    }

    pub async fn get_budget(&self, id: &str) -> Result<Option<Budget>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM budgets WHERE id = ?", BUDGET_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(budget_from_row).transpose()?)
    }

    pub async fn create_budget(&self, request: &CreateBudgetRequest) -> Result<Budget, AppError> {
        let budget = Budget {
            id: new_id(),
            name: request.name.trim().to_string(),
            kind: request.kind,
            category_id: non_empty(&request.category_id),
            amount: request.amount.round_dp(2),
            period: request.period,
            start_date: request.start_date,
            end_date: request.end_date,
            created_at: now(),
            updated_at: now(),
        };

        sqlx::query(&format!(
            "INSERT INTO budgets ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            BUDGET_COLUMNS
        ))
        .bind(&budget.id)
        .bind(&budget.name)
        .bind(budget.kind.as_str())
        .bind(&budget.category_id)
        .bind(money(budget.amount))
        .bind(budget.period.as_str())
        .bind(budget.start_date)
        .bind(budget.end_date)
        .bind(&budget.created_at)
        .bind(&budget.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(budget)
    }

    pub async fn update_budget(
        &self,
        id: &str,
        request: &UpdateBudgetRequest,
    ) -> Result<Budget, AppError> {
        let existing = self
            .get_budget(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Budget {} not found", id)))?;

        let budget = Budget {
            id: existing.id,
            name: request
                .name
                .as_deref()
                .map(str::trim)
                .map(String::from)
                .unwrap_or(existing.name),
            kind: request.kind.unwrap_or(existing.kind),
            category_id: request
                .category_id
                .as_ref()
                .map_or(existing.category_id, |_| non_empty(&request.category_id)),
            amount: request
                .amount
                .map(|a| a.round_dp(2))
                .unwrap_or(existing.amount),
            period: request.period.unwrap_or(existing.period),
            start_date: request.start_date.unwrap_or(existing.start_date),
            end_date: request.end_date.unwrap_or(existing.end_date),
            created_at: existing.created_at,
            updated_at: now(),
        };

        sqlx::query(
            "UPDATE budgets SET name = ?, type = ?, category_id = ?, amount = ?, period = ?, \
             start_date = ?, end_date = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&budget.name)
        .bind(budget.kind.as_str())
        .bind(&budget.category_id)
        .bind(money(budget.amount))
        .bind(budget.period.as_str())
        .bind(budget.start_date)
        .bind(budget.end_date)
        .bind(&budget.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(budget)
    }

    pub async fn delete_budget(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM budgets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Budget {} not found", id)));
        }
        Ok(())
    }

    // ==================== GOAL OPERATIONS ====================

    pub async fn list_goals(&self) -> Result<Vec<FinancialGoal>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM financial_goals ORDER BY deadline, name",
            GOAL_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_all(&rows, goal_from_row)?)
    }

    pub async fn get_goal(&self, id: &str) -> Result<Option<FinancialGoal>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM financial_goals WHERE id = ?",
            GOAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(goal_from_row).transpose()?)
    }

    pub async fn create_goal(
        &self,
        request: &CreateGoalRequest,
    ) -> Result<FinancialGoal, AppError> {
        let goal = FinancialGoal {
            id: new_id(),
            name: request.name.trim().to_string(),
            target_amount: request.target_amount.round_dp(2),
            deadline: request.deadline,
            category_id: non_empty(&request.category_id),
            description: non_empty(&request.description),
            created_at: now(),
            updated_at: now(),
        };

        sqlx::query(&format!(
            "INSERT INTO financial_goals ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            GOAL_COLUMNS
        ))
        .bind(&goal.id)
        .bind(&goal.name)
        .bind(money(goal.target_amount))
        .bind(goal.deadline)
        .bind(&goal.category_id)
        .bind(&goal.description)
        .bind(&goal.created_at)
        .bind(&goal.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(goal)
    }

    pub async fn update_goal(
        &self,
        id: &str,
        request: &UpdateGoalRequest,
    ) -> Result<FinancialGoal, AppError> {
        let existing = self
            .get_goal(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Goal {} not found", id)))?;

        let goal = FinancialGoal {
            id: existing.id,
            name: request
                .name
                .as_deref()
                .map(str::trim)
                .map(String::from)
                .unwrap_or(existing.name),
            target_amount: request
                .target_amount
                .map(|a| a.round_dp(2))
                .unwrap_or(existing.target_amount),
            deadline: request.deadline.unwrap_or(existing.deadline),
            category_id: request
                .category_id
                .as_ref()
                .map_or(existing.category_id, |_| non_empty(&request.category_id)),
            description: request
                .description
                .as_ref()
                .map_or(existing.description, |_| non_empty(&request.description)),
            created_at: existing.created_at,
            updated_at: now(),
        };

        sqlx::query(
            "UPDATE financial_goals SET name = ?, target_amount = ?, deadline = ?, \
             category_id = ?, description = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&goal.name)
        .bind(money(goal.target_amount))
        .bind(goal.deadline)
        .bind(&goal.category_id)
        .bind(&goal.description)
        .bind(&goal.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(goal)
    }

    pub async fn delete_goal(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM financial_goals WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Goal {} not found", id)));
        }
        Ok(())
    }
}

/// Look up a category by name and type, inserting it when missing.
async fn category_id_for(
    conn: &mut SqliteConnection,
    name: &str,
    kind: TransactionType,
) -> Result<String, sqlx::Error> {
    let existing: Option<String> =
        sqlx::query_scalar("SELECT id FROM financial_categories WHERE name = ? AND type = ?")
            .bind(name)
            .bind(kind.as_str())
            .fetch_optional(&mut *conn)
            .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let id = new_id();
    sqlx::query("INSERT INTO financial_categories (id, name, type, created_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(name)
        .bind(kind.as_str())
        .bind(now())
        .execute(&mut *conn)
        .await?;
    tracing::info!("Created {} category {:?}", kind.as_str(), name);

    Ok(id)
}

fn category_from_row(row: &SqliteRow) -> Result<FinancialCategory, sqlx::Error> {
    Ok(FinancialCategory {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        kind: enum_column(row, "type", TransactionType::parse)?,
        created_at: row.try_get("created_at")?,
    })
}

fn bank_account_from_row(row: &SqliteRow) -> Result<BankAccount, sqlx::Error> {
    Ok(BankAccount {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        bank: row.try_get("bank")?,
        agency: row.try_get("agency")?,
        account_number: row.try_get("account_number")?,
        initial_balance: decimal_column(row, "initial_balance")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn transaction_from_row(row: &SqliteRow) -> Result<FinancialTransaction, sqlx::Error> {
    let amount = decimal_column(row, "amount")?;
    Ok(FinancialTransaction {
        id: row.try_get("id")?,
        kind: enum_column(row, "type", TransactionType::parse)?,
        amount_formatted: format_brl(amount),
        amount,
        date: row.try_get("date")?,
        description: row.try_get("description")?,
        category_id: row.try_get("category_id")?,
        category: row.try_get("category_name")?,
        bank_account_id: row.try_get("bank_account_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn budget_from_row(row: &SqliteRow) -> Result<Budget, sqlx::Error> {
    Ok(Budget {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        kind: enum_column(row, "type", TransactionType::parse)?,
        category_id: row.try_get("category_id")?,
        amount: decimal_column(row, "amount")?,
        period: enum_column(row, "period", BudgetPeriod::parse)?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn goal_from_row(row: &SqliteRow) -> Result<FinancialGoal, sqlx::Error> {
    Ok(FinancialGoal {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        target_amount: decimal_column(row, "target_amount")?,
        deadline: row.try_get("deadline")?,
        category_id: row.try_get("category_id")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
