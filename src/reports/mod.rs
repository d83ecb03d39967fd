//! Report layer: financial summaries and CSV exports.
//!
//! Reports aggregate already-fetched rows in memory. Printing is left to the
//! client; this module only produces data and CSV text.

mod format;

pub use format::*;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Brother, FinancialTransaction, MemberFrequency, TransactionType};

/// Income category whose total is reported on its own line.
pub const CHARITY_CATEGORY: &str = "Tronco de Beneficência";

/// Optional date window for reports.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPeriod {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl ReportPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// An amount with its printed form.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub amount: Decimal,
    pub formatted: String,
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self {
            formatted: format_brl(amount),
            amount,
        }
    }
}

/// Totals for one category.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub count: usize,
    pub total: Money,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    pub transaction_count: usize,
    pub total_income: Money,
    pub total_expense: Money,
    pub balance: Money,
    pub charity_income: Money,
    pub by_category: Vec<CategoryTotal>,
}

/// Aggregate the transactions falling inside `period`.
///
/// Categories are listed income first, then alphabetically. Totals saturate
/// at the `Decimal` bounds.
pub fn finance_summary(
    transactions: &[FinancialTransaction],
    period: &ReportPeriod,
) -> FinanceSummary {
    let in_period: Vec<&FinancialTransaction> = transactions
        .iter()
        .filter(|tx| period.contains(tx.date))
        .collect();

    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    let mut charity = Decimal::ZERO;
    let mut buckets: BTreeMap<(u8, String), (TransactionType, usize, Decimal)> = BTreeMap::new();

    for tx in &in_period {
        match tx.kind {
            TransactionType::Income => {
                income = income.saturating_add(tx.amount);
                if tx.category == CHARITY_CATEGORY {
                    charity = charity.saturating_add(tx.amount);
                }
            }
            TransactionType::Expense => expense = expense.saturating_add(tx.amount),
        }
        let order = match tx.kind {
            TransactionType::Income => 0,
            TransactionType::Expense => 1,
        };
        let bucket = buckets
            .entry((order, tx.category.clone()))
            .or_insert((tx.kind, 0, Decimal::ZERO));
        bucket.1 += 1;
        bucket.2 = bucket.2.saturating_add(tx.amount);
    }

    FinanceSummary {
        from: period.from,
        to: period.to,
        transaction_count: in_period.len(),
        total_income: income.into(),
        total_expense: expense.into(),
        balance: income.saturating_sub(expense).into(),
        charity_income: charity.into(),
        by_category: buckets
            .into_iter()
            .map(|((_, category), (kind, count, total))| CategoryTotal {
                category,
                kind,
                count,
                total: total.into(),
            })
            .collect(),
    }
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, AppError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV encoding: {}", e)))
}

/// Transactions in `period`, oldest first.
pub fn transactions_csv(
    transactions: &[FinancialTransaction],
    period: &ReportPeriod,
) -> Result<String, AppError> {
    let mut rows: Vec<&FinancialTransaction> = transactions
        .iter()
        .filter(|tx| period.contains(tx.date))
        .collect();
    rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.created_at.cmp(&b.created_at)));

    let mut writer = csv_writer();
    writer.write_record(["Data", "Tipo", "Categoria", "Descrição", "Valor"])?;
    for tx in rows {
        writer.write_record([
            format_date_br(tx.date).as_str(),
            tx.kind.as_str(),
            tx.category.as_str(),
            tx.description.as_deref().unwrap_or(""),
            format_decimal_br(tx.amount).as_str(),
        ])?;
    }
    finish(writer)
}

pub fn brothers_csv(brothers: &[Brother]) -> Result<String, AppError> {
    let mut writer = csv_writer();
    writer.write_record([
        "Nome",
        "CIM",
        "Grau",
        "E-mail",
        "Telefone",
        "Iniciação",
        "Situação",
    ])?;
    for b in brothers {
        let initiation = b.initiation_date.map(format_date_br).unwrap_or_default();
        writer.write_record([
            b.name.as_str(),
            b.cim.as_deref().unwrap_or(""),
            b.degree.label(),
            b.email.as_deref().unwrap_or(""),
            b.phone.as_deref().unwrap_or(""),
            initiation.as_str(),
            if b.active { "Ativo" } else { "Inativo" },
        ])?;
    }
    finish(writer)
}

pub fn attendance_csv(lines: &[MemberFrequency]) -> Result<String, AppError> {
    let mut writer = csv_writer();
    writer.write_record(["Irmão", "Presenças", "Sessões", "Frequência"])?;
    for line in lines {
        writer.write_record([
            line.brother_name.clone(),
            line.presences.to_string(),
            line.total_sessions.to_string(),
            format!("{}%", line.percentage),
        ])?;
    }
    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tx(
        kind: TransactionType,
        category: &str,
        amount: Decimal,
        date: (i32, u32, u32),
    ) -> FinancialTransaction {
        FinancialTransaction {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            amount,
            amount_formatted: format_brl(amount),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            description: Some(format!("{} {}", kind.as_str(), category)),
            category_id: category.to_lowercase(),
            category: category.to_string(),
            bank_account_id: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn sample() -> Vec<FinancialTransaction> {
        vec![
            tx(TransactionType::Income, "Mensalidade", dec!(1200), (2024, 3, 5)),
            tx(TransactionType::Income, CHARITY_CATEGORY, dec!(85.50), (2024, 3, 12)),
            tx(TransactionType::Expense, "Manutenção", dec!(150), (2024, 3, 1)),
            tx(TransactionType::Expense, "Manutenção", dec!(49.90), (2024, 4, 2)),
        ]
    }

    #[test]
    fn test_finance_summary_totals() {
        let summary = finance_summary(&sample(), &ReportPeriod::default());
        assert_eq!(summary.transaction_count, 4);
        assert_eq!(summary.total_income.amount, dec!(1285.50));
        assert_eq!(summary.total_expense.amount, dec!(199.90));
        assert_eq!(summary.balance.formatted, "R$ 1.085,60");
        assert_eq!(summary.charity_income.formatted, "R$ 85,50");

        let categories: Vec<&str> = summary
            .by_category
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(
            categories,
            vec!["Mensalidade", CHARITY_CATEGORY, "Manutenção"]
        );
        assert_eq!(summary.by_category[2].count, 2);
    }

    #[test]
    fn test_finance_summary_period() {
        let period = ReportPeriod {
            from: NaiveDate::from_ymd_opt(2024, 3, 1),
            to: NaiveDate::from_ymd_opt(2024, 3, 31),
        };
        let summary = finance_summary(&sample(), &period);
        assert_eq!(summary.transaction_count, 3);
        assert_eq!(summary.total_expense.formatted, "R$ 150,00");
    }

    #[test]
    fn test_finance_summary_huge_totals_saturate() {
        let txs = vec![
            tx(TransactionType::Income, CHARITY_CATEGORY, Decimal::MAX, (2024, 3, 5)),
            tx(TransactionType::Income, CHARITY_CATEGORY, Decimal::MAX, (2024, 3, 6)),
            tx(TransactionType::Expense, "Manutenção", Decimal::MAX, (2024, 3, 7)),
        ];
        let summary = finance_summary(&txs, &ReportPeriod::default());
        assert_eq!(summary.total_income.amount, Decimal::MAX);
        assert_eq!(summary.charity_income.amount, Decimal::MAX);
        assert_eq!(summary.balance.amount, Decimal::ZERO);
        assert_eq!(summary.by_category[0].total.amount, Decimal::MAX);
    }

    #[test]
    fn test_transactions_csv() {
        let csv = transactions_csv(&sample(), &ReportPeriod::default()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Data;Tipo;Categoria;Descrição;Valor");
        assert_eq!(lines[1], "01/03/2024;Despesa;Manutenção;Despesa Manutenção;150,00");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_attendance_csv() {
        let lines = vec![MemberFrequency {
            brother_id: "a".into(),
            brother_name: "João; da Silva".into(),
            presences: 3,
            total_sessions: 4,
            percentage: 75,
        }];
        let csv = attendance_csv(&lines).unwrap();
        assert!(csv.contains("\"João; da Silva\";3;4;75%"));
    }
}
