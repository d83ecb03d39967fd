//! Report endpoints: JSON summary and CSV exports.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use super::agenda::member_frequency;
use super::{success, ApiResult, Query};
use crate::errors::AppError;
use crate::models::{BrotherFilter, TransactionFilter};
use crate::reports::{
    attendance_csv, brothers_csv, finance_summary, transactions_csv, FinanceSummary, ReportPeriod,
};
use crate::AppState;

/// CSV body served as a download.
pub struct CsvFile {
    filename: &'static str,
    body: String,
}

impl IntoResponse for CsvFile {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", self.filename),
                ),
            ],
            self.body,
        )
            .into_response()
    }
}

fn period_filter(period: &ReportPeriod) -> TransactionFilter {
    TransactionFilter {
        from: period.from,
        to: period.to,
        ..TransactionFilter::default()
    }
}

fn check_period(period: &ReportPeriod) -> Result<(), AppError> {
    if let (Some(from), Some(to)) = (period.from, period.to) {
        if from > to {
            return Err(AppError::BadRequest(
                "'from' must not be after 'to'".to_string(),
            ));
        }
    }
    Ok(())
}

/// GET /api/reports/finance?from&to
pub async fn finance_report(
    State(state): State<AppState>,
    Query(period): Query<ReportPeriod>,
) -> ApiResult<FinanceSummary> {
    check_period(&period)?;
    let transactions = state.repo.list_transactions(&period_filter(&period)).await?;
    success(finance_summary(&transactions, &period))
}

/// GET /api/reports/finance.csv?from&to
pub async fn finance_csv(
    State(state): State<AppState>,
    Query(period): Query<ReportPeriod>,
) -> Result<CsvFile, AppError> {
    check_period(&period)?;
    let transactions = state.repo.list_transactions(&period_filter(&period)).await?;
    Ok(CsvFile {
        filename: "relatorio-financeiro.csv",
        body: transactions_csv(&transactions, &period)?,
    })
}

/// GET /api/reports/brothers.csv
pub async fn brothers_report_csv(State(state): State<AppState>) -> Result<CsvFile, AppError> {
    let brothers = state.repo.list_brothers(&BrotherFilter::default()).await?;
    Ok(CsvFile {
        filename: "irmaos.csv",
        body: brothers_csv(&brothers)?,
    })
}

/// GET /api/reports/attendance.csv
pub async fn attendance_report_csv(State(state): State<AppState>) -> Result<CsvFile, AppError> {
    let lines = member_frequency(&state).await?;
    Ok(CsvFile {
        filename: "frequencia.csv",
        body: attendance_csv(&lines)?,
    })
}
