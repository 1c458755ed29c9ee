use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Form, Json};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{ExpenseEntry, ExpenseForm};
use crate::state::AppState;

/// Parse an optional form amount, falling back to `default` when absent or blank.
fn parse_amount(raw: Option<&str>, default: f64) -> ApiResult<f64> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => v
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| ApiError::bad_request("Invalid data type")),
    }
}

struct ExpenseValues {
    income: f64,
    expense: f64,
    savings: f64,
    date: String,
    notes: String,
}

/// Validate a submitted form; absent fields take the values in `base`.
fn validate(form: &ExpenseForm, base: ExpenseValues) -> ApiResult<ExpenseValues> {
    let income = parse_amount(form.income.as_deref(), base.income)?;
    let expense = parse_amount(form.expense.as_deref(), base.expense)?;
    let savings = parse_amount(form.savings.as_deref(), base.savings)?;
    let date = form.date.clone().unwrap_or(base.date);
    let notes = form.notes.clone().unwrap_or(base.notes);

    if date.trim().is_empty() {
        return Err(ApiError::bad_request("Date is required"));
    }
    if income < 0.0 || expense < 0.0 || savings < 0.0 {
        return Err(ApiError::bad_request(
            "Income, expense, and savings cannot be negative",
        ));
    }
    Ok(ExpenseValues {
        income,
        expense,
        savings,
        date,
        notes,
    })
}

fn parse_expense_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| {
        tracing::debug!("Invalid expense ID: {raw}");
        ApiError::bad_request("Invalid expense ID")
    })
}

/// POST /api/profile/expenses
pub async fn create_expense(
    State(state): State<AppState>,
    user: AuthUser,
    Form(form): Form<ExpenseForm>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let values = validate(
        &form,
        ExpenseValues {
            income: 0.0,
            expense: 0.0,
            savings: 0.0,
            date: Utc::now().format("%Y-%m-%d").to_string(),
            notes: String::new(),
        },
    )?;

    let entry = ExpenseEntry {
        id: Uuid::new_v4(),
        user_id: user.id,
        income: values.income,
        expense: values.expense,
        savings: values.savings,
        date: values.date,
        notes: values.notes,
        created_at: Utc::now(),
        updated_at: None,
    };
    let id = entry.id;
    state.expenses.insert(entry)?;
    tracing::debug!(user_id = %user.id, expense_id = %id, "Expense created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Expense created successfully",
            "expense_id": id,
        })),
    ))
}

/// GET /api/profile/expenses - The caller's entries, newest first
pub async fn list_expenses(State(state): State<AppState>, user: AuthUser) -> Json<Vec<ExpenseEntry>> {
    let mut entries = state.expenses.filter(|e| e.user_id == user.id);
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(entries)
}

/// PUT /api/profile/expenses/{id}
pub async fn update_expense(
    State(state): State<AppState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
    Form(form): Form<ExpenseForm>,
) -> ApiResult<Json<Value>> {
    let id = parse_expense_id(&raw_id)?;
    let existing = state
        .expenses
        .find(|e| e.id == id && e.user_id == user.id)
        .ok_or_else(|| {
            ApiError::not_found("Expense not found or you are not authorized to update it")
        })?;

    let values = validate(
        &form,
        ExpenseValues {
            income: existing.income,
            expense: existing.expense,
            savings: existing.savings,
            date: existing.date.clone(),
            notes: existing.notes.clone(),
        },
    )?;

    let unchanged = values.income == existing.income
        && values.expense == existing.expense
        && values.savings == existing.savings
        && values.date == existing.date
        && values.notes == existing.notes;
    if unchanged {
        return Err(ApiError::bad_request("No changes made to the expense"));
    }

    let now = Utc::now();
    state
        .expenses
        .update(
            |e| e.id == id && e.user_id == user.id,
            |e| {
                e.income = values.income;
                e.expense = values.expense;
                e.savings = values.savings;
                e.date = values.date;
                e.notes = values.notes;
                e.updated_at = Some(now);
            },
        )?
        .ok_or_else(|| {
            ApiError::not_found("Expense not found or you are not authorized to update it")
        })?;

    Ok(Json(json!({
        "message": "Expense updated successfully",
        "updated_at": now,
    })))
}

/// DELETE /api/profile/expenses/{id}
pub async fn delete_expense(
    State(state): State<AppState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_expense_id(&raw_id)?;
    state
        .expenses
        .remove(|e| e.id == id && e.user_id == user.id)?
        .ok_or_else(|| {
            ApiError::not_found("Expense not found or you are not authorized to delete it")
        })?;

    tracing::debug!(user_id = %user.id, expense_id = %id, "Expense deleted");
    Ok(Json(json!({ "message": "Expense deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ExpenseValues {
        ExpenseValues {
            income: 10.0,
            expense: 5.0,
            savings: 1.0,
            date: "2024-01-01".into(),
            notes: "rent".into(),
        }
    }

    #[test]
    fn test_absent_fields_keep_base_values() {
        let values = validate(&ExpenseForm::default(), base()).unwrap();
        assert_eq!(values.income, 10.0);
        assert_eq!(values.date, "2024-01-01");
        assert_eq!(values.notes, "rent");
    }

    #[test]
    fn test_non_numeric_amount_is_rejected() {
        let form = ExpenseForm {
            income: Some("ten".into()),
            ..ExpenseForm::default()
        };
        let err = validate(&form, base()).err().unwrap();
        assert_eq!(err.message, "Invalid data type");

        let form = ExpenseForm {
            savings: Some("NaN".into()),
            ..ExpenseForm::default()
        };
        assert_eq!(validate(&form, base()).err().unwrap().message, "Invalid data type");
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let form = ExpenseForm {
            expense: Some("-1".into()),
            ..ExpenseForm::default()
        };
        let err = validate(&form, base()).err().unwrap();
        assert_eq!(err.message, "Income, expense, and savings cannot be negative");
    }

    #[test]
    fn test_blank_date_is_rejected() {
        let form = ExpenseForm {
            date: Some("".into()),
            ..ExpenseForm::default()
        };
        assert_eq!(validate(&form, base()).err().unwrap().message, "Date is required");
    }

    #[test]
    fn test_invalid_expense_id() {
        assert_eq!(
            parse_expense_id("not-a-uuid").err().unwrap().status,
            StatusCode::BAD_REQUEST
        );
    }
}
