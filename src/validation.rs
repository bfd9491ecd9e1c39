//! Form validation that happens before anything is sent to the Finance Service.

use std::path::Path;

use crate::{
    Error,
    models::{Category, NewTransaction, RegisterRequest, TransactionKind, iso_date},
};

/// Parse a user-entered amount such as "12.50", "$1,200" or "-3".
///
/// # Errors
/// Returns [Error::InvalidAmount] if the text is not a finite number.
pub fn parse_amount(text: &str) -> Result<f64, Error> {
    let trimmed = text.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, trimmed),
    };
    let digits: String = digits
        .trim_start_matches('$')
        .chars()
        .filter(|&c| c != ',')
        .collect();

    match digits.parse::<f64>() {
        Ok(amount) if amount.is_finite() && !digits.starts_with(['-', '+']) => Ok(sign * amount),
        _ => Err(Error::InvalidAmount(text.to_owned())),
    }
}

/// Validate the add-transaction form.
///
/// The amount is entered without a sign and `kind` decides it: income is
/// stored as a positive amount and an expense as a negative amount.
///
/// # Errors
/// Returns [Error::MissingField] for an empty description, [Error::InvalidDate],
/// [Error::InvalidAmount] or [Error::InvalidCategory] for fields that do not parse.
pub fn validate_transaction_form(
    date: &str,
    description: &str,
    amount: &str,
    category: &str,
    kind: TransactionKind,
) -> Result<NewTransaction, Error> {
    let date = iso_date::parse_date(date.trim()).map_err(|_| Error::InvalidDate(date.to_owned()))?;

    if description.trim().is_empty() {
        return Err(Error::MissingField("Description"));
    }

    let amount = kind.signed(parse_amount(amount)?);
    let category: Category = category.parse()?;

    Ok(NewTransaction::new(date, description, amount, category))
}

/// Validate a budget limit, which must be a positive number.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `limit` is not a number, or
/// [Error::NonPositiveBudgetLimit] if it is zero or negative.
pub fn validate_budget_limit(limit: &str) -> Result<f64, Error> {
    let limit = parse_amount(limit)?;

    if limit <= 0.0 {
        return Err(Error::NonPositiveBudgetLimit);
    }

    Ok(limit)
}

/// Validate the registration form. Fields are checked in the order they appear.
///
/// # Errors
/// Returns [Error::MissingField] naming the first empty field.
pub fn validate_registration(
    full_name: &str,
    username: &str,
    email: &str,
    password: &str,
) -> Result<RegisterRequest, Error> {
    let fields = [
        ("Full name", full_name),
        ("Username", username),
        ("Email", email),
        ("Password", password),
    ];

    if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(Error::MissingField(*name));
    }

    Ok(RegisterRequest::new(full_name, username, email, password))
}

/// Check that `path` names a CSV file by its extension.
///
/// # Errors
/// Returns [Error::NotCsv] if the file does not end in `.csv`.
pub fn validate_csv_path(path: &Path) -> Result<(), Error> {
    let is_csv = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));

    if is_csv {
        Ok(())
    } else {
        Err(Error::NotCsv(path.display().to_string()))
    }
}
