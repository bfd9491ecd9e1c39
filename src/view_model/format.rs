//! Text formatting for amounts and dates.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};
use time::{Date, Month};

/// Format `number` as dollars and cents, e.g. "$1,234.50" or "-$12.30".
pub fn format_currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("$")
            .unwrap()
            .precision(Precision::Decimals(2))
    });

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-$")
            .unwrap()
            .precision(Precision::Decimals(2))
    });

    if number < 0.0 {
        pad_cents(negative_fmt.fmt_string(number.abs()))
    } else if number > 0.0 {
        pad_cents(positive_fmt.fmt_string(number))
    } else {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        "$0.00".to_owned()
    }
}

/// Format `number` rounded to whole dollars, e.g. "$1,235".
pub fn format_currency_rounded(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("$")
            .unwrap()
            .precision(Precision::Decimals(0))
    });

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-$")
            .unwrap()
            .precision(Precision::Decimals(0))
    });

    let number = number.round();

    if number < 0.0 {
        negative_fmt.fmt_string(number.abs())
    } else if number > 0.0 {
        positive_fmt.fmt_string(number)
    } else {
        "$0".to_owned()
    }
}

/// Format a transaction amount with an explicit sign, e.g. "+$200.00" for
/// money in and "-$50.00" for money out.
pub fn format_signed_currency(number: f64) -> String {
    if number > 0.0 {
        format!("+{}", format_currency(number))
    } else {
        format_currency(number)
    }
}

/// numfmt drops trailing zeros after the decimal point, so "12.30" comes out
/// as "12.3" and "5.00" as "5".
fn pad_cents(mut formatted: String) -> String {
    match formatted.rfind('.') {
        Some(dot) => {
            let decimals = formatted.len() - dot - 1;
            for _ in decimals..2 {
                formatted.push('0');
            }
        }
        None => formatted.push_str(".00"),
    }

    formatted
}

/// The three-letter abbreviation of `month`, e.g. "Jan".
pub fn month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

/// A short label for a chart axis, e.g. "Jan 5".
pub fn short_date_label(date: Date) -> String {
    format!("{} {}", month_abbrev(date.month()), date.day())
}

/// A date for lists of transactions, e.g. "Mar 5, 2024".
pub fn date_label(date: Date) -> String {
    format!("{} {}, {}", month_abbrev(date.month()), date.day(), date.year())
}

/// A month heading, e.g. "November 2024".
pub fn month_label(date: Date) -> String {
    format!("{} {}", date.month(), date.year())
}
