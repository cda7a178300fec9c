use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use shared_types::{
    ClassBreakdown, MoneyView, MonthBucket, Transaction, TrailingRevenue, YearBucket,
};
use std::collections::BTreeMap;

pub const MONTH_LABELS: [&str; 12] = [
    "Январь",
    "Февраль",
    "Март",
    "Апрель",
    "Май",
    "Июнь",
    "Июль",
    "Август",
    "Сентябрь",
    "Октябрь",
    "Ноябрь",
    "Декабрь",
];

/// Render a monetary value: thin-space thousands grouping, two decimals,
/// comma separator, trailing currency tag. Pure; the parser inverts it.
pub fn format_amount(value: f64, currency: &str) -> String {
    let cents = (value * 100.0).round() as i128;
    let negative = cents < 0;
    let cents = cents.unsigned_abs();
    let int_part = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('\u{2009}');
        }
        grouped.push(c);
    }

    format!(
        "{}{},{:02} {}",
        if negative { "-" } else { "" },
        grouped,
        frac,
        currency
    )
}

pub fn money(value: f64, currency: &str) -> MoneyView {
    MoneyView {
        value,
        formatted: format_amount(value, currency),
    }
}

/// Monthly tables only admit dates inside [2000-01-01, now + 3 days];
/// anything else still counts toward totals
pub fn in_monthly_window(date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let floor = NaiveDate::from_ymd_opt(2000, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc();
    date >= floor && date <= now + Duration::days(3)
}

/// Stable sort by value date, undated entries last
pub fn sort_by_date(transactions: &mut [Transaction]) {
    transactions.sort_by_key(|t| (t.value_date.is_none(), t.value_date));
}

/// Year/month table plus the unattributed remainder (undated or
/// out-of-window amounts that only appear in the total)
pub fn build_breakdown(
    transactions: &[Transaction],
    currency: &str,
    now: DateTime<Utc>,
) -> (ClassBreakdown, f64) {
    let total: f64 = transactions.iter().map(|t| t.amount).sum();

    let mut years: BTreeMap<i32, BTreeMap<u32, f64>> = BTreeMap::new();
    for tx in transactions {
        let date = match tx.value_date {
            Some(d) if in_monthly_window(d, now) => d,
            _ => continue,
        };
        *years
            .entry(date.year())
            .or_default()
            .entry(date.month0())
            .or_default() += tx.amount;
    }

    let mut attributed = 0.0;
    let year_buckets: Vec<YearBucket> = years
        .into_iter()
        .map(|(year, months)| {
            let year_total: f64 = months.values().sum();
            attributed += year_total;
            YearBucket {
                year,
                total: money(year_total, currency),
                months: months
                    .into_iter()
                    .map(|(month, value)| MonthBucket {
                        month,
                        label: MONTH_LABELS[month as usize].to_string(),
                        value,
                        formatted: format_amount(value, currency),
                    })
                    .collect(),
            }
        })
        .collect();

    let breakdown = ClassBreakdown {
        total: money(total, currency),
        years: year_buckets,
    };
    (breakdown, total - attributed)
}

/// Revenue over the twelve calendar months ending at the latest observed
/// revenue date: [first-of-month(reference − 11 months), reference]
pub fn trailing_twelve_months(transactions: &[Transaction], currency: &str) -> TrailingRevenue {
    let reference = match transactions.iter().filter_map(|t| t.value_date).max() {
        Some(d) => d,
        None => {
            return TrailingRevenue {
                value: 0.0,
                formatted: format_amount(0.0, currency),
                reference_period_end: None,
            }
        }
    };

    let months_total = reference.year() * 12 + reference.month0() as i32 - 11;
    let start_year = months_total.div_euclid(12);
    let start_month = months_total.rem_euclid(12) as u32 + 1;
    let window_start = NaiveDate::from_ymd_opt(start_year, start_month, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc();

    let value: f64 = transactions
        .iter()
        .filter(|t| {
            t.value_date
                .map(|d| d >= window_start && d <= reference)
                .unwrap_or(false)
        })
        .map(|t| t.amount)
        .sum();

    TrailingRevenue {
        value,
        formatted: format_amount(value, currency),
        reference_period_end: Some(reference.date_naive().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amounts::parse_amount;
    use shared_types::ClassificationSource;

    fn tx(date: Option<&str>, amount: f64) -> Transaction {
        Transaction {
            internal_id: "s_1".to_string(),
            raw_amount: amount.to_string(),
            amount,
            value_date: date.map(|d| crate::dates::parse_date(d).unwrap()),
            purpose: String::new(),
            sender: String::new(),
            correspondent: String::new(),
            bin: None,
            source_file: None,
            classification_source: ClassificationSource::Heuristic,
            classification_reason: String::new(),
            possible_non_revenue: false,
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1234567.89, "KZT"), "1\u{2009}234\u{2009}567,89 KZT");
        assert_eq!(format_amount(0.0, "KZT"), "0,00 KZT");
        assert_eq!(format_amount(999.5, "USD"), "999,50 USD");
    }

    #[test]
    fn test_format_parse_round_trip() {
        for value in [0.0, 1.0, 999.99, 1000.0, 1234567.89, 50000.0, 2450000.0] {
            let rendered = format_amount(value, "KZT");
            assert_eq!(parse_amount(&rendered), value, "round trip for {rendered}");
        }
    }

    #[test]
    fn test_breakdown_months() {
        let now = crate::dates::parse_date("2024-06-01").unwrap();
        let txs = vec![
            tx(Some("2024-03-04"), 500_000.0),
            tx(Some("2024-03-15"), 1_200_000.0),
            tx(Some("2024-04-18"), 750_000.0),
        ];
        let (breakdown, delta) = build_breakdown(&txs, "KZT", now);
        assert_eq!(breakdown.total.value, 2_450_000.0);
        assert_eq!(delta, 0.0);
        assert_eq!(breakdown.years.len(), 1);
        let year = &breakdown.years[0];
        assert_eq!(year.year, 2024);
        assert_eq!(year.total.value, 2_450_000.0);
        assert_eq!(year.months.len(), 2);
        assert_eq!(year.months[0].month, 2);
        assert_eq!(year.months[0].label, "Март");
        assert_eq!(year.months[0].value, 1_700_000.0);
        assert_eq!(year.months[1].value, 750_000.0);
    }

    #[test]
    fn test_future_dated_excluded_from_months() {
        let now = crate::dates::parse_date("2024-06-01").unwrap();
        let txs = vec![
            tx(Some("2099-01-01"), 1_000_000.0),
            tx(Some("2024-03-04"), 500_000.0),
        ];
        let (breakdown, delta) = build_breakdown(&txs, "KZT", now);
        assert_eq!(breakdown.total.value, 1_500_000.0);
        assert_eq!(delta, 1_000_000.0);
        assert_eq!(breakdown.years.len(), 1);
        assert_eq!(breakdown.years[0].total.value, 500_000.0);
    }

    #[test]
    fn test_undated_in_totals_only() {
        let now = crate::dates::parse_date("2024-06-01").unwrap();
        let txs = vec![tx(None, 300_000.0), tx(Some("2024-01-10"), 100_000.0)];
        let (breakdown, delta) = build_breakdown(&txs, "KZT", now);
        assert_eq!(breakdown.total.value, 400_000.0);
        assert_eq!(delta, 300_000.0);
    }

    #[test]
    fn test_near_future_within_grace() {
        let now = Utc::now();
        let soon = now + Duration::days(2);
        assert!(in_monthly_window(soon, now));
        assert!(!in_monthly_window(now + Duration::days(4), now));
        assert!(!in_monthly_window(
            crate::dates::parse_date("1999-12-31").unwrap(),
            now
        ));
    }

    #[test]
    fn test_trailing_twelve_months() {
        let txs = vec![
            tx(Some("2024-04-18"), 750_000.0),
            tx(Some("2024-03-04"), 500_000.0),
            // inside the window: first of May 2023 is the boundary
            tx(Some("2023-05-01"), 100_000.0),
            // outside: April 2023 precedes the window start
            tx(Some("2023-04-30"), 999_000.0),
            tx(None, 50_000.0),
        ];
        let trailing = trailing_twelve_months(&txs, "KZT");
        assert_eq!(trailing.value, 1_350_000.0);
        assert_eq!(trailing.reference_period_end.as_deref(), Some("2024-04-18"));
    }

    #[test]
    fn test_trailing_without_dates() {
        let txs = vec![tx(None, 10.0)];
        let trailing = trailing_twelve_months(&txs, "KZT");
        assert_eq!(trailing.value, 0.0);
        assert!(trailing.reference_period_end.is_none());
    }

    #[test]
    fn test_sort_by_date_nulls_last() {
        let mut txs = vec![
            tx(None, 1.0),
            tx(Some("2024-02-01"), 2.0),
            tx(Some("2024-01-01"), 3.0),
        ];
        sort_by_date(&mut txs);
        assert_eq!(txs[0].amount, 3.0);
        assert_eq!(txs[1].amount, 2.0);
        assert_eq!(txs[2].amount, 1.0);
    }
}
