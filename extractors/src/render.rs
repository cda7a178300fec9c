use shared_types::{ClassBreakdown, RevenueReport};

/// Human-readable rendering of a report. Pure: everything comes from the
/// structured form.
pub fn render_report_text(report: &RevenueReport) -> String {
    let mut out = String::new();

    out.push_str("Отчет по кредитовым операциям\n\n");
    out.push_str(&format!("Выручка: {}\n", report.totals.revenue.formatted));
    out.push_str(&format!(
        "Не выручка: {}\n",
        report.totals.non_revenue.formatted
    ));

    let trailing = &report.trailing_twelve_months_revenue;
    match &trailing.reference_period_end {
        Some(end) => out.push_str(&format!(
            "Выручка за последние 12 месяцев (по {}): {}\n",
            end, trailing.formatted
        )),
        None => out.push_str("Выручка за последние 12 месяцев: нет датированных операций\n"),
    }

    render_breakdown(&mut out, "Выручка по периодам", &report.revenue);
    render_breakdown(&mut out, "Не выручка по периодам", &report.non_revenue);

    let stats = &report.stats;
    out.push_str(&format!(
        "\nОпераций всего: {}, по ключевым словам: {}, передано агенту: {}, решений агента: {}, без решения: {}\n",
        stats.total, stats.auto_revenue, stats.agent_reviewed, stats.agent_decisions, stats.unresolved
    ));
    if stats.revenue_unattributed != 0.0 {
        out.push_str(&format!(
            "Не разнесено по месяцам (выручка): {:.2}\n",
            stats.revenue_unattributed
        ));
    }
    if stats.non_revenue_unattributed != 0.0 {
        out.push_str(&format!(
            "Не разнесено по месяцам (не выручка): {:.2}\n",
            stats.non_revenue_unattributed
        ));
    }

    out
}

fn render_breakdown(out: &mut String, title: &str, breakdown: &ClassBreakdown) {
    if breakdown.years.is_empty() {
        return;
    }
    out.push_str(&format!("\n{title}:\n"));
    for year in &breakdown.years {
        out.push_str(&format!("{}: {}\n", year.year, year.total.formatted));
        for month in &year.months {
            out.push_str(&format!("  {}: {}\n", month.label, month.formatted));
        }
    }
}
