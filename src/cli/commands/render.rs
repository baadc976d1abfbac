//! Terminal rendering shared by the read commands.

use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::aggregate::{Leaderboard, Overview};
use crate::model::{CompanyProfile, Contact, Deal, StageBreakdown, Task, TaskStatus};

/// Whole currency units with thousands separators, e.g. `40,000`.
#[must_use]
pub fn format_amount(amount: f64) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let whole = amount.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[must_use]
pub fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "—".to_string(), |dt| dt.format("%Y-%m-%d").to_string())
}

/// `Won 2 · New 1`
#[must_use]
pub fn format_breakdown(breakdown: &StageBreakdown) -> String {
    breakdown
        .entries()
        .iter()
        .map(|(stage, count)| format!("{stage} {count}"))
        .collect::<Vec<_>>()
        .join(" · ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

pub fn print_leaderboard(board: &Leaderboard, limit: Option<usize>) {
    if board.companies.is_empty() {
        println!("No companies yet.");
        return;
    }

    println!(
        "{:<4} {:<28} {:>14} {:>6} {:>9}  {}",
        "#".dimmed(),
        "Company".bold(),
        "Pipeline".bold(),
        "Deals".bold(),
        "Contacts".bold(),
        "Stages".bold()
    );
    let shown = limit.unwrap_or(board.companies.len());
    for (rank, row) in board.companies.iter().take(shown).enumerate() {
        println!(
            "{:<4} {:<28} {:>14} {:>6} {:>9}  {}",
            format!("{}.", rank + 1).dimmed(),
            truncate(&row.name, 28),
            format_amount(row.pipeline_value).green(),
            row.deal_count,
            row.contact_count,
            format_breakdown(&row.stage_breakdown).dimmed()
        );
    }
    if shown < board.companies.len() {
        println!("{}", format!("… {} more", board.companies.len() - shown).dimmed());
    }

    let totals = &board.totals;
    println!();
    println!(
        "{} companies, {} deals, {} in pipeline, {} average deal",
        totals.company_count,
        totals.deal_count,
        format_amount(totals.pipeline_value).green(),
        format_amount(totals.average_deal)
    );
    if !board.stage_tally.is_empty() {
        println!("{} {}", "By stage:".dimmed(), format_breakdown(&board.stage_tally));
    }
}

pub fn print_overview(overview: &Overview) {
    let totals = &overview.totals;
    println!("{}", "Pipeline health".cyan().bold());
    println!("  Deals:     {}", totals.count);
    println!("  Total:     {}", format_amount(totals.total).green());
    println!("  Expected:  {}", format_amount(totals.expected).green());
    println!("  Average:   {}", format_amount(totals.average));

    if let Some(pipeline) = &overview.pipeline {
        println!();
        println!("{}", pipeline.cyan().bold());
        for snap in &overview.snapshot {
            println!(
                "  {:<14} {:>4} {:>14}  {}",
                snap.stage.name,
                snap.count,
                format_amount(snap.amount),
                format!("{:.0}%", snap.stage.probability * 100.0).dimmed()
            );
        }
    }

    if !overview.top_deals.is_empty() {
        println!();
        println!("{}", "Top deals".cyan().bold());
        print_deal_lines(&overview.top_deals);
    }

    if !overview.upcoming_tasks.is_empty() {
        println!();
        println!("{}", "Upcoming tasks".cyan().bold());
        print_task_lines(&overview.upcoming_tasks);
    }
}

pub fn print_company(profile: &CompanyProfile) {
    let summary = &profile.summary;
    println!("{}", summary.name.magenta().bold());
    println!(
        "  {} contacts, {} deals, {} in pipeline",
        summary.contacts_count,
        summary.deals_count,
        format_amount(summary.pipeline_value).green()
    );
    if !summary.owners.is_empty() {
        println!("  Owners: {}", summary.owners.join(", "));
    }
    if !summary.stage_breakdown.is_empty() {
        println!("  Stages: {}", format_breakdown(&summary.stage_breakdown));
    }
    println!("  Last activity: {}", format_date(summary.last_activity));

    if !profile.contacts.is_empty() {
        println!();
        println!("{}", "Contacts".cyan().bold());
        print_contact_lines(&profile.contacts);
    }
    if !profile.deals.is_empty() {
        println!();
        println!("{}", "Deals".cyan().bold());
        print_deal_lines(&profile.deals);
    }
    if !profile.tasks.is_empty() {
        println!();
        println!("{}", "Tasks".cyan().bold());
        print_task_lines(&profile.tasks);
    }
}

pub fn print_contact_lines(contacts: &[Contact]) {
    for contact in contacts {
        let detail = [contact.title.as_deref(), contact.company.as_deref(), contact.email.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" · ");
        println!("  {:<24} {}", truncate(&contact.display_name(), 24).bold(), detail.dimmed());
    }
}

pub fn print_deal_lines(deals: &[Deal]) {
    for deal in deals {
        println!(
            "  {:<30} {:>12}  {:<12} {}",
            truncate(&deal.name, 30),
            format_amount(deal.amount).green(),
            deal.stage_name.as_deref().unwrap_or("—"),
            deal.company.as_deref().unwrap_or("").dimmed()
        );
    }
}

pub fn print_task_lines(tasks: &[Task]) {
    for task in tasks {
        let marker = match task.status {
            TaskStatus::Done => "✓".green(),
            TaskStatus::InProgress => "◐".yellow(),
            TaskStatus::Open => "○".normal(),
        };
        println!(
            "  {} {:<36} {}  {}",
            marker,
            truncate(&task.subject, 36),
            format_date(task.due_at),
            task.owner.as_deref().unwrap_or("").dimmed()
        );
    }
}
