//! Render one tab of the view model.

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use crate::cli::RemoteArgs;
use crate::client::{Action, DataSource, Tab, ViewState};
use crate::error::Result;

use super::render::{
    format_amount, format_breakdown, format_date, print_contact_lines, print_deal_lines,
    print_leaderboard, print_overview, print_task_lines,
};
use super::{fetch_view, print_json, require_loaded};

#[derive(Serialize)]
struct ViewOutput<'a> {
    tab: Tab,
    source: DataSource,
    health: Option<&'a str>,
    content: Value,
}

/// Execute the view command.
///
/// # Errors
///
/// Returns [`crate::Error::LoadFailed`] if a resource cannot be fetched
/// and `--demo-fallback` is not set.
pub fn execute(tab: Tab, company: Option<&str>, remote: &RemoteArgs, json: bool) -> Result<()> {
    let mut state = fetch_view(&remote.server, remote.demo_fallback)?;
    require_loaded(&state)?;

    state.apply(Action::SelectTab(tab));
    if let Some(name) = company {
        state.apply(Action::SelectCompany(name.to_string()));
    }

    if json {
        let output = ViewOutput {
            tab: state.tab,
            source: state.source,
            health: state.health.as_deref(),
            content: tab_content(&state)?,
        };
        return print_json(&output);
    }

    print_tab(&state, &remote.server);
    Ok(())
}

fn tab_content(state: &ViewState) -> Result<Value> {
    let value = match state.tab {
        Tab::Dashboard => serde_json::to_value(state.overview())?,
        Tab::Companies => match state.selected_row() {
            Some(row) => serde_json::to_value(row)?,
            None => serde_json::to_value(state.leaderboard())?,
        },
        Tab::Contacts => serde_json::to_value(&state.contacts)?,
        Tab::Deals => serde_json::to_value(&state.deals)?,
        Tab::Tasks => serde_json::to_value(&state.tasks)?,
        Tab::Settings => serde_json::json!({
            "theme": state.theme,
            "fallback": state.fallback,
            "pipelines": state.catalog.pipelines,
        }),
    };
    Ok(value)
}

fn print_tab(state: &ViewState, server: &str) {
    let tab = state.tab;
    println!("{}", tab.label().magenta().bold());
    println!("{}", tab.blurb().dimmed());
    if state.is_demo() {
        println!("{}", "Demo data (API unavailable)".yellow());
    }
    println!();

    match tab {
        Tab::Dashboard => print_overview(&state.overview()),
        Tab::Companies => match (&state.selected_company, state.selected_row()) {
            (Some(_), Some(row)) => {
                println!("{}", row.name.bold());
                println!(
                    "  {} contacts, {} deals, {} in pipeline",
                    row.contact_count,
                    row.deal_count,
                    format_amount(row.pipeline_value).green()
                );
                if !row.owners.is_empty() {
                    println!("  Owners: {}", row.owners.join(", "));
                }
                if !row.stage_breakdown.is_empty() {
                    println!("  Stages: {}", format_breakdown(&row.stage_breakdown));
                }
                println!("  Last activity: {}", format_date(row.last_activity));
            }
            (Some(key), None) => println!("No contacts or deals for '{key}'."),
            (None, _) => print_leaderboard(&state.leaderboard(), None),
        },
        Tab::Contacts => print_list(&state.contacts, "No contacts yet.", print_contact_lines),
        Tab::Deals => print_list(&state.deals, "No deals yet.", print_deal_lines),
        Tab::Tasks => print_list(&state.tasks, "No tasks yet.", print_task_lines),
        Tab::Settings => {
            println!("  Server:    {server}");
            println!("  Health:    {}", state.health.as_deref().unwrap_or("unknown"));
            println!("  Theme:     {:?}", state.theme);
            println!("  Fallback:  {:?}", state.fallback);
            let names: Vec<&str> = state.catalog.pipelines.iter().map(|p| p.name.as_str()).collect();
            println!("  Pipelines: {}", names.join(", "));
        }
    }
}

fn print_list<T>(items: &[T], empty: &str, print: fn(&[T])) {
    if items.is_empty() {
        println!("{empty}");
    } else {
        print(items);
    }
}
