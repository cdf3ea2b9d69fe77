//! Totals and breakdowns of a user's transactions, as data, JSON and a page.

mod chart_data;
mod charts;
mod core;
mod statistics_page;

pub use chart_data::{get_daily_spending_data, get_monthly_spending_data};
pub use core::{
    CategoryTotal, DateTotal, MonthTotal, Statistics, Summary, aggregate_by_date,
    aggregate_by_month, get_statistics, get_summary,
};
pub use statistics_page::get_statistics_page;
