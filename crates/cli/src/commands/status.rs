//! Status CLI command.
//!
//! Prints the headline activity for a reporting date and its trailing month
//! together with the most traded ISINs of the day, straight from the
//! database.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use compass_core::{ConfigLoader, TimeWindow};
use compass_data::{ActivitySummary, DashboardSource, DatabaseClient, IsinCount};

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Reporting date (YYYY-MM-DD); defaults to the configured reporting date policy
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,
}

/// Runs the status command.
///
/// # Errors
/// Returns an error if configuration cannot be loaded or database queries fail.
pub async fn run_status(args: StatusArgs) -> Result<()> {
    let config = ConfigLoader::load(&args.config)?;
    let date = args
        .date
        .unwrap_or_else(|| config.dashboard.reporting_date.today());

    let client = DatabaseClient::connect(&config.database).await?;
    let source = client.dashboard_source();

    let day_window = TimeWindow::day(date);
    let month_window = TimeWindow::trailing_month(date);
    let report = async {
        let day = source.activity_summary(day_window).await?;
        let month = source.activity_summary(month_window).await?;
        let ranking = source.most_traded(day_window, None).await?;
        anyhow::Ok((day, month, ranking))
    }
    .await;
    client.close().await;

    let (day, month, ranking) = report?;
    print!("{}", format_report(date, month_window, &day, &month, &ranking));
    Ok(())
}

fn format_report(
    date: NaiveDate,
    month_window: TimeWindow,
    day: &ActivitySummary,
    month: &ActivitySummary,
    ranking: &[IsinCount],
) -> String {
    let mut out = String::new();
    let rule = "=".repeat(60);

    out.push('\n');
    out.push_str(&format!("{rule}\nBOND ACTIVITY REPORT {date}\n{rule}\n\n"));
    out.push_str(&format!(
        "{:<32} {:>12} {:>12}\n",
        "", "Day", "Month"
    ));
    for (label, d, m) in [
        ("ISINs traded", day.isin_count, month.isin_count),
        ("Trades", day.trade_count, month.trade_count),
        ("Active venues", day.venue_count, month.venue_count),
    ] {
        out.push_str(&format!("{label:<32} {d:>12} {m:>12}\n"));
    }
    out.push_str(&format!(
        "\nMonth window: {} to {} (exclusive)\n\n",
        month_window.start.format("%Y-%m-%d"),
        month_window.end.format("%Y-%m-%d")
    ));

    out.push_str("Most traded ISINs\n");
    if ranking.is_empty() {
        out.push_str("  (no trades)\n");
    }
    for (rank, row) in ranking.iter().enumerate() {
        out.push_str(&format!("{:>3}. {:<14} {:>8}\n", rank + 1, row.isin, row.how_many));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_report() {
        let date = NaiveDate::from_ymd_opt(2023, 6, 2).unwrap();
        let day = ActivitySummary {
            isin_count: 3,
            trade_count: 10,
            venue_count: 2,
        };
        let month = ActivitySummary {
            isin_count: 40,
            trade_count: 250,
            venue_count: 6,
        };
        let ranking = vec![IsinCount {
            isin: "DE0001102580".to_string(),
            how_many: 7,
        }];

        let report = format_report(date, TimeWindow::trailing_month(date), &day, &month, &ranking);

        assert!(report.contains("BOND ACTIVITY REPORT 2023-06-02"));
        assert!(report.contains("Trades"));
        assert!(report.contains("250"));
        assert!(report.contains("  1. DE0001102580"));
        assert!(report.contains("Month window: 2023-05-03 to 2023-06-03"));
    }

    #[test]
    fn test_format_report_without_trades() {
        let date = NaiveDate::from_ymd_opt(2023, 6, 2).unwrap();
        let empty = ActivitySummary::default();
        let report = format_report(date, TimeWindow::trailing_month(date), &empty, &empty, &[]);
        assert!(report.contains("(no trades)"));
    }
}
