//! Report command implementations

use anyhow::{Context, Result};
use dealbook_core::dashboard::{
    self, DebtBranch, PaymentReport, RankedEntry, RecordDeal,
};
use dealbook_core::{Config, DashboardOptions, DashboardReport, GroupShare, Snapshot};

use crate::cli::SourceArgs;

use super::truncate;

/// Load the dashboard documents named on the command line (or in config)
pub async fn load_snapshot(
    config: &Config,
    source: &SourceArgs,
) -> Result<(Snapshot, DashboardOptions)> {
    let mut config = config.clone();
    if let Some(year) = source.year {
        if !(1900..=9999).contains(&year) {
            anyhow::bail!("Invalid year: {} (use YYYY)", year);
        }
        config.year = year;
    }

    let sources = if source.sources.is_empty() {
        config.sources.clone()
    } else {
        source.sources.clone()
    };
    if sources.is_empty() {
        anyhow::bail!("No dashboard sources. Pass --source FILE or set `sources` in the config");
    }

    let snapshot = Snapshot::load(&sources, &config)
        .await
        .context("Failed to load dashboard sources")?;
    let options = DashboardOptions::from_config(&config)?;

    Ok((snapshot, options))
}

fn header(title: &str, options: &DashboardOptions) {
    println!();
    println!("{} ({})", title, options.year);
    println!("   ─────────────────────────────────────────────────────────────");
}

fn print_ranked(entries: &[RankedEntry], label: &str) {
    println!(
        "   {:30} │ {:>12} │ {:>14} │ {:>6}",
        label, "Volume", "Amount", "Deals"
    );
    println!("   ───────────────────────────────┼──────────────┼────────────────┼───────");
    for entry in entries {
        println!(
            "   {:30} │ {:>12.2} │ {:>14.2} │ {:>6}",
            truncate(&entry.name, 30),
            entry.volume,
            entry.amount,
            entry.deals
        );
    }
}

fn print_shares(shares: &[GroupShare], label: &str) {
    println!("   {:30} │ {:>12} │ {:>6} │ {:>6}", label, "Total", "%", "Count");
    println!("   ───────────────────────────────┼──────────────┼────────┼───────");
    for share in shares {
        println!(
            "   {:30} │ {:>12.2} │ {:>5.1}% │ {:>6}",
            truncate(&share.key, 30),
            share.value,
            share.percent,
            share.count
        );
    }
}

fn print_record_deal(title: &str, deal: Option<&RecordDeal>) {
    println!("   {}", title);
    match deal {
        Some(deal) => {
            println!("      Buyer:   {}", deal.buyer);
            println!("      Product: {}", deal.product);
            println!("      Basis:   {}", deal.basis);
            println!("      Volume:  {:.2}", deal.volume);
            println!("      Amount:  {:.2}", deal.amount);
            if let Some(date) = deal.date {
                println!("      Date:    {}", date.format("%d.%m.%Y"));
            }
        }
        None => println!("      No deals."),
    }
}

pub fn cmd_report_hero(snapshot: &Snapshot, options: &DashboardOptions) -> Result<()> {
    let hero = dashboard::hero_stats(&snapshot.deals, &options.fields.deals);

    header("🏆 Year in numbers", options);
    println!("   Deals:    {}", hero.total_deals);
    println!("   Volume:   {:.2}", hero.total_volume);
    println!("   Revenue:  {:.2}", hero.total_revenue);

    Ok(())
}

pub fn cmd_report_monthly(snapshot: &Snapshot, options: &DashboardOptions) -> Result<()> {
    let months = dashboard::monthly(&snapshot.deals, &options.fields.deals, options.offset);

    header("📅 Monthly volume", options);
    println!("   {:12} │ {:>12} │ {:>6}", "Month", "Volume", "Deals");
    println!("   ─────────────┼──────────────┼───────");
    for point in &months {
        println!(
            "   {:12} │ {:>12.2} │ {:>6}",
            point.label, point.volume, point.deals
        );
    }

    Ok(())
}

pub fn cmd_report_clients(
    snapshot: &Snapshot,
    options: &DashboardOptions,
    limit: usize,
) -> Result<()> {
    let clients = dashboard::top_clients(&snapshot.deals, &options.fields.deals, limit);

    header("🤝 Top buyers", options);
    if clients.is_empty() {
        println!("   No deals found.");
        return Ok(());
    }
    print_ranked(&clients, "Buyer");

    Ok(())
}

pub fn cmd_report_products(
    snapshot: &Snapshot,
    options: &DashboardOptions,
    limit: usize,
) -> Result<()> {
    let products = dashboard::top_products(&snapshot.deals, &options.fields.deals, limit);

    header("📦 Top products", options);
    if products.is_empty() {
        println!("   No deals found.");
        return Ok(());
    }
    print_ranked(&products, "Product");

    Ok(())
}

pub fn cmd_report_prices(snapshot: &Snapshot, options: &DashboardOptions) -> Result<()> {
    let prices = dashboard::average_prices(&snapshot.deals, &options.fields.deals);

    header("💱 Average sale prices", options);
    if prices.is_empty() {
        println!("   No priced deals found.");
        return Ok(());
    }
    println!("   {:30} │ {:>12} │ {:>12} │ {:>6}", "Product", "Price", "Volume", "Deals");
    println!("   ───────────────────────────────┼──────────────┼──────────────┼───────");
    for price in &prices {
        println!(
            "   {:30} │ {:>12.2} │ {:>12.2} │ {:>6}",
            truncate(&price.key, 30),
            price.average,
            price.total_weight,
            price.count
        );
    }

    Ok(())
}

pub fn cmd_report_basis(snapshot: &Snapshot, options: &DashboardOptions) -> Result<()> {
    let basis = dashboard::basis_split(&snapshot.deals, &options.fields.deals);

    header("🚚 Delivery basis", options);
    print_shares(&basis, "Basis");

    Ok(())
}

pub fn cmd_report_geography(snapshot: &Snapshot, options: &DashboardOptions) -> Result<()> {
    let regions = dashboard::geography_split(&snapshot.deals, &options.fields.deals);

    header("🗺️  Purchase regions", options);
    print_shares(&regions, "Region");

    Ok(())
}

pub fn cmd_report_records(snapshot: &Snapshot, options: &DashboardOptions) -> Result<()> {
    let records = dashboard::record_deals(&snapshot.deals, &options.fields.deals, options.offset);

    header("🥇 Record deals", options);
    print_record_deal("Largest by volume", records.by_volume.as_ref());
    println!();
    print_record_deal("Largest by revenue", records.by_revenue.as_ref());

    Ok(())
}

pub fn cmd_report_timeline(snapshot: &Snapshot, options: &DashboardOptions) -> Result<()> {
    let timeline = dashboard::timeline(&snapshot.deals, &options.fields.deals, options.offset);

    header("📈 Timeline", options);
    if timeline.is_empty() {
        println!("   No dated deals found.");
        return Ok(());
    }
    println!(
        "   {:16} │ {:>6} │ {:>12} │ {:>14}",
        "Period", "Deals", "Volume", "Revenue"
    );
    println!("   ─────────────────┼────────┼──────────────┼────────────────");
    for point in &timeline {
        println!(
            "   {:16} │ {:>6} │ {:>12.2} │ {:>14.2}",
            point.label, point.deals, point.volume, point.revenue
        );
    }

    Ok(())
}

pub fn cmd_report_final(snapshot: &Snapshot, options: &DashboardOptions) -> Result<()> {
    let stats = dashboard::final_stats(&snapshot.deals, &options.fields.deals);

    header("🎉 Year totals", options);
    println!("   Deals:          {}", stats.deals);
    println!("   Volume:         {:.2}", stats.volume);
    println!("   Unique buyers:  {}", stats.unique_buyers);

    Ok(())
}

fn print_payment_report(report: &PaymentReport) {
    println!("   Payments:      {}", report.total);
    println!(
        "   Paid:          {} ({:.2})",
        report.paid.count, report.paid.amount
    );
    println!(
        "   Unpaid:        {} ({:.2})",
        report.unpaid.count, report.unpaid.amount
    );
    if report.unrecognized > 0 {
        println!("   \x1b[2mOther status:  {}\x1b[0m", report.unrecognized);
    }

    if !report.by_type.is_empty() {
        println!();
        print_shares(&report.by_type, "Payment type");
    }

    let overall = &report.turnaround.overall;
    println!();
    match overall.average_days {
        Some(days) => println!(
            "   Average turnaround: {:.1} days ({} of {} payments dated)",
            days, overall.samples, overall.payments
        ),
        None => println!("   Average turnaround: n/a"),
    }

    let dated: Vec<_> = report
        .turnaround
        .by_counterparty
        .iter()
        .filter_map(|s| s.average_days.map(|d| (s, d)))
        .collect();
    if !dated.is_empty() {
        println!();
        println!("   {:30} │ {:>8} │ {:>8}", "Counterparty", "Days", "Samples");
        println!("   ───────────────────────────────┼──────────┼─────────");
        for (stat, days) in dated {
            println!(
                "   {:30} │ {:>8.1} │ {:>8}",
                truncate(&stat.key, 30),
                days,
                stat.samples
            );
        }
    }
}

pub fn cmd_report_payments(
    snapshot: &Snapshot,
    options: &DashboardOptions,
    supplier: bool,
) -> Result<()> {
    let (title, records, fields) = if supplier {
        (
            "💸 Supplier payments",
            &snapshot.supplier_payments,
            &options.fields.supplier_payments,
        )
    } else {
        ("💰 Buyer payments", &snapshot.payments, &options.fields.payments)
    };
    let report = dashboard::payment_report(records, fields, options.offset);

    header(title, options);
    if report.total == 0 {
        println!("   No payments found.");
        return Ok(());
    }
    print_payment_report(&report);

    Ok(())
}

pub fn cmd_report_purchases(
    snapshot: &Snapshot,
    options: &DashboardOptions,
    limit: usize,
) -> Result<()> {
    let report = dashboard::purchase_report(&snapshot.purchases, &options.fields.purchases, limit);

    header("🛒 Purchases", options);
    if report.total_purchases == 0 {
        println!("   No purchases found.");
        return Ok(());
    }

    println!("   Purchases:  {}", report.total_purchases);
    println!("   Volume:     {:.2}", report.total_volume);
    println!("   Cost:       {:.2}", report.total_cost);
    if let Some(price) = report.average_price {
        println!("   Avg price:  {:.2}", price);
    }

    println!();
    print_ranked(&report.top_suppliers, "Supplier");

    if !report.regions.is_empty() {
        println!();
        print_shares(&report.regions, "Region");
    }

    Ok(())
}

pub fn cmd_report_debts(snapshot: &Snapshot, options: &DashboardOptions) -> Result<()> {
    let report = dashboard::debt_report(&snapshot.debts, &options.fields.debts);

    header("⚖️  Claims", options);
    if report.total_claims == 0 {
        println!("   No claims found.");
        return Ok(());
    }

    println!("   Claims:  {}", report.total_claims);
    println!("   Amount:  {:.2}", report.total_amount);
    println!();
    println!("   {:30} │ {:>14} │ {:>6}", "Initiator / type", "Amount", "Claims");
    println!("   ───────────────────────────────┼────────────────┼───────");

    fn print_branch(branch: &DebtBranch, indent: usize) {
        let prefix = "  ".repeat(indent);
        println!(
            "   {:30} │ {:>14.2} │ {:>6}",
            format!("{}{}", prefix, truncate(&branch.key, 30 - prefix.len())),
            branch.amount,
            branch.claims
        );
        for child in &branch.children {
            print_branch(child, indent + 1);
        }
    }

    for branch in &report.by_initiator {
        print_branch(branch, 0);
    }

    if !report.by_agent.is_empty() {
        println!();
        print_shares(&report.by_agent, "Responsible");
    }

    if !report.by_status.is_empty() {
        println!();
        print_shares(&report.by_status, "Status");
    }

    Ok(())
}

pub fn cmd_dashboard(snapshot: &Snapshot, options: &DashboardOptions, json: bool) -> Result<()> {
    if json {
        let report = DashboardReport::build(snapshot, options);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    cmd_report_hero(snapshot, options)?;
    cmd_report_monthly(snapshot, options)?;
    cmd_report_clients(snapshot, options, options.top_clients)?;
    cmd_report_products(snapshot, options, options.top_products)?;
    cmd_report_prices(snapshot, options)?;
    cmd_report_basis(snapshot, options)?;
    cmd_report_geography(snapshot, options)?;
    cmd_report_records(snapshot, options)?;
    cmd_report_timeline(snapshot, options)?;
    cmd_report_payments(snapshot, options, false)?;
    cmd_report_payments(snapshot, options, true)?;
    cmd_report_purchases(snapshot, options, options.top_suppliers)?;
    cmd_report_debts(snapshot, options)?;
    cmd_report_final(snapshot, options)?;

    Ok(())
}
