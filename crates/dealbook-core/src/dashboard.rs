//! Year-end dashboard
//!
//! Each section is a pure function over the snapshot's records and returns
//! plain data. Sections never share state, so any one of them can be computed
//! alone (the CLI's `report` command does exactly that).

use std::collections::HashMap;

use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::aggregate::{
    by_month, by_year_month, distinct_count, group_by_field, sum_field, weighted_average,
    GroupShare, Groups, WeightedAverage,
};
use crate::config::{Config, DealFields, DebtFields, FieldMap, PaymentFields, PurchaseFields};
use crate::dataset::Snapshot;
use crate::error::Result;
use crate::extremum::max_by_field;
use crate::filters::{partition_by_status, StatusPartition};
use crate::payment_type::PaymentType;
use crate::record::Record;
use crate::turnaround::{summarize, TurnaroundSummary};

/// Placeholder for blank deal and purchase dimensions
pub const UNSPECIFIED: &str = "Не указан";

/// Placeholder for blank payment and debt dimensions
pub const UNKNOWN: &str = "Неизвестно";

const MONTH_NAMES: [&str; 12] = [
    "январь", "февраль", "март", "апрель", "май", "июнь", "июль", "август", "сентябрь",
    "октябрь", "ноябрь", "декабрь",
];

/// Russian month name (lowercase), empty for an invalid month
pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or("")
}

/// "Январь 2025"
fn period_label(year: i32, month: u32) -> String {
    let name = month_name(month);
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("{}{} {}", first.to_uppercase(), chars.as_str(), year),
        None => year.to_string(),
    }
}

/// Knobs for the dashboard sections
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub year: i32,
    pub offset: FixedOffset,
    pub fields: FieldMap,
    pub top_clients: usize,
    pub top_products: usize,
    pub top_suppliers: usize,
}

impl DashboardOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            year: config.year,
            offset: config.offset()?,
            fields: config.fields.clone(),
            top_clients: 5,
            top_products: 5,
            top_suppliers: 10,
        })
    }
}

// ========== Report Models ==========

/// Headline numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroStats {
    pub total_deals: usize,
    /// Tonnes
    pub total_volume: f64,
    /// Thousand CNY
    pub total_revenue: f64,
}

/// Volume and deal count of one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub month: u32,
    pub label: String,
    pub volume: f64,
    pub deals: u64,
}

/// One row of a top-N table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub name: String,
    pub volume: f64,
    /// Revenue for sales, cost for purchases (thousand CNY)
    pub amount: f64,
    pub deals: u64,
}

/// Display view of a record-setting deal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDeal {
    pub buyer: String,
    pub product: String,
    pub basis: String,
    pub volume: f64,
    pub amount: f64,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDeals {
    pub by_volume: Option<RecordDeal>,
    pub by_revenue: Option<RecordDeal>,
}

/// One month of the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub deals: u64,
    pub volume: f64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalStats {
    pub deals: usize,
    pub volume: f64,
    pub unique_buyers: usize,
}

/// Count and billed amount of one payment status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusTotals {
    pub count: usize,
    pub amount: f64,
}

/// Buyer or supplier payments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReport {
    pub total: usize,
    pub paid: StatusTotals,
    pub unpaid: StatusTotals,
    /// Records whose status is neither paid nor unpaid
    pub unrecognized: usize,
    /// Amount per normalized payment type
    pub by_type: Vec<GroupShare>,
    pub turnaround: TurnaroundSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseReport {
    pub total_purchases: usize,
    pub total_volume: f64,
    /// Σ volume × price
    pub total_cost: f64,
    /// Volume-weighted price across all purchases
    pub average_price: Option<f64>,
    pub top_suppliers: Vec<RankedEntry>,
    pub average_prices: Vec<WeightedAverage>,
    pub regions: Vec<GroupShare>,
}

/// A node of the debts tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtBranch {
    pub key: String,
    pub amount: f64,
    pub claims: u64,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<DebtBranch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtReport {
    pub total_amount: f64,
    pub total_claims: usize,
    /// Initiator, then claim type
    pub by_initiator: Vec<DebtBranch>,
    pub by_agent: Vec<GroupShare>,
    pub by_status: Vec<GroupShare>,
}

/// The whole dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub year: i32,
    pub hero: HeroStats,
    pub monthly: Vec<MonthlyPoint>,
    pub top_clients: Vec<RankedEntry>,
    pub top_products: Vec<RankedEntry>,
    pub average_prices: Vec<WeightedAverage>,
    pub basis: Vec<GroupShare>,
    pub geography: Vec<GroupShare>,
    pub record_deals: RecordDeals,
    pub timeline: Vec<TimelinePoint>,
    pub final_stats: FinalStats,
    pub payments: PaymentReport,
    pub supplier_payments: PaymentReport,
    pub purchases: PurchaseReport,
    pub debts: DebtReport,
}

impl DashboardReport {
    pub fn build(snapshot: &Snapshot, options: &DashboardOptions) -> Self {
        let fields = &options.fields;
        let deals = &snapshot.deals;
        Self {
            year: options.year,
            hero: hero_stats(deals, &fields.deals),
            monthly: monthly(deals, &fields.deals, options.offset),
            top_clients: top_clients(deals, &fields.deals, options.top_clients),
            top_products: top_products(deals, &fields.deals, options.top_products),
            average_prices: average_prices(deals, &fields.deals),
            basis: basis_split(deals, &fields.deals),
            geography: geography_split(deals, &fields.deals),
            record_deals: record_deals(deals, &fields.deals, options.offset),
            timeline: timeline(deals, &fields.deals, options.offset),
            final_stats: final_stats(deals, &fields.deals),
            payments: payment_report(&snapshot.payments, &fields.payments, options.offset),
            supplier_payments: payment_report(
                &snapshot.supplier_payments,
                &fields.supplier_payments,
                options.offset,
            ),
            purchases: purchase_report(&snapshot.purchases, &fields.purchases, options.top_suppliers),
            debts: debt_report(&snapshot.debts, &fields.debts),
        }
    }
}

// ========== Deal sections ==========

pub fn hero_stats(deals: &[Record], fields: &DealFields) -> HeroStats {
    HeroStats {
        total_deals: deals.len(),
        total_volume: sum_field(deals, &fields.volume),
        total_revenue: sum_field(deals, &fields.amount),
    }
}

/// Volume and deals per calendar month, January first
pub fn monthly(deals: &[Record], fields: &DealFields, offset: FixedOffset) -> Vec<MonthlyPoint> {
    by_month(deals, &fields.date, offset, &[&fields.volume])
        .into_iter()
        .map(|p| MonthlyPoint {
            month: p.month,
            label: month_name(p.month).to_string(),
            volume: p.sums[0],
            deals: p.count,
        })
        .collect()
}

fn ranked_entries(groups: &Groups, measure: &str, n: usize) -> Vec<RankedEntry> {
    groups
        .top(measure, n)
        .into_iter()
        .map(|g| RankedEntry {
            name: g.key.clone(),
            volume: g.sums[0],
            amount: g.sums.get(1).copied().unwrap_or(0.0),
            deals: g.count,
        })
        .collect()
}

/// Buyers with the largest volume
pub fn top_clients(deals: &[Record], fields: &DealFields, n: usize) -> Vec<RankedEntry> {
    let groups = group_by_field(deals, &fields.buyer, UNSPECIFIED, &[&fields.volume, &fields.amount]);
    ranked_entries(&groups, &fields.volume, n)
}

/// Products with the largest volume
pub fn top_products(deals: &[Record], fields: &DealFields, n: usize) -> Vec<RankedEntry> {
    let groups = group_by_field(deals, &fields.product, UNSPECIFIED, &[&fields.volume, &fields.amount]);
    ranked_entries(&groups, &fields.volume, n)
}

/// Volume-weighted sale price per product
pub fn average_prices(deals: &[Record], fields: &DealFields) -> Vec<WeightedAverage> {
    weighted_average(
        deals,
        |r| r.key_or(&fields.product, UNSPECIFIED),
        &fields.price,
        &fields.volume,
    )
}

/// Volume share per delivery basis
pub fn basis_split(deals: &[Record], fields: &DealFields) -> Vec<GroupShare> {
    group_by_field(deals, &fields.basis, UNSPECIFIED, &[&fields.volume]).shares(&fields.volume)
}

/// Volume share per purchase region
pub fn geography_split(deals: &[Record], fields: &DealFields) -> Vec<GroupShare> {
    group_by_field(deals, &fields.region, UNSPECIFIED, &[&fields.volume]).shares(&fields.volume)
}

fn record_deal(record: &Record, fields: &DealFields, offset: FixedOffset) -> RecordDeal {
    RecordDeal {
        buyer: record.key_or(&fields.buyer, UNSPECIFIED),
        product: record.key_or(&fields.product, UNSPECIFIED),
        basis: record.key_or(&fields.basis, UNSPECIFIED),
        volume: record.number(&fields.volume),
        amount: record.number(&fields.amount),
        date: record.local_date(&fields.date, offset),
    }
}

/// Largest deal by volume and by revenue
pub fn record_deals(deals: &[Record], fields: &DealFields, offset: FixedOffset) -> RecordDeals {
    RecordDeals {
        by_volume: max_by_field(deals, &fields.volume).map(|r| record_deal(r, fields, offset)),
        by_revenue: max_by_field(deals, &fields.amount).map(|r| record_deal(r, fields, offset)),
    }
}

/// Deals, volume and revenue per month, oldest first
pub fn timeline(deals: &[Record], fields: &DealFields, offset: FixedOffset) -> Vec<TimelinePoint> {
    by_year_month(deals, &fields.date, offset, &[&fields.volume, &fields.amount])
        .into_iter()
        .map(|p| TimelinePoint {
            year: p.year,
            month: p.month,
            label: period_label(p.year, p.month),
            deals: p.count,
            volume: p.sums[0],
            revenue: p.sums[1],
        })
        .collect()
}

pub fn final_stats(deals: &[Record], fields: &DealFields) -> FinalStats {
    FinalStats {
        deals: deals.len(),
        volume: sum_field(deals, &fields.volume),
        unique_buyers: distinct_count(deals, &fields.buyer),
    }
}

// ========== Payments ==========

fn status_totals(records: &[&Record], amount_field: &str) -> StatusTotals {
    StatusTotals {
        count: records.len(),
        amount: sum_field(records.iter().copied(), amount_field),
    }
}

/// Status totals, payment-type breakdown and turnaround
pub fn payment_report(payments: &[Record], fields: &PaymentFields, offset: FixedOffset) -> PaymentReport {
    let StatusPartition { paid, unpaid } = partition_by_status(payments, &fields.status);

    let mut by_type = Groups::new(&[&fields.amount]);
    for record in payments {
        let kind = PaymentType::from_cell(record.get(&fields.payment_type));
        by_type.add(kind.as_str().to_string(), record);
    }

    PaymentReport {
        total: payments.len(),
        unrecognized: payments.len() - paid.len() - unpaid.len(),
        paid: status_totals(&paid, &fields.amount),
        unpaid: status_totals(&unpaid, &fields.amount),
        by_type: by_type.shares(&fields.amount),
        turnaround: summarize(payments, fields, offset, UNKNOWN),
    }
}

// ========== Purchases ==========

pub fn purchase_report(purchases: &[Record], fields: &PurchaseFields, top_n: usize) -> PurchaseReport {
    let mut suppliers = Groups::new(&["volume", "cost"]);
    for record in purchases {
        let volume = record.number(&fields.volume);
        let cost = volume * record.number(&fields.price);
        suppliers.add_values(record.key_or(&fields.supplier, UNSPECIFIED), &[volume, cost]);
    }

    let total_volume = suppliers.total("volume");
    let total_cost = suppliers.total("cost");

    PurchaseReport {
        total_purchases: purchases.len(),
        total_volume,
        total_cost,
        average_price: (total_volume != 0.0).then(|| total_cost / total_volume),
        top_suppliers: ranked_entries(&suppliers, "volume", top_n),
        average_prices: weighted_average(
            purchases,
            |r| r.key_or(&fields.product, UNSPECIFIED),
            &fields.price,
            &fields.volume,
        ),
        regions: group_by_field(purchases, &fields.region, UNSPECIFIED, &[&fields.volume])
            .shares(&fields.volume),
    }
}

// ========== Debts ==========

/// Claims grouped by initiator then claim type, largest amount first
pub fn debt_report(debts: &[Record], fields: &DebtFields) -> DebtReport {
    let mut initiators = Groups::new(&[&fields.amount]);
    let mut claim_types: HashMap<String, Groups> = HashMap::new();
    for record in debts {
        let initiator = record.key_or(&fields.initiator, UNKNOWN);
        claim_types
            .entry(initiator.clone())
            .or_insert_with(|| Groups::new(&[&fields.amount]))
            .add(record.key_or(&fields.claim_type, UNKNOWN), record);
        initiators.add(initiator, record);
    }

    let by_initiator = initiators
        .ranked(&fields.amount)
        .into_iter()
        .map(|g| DebtBranch {
            key: g.key.clone(),
            amount: g.sums[0],
            claims: g.count,
            children: claim_types
                .get(&g.key)
                .map(|types| {
                    types
                        .ranked(&fields.amount)
                        .into_iter()
                        .map(|t| DebtBranch {
                            key: t.key.clone(),
                            amount: t.sums[0],
                            claims: t.count,
                            children: Vec::new(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect();

    DebtReport {
        total_amount: initiators.total(&fields.amount),
        total_claims: debts.len(),
        by_initiator,
        by_agent: group_by_field(debts, &fields.agent, UNKNOWN, &[&fields.amount]).shares(&fields.amount),
        by_status: group_by_field(debts, &fields.status, UNKNOWN, &[&fields.amount]).shares(&fields.amount),
    }
}
