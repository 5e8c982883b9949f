//! Builds currency-normalized reports from the cost store.
use crate::core::convert::{convert, finite_or_zero, round2};
use crate::core::cost::{Category, Currency, StoredCost};
use crate::core::currency::RateProvider;
use crate::core::error::CostError;
use crate::core::store::CostStore;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A single cost inside a monthly report, with its amount converted to the
/// report currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCost {
    pub id: u64,
    pub amount: f64,
    pub currency: Currency,
    pub category: Category,
    pub description: String,
    pub day: u32,
    pub converted_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTotal {
    pub currency: Currency,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub year: i32,
    pub month: u32,
    pub costs: Vec<ReportCost>,
    pub by_category: BTreeMap<Category, f64>,
    pub total: ReportTotal,
}

impl Report {
    pub fn empty(year: i32, month: u32, currency: Currency) -> Self {
        Report {
            year,
            month,
            costs: Vec::new(),
            by_category: BTreeMap::new(),
            total: ReportTotal {
                currency,
                total: 0.0,
            },
        }
    }
}

/// Per-category sums of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    pub month: u32,
    pub totals: BTreeMap<Category, f64>,
}

impl MonthBucket {
    fn zeroed(month: u32) -> Self {
        MonthBucket {
            month,
            totals: Category::ALL.into_iter().map(|c| (c, 0.0)).collect(),
        }
    }

    pub fn total(&self) -> f64 {
        self.totals.values().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualReport {
    pub year: i32,
    pub currency: Currency,
    pub months: Vec<MonthBucket>,
}

impl AnnualReport {
    fn zeroed(year: i32, currency: Currency) -> Self {
        AnnualReport {
            year,
            currency,
            months: (1..=12).map(MonthBucket::zeroed).collect(),
        }
    }

    pub fn category_total(&self, category: Category) -> f64 {
        self.months
            .iter()
            .map(|m| m.totals.get(&category).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn total(&self) -> f64 {
        self.months.iter().map(MonthBucket::total).sum()
    }
}

/// Sums that left the finite range count as 0, like single non-finite amounts.
fn discard_overflowed(sums: &mut BTreeMap<Category, f64>) {
    for (category, sum) in sums.iter_mut() {
        if !sum.is_finite() {
            warn!(%category, "Category sum overflowed, counting it as 0");
            *sum = 0.0;
        }
    }
}

/// Reads the store, absorbing a closed store as "no records".
async fn scan_period(
    store: &dyn CostStore,
    year: i32,
    month: Option<u32>,
) -> Result<Vec<StoredCost>, CostError> {
    let scanned = match month {
        Some(month) => store.scan_by_year_month(year, month).await,
        None => store.scan_by_year(year).await,
    };
    match scanned {
        Ok(costs) => Ok(costs),
        Err(e) if e.is_unavailable() => {
            warn!(error = %e, "Store is not open, reporting an empty period");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Costs of one month converted to `target`, with per-category and grand totals.
///
/// The grand total is rounded to cents; converted amounts of single costs are
/// left as computed. A month without records, or a closed store, gives an
/// empty report.
pub async fn monthly_report(
    store: &dyn CostStore,
    rate_provider: &dyn RateProvider,
    year: i32,
    month: u32,
    target: Currency,
) -> Result<Report, CostError> {
    let costs = scan_period(store, year, Some(month)).await?;
    debug!(year, month, count = costs.len(), "Building monthly report");
    if costs.is_empty() {
        return Ok(Report::empty(year, month, target));
    }

    let rates = rate_provider.resolve_rates().await.into_table();
    let mut report = Report::empty(year, month, target);
    let mut total = 0.0;

    for cost in costs {
        let converted = convert(cost.amount(), cost.currency(), target, &rates);
        let contribution = finite_or_zero(converted);
        if !converted.is_finite() {
            warn!(
                id = cost.id(),
                currency = %cost.currency(),
                "Conversion produced a non-finite amount, counting it as 0"
            );
        }
        total += contribution;
        *report.by_category.entry(cost.category()).or_insert(0.0) += contribution;

        report.costs.push(ReportCost {
            id: cost.id(),
            amount: cost.amount(),
            currency: cost.currency(),
            category: cost.category(),
            description: cost.description().to_string(),
            day: cost.day(),
            converted_amount: converted,
        });
    }

    discard_overflowed(&mut report.by_category);
    if !total.is_finite() {
        warn!(year, month, "Monthly total overflowed, counting it as 0");
    }
    report.total.total = round2(finite_or_zero(total));
    Ok(report)
}

/// Twelve month buckets of per-category sums for `year`, all in `target`.
///
/// Rates are resolved once and shared by every month.
pub async fn annual_by_category(
    store: &dyn CostStore,
    rate_provider: &dyn RateProvider,
    year: i32,
    target: Currency,
) -> Result<AnnualReport, CostError> {
    let costs = scan_period(store, year, None).await?;
    debug!(year, count = costs.len(), "Building annual report");

    let mut report = AnnualReport::zeroed(year, target);
    if costs.is_empty() {
        return Ok(report);
    }
    let rates = rate_provider.resolve_rates().await.into_table();

    for cost in costs {
        let bucket = cost
            .month()
            .checked_sub(1)
            .and_then(|index| report.months.get_mut(index as usize));
        let Some(bucket) = bucket else {
            debug!(
                id = cost.id(),
                month = cost.month(),
                "Dropping cost with month out of range"
            );
            continue;
        };
        let converted =
            finite_or_zero(convert(cost.amount(), cost.currency(), target, &rates));
        *bucket.totals.entry(cost.category()).or_insert(0.0) += converted;
    }
    for bucket in &mut report.months {
        discard_overflowed(&mut bucket.totals);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cost::{FixedClock, MAX_AMOUNT, NewCost};
    use crate::core::currency::{FallbackReason, RateResolution, RateTable};
    use crate::store::memory::MemoryCostStore;
    use async_trait::async_trait;
    use chrono::{DateTime, FixedOffset};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockRates {
        resolution: RateResolution,
        call_count: AtomicUsize,
    }

    impl MockRates {
        fn default_rates() -> Self {
            Self::new(RateResolution::UsedDefault(FallbackReason::NotConfigured))
        }

        fn new(resolution: RateResolution) -> Self {
            Self {
                resolution,
                call_count: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateProvider for MockRates {
        async fn resolve_rates(&self) -> RateResolution {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.resolution.clone()
        }
    }

    /// Store serving a fixed list of records.
    struct CannedStore(Vec<StoredCost>);

    #[async_trait]
    impl CostStore for CannedStore {
        async fn insert(&self, _cost: NewCost) -> Result<StoredCost, CostError> {
            Err(CostError::Storage("read only".to_string()))
        }

        async fn delete(&self, _id: u64) -> Result<bool, CostError> {
            Ok(false)
        }

        async fn scan_all(&self) -> Result<Vec<StoredCost>, CostError> {
            Ok(self.0.clone())
        }

        async fn close(&self) {}
    }

    fn at(ts: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(ts).unwrap()
    }

    fn store_at(ts: &str) -> MemoryCostStore {
        MemoryCostStore::with_clock(Arc::new(FixedClock(at(ts))))
    }

    fn cost(amount: f64, currency: Currency, category: Category) -> NewCost {
        NewCost::new(amount, currency, category, "test")
    }

    #[tokio::test]
    async fn test_monthly_report_single_usd_cost() {
        let store = store_at("2024-03-10T09:00:00+00:00");
        store
            .insert(NewCost::new(100.0, Currency::Usd, Category::Food, "lunch"))
            .await
            .unwrap();
        let rates = MockRates::default_rates();

        let report = monthly_report(&store, &rates, 2024, 3, Currency::Usd)
            .await
            .unwrap();

        assert_eq!(report.year, 2024);
        assert_eq!(report.month, 3);
        assert_eq!(report.total.total, 100.0);
        assert_eq!(report.total.currency, Currency::Usd);
        assert_eq!(report.costs.len(), 1);
        assert_eq!(report.costs[0].category, Category::Food);
        assert_eq!(report.costs[0].description, "lunch");
        assert_eq!(report.costs[0].day, 10);
        assert_eq!(report.by_category.get(&Category::Food), Some(&100.0));
        assert_eq!(rates.calls(), 1);
    }

    #[tokio::test]
    async fn test_monthly_report_converts_shekels() {
        let store = store_at("2024-05-02T09:00:00+03:00");
        store
            .insert(cost(340.0, Currency::Ils, Category::Housing))
            .await
            .unwrap();
        let rates = MockRates::default_rates();

        let report = monthly_report(&store, &rates, 2024, 5, Currency::Usd)
            .await
            .unwrap();

        assert_eq!(report.total.total, 100.0);
        assert!((report.costs[0].converted_amount - 100.0).abs() < 1e-9);
        assert_eq!(report.costs[0].amount, 340.0);
        assert_eq!(report.costs[0].currency, Currency::Ils);
    }

    #[tokio::test]
    async fn test_monthly_report_groups_by_category_and_rounds_total() {
        let store = store_at("2024-07-20T12:00:00+00:00");
        for c in [
            cost(10.0, Currency::Usd, Category::Food),
            cost(3.4, Currency::Ils, Category::Food),
            cost(0.6, Currency::Gbp, Category::Travel),
            cost(1.0, Currency::Ils, Category::Other),
        ] {
            store.insert(c).await.unwrap();
        }
        let rates = MockRates::default_rates();

        let report = monthly_report(&store, &rates, 2024, 7, Currency::Usd)
            .await
            .unwrap();

        assert_eq!(report.costs.len(), 4);
        assert_eq!(report.by_category.len(), 3);
        assert!((report.by_category[&Category::Food] - 11.0).abs() < 1e-9);
        assert!((report.by_category[&Category::Travel] - 1.0).abs() < 1e-9);
        // 10 + 1 + 1 + 0.294117... rounds to 12.29
        assert_eq!(report.total.total, 12.29);
        assert_eq!(rates.calls(), 1);
    }

    #[tokio::test]
    async fn test_monthly_report_uses_fetched_rates() {
        let store = store_at("2024-07-20T12:00:00+00:00");
        store
            .insert(cost(50.0, Currency::Usd, Category::Health))
            .await
            .unwrap();
        let table: RateTable = [("USD".to_string(), 1.0), ("ILS".to_string(), 4.0)]
            .into_iter()
            .collect();
        let rates = MockRates::new(RateResolution::Fetched(table));

        let report = monthly_report(&store, &rates, 2024, 7, Currency::Ils)
            .await
            .unwrap();

        assert_eq!(report.total.total, 200.0);
        assert_eq!(report.total.currency, Currency::Ils);
    }

    #[tokio::test]
    async fn test_monthly_report_empty_month() {
        let store = store_at("2024-03-10T09:00:00+00:00");
        store
            .insert(cost(5.0, Currency::Usd, Category::Food))
            .await
            .unwrap();
        let rates = MockRates::default_rates();

        let report = monthly_report(&store, &rates, 2024, 4, Currency::Gbp)
            .await
            .unwrap();

        assert!(report.costs.is_empty());
        assert!(report.by_category.is_empty());
        assert_eq!(report.total.total, 0.0);
        assert_eq!(report.total.currency, Currency::Gbp);
        assert_eq!(rates.calls(), 0);
    }

    #[tokio::test]
    async fn test_monthly_report_on_closed_store_is_empty() {
        let store = store_at("2024-03-10T09:00:00+00:00");
        store
            .insert(cost(5.0, Currency::Usd, Category::Food))
            .await
            .unwrap();
        store.close().await;
        let rates = MockRates::default_rates();

        let report = monthly_report(&store, &rates, 2024, 3, Currency::Usd)
            .await
            .unwrap();

        assert_eq!(report, Report::empty(2024, 3, Currency::Usd));
    }

    #[tokio::test]
    async fn test_zero_rate_never_reaches_totals() {
        let store = store_at("2024-03-10T09:00:00+00:00");
        store
            .insert(cost(5.0, Currency::Gbp, Category::Food))
            .await
            .unwrap();
        store
            .insert(cost(7.0, Currency::Usd, Category::Food))
            .await
            .unwrap();
        let table: RateTable = [("USD".to_string(), 1.0), ("GBP".to_string(), 0.0)]
            .into_iter()
            .collect();
        let rates = MockRates::new(RateResolution::Fetched(table));

        let report = monthly_report(&store, &rates, 2024, 3, Currency::Usd)
            .await
            .unwrap();
        assert_eq!(report.total.total, 7.0);
        assert_eq!(report.by_category[&Category::Food], 7.0);
        assert!(
            report
                .costs
                .iter()
                .any(|c| !c.converted_amount.is_finite())
        );

        let annual = annual_by_category(&store, &rates, 2024, Currency::Usd)
            .await
            .unwrap();
        assert_eq!(annual.months[2].totals[&Category::Food], 7.0);
        assert!(annual.total().is_finite());
    }

    #[tokio::test]
    async fn test_overflowing_sums_never_reach_totals() {
        // Records past the insert limit can still come from an older store.
        let huge = |id| {
            StoredCost::stamp(
                id,
                cost(1e308, Currency::Usd, Category::Food),
                at("2024-03-10T09:00:00+00:00"),
            )
        };
        let store = CannedStore(vec![huge(1), huge(2)]);
        let rates = MockRates::default_rates();

        let report = monthly_report(&store, &rates, 2024, 3, Currency::Usd)
            .await
            .unwrap();
        assert_eq!(report.total.total, 0.0);
        assert_eq!(report.by_category[&Category::Food], 0.0);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total"]["total"], 0.0);

        let annual = annual_by_category(&store, &rates, 2024, Currency::Usd)
            .await
            .unwrap();
        assert_eq!(annual.months[2].totals[&Category::Food], 0.0);
        assert!(annual.total().is_finite());
    }

    #[tokio::test]
    async fn test_largest_accepted_amounts_stay_finite() {
        let store = store_at("2024-03-10T09:00:00+00:00");
        for _ in 0..2 {
            store
                .insert(cost(MAX_AMOUNT, Currency::Usd, Category::Food))
                .await
                .unwrap();
        }
        let rates = MockRates::default_rates();

        let report = monthly_report(&store, &rates, 2024, 3, Currency::Ils)
            .await
            .unwrap();
        assert!((report.total.total - 2.0 * MAX_AMOUNT * 3.4).abs() < 1.0);
        assert!(report.costs.iter().all(|c| c.converted_amount.is_finite()));
    }

    #[tokio::test]
    async fn test_annual_places_costs_in_their_month() {
        let march = store_at("2024-03-05T10:00:00+00:00");
        let november = MemoryCostStore::with_clock(Arc::new(FixedClock(at(
            "2024-11-28T10:00:00+00:00",
        ))));
        let mut records = Vec::new();
        records.push(march.insert(cost(20.0, Currency::Usd, Category::Food)).await.unwrap());
        records.push(march.insert(cost(6.8, Currency::Ils, Category::Travel)).await.unwrap());
        records.push(november.insert(cost(0.7, Currency::Eur, Category::Food)).await.unwrap());
        records.push(november.insert(cost(1.2, Currency::Gbp, Category::Education)).await.unwrap());
        let last_year = MemoryCostStore::with_clock(Arc::new(FixedClock(at(
            "2023-03-05T10:00:00+00:00",
        ))));
        records.push(last_year.insert(cost(999.0, Currency::Usd, Category::Food)).await.unwrap());
        let store = CannedStore(records.clone());
        let rates = MockRates::default_rates();

        let annual = annual_by_category(&store, &rates, 2024, Currency::Usd)
            .await
            .unwrap();

        assert_eq!(rates.calls(), 1);
        assert_eq!(annual.months.len(), 12);
        for (index, bucket) in annual.months.iter().enumerate() {
            assert_eq!(bucket.month, index as u32 + 1);
            assert_eq!(bucket.totals.len(), Category::ALL.len());
        }
        assert!((annual.months[2].totals[&Category::Food] - 20.0).abs() < 1e-9);
        assert!((annual.months[2].totals[&Category::Travel] - 2.0).abs() < 1e-9);
        assert!((annual.months[10].totals[&Category::Food] - 1.0).abs() < 1e-9);
        assert!((annual.months[10].totals[&Category::Education] - 2.0).abs() < 1e-9);
        assert_eq!(annual.months[0].total(), 0.0);

        // Bucket sums agree with filtering the records by hand.
        let rates_table = RateTable::builtin();
        for category in Category::ALL {
            let expected: f64 = records
                .iter()
                .filter(|c| c.year() == 2024 && c.category() == category)
                .map(|c| convert(c.amount(), c.currency(), Currency::Usd, &rates_table))
                .sum();
            assert!((annual.category_total(category) - expected).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_annual_drops_months_out_of_range() {
        let store = store_at("2024-06-01T10:00:00+00:00");
        let good = store
            .insert(cost(10.0, Currency::Usd, Category::Food))
            .await
            .unwrap();
        let zero = good.clone().with_period_for_test(2024, 0);
        let thirteen = good.clone().with_period_for_test(2024, 13);
        let canned = CannedStore(vec![good, zero, thirteen]);
        let rates = MockRates::default_rates();

        let annual = annual_by_category(&canned, &rates, 2024, Currency::Usd)
            .await
            .unwrap();

        assert_eq!(annual.total(), 10.0);
        assert_eq!(annual.months[5].totals[&Category::Food], 10.0);
    }

    #[tokio::test]
    async fn test_annual_empty_year_is_all_zero() {
        let store = store_at("2024-06-01T10:00:00+00:00");
        store.close().await;
        let rates = MockRates::default_rates();

        let annual = annual_by_category(&store, &rates, 2024, Currency::Eur)
            .await
            .unwrap();

        assert_eq!(annual.months.len(), 12);
        assert_eq!(annual.total(), 0.0);
        assert_eq!(annual.currency, Currency::Eur);
        assert_eq!(rates.calls(), 0);
    }

    #[test]
    fn test_report_json_shape() {
        let mut report = Report::empty(2024, 3, Currency::Usd);
        report.costs.push(ReportCost {
            id: 1,
            amount: 340.0,
            currency: Currency::Ils,
            category: Category::Food,
            description: "groceries".to_string(),
            day: 4,
            converted_amount: 100.0,
        });
        report.by_category.insert(Category::Food, 100.0);
        report.total.total = 100.0;

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["costs"][0]["convertedAmount"], 100.0);
        assert_eq!(json["costs"][0]["currency"], "ILS");
        assert_eq!(json["byCategory"]["FOOD"], 100.0);
        assert_eq!(json["total"]["currency"], "USD");
        assert_eq!(json["total"]["total"], 100.0);
    }
}
