//! Date-bucketed earnings and delivery statistics for deliverers.
//!
//! Every function takes `now` in the service's configured local offset; day,
//! week (Sunday start) and month boundaries as well as hour-of-day buckets are
//! computed in that offset.

use crate::domain::model::{Order, OrderStatus};
use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Today,
    Week,
    Month,
    All,
}

impl Period {
    /// 無法辨識的值視為 `All`
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("today") => Self::Today,
            Some("week") => Self::Week,
            Some("month") => Self::Month,
            _ => Self::All,
        }
    }

    pub fn cutoff(&self, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::Today => Some(start_of_day(now)),
            Self::Week => Some(now - Duration::days(7)),
            Self::Month => Some(now - Duration::days(30)),
            Self::All => None,
        }
    }
}

pub fn start_of_day(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    now - Duration::seconds(i64::from(now.num_seconds_from_midnight()))
        - Duration::nanoseconds(i64::from(now.nanosecond()))
}

pub fn start_of_week(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    start_of_day(now) - Duration::days(i64::from(now.weekday().num_days_from_sunday()))
}

pub fn start_of_month(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    start_of_day(now) - Duration::days(i64::from(now.day0()))
}

pub fn start_of_previous_month(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    start_of_month(start_of_month(now) - Duration::days(1))
}

fn local(order: &Order, now: &DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    order.created_at.with_timezone(&now.timezone())
}

fn since<'a>(
    orders: &'a [Order],
    from: DateTime<FixedOffset>,
) -> impl Iterator<Item = &'a Order> + 'a {
    orders.iter().filter(move |o| o.created_at >= from)
}

fn sum_earnings<'a>(orders: impl IntoIterator<Item = &'a Order>) -> (f64, usize) {
    orders
        .into_iter()
        .fold((0.0, 0), |(sum, count), o| (sum + o.earnings(), count + 1))
}

fn average(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bucket {
    pub earnings: f64,
    pub orders: usize,
}

impl Bucket {
    fn of<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        let (earnings, orders) = sum_earnings(orders);
        Self { earnings, orders }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyEarnings {
    pub date: String,
    pub earnings: f64,
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyEarnings {
    pub hour: u32,
    pub earnings: f64,
    pub orders: usize,
}

fn daily_buckets(orders: &[Order], now: &DateTime<FixedOffset>) -> BTreeMap<String, Bucket> {
    let mut days: BTreeMap<String, Bucket> = BTreeMap::new();
    for order in orders {
        let key = local(order, now).format("%Y-%m-%d").to_string();
        let bucket = days.entry(key).or_default();
        bucket.earnings += order.earnings();
        bucket.orders += 1;
    }
    days
}

fn hourly_buckets(orders: &[Order], now: &DateTime<FixedOffset>) -> BTreeMap<u32, Bucket> {
    let mut hours: BTreeMap<u32, Bucket> = BTreeMap::new();
    for order in orders {
        let bucket = hours.entry(local(order, now).hour()).or_default();
        bucket.earnings += order.earnings();
        bucket.orders += 1;
    }
    hours
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSummary {
    pub total_earnings: f64,
    pub total_orders: usize,
    pub average_earnings_per_order: f64,
    pub period: Period,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsRow {
    pub id: String,
    pub earnings: f64,
    pub total_cost: f64,
    pub date: DateTime<Utc>,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsReport {
    pub summary: EarningsSummary,
    pub weekly: Bucket,
    pub daily_breakdown: Vec<DailyEarnings>,
    pub orders: Vec<EarningsRow>,
}

pub fn earnings_report(orders: &[Order], period: Period, now: DateTime<FixedOffset>) -> EarningsReport {
    let filtered: Vec<Order> = match period.cutoff(now) {
        Some(cutoff) => since(orders, cutoff).cloned().collect(),
        None => orders.to_vec(),
    };

    let (total_earnings, total_orders) = sum_earnings(&filtered);

    let daily_breakdown = daily_buckets(&filtered, &now)
        .into_iter()
        .map(|(date, b)| DailyEarnings {
            date,
            earnings: b.earnings,
            orders: b.orders,
        })
        .collect();

    // 本週統計不受 period 篩選影響
    let weekly = Bucket::of(since(orders, start_of_week(now)));

    EarningsReport {
        summary: EarningsSummary {
            total_earnings,
            total_orders,
            average_earnings_per_order: average(total_earnings, total_orders),
            period,
        },
        weekly,
        daily_breakdown,
        orders: filtered
            .iter()
            .map(|o| EarningsRow {
                id: o.id.clone(),
                earnings: o.earnings(),
                total_cost: o.total_cost,
                date: o.created_at,
                status: o.status.clone(),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodBuckets {
    pub today: Bucket,
    pub this_week: Bucket,
    pub this_month: Bucket,
    pub last_month: Bucket,
    pub all_time: Bucket,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Growth {
    pub monthly: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Averages {
    pub earnings_per_order: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub best_day: Option<DailyEarnings>,
    pub peak_hour: Option<HourlyEarnings>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsStats {
    pub periods: PeriodBuckets,
    pub growth: Growth,
    pub averages: Averages,
    pub insights: Insights,
    pub hourly_distribution: Vec<HourlyEarnings>,
}

pub fn monthly_growth(this_month: f64, last_month: f64) -> f64 {
    if last_month > 0.0 {
        (this_month - last_month) / last_month * 100.0
    } else if this_month > 0.0 {
        100.0
    } else {
        0.0
    }
}

pub fn earnings_stats(orders: &[Order], now: DateTime<FixedOffset>) -> EarningsStats {
    let this_month_start = start_of_month(now);
    let last_month_start = start_of_previous_month(now);

    let this_month = Bucket::of(since(orders, this_month_start));
    let last_month = Bucket::of(
        orders
            .iter()
            .filter(|o| o.created_at >= last_month_start && o.created_at < this_month_start),
    );
    let all_time = Bucket::of(orders);

    // 同額時取最早的日期 / 時段
    let best_day = daily_buckets(orders, &now)
        .into_iter()
        .fold(None::<DailyEarnings>, |best, (date, b)| {
            let current = best.as_ref().map(|d| d.earnings).unwrap_or(0.0);
            if b.earnings > current {
                Some(DailyEarnings {
                    date,
                    earnings: b.earnings,
                    orders: b.orders,
                })
            } else {
                best
            }
        });

    let hourly_distribution: Vec<HourlyEarnings> = hourly_buckets(orders, &now)
        .into_iter()
        .map(|(hour, b)| HourlyEarnings {
            hour,
            earnings: b.earnings,
            orders: b.orders,
        })
        .collect();

    let peak_hour = hourly_distribution
        .iter()
        .fold(None::<&HourlyEarnings>, |peak, h| {
            let current = peak.map(|p| p.earnings).unwrap_or(0.0);
            if h.earnings > current {
                Some(h)
            } else {
                peak
            }
        })
        .cloned();

    EarningsStats {
        periods: PeriodBuckets {
            today: Bucket::of(since(orders, start_of_day(now))),
            this_week: Bucket::of(since(orders, start_of_week(now))),
            this_month,
            last_month,
            all_time,
        },
        growth: Growth {
            monthly: monthly_growth(this_month.earnings, last_month.earnings),
        },
        averages: Averages {
            earnings_per_order: average(all_time.earnings, all_time.orders),
        },
        insights: Insights {
            best_day,
            peak_hour,
        },
        hourly_distribution,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DeliveryBucket {
    pub deliveries: usize,
    pub earnings: f64,
}

impl DeliveryBucket {
    fn of<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        let (earnings, deliveries) = sum_earnings(orders);
        Self {
            deliveries,
            earnings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_deliveries: usize,
    pub total_earnings: f64,
    pub average_earnings_per_delivery: f64,
    pub average_delivery_time: i64,
    pub completion_rate: f64,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBasedStats {
    pub today: DeliveryBucket,
    pub this_week: DeliveryBucket,
    pub this_month: DeliveryBucket,
    #[serde(rename = "last30Days")]
    pub last_30_days: DeliveryBucket,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakDeliveries {
    pub hour: u32,
    pub deliveries: usize,
    pub earnings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub peak_hour: Option<PeakDeliveries>,
    pub average_delivery_time: i64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub date: DateTime<Utc>,
    pub earnings: f64,
    pub delivery_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub overview: Overview,
    pub time_based_stats: TimeBasedStats,
    pub performance: Performance,
    pub recent_activity: Vec<Activity>,
}

/// 只收錄已送達訂單，完成率固定為 100
pub const COMPLETION_RATE: f64 = 100.0;
/// 評分系統尚未建立前的預設值
pub const DEFAULT_RATING: f64 = 5.0;
const RECENT_ACTIVITY_LIMIT: usize = 10;

pub fn performance_stats(orders: &[Order], now: DateTime<FixedOffset>) -> PerformanceStats {
    let total = DeliveryBucket::of(orders);

    let times: Vec<f64> = orders.iter().filter_map(Order::delivery_minutes).collect();
    let average_delivery_time = if times.is_empty() {
        0
    } else {
        (times.iter().sum::<f64>() / times.len() as f64).round() as i64
    };

    let peak_hour = hourly_buckets(orders, &now)
        .into_iter()
        .fold(None::<PeakDeliveries>, |peak, (hour, b)| {
            let current = peak.as_ref().map(|p| p.deliveries).unwrap_or(0);
            if b.orders > current {
                Some(PeakDeliveries {
                    hour,
                    deliveries: b.orders,
                    earnings: b.earnings,
                })
            } else {
                peak
            }
        });

    PerformanceStats {
        overview: Overview {
            total_deliveries: total.deliveries,
            total_earnings: total.earnings,
            average_earnings_per_delivery: average(total.earnings, total.deliveries),
            average_delivery_time,
            completion_rate: COMPLETION_RATE,
            rating: DEFAULT_RATING,
        },
        time_based_stats: TimeBasedStats {
            today: DeliveryBucket::of(since(orders, start_of_day(now))),
            this_week: DeliveryBucket::of(since(orders, start_of_week(now))),
            this_month: DeliveryBucket::of(since(orders, start_of_month(now))),
            last_30_days: DeliveryBucket::of(since(orders, now - Duration::days(30))),
        },
        performance: Performance {
            peak_hour,
            average_delivery_time,
            completion_rate: COMPLETION_RATE,
        },
        recent_activity: orders
            .iter()
            .take(RECENT_ACTIVITY_LIMIT)
            .map(|o| Activity {
                id: o.id.clone(),
                date: o.created_at,
                earnings: o.earnings(),
                delivery_time: o.delivery_minutes().map(|m| m.round() as i64),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub total_deliveries: usize,
    pub total_earnings: f64,
    pub average_order_value: f64,
}

pub fn history_summary(orders: &[Order]) -> HistorySummary {
    let (total_earnings, total_deliveries) = sum_earnings(orders);
    let total_cost: f64 = orders.iter().map(|o| o.total_cost).sum();
    HistorySummary {
        total_deliveries,
        total_earnings,
        average_order_value: average(total_cost, total_deliveries),
    }
}
