use crate::app::auth::Caller;
use crate::app::state::AppState;
use crate::core::earnings::{
    earnings_report, earnings_stats, history_summary, performance_stats, EarningsReport,
    EarningsStats, HistorySummary, Period, PerformanceStats, DEFAULT_RATING,
};
use crate::domain::model::{DelivererDetails, Order, User, UserUpdate};
use crate::utils::error::{FoodError, Result};
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const UNKNOWN_CUSTOMER: &str = "Unknown Customer";

#[derive(Debug, Default, Deserialize)]
pub struct EarningsQuery {
    pub period: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryOrder {
    #[serde(flatten)]
    pub order: Order,
    pub customer_name: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub orders: Vec<HistoryOrder>,
    pub summary: HistorySummary,
}

#[derive(Debug, Serialize)]
struct HistoryCsvRow<'a> {
    id: &'a str,
    delivered_at: Option<DateTime<Utc>>,
    customer_name: &'a str,
    delivery_address: &'a str,
    items: usize,
    total_cost: f64,
    delivery_fee: f64,
}

#[derive(Debug, Serialize)]
pub struct DelivererProfile {
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub email: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(flatten)]
    pub details: DelivererDetails,
    pub is_available: bool,
    pub rating: f64,
    pub total_deliveries: usize,
    pub total_earnings: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DelivererUpdate {
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub vehicle_type: Option<String>,
    pub license_plate: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub delivery_radius: Option<f64>,
    pub preferred_hours_start: Option<String>,
    pub preferred_hours_end: Option<String>,
    pub accepts_cash: Option<bool>,
    pub accepts_card: Option<bool>,
}

impl DelivererUpdate {
    fn validate(&self) -> Result<()> {
        if let Some(radius) = self.delivery_radius {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(FoodError::BadRequest(
                    "delivery_radius must be positive".to_string(),
                ));
            }
        }
        for (field, value) in [
            ("preferred_hours_start", &self.preferred_hours_start),
            ("preferred_hours_end", &self.preferred_hours_end),
        ] {
            if let Some(value) = value {
                NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
                    FoodError::BadRequest(format!("{} must use HH:MM, got '{}'", field, value))
                })?;
            }
        }
        Ok(())
    }

    fn apply(self, details: &mut DelivererDetails) -> UserUpdate {
        if self.phone.is_some() {
            details.phone = self.phone;
        }
        if self.vehicle_type.is_some() {
            details.vehicle_type = self.vehicle_type;
        }
        if self.license_plate.is_some() {
            details.license_plate = self.license_plate;
        }
        if self.emergency_contact_name.is_some() {
            details.emergency_contact_name = self.emergency_contact_name;
        }
        if self.emergency_contact_phone.is_some() {
            details.emergency_contact_phone = self.emergency_contact_phone;
        }
        if let Some(v) = self.delivery_radius {
            details.delivery_radius = v;
        }
        if let Some(v) = self.preferred_hours_start {
            details.preferred_hours_start = v;
        }
        if let Some(v) = self.preferred_hours_end {
            details.preferred_hours_end = v;
        }
        if let Some(v) = self.accepts_cash {
            details.accepts_cash = v;
        }
        if let Some(v) = self.accepts_card {
            details.accepts_card = v;
        }
        UserUpdate {
            name: self.full_name,
            address: self.address,
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AvailabilityChanged {
    pub success: bool,
    pub availability_status: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityView {
    pub availability_status: bool,
    pub last_availability_change: Option<DateTime<Utc>>,
}

/// GET /api/delivery/earnings?period=today|week|month|all
pub async fn earnings(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<EarningsQuery>,
) -> Result<Json<EarningsReport>> {
    caller.require_deliverer(&state).await?;
    let orders = state.store.delivered_orders(caller.id()).await?;
    let period = Period::parse(query.period.as_deref());
    Ok(Json(earnings_report(&orders, period, state.now())))
}

/// GET /api/delivery/earnings/stats
pub async fn earnings_statistics(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<EarningsStats>> {
    caller.require_deliverer(&state).await?;
    let orders = state.store.delivered_orders(caller.id()).await?;
    Ok(Json(earnings_stats(&orders, state.now())))
}

async fn customer_names(state: &AppState, orders: &[Order]) -> HashMap<String, String> {
    let mut names = HashMap::new();
    for shopper_id in orders.iter().filter_map(|o| o.shopper_id.as_deref()) {
        if names.contains_key(shopper_id) {
            continue;
        }
        // 查詢失敗只影響顯示名稱
        match state.store.get_user(shopper_id).await {
            Ok(Some(user)) if !user.name.trim().is_empty() => {
                names.insert(shopper_id.to_string(), user.name);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("⚠️ Failed to load customer {}: {}", shopper_id, e),
        }
    }
    names
}

fn history_csv(orders: &[HistoryOrder]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in orders {
        writer.serialize(HistoryCsvRow {
            id: &row.order.id,
            delivered_at: row.order.delivered_at,
            customer_name: &row.customer_name,
            delivery_address: row.order.delivery_address.as_deref().unwrap_or_default(),
            items: row.order.order_items.len(),
            total_cost: row.order.total_cost,
            delivery_fee: row.order.earnings(),
        })?;
    }
    writer.into_inner().map_err(|e| e.into_error().into())
}

/// GET /api/delivery/history (`?format=csv` 匯出 CSV)
pub async fn history(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<HistoryQuery>,
) -> Result<Response> {
    caller.require_deliverer(&state).await?;
    let orders = state.store.delivered_orders(caller.id()).await?;
    let summary = history_summary(&orders);
    let names = customer_names(&state, &orders).await;

    let orders: Vec<HistoryOrder> = orders
        .into_iter()
        .map(|order| {
            let customer_name = order
                .shopper_id
                .as_ref()
                .and_then(|id| names.get(id))
                .cloned()
                .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string());
            HistoryOrder {
                order,
                customer_name,
            }
        })
        .collect();

    if query.format.as_deref() == Some("csv") {
        let body = history_csv(&orders)?;
        tracing::info!("📄 Exported {} deliveries as CSV for {}", orders.len(), caller.id());
        return Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"delivery-history.csv\"",
                ),
            ],
            body,
        )
            .into_response());
    }

    Ok(Json(HistoryResponse { orders, summary }).into_response())
}

fn profile_view(
    user: User,
    email: Option<String>,
    details: DelivererDetails,
    orders: &[Order],
) -> DelivererProfile {
    DelivererProfile {
        full_name: user.name.clone(),
        id: user.id,
        name: user.name,
        email,
        address: user.address,
        city: user.city,
        state: user.state,
        zip: user.zip,
        is_available: details.availability_status,
        details,
        rating: DEFAULT_RATING,
        total_deliveries: orders.len(),
        total_earnings: orders.iter().map(Order::earnings).sum(),
    }
}

/// GET /api/delivery/profile
pub async fn get_profile(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<DelivererProfile>> {
    let user = caller.require_deliverer(&state).await?;
    let details = state.store.get_deliverer_details(caller.id()).await?;
    let orders = state.store.delivered_orders(caller.id()).await?;
    Ok(Json(profile_view(user, caller.0.email.clone(), details, &orders)))
}

/// PUT /api/delivery/profile
pub async fn update_profile(
    State(state): State<AppState>,
    caller: Caller,
    Json(update): Json<DelivererUpdate>,
) -> Result<Json<DelivererProfile>> {
    caller.require_deliverer(&state).await?;
    update.validate()?;

    let mut details = state.store.get_deliverer_details(caller.id()).await?;
    let user_update = update.apply(&mut details);
    details.user_id = caller.id().to_string();

    let user = state
        .store
        .update_user(caller.id(), user_update)
        .await?
        .ok_or_else(|| FoodError::NotFound("Profile not found".to_string()))?;
    let details = state.store.put_deliverer_details(details).await?;
    let orders = state.store.delivered_orders(caller.id()).await?;

    tracing::info!("🚚 Updated deliverer profile for {}", caller.id());
    Ok(Json(profile_view(user, caller.0.email.clone(), details, &orders)))
}

/// GET /api/delivery/profile/stats
pub async fn profile_stats(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<PerformanceStats>> {
    caller.require_deliverer(&state).await?;
    let orders = state.store.delivered_orders(caller.id()).await?;
    Ok(Json(performance_stats(&orders, state.now())))
}

/// GET /api/delivery/profile/availability
pub async fn get_availability(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<AvailabilityView>> {
    caller.require_deliverer(&state).await?;
    let details = state.store.get_deliverer_details(caller.id()).await?;
    Ok(Json(AvailabilityView {
        availability_status: details.availability_status,
        last_availability_change: details.last_availability_change,
    }))
}

pub fn availability_message(available: bool) -> &'static str {
    if available {
        "You are now available for deliveries"
    } else {
        "You are now offline"
    }
}

/// POST /api/delivery/profile/availability
pub async fn set_availability(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<Value>,
) -> Result<Json<AvailabilityChanged>> {
    caller.require_deliverer(&state).await?;
    let Some(available) = body.get("availability_status").and_then(Value::as_bool) else {
        return Err(FoodError::BadRequest(
            "availability_status must be a boolean".to_string(),
        ));
    };

    let mut details = state.store.get_deliverer_details(caller.id()).await?;
    details.availability_status = available;
    details.last_availability_change = Some(Utc::now());
    state.store.put_deliverer_details(details).await?;

    tracing::info!(
        "🚦 Deliverer {} is now {}",
        caller.id(),
        if available { "available" } else { "offline" }
    );
    Ok(Json(AvailabilityChanged {
        success: true,
        availability_status: available,
        message: availability_message(available).to_string(),
    }))
}
