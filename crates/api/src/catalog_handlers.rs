use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::{AppState, error::ApiError, middleware::AuthPrincipal};
use storage::{
    MenuCategory, MenuItem, NewRestaurant, Order, OrderLine, Promotion, Restaurant,
    RestaurantUpdate,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuQuery {
    pub restaurant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PromotionQuery {
    /// Only promotions valid right now
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuItemRequest {
    pub restaurant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: MenuCategory,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPromotionRequest {
    pub restaurant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub discount: u8,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub promo_code: Option<String>,
    pub min_order_amount: Option<f64>,
    pub max_discount: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub menu_item_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    pub restaurant_id: String,
    pub items: Vec<OrderLineRequest>,
}

pub async fn list_restaurants(State(state): State<Arc<AppState>>) -> Json<Vec<Restaurant>> {
    Json(state.store.list_restaurants().await)
}

pub async fn get_restaurant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Restaurant>, ApiError> {
    state
        .store
        .restaurant(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Restaurant".to_string()))
}

pub async fn add_restaurant(
    State(state): State<Arc<AppState>>,
    AuthPrincipal(claims): AuthPrincipal,
    payload: Result<Json<NewRestaurant>, JsonRejection>,
) -> Result<(StatusCode, Json<Restaurant>), ApiError> {
    let Json(new) = payload?;

    let restaurant = state.store.add_restaurant(new).await?;
    info!(restaurant_id = %restaurant.id, admin_id = %claims.sub, "restaurant created");

    Ok((StatusCode::CREATED, Json(restaurant)))
}

pub async fn update_restaurant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<RestaurantUpdate>, JsonRejection>,
) -> Result<Json<Restaurant>, ApiError> {
    let Json(update) = payload?;

    Ok(Json(state.store.update_restaurant(&id, update).await?))
}

pub async fn deactivate_restaurant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Restaurant>, ApiError> {
    let restaurant = state.store.deactivate_restaurant(&id).await?;
    info!(restaurant_id = %restaurant.id, "restaurant deactivated");

    Ok(Json(restaurant))
}

pub async fn list_menu(
    State(state): State<Arc<AppState>>,
    query: Result<Query<MenuQuery>, QueryRejection>,
) -> Result<Json<Vec<MenuItem>>, ApiError> {
    let Query(query) = query?;

    Ok(Json(
        state
            .store
            .list_menu_items(query.restaurant_id.as_deref())
            .await,
    ))
}

pub async fn add_menu_item(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewMenuItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MenuItem>), ApiError> {
    let Json(request) = payload?;

    let mut item = MenuItem::new(
        request.restaurant_id,
        request.name.trim().to_string(),
        request.price,
        request.category,
    );
    item.description = request.description;
    item.dietary_tags = request.dietary_tags;

    Ok((StatusCode::CREATED, Json(state.store.add_menu_item(item).await?)))
}

pub async fn list_promotions(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PromotionQuery>, QueryRejection>,
) -> Result<Json<Vec<Promotion>>, ApiError> {
    let Query(query) = query?;
    let active_at = query.active.then(Utc::now);

    Ok(Json(state.store.list_promotions(active_at).await))
}

pub async fn add_promotion(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewPromotionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Promotion>), ApiError> {
    let Json(request) = payload?;

    let mut promotion = Promotion::new(
        request.restaurant_id,
        request.name.trim().to_string(),
        request.discount,
        request.start_date,
        request.end_date,
    );
    promotion.description = request.description;
    promotion.promo_code = request.promo_code.map(|code| code.trim().to_string());
    promotion.min_order_amount = request.min_order_amount;
    promotion.max_discount = request.max_discount;

    Ok((StatusCode::CREATED, Json(state.store.add_promotion(promotion).await?)))
}

pub async fn list_orders(State(state): State<Arc<AppState>>) -> Json<Vec<Order>> {
    Json(state.store.list_orders().await)
}

/// Place an order for the caller; unit prices come from the current menu
pub async fn place_order(
    State(state): State<Arc<AppState>>,
    AuthPrincipal(claims): AuthPrincipal,
    payload: Result<Json<NewOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(request) = payload?;

    let menu = state
        .store
        .list_menu_items(Some(&request.restaurant_id))
        .await;

    let mut lines = Vec::with_capacity(request.items.len());
    for line in request.items {
        if line.quantity == 0 {
            return Err(ApiError::Validation("Quantity must be at least 1.".to_string()));
        }
        let item = menu
            .iter()
            .find(|item| item.id == line.menu_item_id)
            .ok_or_else(|| ApiError::NotFound("Menu item".to_string()))?;

        lines.push(OrderLine {
            menu_item_id: item.id.clone(),
            quantity: line.quantity,
            unit_price: item.price,
        });
    }

    let order = state
        .store
        .add_order(Order::new(claims.sub, request.restaurant_id, lines))
        .await?;
    info!(order_id = %order.id, total = order.total(), "order placed");

    Ok((StatusCode::CREATED, Json(order)))
}
