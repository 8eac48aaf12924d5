use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of restaurant, menu item and promotion names
pub const MAX_NAME_LENGTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestaurantStatus {
    #[default]
    Active,
    Inactive,
    Closed,
    OnBreak,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub cuisine: Option<String>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub status: RestaurantStatus,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRestaurant {
    pub name: String,
    pub description: Option<String>,
    pub cuisine: Option<String>,
    #[serde(default)]
    pub location: Location,
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cuisine: Option<String>,
    pub location: Option<Location>,
}

impl Restaurant {
    pub fn new(new: NewRestaurant) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            description: new.description,
            cuisine: new.cuisine,
            location: new.location,
            status: RestaurantStatus::Active,
            owner_id: new.owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RestaurantStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuCategory {
    Appetizer,
    Main,
    Dessert,
    Beverage,
    Side,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuItemStatus {
    #[default]
    Active,
    Inactive,
    Seasonal,
    SoldOut,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: MenuCategory,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    #[serde(default)]
    pub status: MenuItemStatus,
    pub created_at: DateTime<Utc>,
}

impl MenuItem {
    pub fn new(restaurant_id: String, name: String, price: f64, category: MenuCategory) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            restaurant_id,
            name,
            description: None,
            price,
            category,
            dietary_tags: Vec::new(),
            status: MenuItemStatus::Active,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Percentage, 1 to 100
    pub discount: u8,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub promo_code: Option<String>,
    pub min_order_amount: Option<f64>,
    pub max_discount: Option<f64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Promotion {
    pub fn new(
        restaurant_id: String,
        name: String,
        discount: u8,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            restaurant_id,
            name,
            description: None,
            discount,
            start_date,
            end_date,
            promo_code: None,
            min_order_amount: None,
            max_discount: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Active and inside its date window at `now` (both ends inclusive)
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.start_date <= now && now <= self.end_date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub menu_item_id: String,
    pub quantity: u32,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub restaurant_id: String,
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(user_id: String, restaurant_id: String, items: Vec<OrderLine>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            restaurant_id,
            items,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn total(&self) -> f64 {
        self.items
            .iter()
            .map(|line| line.unit_price * f64::from(line.quantity))
            .sum()
    }
}

/// Editable profile fields; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(alias = "userName")]
    pub display_name: Option<String>,
    pub mob_num: Option<String>,
    pub address: Option<String>,
    pub dob: Option<NaiveDate>,
}
