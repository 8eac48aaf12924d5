use chrono::{DateTime, Utc};

use crate::model::{
    MenuItem, NewRestaurant, Order, Promotion, Restaurant, RestaurantStatus, RestaurantUpdate,
    MAX_NAME_LENGTH,
};
use crate::store::MemoryStore;
use crate::{Result, StorageError};

fn check_name(kind: &str, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StorageError::Validation(format!("{kind} name is required.")));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(StorageError::Validation(format!(
            "{kind} name cannot exceed {MAX_NAME_LENGTH} characters."
        )));
    }
    Ok(())
}

fn sorted_by_creation<T>(mut items: Vec<T>, key: impl Fn(&T) -> (DateTime<Utc>, String)) -> Vec<T> {
    items.sort_by_key(|item| key(item));
    items
}

impl MemoryStore {
    /// All restaurants, oldest first
    pub async fn list_restaurants(&self) -> Vec<Restaurant> {
        let restaurants: Vec<Restaurant> = self.read(|c| c.restaurants.values().cloned().collect()).await;
        sorted_by_creation(restaurants, |r: &Restaurant| (r.created_at, r.id.clone()))
    }

    pub async fn restaurant(&self, id: &str) -> Option<Restaurant> {
        self.read(|c| c.restaurants.get(id).cloned()).await
    }

    pub async fn add_restaurant(&self, new: NewRestaurant) -> Result<Restaurant> {
        check_name("Restaurant", &new.name)?;
        let restaurant = Restaurant::new(new);

        self.mutate(|c| {
            c.restaurants.insert(restaurant.id.clone(), restaurant.clone());
            Ok(restaurant)
        })
        .await
    }

    pub async fn update_restaurant(&self, id: &str, update: RestaurantUpdate) -> Result<Restaurant> {
        if let Some(name) = &update.name {
            check_name("Restaurant", name)?;
        }

        self.mutate(|c| {
            let restaurant = c
                .restaurants
                .get_mut(id)
                .ok_or_else(|| StorageError::NotFound("Restaurant".to_string()))?;

            if let Some(name) = update.name {
                restaurant.name = name.trim().to_string();
            }
            if let Some(description) = update.description {
                restaurant.description = Some(description);
            }
            if let Some(cuisine) = update.cuisine {
                restaurant.cuisine = Some(cuisine);
            }
            if let Some(location) = update.location {
                restaurant.location = location;
            }
            restaurant.updated_at = Utc::now();

            Ok(restaurant.clone())
        })
        .await
    }

    /// Mark a restaurant inactive; records are never deleted
    pub async fn deactivate_restaurant(&self, id: &str) -> Result<Restaurant> {
        self.mutate(|c| {
            let restaurant = c
                .restaurants
                .get_mut(id)
                .ok_or_else(|| StorageError::NotFound("Restaurant".to_string()))?;

            restaurant.status = RestaurantStatus::Inactive;
            restaurant.updated_at = Utc::now();

            Ok(restaurant.clone())
        })
        .await
    }

    /// Menu items, optionally narrowed to one restaurant
    pub async fn list_menu_items(&self, restaurant_id: Option<&str>) -> Vec<MenuItem> {
        let items: Vec<MenuItem> = self
            .read(|c| {
                c.menu_items
                    .values()
                    .filter(|item| restaurant_id.is_none_or(|id| item.restaurant_id == id))
                    .cloned()
                    .collect()
            })
            .await;
        sorted_by_creation(items, |m: &MenuItem| (m.created_at, m.id.clone()))
    }

    pub async fn add_menu_item(&self, item: MenuItem) -> Result<MenuItem> {
        check_name("Item", &item.name)?;
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(StorageError::Validation("Price cannot be negative.".to_string()));
        }

        self.mutate(|c| {
            if !c.restaurants.contains_key(&item.restaurant_id) {
                return Err(StorageError::NotFound("Restaurant".to_string()));
            }
            c.menu_items.insert(item.id.clone(), item.clone());
            Ok(item)
        })
        .await
    }

    /// Promotions; with `active_at`, only those valid at that instant
    pub async fn list_promotions(&self, active_at: Option<DateTime<Utc>>) -> Vec<Promotion> {
        let promotions: Vec<Promotion> = self
            .read(|c| {
                c.promotions
                    .values()
                    .filter(|p| active_at.is_none_or(|now| p.is_valid_at(now)))
                    .cloned()
                    .collect()
            })
            .await;
        sorted_by_creation(promotions, |p: &Promotion| (p.created_at, p.id.clone()))
    }

    pub async fn add_promotion(&self, promotion: Promotion) -> Result<Promotion> {
        check_name("Promotion", &promotion.name)?;
        if !(1..=100).contains(&promotion.discount) {
            return Err(StorageError::Validation(
                "Discount must be between 1% and 100%.".to_string(),
            ));
        }
        if promotion.start_date >= promotion.end_date {
            return Err(StorageError::Validation(
                "Start date must be before end date.".to_string(),
            ));
        }

        self.mutate(|c| {
            if !c.restaurants.contains_key(&promotion.restaurant_id) {
                return Err(StorageError::NotFound("Restaurant".to_string()));
            }
            if let Some(code) = &promotion.promo_code {
                let taken = c
                    .promotions
                    .values()
                    .any(|p| p.promo_code.as_deref().is_some_and(|other| other.eq_ignore_ascii_case(code)));
                if taken {
                    return Err(StorageError::Validation(format!(
                        "Promo code {code} is already in use."
                    )));
                }
            }
            c.promotions.insert(promotion.id.clone(), promotion.clone());
            Ok(promotion)
        })
        .await
    }

    /// All orders, oldest first
    pub async fn list_orders(&self) -> Vec<Order> {
        let orders: Vec<Order> = self.read(|c| c.orders.values().cloned().collect()).await;
        sorted_by_creation(orders, |o: &Order| (o.created_at, o.id.clone()))
    }

    pub async fn add_order(&self, order: Order) -> Result<Order> {
        if order.items.is_empty() {
            return Err(StorageError::Validation("An order needs at least one item.".to_string()));
        }

        self.mutate(|c| {
            if !c.principals.contains_key(&order.user_id) {
                return Err(StorageError::NotFound("User".to_string()));
            }
            if !c.restaurants.contains_key(&order.restaurant_id) {
                return Err(StorageError::NotFound("Restaurant".to_string()));
            }
            c.orders.insert(order.id.clone(), order.clone());
            Ok(order)
        })
        .await
    }
}
