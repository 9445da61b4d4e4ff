//! 购物车注册表
//!
//! 进程内唯一的购物车集合，所有修改都在同一把互斥锁下完成。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tracing::{info, warn};

use super::model::{AddOutcome, Cart, CartError, CartId, ItemChange};

/// 对未知购物车 ID 调用添加操作时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownCartPolicy {
    /// 静默创建新购物车并返回新 ID
    #[default]
    CreateNew,
    /// 返回 `CartNotFound`，只有未提供 ID 时才创建
    Reject,
}

#[derive(Clone, Default)]
pub struct CartRegistry {
    carts: Arc<Mutex<HashMap<CartId, Cart>>>,
    policy: UnknownCartPolicy,
}

impl CartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: UnknownCartPolicy) -> Self {
        Self {
            carts: Arc::default(),
            policy,
        }
    }

    /// 注册一个空购物车并返回其 ID
    pub fn create_cart(&self) -> CartId {
        let cart_id = CartId::generate();
        self.carts.lock().insert(cart_id.clone(), Cart::new());
        info!("创建购物车: {}", cart_id);
        cart_id
    }

    /// 向购物车添加商品
    ///
    /// 返回的 `cart_id` 可能与传入的不同，调用方后续操作必须使用返回值。
    pub fn add_item(
        &self,
        cart_id: Option<&CartId>,
        product_id: &str,
        quantity: i64,
    ) -> Result<AddOutcome, CartError> {
        let mut carts = self.carts.lock();

        let (effective_id, created) = match cart_id {
            Some(id) if carts.contains_key(id) => (id.clone(), false),
            Some(id) => {
                if self.policy == UnknownCartPolicy::Reject {
                    return Err(CartError::CartNotFound);
                }
                let fresh = CartId::generate();
                warn!("购物车 {} 不存在，已创建新购物车 {}", id, fresh);
                (fresh, true)
            }
            None => {
                let fresh = CartId::generate();
                info!("创建购物车: {}", fresh);
                (fresh, true)
            }
        };

        carts
            .entry(effective_id.clone())
            .or_insert_with(Cart::new)
            .add(product_id, quantity);

        Ok(AddOutcome {
            cart_id: effective_id,
            created,
        })
    }

    pub fn decrement_or_remove_item(
        &self,
        cart_id: &CartId,
        product_id: &str,
        quantity: i64,
    ) -> Result<ItemChange, CartError> {
        let mut carts = self.carts.lock();
        let cart = carts.get_mut(cart_id).ok_or(CartError::CartNotFound)?;
        cart.decrement(product_id, quantity)
    }

    pub fn delete_cart(&self, cart_id: &CartId) -> Result<(), CartError> {
        self.carts
            .lock()
            .remove(cart_id)
            .map(|_| info!("删除购物车: {}", cart_id))
            .ok_or(CartError::CartNotFound)
    }

    /// 获取购物车快照，锁只在复制期间持有
    pub fn get_cart(&self, cart_id: &CartId) -> Result<Cart, CartError> {
        self.carts
            .lock()
            .get(cart_id)
            .cloned()
            .ok_or(CartError::CartNotFound)
    }

    pub fn len(&self) -> usize {
        self.carts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.carts.lock().is_empty()
    }

    /// 移除最后活动时间早于 `now - ttl` 的购物车，返回移除数量
    pub fn evict_idle(&self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let Some(cutoff) = now.checked_sub_signed(ttl) else {
            return 0;
        };
        let mut carts = self.carts.lock();
        let before = carts.len();
        carts.retain(|_, cart| cart.last_activity() >= cutoff);
        before - carts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_cart_is_empty_and_active() {
        let registry = CartRegistry::new();
        let id = registry.create_cart();
        let cart = registry.get_cart(&id).unwrap();
        assert!(cart.is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_add_to_existing_cart_sums_quantities() {
        let registry = CartRegistry::new();
        let id = registry.create_cart();

        for qty in [1, 4, 2, 3] {
            let outcome = registry.add_item(Some(&id), "p1", qty).unwrap();
            assert_eq!(outcome.cart_id, id);
            assert!(!outcome.created);
        }

        assert_eq!(registry.get_cart(&id).unwrap().quantity("p1"), Some(10));
    }

    #[test]
    fn test_add_to_unknown_cart_creates_new_one() {
        let registry = CartRegistry::new();
        let stale = CartId::from("does-not-exist");

        let outcome = registry.add_item(Some(&stale), "p1", 2).unwrap();
        assert!(outcome.created);
        assert_ne!(outcome.cart_id, stale);

        let cart = registry.get_cart(&outcome.cart_id).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity("p1"), Some(2));
        assert_eq!(registry.get_cart(&stale), Err(CartError::CartNotFound));
    }

    #[test]
    fn test_add_without_id_creates_cart() {
        let registry = CartRegistry::with_policy(UnknownCartPolicy::Reject);
        let outcome = registry.add_item(None, "p1", 1).unwrap();
        assert!(outcome.created);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reject_policy_fails_on_unknown_id() {
        let registry = CartRegistry::with_policy(UnknownCartPolicy::Reject);
        let result = registry.add_item(Some(&CartId::from("stale")), "p1", 1);
        assert_eq!(result, Err(CartError::CartNotFound));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_decrement_errors() {
        let registry = CartRegistry::new();
        assert_eq!(
            registry.decrement_or_remove_item(&CartId::from("nope"), "p1", 1),
            Err(CartError::CartNotFound)
        );

        let id = registry.create_cart();
        assert_eq!(
            registry.decrement_or_remove_item(&id, "p1", 1),
            Err(CartError::ProductNotInCart)
        );
    }

    #[test]
    fn test_decrement_keeps_empty_cart_active() {
        let registry = CartRegistry::new();
        let id = registry.add_item(None, "p1", 2).unwrap().cart_id;

        assert_eq!(
            registry.decrement_or_remove_item(&id, "p1", 2),
            Ok(ItemChange::Removed)
        );
        assert!(registry.get_cart(&id).unwrap().is_empty());
    }

    #[test]
    fn test_deleted_cart_is_terminal() {
        let registry = CartRegistry::new();
        let id = registry.add_item(None, "p1", 1).unwrap().cart_id;

        registry.delete_cart(&id).unwrap();

        assert_eq!(registry.delete_cart(&id), Err(CartError::CartNotFound));
        assert_eq!(registry.get_cart(&id), Err(CartError::CartNotFound));
        assert_eq!(
            registry.decrement_or_remove_item(&id, "p1", 1),
            Err(CartError::CartNotFound)
        );

        let outcome = registry.add_item(Some(&id), "p1", 1).unwrap();
        assert_ne!(outcome.cart_id, id);
        assert_eq!(registry.get_cart(&id), Err(CartError::CartNotFound));
    }

    #[test]
    fn test_evict_idle_removes_only_stale_carts() {
        let registry = CartRegistry::new();
        let id = registry.create_cart();

        let now = Utc::now();
        assert_eq!(registry.evict_idle(now, Duration::hours(1)), 0);
        assert_eq!(
            registry.evict_idle(now + Duration::hours(2), Duration::hours(1)),
            1
        );
        assert_eq!(registry.get_cart(&id), Err(CartError::CartNotFound));
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let registry = CartRegistry::new();
        let id = registry.create_cart();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let id = id.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        registry.add_item(Some(&id), "p1", 1).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.get_cart(&id).unwrap().quantity("p1"), Some(2000));
    }
}
