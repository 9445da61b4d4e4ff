//! 购物车计价

use super::model::{Cart, CartLine, CartView};
use crate::app::catalog::model::Product;

pub const MISSING_PRODUCT_MESSAGE: &str = "Product not found";

/// 将购物车与商品目录快照组合成带价格的视图
///
/// 目录中已不存在的商品只把对应行标记为错误，不计入总价。
pub fn price_cart(cart: &Cart, products: &[Product]) -> CartView {
    let mut grand_total = 0.0;
    let mut items = Vec::with_capacity(cart.items().len());

    for (product_id, quantity) in display_order(cart) {
        let Some(product) = products.iter().find(|p| p.id == *product_id) else {
            items.push(CartLine::Missing {
                id: product_id.clone(),
                error: MISSING_PRODUCT_MESSAGE.to_string(),
            });
            continue;
        };

        let line_total = product.price * quantity as f64;
        grand_total += line_total;

        items.push(CartLine::Priced {
            id: product_id.clone(),
            name: product.name.clone(),
            price: product.price,
            quantity,
            total: format_amount(line_total),
        });
    }

    CartView {
        items,
        total: format_amount(grand_total),
    }
}

/// 视图中的行顺序：形如数组下标的商品 ID 按数值升序排在最前，其余按加入顺序
pub fn display_order(cart: &Cart) -> Vec<(&String, i64)> {
    let (mut indexed, named): (Vec<_>, Vec<_>) = cart
        .items()
        .iter()
        .map(|(id, &quantity)| (id, quantity))
        .partition(|(id, _)| array_index(id).is_some());
    indexed.sort_by_key(|(id, _)| array_index(id));
    indexed.extend(named);
    indexed
}

/// 无前导零且小于 2^32 - 1 的十进制整数
fn array_index(key: &str) -> Option<u32> {
    let index = key.parse::<u32>().ok()?;
    (index != u32::MAX && index.to_string() == key).then_some(index)
}

/// 保留两位小数，恰好落在两分之间时远离零舍入
pub fn format_amount(amount: f64) -> String {
    let cents = amount * 100.0;
    let exact = amount.mul_add(100.0, -cents) == 0.0;
    if exact && cents.fract().abs() == 0.5 {
        format!("{:.2}", cents.round() / 100.0)
    } else {
        format!("{:.2}", amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: f64) -> Product {
        Product::new(id, format!("Product {id}"), price, "misc")
    }

    #[test]
    fn test_empty_cart_totals_zero() {
        let view = price_cart(&Cart::new(), &[]);
        assert!(view.items.is_empty());
        assert_eq!(view.total, "0.00");
    }

    #[test]
    fn test_line_and_grand_totals() {
        let mut cart = Cart::new();
        cart.add("a", 3);
        cart.add("b", 2);

        let view = price_cart(&cart, &[product("a", 1.5), product("b", 10.25)]);

        assert_eq!(view.items.len(), 2);
        match &view.items[0] {
            CartLine::Priced {
                id,
                quantity,
                total,
                ..
            } => {
                assert_eq!(id, "a");
                assert_eq!(*quantity, 3);
                assert_eq!(total, "4.50");
            }
            other => panic!("unexpected line: {other:?}"),
        }
        assert_eq!(view.total, "25.00");
    }

    #[test]
    fn test_missing_product_is_flagged_and_excluded() {
        let mut cart = Cart::new();
        cart.add("a", 1);
        cart.add("gone", 4);

        let view = price_cart(&cart, &[product("a", 2.0)]);

        let missing: Vec<_> = view.items.iter().filter(|l| l.is_missing()).collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].id(), "gone");
        assert_eq!(view.total, "2.00");
    }

    #[test]
    fn test_missing_line_serializes_as_error_entry() {
        let mut cart = Cart::new();
        cart.add("gone", 1);

        let json = serde_json::to_value(price_cart(&cart, &[])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "items": [{ "id": "gone", "error": "Product not found" }],
                "total": "0.00"
            })
        );
    }

    #[test]
    fn test_format_amount_rounds_to_cents() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(19.999), "20.00");
        assert_eq!(format_amount(3.0 * 0.1), "0.30");
    }

    #[test]
    fn test_format_amount_rounds_exact_halves_away_from_zero() {
        assert_eq!(format_amount(0.125), "0.13");
        assert_eq!(format_amount(2.375), "2.38");
        assert_eq!(format_amount(-0.125), "-0.13");
        // 1.005 的二进制值略小于 1.005
        assert_eq!(format_amount(1.005), "1.00");
    }

    #[test]
    fn test_lines_follow_display_order() {
        let mut cart = Cart::new();
        for id in ["b", "10", "a", "2", "01", "1"] {
            cart.add(id, 1);
        }

        let view = price_cart(&cart, &[]);
        let ids: Vec<_> = view.items.iter().map(CartLine::id).collect();
        assert_eq!(ids, ["1", "2", "10", "b", "a", "01"]);
    }
}
