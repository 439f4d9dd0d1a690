//! Integration tests for the shopping cart.

#![allow(clippy::unwrap_used)]

use petlandia_core::ProductId;
use petlandia_integration_tests::TestContext;
use petlandia_storefront::services::{CartError, CartService, QuantityChange};
use rust_decimal::Decimal;

#[tokio::test]
async fn test_add_update_scenario() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("shopper", false).await;
    let product = ctx.create_product("P", "10.00", 5).await;
    let cart = CartService::new(&ctx.pool);

    assert_eq!(cart.add_to_cart(user.id, product.id).await.unwrap(), 1);
    assert_eq!(cart.add_to_cart(user.id, product.id).await.unwrap(), 1);

    let view = cart.view_cart(user.id).await.unwrap();
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.lines[0].quantity, 2);
    assert_eq!(view.total(), Some(Decimal::new(2000, 2)));

    let change = cart.update_quantity(user.id, product.id, -2).await.unwrap();
    assert_eq!(change, QuantityChange::Removed);

    let view = cart.view_cart(user.id).await.unwrap();
    assert!(view.is_empty());
    assert_eq!(view.total(), Some(Decimal::ZERO));
}

#[tokio::test]
async fn test_add_twice_keeps_one_row() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("shopper", false).await;
    let product = ctx.create_product("Bone", "1.50", 5).await;
    let cart = CartService::new(&ctx.pool);

    cart.add_to_cart(user.id, product.id).await.unwrap();
    cart.add_to_cart(user.id, product.id).await.unwrap();

    assert_eq!(ctx.cart_rows_for(product.id).await, 1);
    assert_eq!(ctx.quantity(user.id, product.id).await, Some(2));
}

#[tokio::test]
async fn test_cart_count_is_distinct_lines() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("shopper", false).await;
    let a = ctx.create_product("A", "1", 5).await;
    let b = ctx.create_product("B", "1", 5).await;
    let cart = CartService::new(&ctx.pool);

    cart.add_to_cart(user.id, a.id).await.unwrap();
    cart.add_to_cart(user.id, a.id).await.unwrap();
    assert_eq!(cart.add_to_cart(user.id, b.id).await.unwrap(), 2);
    assert_eq!(cart.cart_count(user.id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_add_missing_product_is_not_found() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("shopper", false).await;

    let result = CartService::new(&ctx.pool)
        .add_to_cart(user.id, ProductId::new(42))
        .await;

    assert!(matches!(result, Err(CartError::ProductNotFound(_))));
}

#[tokio::test]
async fn test_decrement_to_zero_deletes_then_not_found() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("shopper", false).await;
    let product = ctx.create_product("Treat", "0.99", 5).await;
    let cart = CartService::new(&ctx.pool);
    cart.add_to_cart(user.id, product.id).await.unwrap();

    let change = cart.update_quantity(user.id, product.id, -1).await.unwrap();
    assert_eq!(change, QuantityChange::Removed);
    assert_eq!(ctx.quantity(user.id, product.id).await, None);

    let again = cart.update_quantity(user.id, product.id, -1).await;
    assert!(matches!(again, Err(CartError::LineNotFound(_))));
}

#[tokio::test]
async fn test_negative_result_leaves_line_unchanged() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("shopper", false).await;
    let product = ctx.create_product("Treat", "0.99", 5).await;
    let cart = CartService::new(&ctx.pool);
    cart.add_to_cart(user.id, product.id).await.unwrap();
    cart.add_to_cart(user.id, product.id).await.unwrap();

    let result = cart.update_quantity(user.id, product.id, -5).await;

    assert!(matches!(
        result,
        Err(CartError::InvalidQuantity {
            current: 2,
            delta: -5
        })
    ));
    assert_eq!(ctx.quantity(user.id, product.id).await, Some(2));
}

#[tokio::test]
async fn test_update_never_creates_a_line() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("shopper", false).await;
    let product = ctx.create_product("Treat", "0.99", 5).await;

    let result = CartService::new(&ctx.pool)
        .update_quantity(user.id, product.id, 3)
        .await;

    assert!(matches!(result, Err(CartError::LineNotFound(_))));
    assert_eq!(ctx.cart_rows_for(product.id).await, 0);
}

#[tokio::test]
async fn test_positive_update_and_total_recomputed() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("shopper", false).await;
    let a = ctx.create_product("A", "2.50", 5).await;
    let b = ctx.create_product("B", "0.10", 5).await;
    let cart = CartService::new(&ctx.pool);
    cart.add_to_cart(user.id, a.id).await.unwrap();
    cart.add_to_cart(user.id, b.id).await.unwrap();

    let change = cart.update_quantity(user.id, a.id, 3).await.unwrap();
    assert_eq!(change, QuantityChange::Updated(4));

    let view = cart.view_cart(user.id).await.unwrap();
    assert_eq!(view.lines[0].product.id, a.id);
    assert_eq!(view.lines[1].product.id, b.id);
    assert_eq!(view.total(), Some(Decimal::new(1010, 2)));
}

#[tokio::test]
async fn test_remove_line() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("shopper", false).await;
    let product = ctx.create_product("Collar", "8", 5).await;
    let cart = CartService::new(&ctx.pool);
    cart.add_to_cart(user.id, product.id).await.unwrap();

    cart.remove_from_cart(user.id, product.id).await.unwrap();
    assert_eq!(ctx.quantity(user.id, product.id).await, None);

    let again = cart.remove_from_cart(user.id, product.id).await;
    assert!(matches!(again, Err(CartError::LineNotFound(_))));
}

#[tokio::test]
async fn test_carts_are_per_user() {
    let ctx = TestContext::new().await;
    let ann = ctx.create_user("ann", false).await;
    let bob = ctx.create_user("bob", false).await;
    let product = ctx.create_product("Collar", "8", 5).await;
    let cart = CartService::new(&ctx.pool);

    cart.add_to_cart(ann.id, product.id).await.unwrap();

    assert_eq!(cart.cart_count(bob.id).await.unwrap(), 0);
    assert!(cart.view_cart(bob.id).await.unwrap().is_empty());
    assert!(matches!(
        cart.update_quantity(bob.id, product.id, 1).await,
        Err(CartError::LineNotFound(_))
    ));
}

#[tokio::test]
async fn test_most_expensive_product_still_totals() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user("shopper", false).await;
    let product = ctx.create_product("Yacht", "999999999.99", 1).await;
    let cart = CartService::new(&ctx.pool);
    cart.add_to_cart(user.id, product.id).await.unwrap();
    cart.add_to_cart(user.id, product.id).await.unwrap();

    let view = cart.view_cart(user.id).await.unwrap();

    assert_eq!(view.total(), Some(Decimal::new(199_999_999_998, 2)));
}
