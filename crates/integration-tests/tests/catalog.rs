//! Integration tests for catalog management.

#![allow(clippy::unwrap_used)]

use petlandia_core::ProductId;
use petlandia_integration_tests::{TestContext, product_form};
use petlandia_storefront::services::{CartService, CatalogError, ImageUpload, UploadError};
use rust_decimal::Decimal;

fn image(name: &str, bytes: &[u8]) -> ImageUpload {
    ImageUpload {
        file_name: name.to_owned(),
        bytes: bytes.to_vec(),
    }
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_valid_product_creates_exactly_one_row() {
    let ctx = TestContext::new().await;

    let product = ctx
        .catalog()
        .add_product(&product_form("Kibble", "12.50", "7"), None)
        .await
        .unwrap();

    assert_eq!(ctx.product_count().await, 1);
    assert_eq!(product.name, "Kibble");
    assert_eq!(product.price.amount(), Decimal::new(1250, 2));
    assert_eq!(product.stock, 7);
    assert!(product.image_url.is_none());

    let listed = ctx.catalog().list_products().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, product.id);
}

#[tokio::test]
async fn test_invalid_numbers_create_nothing() {
    let ctx = TestContext::new().await;

    for (price, stock) in [
        ("abc", "1"),
        ("-1", "1"),
        ("79228162514264337593543950335", "1"),
        ("1.00", "x"),
        ("1.00", "-3"),
        ("", ""),
    ] {
        let result = ctx
            .catalog()
            .add_product(&product_form("Leash", price, stock), None)
            .await;
        assert!(
            matches!(result, Err(CatalogError::Validation(_))),
            "price={price:?} stock={stock:?}"
        );
    }

    assert_eq!(ctx.product_count().await, 0);
}

#[tokio::test]
async fn test_rejected_product_does_not_write_image() {
    let ctx = TestContext::new().await;

    let result = ctx
        .catalog()
        .add_product(
            &product_form("Leash", "not-a-price", "1"),
            Some(&image("leash.png", b"png")),
        )
        .await;

    assert!(matches!(result, Err(CatalogError::Validation(_))));
    assert!(!ctx.uploads.dir().join("leash.png").exists());
}

#[tokio::test]
async fn test_failed_insert_keeps_image_shared_with_other_product() {
    let ctx = TestContext::new().await;
    ctx.catalog()
        .add_product(&product_form("Toy", "5", "1"), Some(&image("toy.png", b"toy")))
        .await
        .unwrap();
    sqlx::query(
        "CREATE TRIGGER block_product_insert BEFORE INSERT ON product \
         BEGIN SELECT RAISE(ABORT, 'boom'); END",
    )
    .execute(&ctx.pool)
    .await
    .unwrap();

    let shared = ctx
        .catalog()
        .add_product(&product_form("Toy 2", "5", "1"), Some(&image("toy.png", b"two")))
        .await;
    let fresh = ctx
        .catalog()
        .add_product(&product_form("Ball", "5", "1"), Some(&image("ball.png", b"b")))
        .await;

    assert!(matches!(shared, Err(CatalogError::Repository(_))));
    assert!(matches!(fresh, Err(CatalogError::Repository(_))));
    assert!(ctx.uploads.dir().join("toy.png").exists());
    assert!(!ctx.uploads.dir().join("ball.png").exists());
}

#[tokio::test]
async fn test_image_saved_under_sanitized_name() {
    let ctx = TestContext::new().await;

    let product = ctx
        .catalog()
        .add_product(
            &product_form("Bed", "40", "2"),
            Some(&image("../My Dog Bed.png", b"bed")),
        )
        .await
        .unwrap();

    assert_eq!(
        product.image_url.as_deref(),
        Some("/static/img/products/My_Dog_Bed.png")
    );
    let stored = std::fs::read(ctx.uploads.dir().join("My_Dog_Bed.png")).unwrap();
    assert_eq!(stored, b"bed");
}

// ============================================================================
// Edit
// ============================================================================

#[tokio::test]
async fn test_edit_overwrites_fields() {
    let ctx = TestContext::new().await;
    let product = ctx.create_product("Ball", "3.00", 10).await;

    let updated = ctx
        .catalog()
        .edit_product(product.id, &product_form("Big ball", "4.25", "8"), None)
        .await
        .unwrap();

    assert_eq!(updated.id, product.id);
    assert_eq!(updated.name, "Big ball");
    assert_eq!(updated.price.amount(), Decimal::new(425, 2));
    assert_eq!(updated.stock, 8);
    assert!(updated.updated_at >= product.updated_at);
}

#[tokio::test]
async fn test_edit_with_new_image_replaces_old_file() {
    let ctx = TestContext::new().await;
    let product = ctx
        .catalog()
        .add_product(&product_form("Toy", "5", "1"), Some(&image("old.png", b"old")))
        .await
        .unwrap();

    let updated = ctx
        .catalog()
        .edit_product(
            product.id,
            &product_form("Toy", "5", "1"),
            Some(&image("new.png", b"new")),
        )
        .await
        .unwrap();

    assert_eq!(
        updated.image_url.as_deref(),
        Some("/static/img/products/new.png")
    );
    assert!(!ctx.uploads.dir().join("old.png").exists());
    assert!(ctx.uploads.dir().join("new.png").exists());
}

#[tokio::test]
async fn test_edit_without_image_keeps_existing_one() {
    let ctx = TestContext::new().await;
    let product = ctx
        .catalog()
        .add_product(&product_form("Toy", "5", "1"), Some(&image("toy.png", b"toy")))
        .await
        .unwrap();

    let updated = ctx
        .catalog()
        .edit_product(product.id, &product_form("Toy", "6", "1"), None)
        .await
        .unwrap();

    assert_eq!(updated.image_url, product.image_url);
    assert!(ctx.uploads.dir().join("toy.png").exists());
}

#[tokio::test]
async fn test_edit_missing_product_is_not_found() {
    let ctx = TestContext::new().await;

    let result = ctx
        .catalog()
        .edit_product(ProductId::new(99), &product_form("Ghost", "1", "1"), None)
        .await;

    assert!(matches!(result, Err(CatalogError::NotFound(id)) if id == ProductId::new(99)));
}

#[tokio::test]
async fn test_rejected_image_edit_keeps_old_image() {
    let ctx = TestContext::new().await;
    let product = ctx
        .catalog()
        .add_product(&product_form("Toy", "5", "1"), Some(&image("toy.png", b"toy")))
        .await
        .unwrap();

    let result = ctx
        .catalog()
        .edit_product(
            product.id,
            &product_form("Toy", "5", "1"),
            Some(&image("***", b"new")),
        )
        .await;

    assert!(matches!(
        result,
        Err(CatalogError::Upload(UploadError::InvalidFilename(_)))
    ));
    assert!(ctx.uploads.dir().join("toy.png").exists());
    let stored = ctx.catalog().get_product(product.id).await.unwrap();
    assert_eq!(stored.image_url, product.image_url);
}

#[tokio::test]
async fn test_failed_image_write_clears_stale_reference() {
    let ctx = TestContext::new().await;
    let product = ctx
        .catalog()
        .add_product(&product_form("Toy", "5", "1"), Some(&image("toy.png", b"toy")))
        .await
        .unwrap();
    std::fs::remove_dir_all(ctx.uploads.dir()).unwrap();

    let result = ctx
        .catalog()
        .edit_product(
            product.id,
            &product_form("Toy", "5", "1"),
            Some(&image("new.png", b"new")),
        )
        .await;

    assert!(matches!(result, Err(CatalogError::Upload(UploadError::Io(_)))));
    let stored = ctx.catalog().get_product(product.id).await.unwrap();
    assert_eq!(stored.image_url, None);
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_removes_every_cart_line() {
    let ctx = TestContext::new().await;
    let doomed = ctx.create_product("Doomed", "10", 5).await;
    let kept = ctx.create_product("Kept", "2", 5).await;

    let cart = CartService::new(&ctx.pool);
    for name in ["ann", "bob", "cid"] {
        let user = ctx.create_user(name, false).await;
        cart.add_to_cart(user.id, doomed.id).await.unwrap();
        cart.add_to_cart(user.id, kept.id).await.unwrap();
    }
    assert_eq!(ctx.cart_rows_for(doomed.id).await, 3);

    let deletion = ctx.catalog().delete_product(doomed.id).await.unwrap();

    assert_eq!(deletion.cart_lines_removed, 3);
    assert_eq!(deletion.product.id, doomed.id);
    assert_eq!(ctx.cart_rows_for(doomed.id).await, 0);
    assert_eq!(ctx.cart_rows_for(kept.id).await, 3);
    assert!(matches!(
        ctx.catalog().get_product(doomed.id).await,
        Err(CatalogError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_removes_image_file() {
    let ctx = TestContext::new().await;
    let product = ctx
        .catalog()
        .add_product(&product_form("Cage", "30", "1"), Some(&image("cage.png", b"c")))
        .await
        .unwrap();

    ctx.catalog().delete_product(product.id).await.unwrap();

    assert!(!ctx.uploads.dir().join("cage.png").exists());
}

#[tokio::test]
async fn test_delete_succeeds_when_image_file_is_gone() {
    let ctx = TestContext::new().await;
    let product = ctx
        .catalog()
        .add_product(&product_form("Cage", "30", "1"), Some(&image("cage.png", b"c")))
        .await
        .unwrap();
    std::fs::remove_file(ctx.uploads.dir().join("cage.png")).unwrap();

    ctx.catalog().delete_product(product.id).await.unwrap();

    assert_eq!(ctx.product_count().await, 0);
}

#[tokio::test]
async fn test_failed_delete_rolls_back_cart_lines() {
    let ctx = TestContext::new().await;
    let product = ctx.create_product("Sticky", "3", 5).await;

    let cart = CartService::new(&ctx.pool);
    for name in ["ann", "bob"] {
        let user = ctx.create_user(name, false).await;
        cart.add_to_cart(user.id, product.id).await.unwrap();
    }
    sqlx::query(
        "CREATE TRIGGER block_product_delete BEFORE DELETE ON product \
         BEGIN SELECT RAISE(ABORT, 'boom'); END",
    )
    .execute(&ctx.pool)
    .await
    .unwrap();

    let result = ctx.catalog().delete_product(product.id).await;

    assert!(matches!(result, Err(CatalogError::Repository(_))));
    assert_eq!(ctx.cart_rows_for(product.id).await, 2);
    assert!(ctx.catalog().get_product(product.id).await.is_ok());
}

#[tokio::test]
async fn test_delete_missing_product_is_not_found() {
    let ctx = TestContext::new().await;

    let result = ctx.catalog().delete_product(ProductId::new(1)).await;

    assert!(matches!(result, Err(CatalogError::NotFound(_))));
}
