//! Product management over HTTP.

#![allow(clippy::unwrap_used)]

use lpg_core::{NewProduct, ProductPatch};
use lpg_integration_tests::TestServer;
use rust_decimal::Decimal;

fn draft(name: &str, quantity: i32) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        category: "Cylinders".to_string(),
        quantity,
        price: Decimal::new(95_000, 2),
        low_stock_threshold: None,
    }
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_creates_minus_deletes() {
    let server = TestServer::spawn().await;
    let admin = server.admin_client().await;
    let seeded = admin.products().await.unwrap().len();

    let mut ids = Vec::new();
    for i in 0..5 {
        let product = admin.add_product(&draft(&format!("Tank {i}"), 30)).await.unwrap();
        ids.push(product.id);
    }
    let (deleted, kept) = ids.split_at(2);
    for id in deleted {
        admin.delete_product(id).await.unwrap();
    }

    let products = admin.products().await.unwrap();
    assert_eq!(products.len(), seeded + 3);
    assert!(products.iter().all(|p| !deleted.contains(&p.id)));
    assert!(kept.iter().all(|id| products.iter().any(|p| &p.id == id)));
}

#[tokio::test]
async fn test_list_needs_no_token() {
    let server = TestServer::spawn().await;
    server.admin_client().await;

    let anonymous = server.client();
    assert_eq!(anonymous.products().await.unwrap().len(), 10);
}

// =============================================================================
// Updates
// =============================================================================

#[tokio::test]
async fn test_update_keeps_id_and_created_at() {
    let server = TestServer::spawn().await;
    let admin = server.admin_client().await;
    let original = admin.add_product(&draft("Regulator", 40)).await.unwrap();

    let patch = ProductPatch {
        quantity: Some(12),
        ..ProductPatch::default()
    };
    let updated = admin.update_product(&original.id, &patch).await.unwrap();

    assert_eq!(updated.id, original.id);
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(updated.quantity, 12);
    assert_eq!(updated.name, "Regulator");
    assert!(updated.updated_at >= original.updated_at);
}

#[tokio::test]
async fn test_update_missing_product_is_404() {
    let server = TestServer::spawn().await;
    let admin = server.admin_client().await;

    let err = admin
        .update_product(&"no-such-product".into(), &ProductPatch::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_staff_may_update_but_not_create_or_delete() {
    let server = TestServer::spawn().await;
    let admin = server.admin_client().await;
    let product = admin.add_product(&draft("Hose", 50)).await.unwrap();

    let staff = server.signed_in("cashier", "pw", "staff").await;

    let patch = ProductPatch {
        quantity: Some(49),
        ..ProductPatch::default()
    };
    assert_eq!(
        staff.update_product(&product.id, &patch).await.unwrap().quantity,
        49
    );

    let create = staff.add_product(&draft("Sneaky", 1)).await.unwrap_err();
    assert_eq!(create.status(), Some(403));

    let delete = staff.delete_product(&product.id).await.unwrap_err();
    assert_eq!(delete.status(), Some(403));
}

#[tokio::test]
async fn test_create_without_token_is_401() {
    let server = TestServer::spawn().await;

    let response = reqwest::Client::new()
        .post(server.url("products"))
        .json(&draft("Tank", 1))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Low stock
// =============================================================================

#[tokio::test]
async fn test_dashboard_stats() {
    let server = TestServer::spawn().await;
    let admin = server.admin_client().await;

    let mut custom = draft("Clamp", 8);
    custom.low_stock_threshold = Some(5);
    admin.add_product(&custom).await.unwrap();
    admin.add_product(&draft("Valve", 20)).await.unwrap();

    let stats = admin.dashboard_stats().await.unwrap();
    let products = admin.products().await.unwrap();
    let expected_low = products.iter().filter(|p| p.is_low_stock()).count();

    assert_eq!(stats.total_products, 12);
    assert_eq!(stats.low_stock, expected_low);
    assert!(products.iter().any(|p| p.name == "Valve" && p.is_low_stock()));
    assert!(products.iter().any(|p| p.name == "Clamp" && !p.is_low_stock()));
    assert_eq!(stats.total_users, Some(2));

    let staff = server.signed_in("clerk", "pw", "staff").await;
    assert_eq!(staff.dashboard_stats().await.unwrap().total_users, None);
}
