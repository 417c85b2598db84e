//! End-to-end flow: catalog and overrides in the database, an order priced
//! from them, stored, then delivered.

use chrono::Utc;
use flama_core::legacy::{LegacyStore, PRICING_COLLECTION_KEYS};
use flama_core::order::OrderDraft;
use flama_core::pricing::{resolve_price, PriceQuery};
use flama_core::{
    normalize, Deposit, Money, OrderStatus, PriceSource, PricingMode, PricingRule, Product,
};
use flama_db::{Database, DbConfig, DbError};
use serde_json::json;

fn deposit(id: &str) -> Deposit {
    Deposit {
        id: id.to_string(),
        name: format!("Depósito {id}"),
        address: None,
        phone: None,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn product(id: &str, name: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        unit: None,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

async fn setup() -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    db.deposits().upsert(&deposit("centro")).await.unwrap();
    db.deposits().upsert(&deposit("norte")).await.unwrap();
    db.products().upsert(&product("P13", "Botijão P13")).await.unwrap();
    db.products().upsert(&product("P45", "Cilindro P45")).await.unwrap();

    let rules = db.pricing_rules();
    rules
        .upsert(&PricingRule::simple("P13", None, Money::from_cents(11500)))
        .await
        .unwrap();
    rules
        .upsert(&PricingRule::simple("P13", Some("norte"), Money::from_cents(11000)))
        .await
        .unwrap();
    rules
        .upsert(&PricingRule::exchange("P13", Some("norte"), Money::from_cents(10000)))
        .await
        .unwrap();

    db
}

#[tokio::test]
async fn test_order_priced_from_stored_overrides() {
    let db = setup().await;

    let ids = vec!["P13".to_string(), "P45".to_string()];
    let rules = db.pricing_rules().list_for_products(&ids).await.unwrap();
    let p13 = db.products().get_by_id("P13").await.unwrap().unwrap();
    let p45 = db.products().get_by_id("P45").await.unwrap().unwrap();

    let mut draft = OrderDraft::new(Some("norte"), PricingMode::Exchange);
    let p13_price = draft.add_product(&p13, 3, &rules).unwrap();
    let p45_price = draft.add_product(&p45, 1, &rules).unwrap();

    assert_eq!(p13_price.price.cents(), 10000);
    assert_eq!(p13_price.source, PriceSource::DepositExact);
    assert_eq!(p45_price.source, PriceSource::Unmatched);
    assert_eq!(draft.unpriced_lines().count(), 1);

    let (order, items) = draft.into_order().unwrap();
    db.orders().insert(&order, &items).await.unwrap();

    // Later override edits never rewrite a stored order
    db.pricing_rules()
        .upsert(&PricingRule::exchange("P13", Some("norte"), Money::from_cents(12000)))
        .await
        .unwrap();

    let stored = db.orders().items_for_order(&order.id).await.unwrap();
    assert_eq!(stored[0].unit_price_cents, 10000);
    assert_eq!(stored[0].line_total_cents, 30000);
    assert_eq!(stored[1].unit_price_cents, 0);

    let delivered = db
        .orders()
        .update_status(&order.id, OrderStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(delivered.total_cents, 30000);
}

#[tokio::test]
async fn test_normalized_raw_rows_are_stored() {
    let db = setup().await;

    let raw = json!([
        { "produto_id": "P45", "deposito_id": "centro", "modalidade": "cheio", "preco_completo": "980,00" },
        { "productId": "P45", "mode": "simple", "price": 420 }
    ]);
    let rows = raw.as_array().unwrap();

    for rule in normalize::pricing_rules(rows) {
        db.pricing_rules().upsert(&rule).await.unwrap();
    }

    let stored = db.pricing_rules().list_for_product("P45").await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].mode, PricingMode::Full);
    assert_eq!(stored[0].full_price, Some(Money::from_cents(98000)));
    assert_eq!(stored[1].price, Some(Money::from_cents(42000)));
}

#[tokio::test]
async fn test_imported_dump_charges_what_the_dump_resolved() {
    let db = setup().await;

    let store = LegacyStore::from_json_str(
        r#"{
            "precos": [
                { "produto_id": "P45", "deposito_id": "centro", "preco": 9 },
                { "produto_id": "P45", "deposito_id": "centro", "preco": 1 }
            ]
        }"#,
    )
    .unwrap();
    let from_dump = normalize::pricing_rules(&store.collection(PRICING_COLLECTION_KEYS));

    for rule in &store.extract().pricing_rules {
        db.pricing_rules().upsert(rule).await.unwrap();
    }
    let stored = db.pricing_rules().list_for_product("P45").await.unwrap();

    let query = PriceQuery::new("P45", Some("centro"), PricingMode::Simple);
    assert_eq!(resolve_price(&query, &from_dump).cents(), 900);
    assert_eq!(resolve_price(&query, &stored), resolve_price(&query, &from_dump));
}

#[tokio::test]
async fn test_cancelled_order_cannot_be_delivered() {
    let db = setup().await;
    let rules = db.pricing_rules().list_for_product("P13").await.unwrap();
    let p13 = db.products().get_by_id("P13").await.unwrap().unwrap();

    let mut draft = OrderDraft::new(None, PricingMode::Simple);
    draft.add_product(&p13, 1, &rules).unwrap();
    let (order, items) = draft.into_order().unwrap();
    assert_eq!(order.total_cents, 11000);

    db.orders().insert(&order, &items).await.unwrap();
    db.orders()
        .update_status(&order.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    let err = db
        .orders()
        .update_status(&order.id, OrderStatus::Delivered)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(_)));
}
