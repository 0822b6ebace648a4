use axum_pos_api::{
    db::{create_orm_conn, create_pool},
    dto::receivings::{CreateReceivingRequest, ReceivingLineRequest},
    entity::{
        items::{ActiveModel as ItemActive, Entity as Items},
        suppliers::ActiveModel as SupplierActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::receiving_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    let orm = create_orm_conn(&database_url).await?;
    Ok(Some(AppState::new(pool, orm)))
}

async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, password_hash, role) VALUES ($1, $2, 'x', $3)")
        .bind(id)
        .bind(format!("{}-{}@example.com", role, id))
        .bind(role)
        .execute(&state.pool)
        .await?;
    Ok(AuthUser {
        user_id: id,
        role: role.into(),
    })
}

async fn create_supplier(state: &AppState) -> anyhow::Result<Uuid> {
    let supplier = SupplierActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Supplier {}", Uuid::new_v4())),
        contact_person: Set(None),
        email: Set(None),
        phone: Set(None),
        status: Set("active".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(supplier.id)
}

async fn create_item(
    state: &AppState,
    supplier_id: Option<Uuid>,
    cost: i64,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let item = ItemActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Widget {}", Uuid::new_v4())),
        description: Set(None),
        category_id: Set(None),
        supplier_id: Set(supplier_id),
        cost: Set(cost),
        price: Set(cost * 2),
        stock: Set(stock),
        min_stock: Set(0),
        barcode: Set(None),
        status: Set("active".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(item.id)
}

async fn item_stock(state: &AppState, id: Uuid) -> anyhow::Result<i32> {
    Ok(Items::find_by_id(id)
        .one(&state.orm)
        .await?
        .expect("item")
        .stock)
}

fn line(item_id: Uuid, qty: i32, discount_pct: Option<i32>) -> ReceivingLineRequest {
    ReceivingLineRequest {
        item_id,
        qty,
        discount_pct,
    }
}

// Scenario: a pending receiving touches no stock; completion applies it
// exactly once, and a second completion is a clean conflict.
#[tokio::test]
async fn receiving_applies_stock_exactly_once() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let manager = create_user(&state, "manager").await?;
    let supplier_id = create_supplier(&state).await?;
    let item_id = create_item(&state, Some(supplier_id), 250, 2).await?;

    let resp = receiving_service::create_receiving(
        &state,
        &manager,
        CreateReceivingRequest {
            supplier_id,
            expected_delivery_date: None,
            order_notes: Some("restock".into()),
            items: vec![line(item_id, 4, None)],
        },
    )
    .await?;
    let created = resp.data.unwrap();
    assert_eq!(created.receiving.status, "pending");
    assert_eq!(created.receiving.total, 1000);
    assert_eq!(created.receiving.discount_total, 0);
    assert_eq!(created.receiving.amount_due, 1000);
    assert_eq!(created.items[0].cost, 250);
    assert_eq!(item_stock(&state, item_id).await?, 2);

    let resp = receiving_service::complete_receiving(&state, &manager, created.receiving.id).await?;
    let completed = resp.data.unwrap();
    assert_eq!(completed.receiving.status, "completed");
    assert_eq!(item_stock(&state, item_id).await?, 6);

    let err = receiving_service::complete_receiving(&state, &manager, created.receiving.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StateConflict(_)));
    assert_eq!(item_stock(&state, item_id).await?, 6);
    Ok(())
}

#[tokio::test]
async fn receiving_applies_line_discounts() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let manager = create_user(&state, "manager").await?;
    let supplier_id = create_supplier(&state).await?;
    let item_id = create_item(&state, Some(supplier_id), 250, 0).await?;

    let created = receiving_service::create_receiving(
        &state,
        &manager,
        CreateReceivingRequest {
            supplier_id,
            expected_delivery_date: None,
            order_notes: None,
            items: vec![line(item_id, 4, Some(10))],
        },
    )
    .await?
    .data
    .unwrap();

    assert_eq!(created.receiving.total, 1000);
    assert_eq!(created.receiving.discount_total, 100);
    assert_eq!(created.receiving.amount_due, 900);
    assert_eq!(created.items[0].discount_pct, 10);
    assert_eq!(created.items[0].total, 900);
    Ok(())
}

// The cost snapshot on the line must survive later catalog edits.
#[tokio::test]
async fn receiving_cost_snapshot_is_immutable() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let manager = create_user(&state, "manager").await?;
    let supplier_id = create_supplier(&state).await?;
    let item_id = create_item(&state, Some(supplier_id), 250, 0).await?;

    let created = receiving_service::create_receiving(
        &state,
        &manager,
        CreateReceivingRequest {
            supplier_id,
            expected_delivery_date: None,
            order_notes: None,
            items: vec![line(item_id, 2, None)],
        },
    )
    .await?
    .data
    .unwrap();

    let item = Items::find_by_id(item_id).one(&state.orm).await?.unwrap();
    let mut active: axum_pos_api::entity::items::ActiveModel = item.into();
    active.cost = Set(999);
    active.update(&state.orm).await?;

    let fetched = receiving_service::get_receiving(&state, created.receiving.id)
        .await?
        .data
        .unwrap();
    assert_eq!(fetched.items[0].cost, 250);
    assert_eq!(fetched.receiving.amount_due, 500);
    Ok(())
}

#[tokio::test]
async fn receiving_rejects_items_from_other_suppliers() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let manager = create_user(&state, "manager").await?;
    let supplier_id = create_supplier(&state).await?;
    let other_supplier_id = create_supplier(&state).await?;
    let foreign_item = create_item(&state, Some(other_supplier_id), 100, 0).await?;

    let err = receiving_service::create_receiving(
        &state,
        &manager,
        CreateReceivingRequest {
            supplier_id,
            expected_delivery_date: None,
            order_notes: None,
            items: vec![line(foreign_item, 1, None)],
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn cashiers_cannot_settle_receivings() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let manager = create_user(&state, "manager").await?;
    let cashier = create_user(&state, "cashier").await?;
    let supplier_id = create_supplier(&state).await?;
    let item_id = create_item(&state, Some(supplier_id), 100, 0).await?;

    let err = receiving_service::create_receiving(
        &state,
        &cashier,
        CreateReceivingRequest {
            supplier_id,
            expected_delivery_date: None,
            order_notes: None,
            items: vec![line(item_id, 1, None)],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let created = receiving_service::create_receiving(
        &state,
        &manager,
        CreateReceivingRequest {
            supplier_id,
            expected_delivery_date: None,
            order_notes: None,
            items: vec![line(item_id, 1, None)],
        },
    )
    .await?
    .data
    .unwrap();

    let err = receiving_service::complete_receiving(&state, &cashier, created.receiving.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    assert_eq!(item_stock(&state, item_id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn receiving_rejects_unknown_supplier() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let manager = create_user(&state, "manager").await?;
    let supplier_id = create_supplier(&state).await?;
    let item_id = create_item(&state, Some(supplier_id), 100, 0).await?;

    let err = receiving_service::create_receiving(
        &state,
        &manager,
        CreateReceivingRequest {
            supplier_id: Uuid::new_v4(),
            expected_delivery_date: None,
            order_notes: None,
            items: vec![line(item_id, 1, None)],
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::NotFound));
    Ok(())
}
