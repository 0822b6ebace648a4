use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_pos_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123!", "admin").await?;
    let cashier_id = ensure_user(&pool, "cashier@example.com", "cashier123!", "cashier").await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Cashier ID: {cashier_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let id = Uuid::new_v4();
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let supplier_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO suppliers (id, name, contact_person) VALUES ($1, 'Acme Wholesale', 'Sam Doe')",
    )
    .bind(supplier_id)
    .execute(pool)
    .await?;

    let (category_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name) VALUES ($1, 'Beverages')
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .fetch_one(pool)
    .await?;

    sqlx::query_as::<_, (Uuid,)>(
        r#"
        INSERT INTO cards (id, name) VALUES ($1, 'Standard')
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .fetch_one(pool)
    .await?;

    // Prices and costs are cents.
    let items: [(&str, i64, i64, i32); 3] = [
        ("Espresso Beans 1kg", 1450, 2500, 40),
        ("Cold Brew Bottle", 220, 450, 120),
        ("Ceramic Mug", 310, 800, 25),
    ];
    for (name, cost, price, stock) in items {
        sqlx::query(
            r#"
            INSERT INTO items (id, name, category_id, supplier_id, cost, price, stock, min_stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(category_id)
        .bind(supplier_id)
        .bind(cost)
        .bind(price)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    Ok(())
}
