use std::str::FromStr;

use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::PgPool;
use storefront_api::{
    db::{create_pool, run_migrations},
    middleware::auth::{ROLE_ADMIN, ROLE_USER},
    services::auth_service::hash_password,
};
use uuid::Uuid;

const CATEGORIES: &[(&str, &str, Option<&str>)] = &[
    ("Eyeglasses", "eyeglasses", None),
    ("Sunglasses", "sunglasses", None),
    ("Contact Lenses", "contact-lenses", None),
    ("Metal Frames", "metal-frames", Some("eyeglasses")),
    ("Acetate Frames", "acetate-frames", Some("eyeglasses")),
    ("Polarized", "polarized", Some("sunglasses")),
    ("Sports Sunglasses", "sports-sunglasses", Some("sunglasses")),
];

const BRANDS: &[(&str, &str)] = &[
    ("eyeLUX", "House brand frames"),
    ("Northlight", "Lightweight everyday eyewear"),
    ("TrailBlaze", "Sport and outdoor shades"),
];

// name, category slug, brand, price, stock, featured
const PRODUCTS: &[(&str, &str, &str, &str, i32, bool)] = &[
    ("eyeLUX TitanFlex Round", "metal-frames", "eyeLUX", "129.00", 40, true),
    ("Classic ThinWire Oval", "metal-frames", "Northlight", "89.50", 25, false),
    ("Urban Chrome Rectangle", "metal-frames", "eyeLUX", "104.00", 3, false),
    ("Vintage Havana Cat Eye", "acetate-frames", "eyeLUX", "119.00", 18, true),
    ("Matte Noir Bold Rectangle", "acetate-frames", "Northlight", "74.99", 60, false),
    ("Cruise Black Polar", "polarized", "TrailBlaze", "59.00", 35, false),
    ("Anti-Glare Gold Aviators", "polarized", "eyeLUX", "154.00", 12, true),
    ("ProRun Active Wrap", "sports-sunglasses", "TrailBlaze", "45.00", 80, false),
    ("AquaSport Floating Shades", "sports-sunglasses", "TrailBlaze", "39.95", 4, false),
    ("Daily Comfort 30-Pack", "contact-lenses", "Northlight", "24.99", 150, false),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

    let pool = create_pool(&database_url, 2).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "Store Admin", "admin1234", ROLE_ADMIN).await?;
    let user_id = ensure_user(&pool, "user@example.com", "Demo Shopper", "user12345", ROLE_USER).await?;
    seed_categories(&pool).await?;
    seed_brands(&pool).await?;
    seed_products(&pool).await?;

    pool.close().await;
    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &PgPool,
    email: &str,
    name: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, name, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(id)
}

async fn seed_categories(pool: &PgPool) -> anyhow::Result<()> {
    for (name, slug, parent) in CATEGORIES {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, parent_id)
            VALUES ($1, $2, $3, (SELECT id FROM categories WHERE slug = $4))
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slug)
        .bind(parent)
        .execute(pool)
        .await?;
    }
    println!("Seeded categories");
    Ok(())
}

async fn seed_brands(pool: &PgPool) -> anyhow::Result<()> {
    for (name, description) in BRANDS {
        sqlx::query(
            "INSERT INTO brands (id, name, description) VALUES ($1, $2, $3) ON CONFLICT (name) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?;
    }
    println!("Seeded brands");
    Ok(())
}

async fn seed_products(pool: &PgPool) -> anyhow::Result<()> {
    for (name, category, brand, price, stock, featured) in PRODUCTS {
        let price = Decimal::from_str(price)?;
        sqlx::query(
            r#"
            INSERT INTO products (id, name, slug, description, price, stock, is_featured, category_id, brand_id)
            VALUES (
                $1, $2, $3, $4, $5, $6, $7,
                (SELECT id FROM categories WHERE slug = $8),
                (SELECT id FROM brands WHERE name = $9)
            )
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slugify(name))
        .bind(format!("{name} from the {brand} collection"))
        .bind(price)
        .bind(stock)
        .bind(featured)
        .bind(category)
        .bind(brand)
        .execute(pool)
        .await?;
    }
    println!("Seeded products");
    Ok(())
}

fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
