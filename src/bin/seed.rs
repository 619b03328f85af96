use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use pet_marketplace_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "Admin", "admin123", "admin").await?;
    let buyer_id = ensure_user(&pool, "buyer@example.com", "Bella Buyer", "buyer123", "user").await?;
    let vendor_id =
        ensure_user(&pool, "vendor@example.com", "Pet Goods Co", "vendor123", "vendor").await?;
    let school_id =
        ensure_user(&pool, "school@example.com", "Paws Academy", "school123", "school").await?;

    seed_catalog(&pool, vendor_id).await?;
    seed_school(&pool, school_id).await?;
    seed_buyer_fixtures(&pool, buyer_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, Buyer ID: {buyer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    full_name: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, full_name, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(full_name)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(id)
}

async fn seed_catalog(pool: &sqlx::PgPool, vendor_id: Uuid) -> anyhow::Result<()> {
    let products: [(&str, &str, &[(&str, i64, i64, i32)]); 2] = [
        (
            "Tough Chew Rope",
            "Braided cotton rope for heavy chewers",
            &[("small", 90_00, 75_00, 120), ("large", 140_00, 120_00, 80)],
        ),
        (
            "Salmon Crunch Treats",
            "Single-ingredient salmon treats",
            &[("200g", 60_00, 55_00, 200)],
        ),
    ];

    for (name, desc, variants) in products {
        let product_id = Uuid::new_v4();
        let inserted = sqlx::query(
            r#"
            INSERT INTO products (id, vendor_id, name, description)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE vendor_id = $2 AND name = $3)
            "#,
        )
        .bind(product_id)
        .bind(vendor_id)
        .bind(name)
        .bind(desc)
        .execute(pool)
        .await?;

        if inserted.rows_affected() == 0 {
            continue;
        }

        for &(size, original, selling, stock) in variants {
            sqlx::query(
                r#"
                INSERT INTO variants (id, product_id, attributes, original_price, selling_price, stock)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(product_id)
            .bind(serde_json::json!({ "size": size }))
            .bind(original)
            .bind(selling)
            .bind(stock)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded catalog");
    Ok(())
}

async fn seed_school(pool: &sqlx::PgPool, school_id: Uuid) -> anyhow::Result<()> {
    let course_id = Uuid::new_v4();
    let inserted = sqlx::query(
        r#"
        INSERT INTO courses (id, school_id, name)
        SELECT $1, $2, $3
        WHERE NOT EXISTS (SELECT 1 FROM courses WHERE school_id = $2 AND name = $3)
        "#,
    )
    .bind(course_id)
    .bind(school_id)
    .bind("Puppy Obedience Basics")
    .execute(pool)
    .await?;

    if inserted.rows_affected() > 0 {
        sqlx::query(
            r#"
            INSERT INTO course_schedules (id, course_id, time, total_seats, available_seats)
            VALUES ($1, $2, $3, $4, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind("Saturdays 10:00")
        .bind(8)
        .execute(pool)
        .await?;
    }

    println!("Seeded school course");
    Ok(())
}

async fn seed_buyer_fixtures(pool: &sqlx::PgPool, buyer_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO pet_profiles (id, owner_id, pet_name, pet_type, breed)
        SELECT $1, $2, $3, $4, $5
        WHERE NOT EXISTS (SELECT 1 FROM pet_profiles WHERE owner_id = $2 AND pet_name = $3)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(buyer_id)
    .bind("Milo")
    .bind("dog")
    .bind("Corgi")
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO shipping_addresses (id, user_id, label, address_line, city)
        SELECT $1, $2, $3, $4, $5
        WHERE NOT EXISTS (SELECT 1 FROM shipping_addresses WHERE user_id = $2 AND label = $3)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(buyer_id)
    .bind("Home")
    .bind("12 Harbor Lane")
    .bind("Portsmouth")
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO posts (id, author_id, caption, media)
        SELECT $1, $2, $3, $4
        WHERE NOT EXISTS (SELECT 1 FROM posts WHERE author_id = $2 AND caption = $3)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(buyer_id)
    .bind("Milo's first day at the beach")
    .bind("https://cdn.example.com/milo-beach.jpg")
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO reels (id, author_id, caption, video, duration)
        SELECT $1, $2, $3, $4, $5
        WHERE NOT EXISTS (SELECT 1 FROM reels WHERE author_id = $2 AND caption = $3)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(buyer_id)
    .bind("Zoomies compilation")
    .bind("https://cdn.example.com/milo-zoomies.mp4")
    .bind(34)
    .execute(pool)
    .await?;

    println!("Seeded buyer fixtures");
    Ok(())
}
