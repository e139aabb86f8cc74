use std::{fs, path::Path};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    api::ProviderSource,
    error::{AppError, AppResult},
    models::{ProviderRow, ServiceProvider},
    search::FavoriteSet,
};

const PROVIDER_COLUMNS: &str = r#"id, name, business_name, category, description, rating, review_count,
       starting_price, distance, address, city, state, zip, phone, email,
       available_today, available_tomorrow, available_this_week, available_next_week"#;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Creates the parent directory of a file-backed SQLite URL.
pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let Some(path) = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Providers that back search until a real search API is wired in.
struct SeedProvider {
    id: &'static str,
    name: &'static str,
    business_name: &'static str,
    category: &'static str,
    description: &'static str,
    rating: f64,
    review_count: i64,
    starting_price: f64,
    distance: &'static str,
    address: &'static str,
    city: &'static str,
    state: &'static str,
    zip: &'static str,
    phone: &'static str,
    email: &'static str,
    windows: [bool; 4],
}

const SEED_PROVIDERS: &[SeedProvider] = &[
    SeedProvider {
        id: "prov-maya-hair",
        name: "Maya Chen",
        business_name: "Maya's Hair Lounge",
        category: "Hair",
        description: "Cuts, color and balayage in a relaxed studio.",
        rating: 4.8,
        review_count: 214,
        starting_price: 45.0,
        distance: "0.8 mi",
        address: "412 Alder St",
        city: "Portland",
        state: "OR",
        zip: "97205",
        phone: "503-555-0141",
        email: "hello@mayashair.example",
        windows: [true, true, true, false],
    },
    SeedProvider {
        id: "prov-fade-factory",
        name: "Luis Ortega",
        business_name: "Fade Factory Barbers",
        category: "Barber",
        description: "Skin fades, beard sculpting and hot towel shaves.",
        rating: 4.6,
        review_count: 389,
        starting_price: 30.0,
        distance: "1.9 mi",
        address: "88 Burnside Ave",
        city: "Portland",
        state: "OR",
        zip: "97214",
        phone: "503-555-0177",
        email: "book@fadefactory.example",
        windows: [false, true, true, true],
    },
    SeedProvider {
        id: "prov-still-water",
        name: "Priya Nair",
        business_name: "Still Water Massage",
        category: "Wellness",
        description: "Deep tissue, prenatal and hot stone massage.",
        rating: 4.9,
        review_count: 156,
        starting_price: 95.0,
        distance: "3.4 mi",
        address: "1500 Hawthorne Blvd",
        city: "Portland",
        state: "OR",
        zip: "97214",
        phone: "503-555-0102",
        email: "relax@stillwater.example",
        windows: [false, false, true, true],
    },
    SeedProvider {
        id: "prov-polished",
        name: "Tessa Grant",
        business_name: "Polished Nail Bar",
        category: "Nails",
        description: "Gel manicures, pedicures and nail art.",
        rating: 4.4,
        review_count: 97,
        starting_price: 35.0,
        distance: "2.2 mi",
        address: "23 Mississippi Ave",
        city: "Portland",
        state: "OR",
        zip: "97227",
        phone: "503-555-0160",
        email: "hi@polished.example",
        windows: [true, false, false, true],
    },
    SeedProvider {
        id: "prov-glow-skin",
        name: "Dana Reyes",
        business_name: "Glow Skin Studio",
        category: "Skincare",
        description: "Facials, peels and hair-free waxing.",
        rating: 4.7,
        review_count: 132,
        starting_price: 120.0,
        distance: "5.1 mi",
        address: "900 Main St",
        city: "Vancouver",
        state: "WA",
        zip: "98660",
        phone: "360-555-0119",
        email: "care@glowskin.example",
        windows: [false, true, false, false],
    },
    SeedProvider {
        id: "prov-summit-spa",
        name: "Owen Park",
        business_name: "Summit Day Spa",
        category: "Wellness",
        description: "Full-day spa packages with sauna access.",
        rating: 4.5,
        review_count: 301,
        starting_price: 650.0,
        distance: "12.6 mi",
        address: "7 Timberline Rd",
        city: "Lake Oswego",
        state: "OR",
        zip: "97034",
        phone: "503-555-0188",
        email: "stay@summitspa.example",
        windows: [false, false, false, true],
    },
];

pub async fn seed_providers(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let (existing,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM providers")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    let now = Utc::now().to_rfc3339();
    for (position, seed) in SEED_PROVIDERS.iter().enumerate() {
        sqlx::query(
            r#"INSERT INTO providers
               (id, name, business_name, category, description, rating, review_count, starting_price,
                distance, address, city, state, zip, phone, email,
                available_today, available_tomorrow, available_this_week, available_next_week,
                position, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(seed.id)
        .bind(seed.name)
        .bind(seed.business_name)
        .bind(seed.category)
        .bind(seed.description)
        .bind(seed.rating)
        .bind(seed.review_count)
        .bind(seed.starting_price)
        .bind(seed.distance)
        .bind(seed.address)
        .bind(seed.city)
        .bind(seed.state)
        .bind(seed.zip)
        .bind(seed.phone)
        .bind(seed.email)
        .bind(seed.windows[0])
        .bind(seed.windows[1])
        .bind(seed.windows[2])
        .bind(seed.windows[3])
        .bind(position as i64)
        .bind(&now)
        .execute(pool)
        .await?;
    }
    log::info!("Seeded {} demo providers", SEED_PROVIDERS.len());
    Ok(())
}

#[derive(Clone)]
pub struct SqliteProviderSource {
    pool: SqlitePool,
}

impl SqliteProviderSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProviderSource for SqliteProviderSource {
    async fn list_providers(&self) -> AppResult<Vec<ServiceProvider>> {
        let rows = sqlx::query_as::<_, ProviderRow>(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM providers ORDER BY position, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ServiceProvider::from).collect())
    }

    async fn get_provider(&self, id: &str) -> AppResult<ServiceProvider> {
        sqlx::query_as::<_, ProviderRow>(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM providers WHERE id = ? LIMIT 1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(ServiceProvider::from)
        .ok_or_else(|| AppError::NotFound(format!("provider {id}")))
    }

    async fn favorites(&self, user_id: &str) -> AppResult<FavoriteSet> {
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT provider_id FROM favorites WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(provider_id,)| provider_id).collect())
    }

    async fn add_favorite(&self, user_id: &str, provider_id: &str) -> AppResult<()> {
        self.get_provider(provider_id).await?;
        sqlx::query(
            r#"INSERT INTO favorites (user_id, provider_id, created_at)
               VALUES (?, ?, ?)
               ON CONFLICT(user_id, provider_id) DO NOTHING"#,
        )
        .bind(user_id)
        .bind(provider_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_favorite(&self, user_id: &str, provider_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM favorites WHERE user_id = ? AND provider_id = ?")
            .bind(user_id)
            .bind(provider_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
