use async_trait::async_trait;
use sqlx::{postgres::PgQueryResult, PgPool};
use uuid::Uuid;

use crate::domain::business::BusinessRecord;

use super::BusinessStore;

pub async fn count_businesses(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("select count(*) from business")
        .fetch_one(pool)
        .await
}

pub async fn get_websites_containing(
    pool: &PgPool,
    pattern: &str,
    limit: i64,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r"
        select
            website
        from
            business
        where
            website is not null
            and strpos(website, $1) > 0
        limit $2
        ",
    )
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn insert_businesses(
    pool: &PgPool,
    records: &[BusinessRecord],
) -> Result<PgQueryResult, sqlx::Error> {
    let total_rows = records.len();
    let ids: Vec<Uuid> = (0..total_rows).map(|_| Uuid::new_v4()).collect();

    let mut place_ids = Vec::with_capacity(total_rows);
    let mut names = Vec::with_capacity(total_rows);
    let mut addresses = Vec::with_capacity(total_rows);
    let mut latitudes = Vec::with_capacity(total_rows);
    let mut longitudes = Vec::with_capacity(total_rows);
    let mut websites = Vec::with_capacity(total_rows);
    let mut phone_numbers = Vec::with_capacity(total_rows);
    let mut ratings = Vec::with_capacity(total_rows);
    let mut user_ratings_totals = Vec::with_capacity(total_rows);
    let mut place_types = Vec::with_capacity(total_rows);
    let mut screenshot_urls = Vec::with_capacity(total_rows);
    let mut navigation_failures = Vec::with_capacity(total_rows);

    for r in records {
        place_ids.push(r.place_id.clone());
        names.push(r.name.clone());
        addresses.push(r.address.clone());
        latitudes.push(r.location.lat);
        longitudes.push(r.location.lng);
        websites.push(r.website.clone());
        phone_numbers.push(r.phone_number.clone());
        ratings.push(r.rating);
        user_ratings_totals.push(r.user_ratings_total.map(|t| t as i32));
        place_types.push(r.types.join(","));
        screenshot_urls.push(r.screenshot_url.clone());
        navigation_failures.push(r.navigation_failed);
    }

    sqlx::query(
        r#"
        insert into business
            (id, place_id, name, address, latitude, longitude, website, phone_number,
             rating, user_ratings_total, place_types, screenshot_url, navigation_failed)
        select * from unnest (
            $1::uuid[],
            $2::text[],
            $3::text[],
            $4::text[],
            $5::float8[],
            $6::float8[],
            $7::text[],
            $8::text[],
            $9::float4[],
            $10::int4[],
            $11::text[],
            $12::text[],
            $13::bool[]
        )
        on conflict (place_id) do nothing
        "#,
    )
    .bind(&ids)
    .bind(&place_ids)
    .bind(&names)
    .bind(&addresses)
    .bind(&latitudes)
    .bind(&longitudes)
    .bind(&websites)
    .bind(&phone_numbers)
    .bind(&ratings)
    .bind(&user_ratings_totals)
    .bind(&place_types)
    .bind(&screenshot_urls)
    .bind(&navigation_failures)
    .execute(pool)
    .await
}

pub struct PgBusinessStore {
    pool: PgPool,
}

impl PgBusinessStore {
    pub fn new(pool: PgPool) -> Self {
        PgBusinessStore { pool }
    }
}

#[async_trait]
impl BusinessStore for PgBusinessStore {
    async fn count(&self) -> anyhow::Result<i64> {
        Ok(count_businesses(&self.pool).await?)
    }

    async fn find_website_matches(
        &self,
        pattern: &str,
        limit: i64,
    ) -> anyhow::Result<Vec<String>> {
        Ok(get_websites_containing(&self.pool, pattern, limit).await?)
    }

    async fn add(&self, records: &[BusinessRecord]) -> anyhow::Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let result = insert_businesses(&self.pool, records).await?;
        log::info!(
            "Inserted {} of {} businesses",
            result.rows_affected(),
            records.len()
        );

        Ok(())
    }
}
