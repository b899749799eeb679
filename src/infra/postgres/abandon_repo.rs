use {
    crate::domain::{
        abandon::{AbandonFilter, NewAbandon, StoredAbandon},
        error::PipelineError,
        sale::UpsertOutcome,
        store::{Page, PageParams},
    },
    sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row},
    uuid::Uuid,
};

/// Upsert one abandoned checkout by its synthesized key. On conflict only
/// the refreshable subset changes; product_name and plan_key keep their
/// first-seen values.
pub async fn upsert(pool: &PgPool, abandon: &NewAbandon) -> Result<UpsertOutcome, PipelineError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SET LOCAL lock_timeout = '5s'")
        .execute(&mut *tx)
        .await?;

    let lock_key = format!("{}:{}", abandon.gateway_config_id, abandon.abandon_key);
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(&lock_key)
        .execute(&mut *tx)
        .await?;

    let existing: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM abandons WHERE gateway_config_id = $1 AND abandon_key = $2",
    )
    .bind(abandon.gateway_config_id)
    .bind(&abandon.abandon_key)
    .fetch_optional(&mut *tx)
    .await?;

    let outcome = match existing {
        None => {
            let id = Uuid::now_v7();
            sqlx::query(
                r#"
                INSERT INTO abandons
                    (id, gateway_config_id, abandon_key, product_key, product_name,
                     plan_key, plan_name, plan_value,
                     client_name, client_email, client_phone, client_document,
                     client_address, client_city, client_state, client_zip,
                     gateway_created_at, gateway_updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                        $13, $14, $15, $16, $17, $18)
                "#,
            )
            .bind(id)
            .bind(abandon.gateway_config_id)
            .bind(&abandon.abandon_key)
            .bind(&abandon.product_key)
            .bind(&abandon.product_name)
            .bind(&abandon.plan_key)
            .bind(&abandon.plan_name)
            .bind(abandon.plan_value)
            .bind(&abandon.client.name)
            .bind(&abandon.client.email)
            .bind(&abandon.client.phone)
            .bind(&abandon.client.document)
            .bind(&abandon.client.address)
            .bind(&abandon.client.city)
            .bind(&abandon.client.state)
            .bind(&abandon.client.zip)
            .bind(abandon.gateway_created_at)
            .bind(abandon.gateway_updated_at)
            .execute(&mut *tx)
            .await?;
            UpsertOutcome::Created(id)
        }
        Some(id) => {
            sqlx::query(
                r#"
                UPDATE abandons SET
                    plan_name = $2, plan_value = $3,
                    client_name = $4, client_email = $5, client_phone = $6,
                    client_document = $7, client_address = $8, client_city = $9,
                    client_state = $10, client_zip = $11,
                    gateway_updated_at = $12, updated_at = now()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(&abandon.plan_name)
            .bind(abandon.plan_value)
            .bind(&abandon.client.name)
            .bind(&abandon.client.email)
            .bind(&abandon.client.phone)
            .bind(&abandon.client.document)
            .bind(&abandon.client.address)
            .bind(&abandon.client.city)
            .bind(&abandon.client.state)
            .bind(&abandon.client.zip)
            .bind(abandon.gateway_updated_at)
            .execute(&mut *tx)
            .await?;
            UpsertOutcome::Updated(id)
        }
    };

    tx.commit().await?;
    Ok(outcome)
}

pub async fn count_for_product(
    pool: &PgPool,
    config_id: Uuid,
    product_key: &str,
) -> Result<i64, PipelineError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM abandons WHERE gateway_config_id = $1 AND product_key = $2",
    )
    .bind(config_id)
    .bind(product_key)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

pub async fn get(
    pool: &PgPool,
    config_id: Uuid,
    abandon_key: &str,
) -> Result<Option<StoredAbandon>, PipelineError> {
    let row = sqlx::query(
        "SELECT * FROM abandons WHERE gateway_config_id = $1 AND abandon_key = $2",
    )
    .bind(config_id)
    .bind(abandon_key)
    .fetch_optional(pool)
    .await?;

    row.map(|r| StoredAbandon::from_row(&r).map_err(PipelineError::from))
        .transpose()
}

pub async fn list(
    pool: &PgPool,
    filter: &AbandonFilter,
    page: PageParams,
) -> Result<Page<StoredAbandon>, PipelineError> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT *, COUNT(*) OVER () AS total FROM abandons WHERE 1 = 1",
    );

    if let Some(id) = filter.gateway_config_id {
        qb.push(" AND gateway_config_id = ").push_bind(id);
    }
    if let Some(from) = filter.from {
        qb.push(" AND gateway_created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND gateway_created_at <= ").push_bind(to);
    }
    if let Some(key) = &filter.product_key {
        qb.push(" AND product_key = ").push_bind(key);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (client_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR client_email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR product_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    qb.push(" ORDER BY gateway_created_at DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows = qb.build().fetch_all(pool).await?;
    let total = match rows.first() {
        Some(row) => row.try_get::<i64, _>("total").map_err(PipelineError::from)?,
        None => 0,
    };
    let items = rows
        .iter()
        .map(|r| StoredAbandon::from_row(r).map_err(PipelineError::from))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        page: page.page,
        per_page: page.per_page,
        total,
    })
}
