use {
    crate::domain::{
        error::PipelineError,
        product::ProductRollup,
        store::{Page, PageParams},
    },
    sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row},
    uuid::Uuid,
};

/// Overwrite the rollup row with freshly computed totals. Values are never
/// incremented in place.
pub async fn upsert_rollup(pool: &PgPool, rollup: &ProductRollup) -> Result<(), PipelineError> {
    sqlx::query(
        r#"
        INSERT INTO products
            (id, gateway_config_id, product_key, product_key_hash, product_name,
             total_sales, total_revenue, total_abandons, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
        ON CONFLICT (gateway_config_id, product_key_hash) DO UPDATE SET
            product_name = EXCLUDED.product_name,
            total_sales = EXCLUDED.total_sales,
            total_revenue = EXCLUDED.total_revenue,
            total_abandons = EXCLUDED.total_abandons,
            updated_at = now()
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(rollup.gateway_config_id)
    .bind(&rollup.product_key)
    .bind(rollup.product_key_hash)
    .bind(&rollup.product_name)
    .bind(rollup.total_sales)
    .bind(rollup.total_revenue)
    .bind(rollup.total_abandons)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get(
    pool: &PgPool,
    config_id: Uuid,
    product_key: &str,
) -> Result<Option<ProductRollup>, PipelineError> {
    let row = sqlx::query(
        "SELECT * FROM products WHERE gateway_config_id = $1 AND product_key = $2",
    )
    .bind(config_id)
    .bind(product_key)
    .fetch_optional(pool)
    .await?;

    row.map(|r| ProductRollup::from_row(&r).map_err(PipelineError::from))
        .transpose()
}

pub async fn list(
    pool: &PgPool,
    config_id: Option<Uuid>,
    page: PageParams,
) -> Result<Page<ProductRollup>, PipelineError> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT *, COUNT(*) OVER () AS total FROM products WHERE 1 = 1",
    );
    if let Some(id) = config_id {
        qb.push(" AND gateway_config_id = ").push_bind(id);
    }
    qb.push(" ORDER BY product_key LIMIT ")
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
        .map(|r| ProductRollup::from_row(r).map_err(PipelineError::from))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        page: page.page,
        per_page: page.per_page,
        total,
    })
}
