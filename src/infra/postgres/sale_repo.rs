use {
    crate::domain::{
        error::PipelineError,
        product::SaleMetrics,
        sale::{NewSale, NewSaleItem, SaleFilter, StoredSale, StoredSaleItem, UpsertOutcome},
        store::{Page, PageParams},
    },
    sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row},
    uuid::Uuid,
};

/// Upsert one sale by its natural key with full-row overwrite, replacing
/// the item set wholesale. An advisory lock on the natural key serializes
/// concurrent same-key deliveries; it works even before the row exists,
/// so there is no insert race to retry around.
pub async fn upsert(pool: &PgPool, sale: &NewSale) -> Result<UpsertOutcome, PipelineError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SET LOCAL lock_timeout = '5s'")
        .execute(&mut *tx)
        .await?;

    let lock_key = format!("{}:{}", sale.gateway_config_id, sale.transaction_key);
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(&lock_key)
        .execute(&mut *tx)
        .await?;

    let existing: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM sales WHERE gateway_config_id = $1 AND transaction_key = $2",
    )
    .bind(sale.gateway_config_id)
    .bind(&sale.transaction_key)
    .fetch_optional(&mut *tx)
    .await?;

    let outcome = match existing {
        None => {
            let id = Uuid::now_v7();
            sqlx::query(
                r#"
                INSERT INTO sales
                    (id, gateway_config_id, transaction_key, product_key, product_name,
                     plan_key, plan_name, trans_value, trans_total_value, freight_value,
                     status_code, status_label, payment_method,
                     client_name, client_email, client_phone, client_document,
                     client_address, client_city, client_state, client_zip,
                     commission, gateway_created_at, gateway_updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                        $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
                "#,
            )
            .bind(id)
            .bind(sale.gateway_config_id)
            .bind(&sale.transaction_key)
            .bind(&sale.product_key)
            .bind(&sale.product_name)
            .bind(&sale.plan_key)
            .bind(&sale.plan_name)
            .bind(sale.trans_value)
            .bind(sale.trans_total_value)
            .bind(sale.freight_value)
            .bind(sale.status_code)
            .bind(&sale.status_label)
            .bind(sale.payment_method)
            .bind(&sale.client.name)
            .bind(&sale.client.email)
            .bind(&sale.client.phone)
            .bind(&sale.client.document)
            .bind(&sale.client.address)
            .bind(&sale.client.city)
            .bind(&sale.client.state)
            .bind(&sale.client.zip)
            .bind(&sale.commission)
            .bind(sale.gateway_created_at)
            .bind(sale.gateway_updated_at)
            .execute(&mut *tx)
            .await?;
            UpsertOutcome::Created(id)
        }
        Some(id) => {
            // Identity fields stay; every mutable field takes the value
            // from the latest payload.
            sqlx::query(
                r#"
                UPDATE sales SET
                    product_key = $2, product_name = $3, plan_key = $4, plan_name = $5,
                    trans_value = $6, trans_total_value = $7, freight_value = $8,
                    status_code = $9, status_label = $10, payment_method = $11,
                    client_name = $12, client_email = $13, client_phone = $14,
                    client_document = $15, client_address = $16, client_city = $17,
                    client_state = $18, client_zip = $19, commission = $20,
                    gateway_created_at = $21, gateway_updated_at = $22,
                    updated_at = now()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(&sale.product_key)
            .bind(&sale.product_name)
            .bind(&sale.plan_key)
            .bind(&sale.plan_name)
            .bind(sale.trans_value)
            .bind(sale.trans_total_value)
            .bind(sale.freight_value)
            .bind(sale.status_code)
            .bind(&sale.status_label)
            .bind(sale.payment_method)
            .bind(&sale.client.name)
            .bind(&sale.client.email)
            .bind(&sale.client.phone)
            .bind(&sale.client.document)
            .bind(&sale.client.address)
            .bind(&sale.client.city)
            .bind(&sale.client.state)
            .bind(&sale.client.zip)
            .bind(&sale.commission)
            .bind(sale.gateway_created_at)
            .bind(sale.gateway_updated_at)
            .execute(&mut *tx)
            .await?;

            sqlx::query("DELETE FROM sale_items WHERE sale_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            UpsertOutcome::Updated(id)
        }
    };

    insert_items(&mut tx, outcome.id(), &sale.items).await?;
    tx.commit().await?;
    Ok(outcome)
}

/// One batch statement for the whole item set.
async fn insert_items(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    sale_id: Uuid,
    items: &[NewSaleItem],
) -> Result<(), PipelineError> {
    if items.is_empty() {
        return Ok(());
    }

    let mut qb = QueryBuilder::<Postgres>::new(
        "INSERT INTO sale_items \
         (id, sale_id, plan_key, plan_name, unit_value, quantity, product_key, product_type, is_main) ",
    );
    qb.push_values(items, |mut b, item| {
        b.push_bind(Uuid::now_v7())
            .push_bind(sale_id)
            .push_bind(&item.plan_key)
            .push_bind(&item.plan_name)
            .push_bind(item.unit_value)
            .push_bind(item.quantity)
            .push_bind(&item.product_key)
            .push_bind(item.product_type)
            .push_bind(item.is_main);
    });
    qb.build().execute(&mut **tx).await?;
    Ok(())
}

/// Count of all sales plus approved-only revenue for one product,
/// recomputed from committed rows.
pub async fn metrics(
    pool: &PgPool,
    config_id: Uuid,
    product_key: &str,
    approved_status_code: i32,
) -> Result<SaleMetrics, PipelineError> {
    let (total_sales, total_revenue): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COALESCE(SUM(trans_value) FILTER (WHERE status_code = $3), 0)::BIGINT
        FROM sales
        WHERE gateway_config_id = $1 AND product_key = $2
        "#,
    )
    .bind(config_id)
    .bind(product_key)
    .bind(approved_status_code)
    .fetch_one(pool)
    .await?;

    Ok(SaleMetrics {
        total_sales,
        total_revenue: crate::domain::money::Cents::new(total_revenue)?,
    })
}

pub async fn get(
    pool: &PgPool,
    config_id: Uuid,
    transaction_key: &str,
) -> Result<Option<StoredSale>, PipelineError> {
    let row = sqlx::query(
        "SELECT * FROM sales WHERE gateway_config_id = $1 AND transaction_key = $2",
    )
    .bind(config_id)
    .bind(transaction_key)
    .fetch_optional(pool)
    .await?;

    row.map(|r| StoredSale::from_row(&r).map_err(PipelineError::from))
        .transpose()
}

pub async fn items(pool: &PgPool, sale_id: Uuid) -> Result<Vec<StoredSaleItem>, PipelineError> {
    let rows = sqlx::query("SELECT * FROM sale_items WHERE sale_id = $1 ORDER BY id")
        .bind(sale_id)
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|r| StoredSaleItem::from_row(r).map_err(PipelineError::from))
        .collect()
}

pub async fn list(
    pool: &PgPool,
    filter: &SaleFilter,
    page: PageParams,
) -> Result<Page<StoredSale>, PipelineError> {
    let mut qb =
        QueryBuilder::<Postgres>::new("SELECT *, COUNT(*) OVER () AS total FROM sales WHERE 1 = 1");

    if let Some(id) = filter.gateway_config_id {
        qb.push(" AND gateway_config_id = ").push_bind(id);
    }
    if let Some(from) = filter.from {
        qb.push(" AND gateway_created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND gateway_created_at <= ").push_bind(to);
    }
    if let Some(code) = filter.status_code {
        qb.push(" AND status_code = ").push_bind(code);
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
        .map(|r| StoredSale::from_row(r).map_err(PipelineError::from))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        page: page.page,
        per_page: page.per_page,
        total,
    })
}
