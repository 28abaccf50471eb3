use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, FromQueryResult, Statement};
use tracing::warn;

use dispatch_core::{AggregateError, AggregateKind, AggregateProducer, ManufacturerCount};

/// Both queries aggregate over the same joined relation (§4.4): orders
/// joined to products, clients, and manufacturers. `products:bought`
/// counts distinct products per manufacturer; `items:bought` sums the
/// ordered quantity per manufacturer. Rows with a null manufacturer are
/// excluded by the inner join itself.
const PRODUCTS_BOUGHT_QUERY: &str = "
    SELECT manufacturer, COUNT(DISTINCT product) AS count FROM
    (SELECT orders.id, orders.quantity, products.name AS product,
    manufacturers.name AS manufacturer, clients.username AS client
    FROM orders JOIN products ON orders.product_id = products.id
    JOIN clients ON orders.client_id = clients.id
    JOIN manufacturers ON products.manufacturer_id = manufacturers.id)
    AS orders_list GROUP BY manufacturer";

const ITEMS_BOUGHT_QUERY: &str = "
    SELECT manufacturer, SUM(quantity) AS count FROM
    (SELECT orders.id, orders.quantity, products.name AS product,
    manufacturers.name AS manufacturer, clients.username AS client
    FROM orders JOIN products ON orders.product_id = products.id
    JOIN clients ON orders.client_id = clients.id
    JOIN manufacturers ON products.manufacturer_id = manufacturers.id)
    AS orders_list GROUP BY manufacturer";

#[derive(Debug, FromQueryResult)]
struct AggregateRow {
    manufacturer: String,
    count: i64,
}

/// The production `AggregateProducer`, backed by a single Postgres source.
pub struct PostgresAggregateProducer {
    db: DatabaseConnection,
}

impl PostgresAggregateProducer {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn query_for(kind: AggregateKind) -> &'static str {
        match kind {
            AggregateKind::ProductsBought => PRODUCTS_BOUGHT_QUERY,
            AggregateKind::ItemsBought => ITEMS_BOUGHT_QUERY,
        }
    }
}

#[async_trait]
impl AggregateProducer for PostgresAggregateProducer {
    async fn produce(&self, kind: AggregateKind) -> Result<Vec<ManufacturerCount>, AggregateError> {
        let stmt = Statement::from_string(DatabaseBackend::Postgres, Self::query_for(kind).to_owned());

        let rows = AggregateRow::find_by_statement(stmt).all(&self.db).await.map_err(|error| {
            warn!(%error, %kind, "aggregate query failed");
            AggregateError::Database(error.to_string())
        })?;

        Ok(rows
            .into_iter()
            .map(|row| ManufacturerCount {
                manufacturer: row.manufacturer,
                count: row.count,
            })
            .collect())
    }
}
