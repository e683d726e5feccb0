//! Shopping list export.
//!
//! Flattens every recipe in a user's cart into ingredient occurrences and
//! sums them by (name, unit) into a plain-text list.

use std::collections::BTreeMap;

use pantry_common::{AppError, AppResult};
use pantry_db::repositories::{CartIngredientRow, MembershipRepository};

/// One aggregated shopping list line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    /// Sum across the whole cart. Wider than a single amount so large carts
    /// cannot overflow.
    pub total: i64,
}

/// Shopping list service.
#[derive(Clone)]
pub struct ShoppingListService {
    membership_repo: MembershipRepository,
}

impl ShoppingListService {
    /// Create a new shopping list service.
    #[must_use]
    pub const fn new(membership_repo: MembershipRepository) -> Self {
        Self { membership_repo }
    }

    /// Render the user's shopping list as a plain-text document.
    /// An empty cart is an error.
    pub async fn export(&self, user_id: &str) -> AppResult<String> {
        if self.membership_repo.cart_is_empty(user_id).await? {
            return Err(AppError::Validation("Shopping cart is empty".to_string()));
        }

        let rows = self.membership_repo.cart_ingredients(user_id).await?;
        Ok(render(&aggregate(rows)))
    }
}

/// Sum ingredient occurrences by (name, unit). The key is textual, so the
/// same name under different units stays separate, and two catalog entries
/// with identical name and unit merge.
#[must_use]
pub fn aggregate(rows: Vec<CartIngredientRow>) -> Vec<ShoppingListLine> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();

    for row in rows {
        *totals
            .entry((row.name, row.measurement_unit))
            .or_insert(0) += i64::from(row.amount);
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total)| ShoppingListLine {
            name,
            measurement_unit,
            total,
        })
        .collect()
}

/// Render aggregated lines as the downloadable document.
#[must_use]
pub fn render(lines: &[ShoppingListLine]) -> String {
    let mut out = String::from("Shopping list:\n");
    for line in lines {
        out.push_str(&format!(
            "{} ({}) — {}\n",
            line.name, line.measurement_unit, line.total
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::BTreeMap as Map;
    use std::sync::Arc;

    fn row(name: &str, unit: &str, amount: i32) -> CartIngredientRow {
        CartIngredientRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    fn mock_row(name: &str, unit: &str, amount: i32) -> Map<&'static str, sea_orm::Value> {
        let mut row = Map::new();
        row.insert("name", sea_orm::Value::from(name));
        row.insert("measurement_unit", sea_orm::Value::from(unit));
        row.insert("amount", sea_orm::Value::Int(Some(amount)));
        row
    }

    #[test]
    fn test_aggregate_sums_by_name_and_unit() {
        let lines = aggregate(vec![
            row("flour", "g", 200),
            row("flour", "g", 300),
            row("salt", "g", 5),
        ]);

        assert_eq!(
            lines,
            vec![
                ShoppingListLine {
                    name: "flour".to_string(),
                    measurement_unit: "g".to_string(),
                    total: 500,
                },
                ShoppingListLine {
                    name: "salt".to_string(),
                    measurement_unit: "g".to_string(),
                    total: 5,
                },
            ]
        );
    }

    #[test]
    fn test_aggregate_keeps_same_name_different_unit_apart() {
        let lines = aggregate(vec![row("milk", "ml", 250), row("milk", "g", 30)]);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].measurement_unit, "g");
        assert_eq!(lines[1].measurement_unit, "ml");
    }

    #[test]
    fn test_aggregate_merges_duplicate_catalog_entries() {
        // Two catalog rows with the same name and unit still merge, because
        // the key is textual rather than the ingredient ID.
        let lines = aggregate(vec![row("sugar", "g", 10), row("sugar", "g", 20)]);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].total, 30);
    }

    #[test]
    fn test_aggregate_totals_do_not_overflow_i32() {
        let lines = aggregate(vec![row("flour", "g", i32::MAX), row("flour", "g", i32::MAX)]);

        assert_eq!(lines[0].total, i64::from(i32::MAX) * 2);
    }

    #[test]
    fn test_render_format() {
        let lines = vec![ShoppingListLine {
            name: "flour".to_string(),
            measurement_unit: "g".to_string(),
            total: 500,
        }];

        let text = render(&lines);
        assert_eq!(text, "Shopping list:\nflour (g) — 500\n");
    }

    #[tokio::test]
    async fn test_export_empty_cart_is_rejected() {
        let mut count_row: Map<&str, sea_orm::Value> = Map::new();
        count_row.insert("num_items", sea_orm::Value::BigInt(Some(0)));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row]])
            .into_connection();

        let service = ShoppingListService::new(MembershipRepository::new(Arc::new(db)));
        let result = service.export("u1").await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_export_renders_aggregated_cart() {
        let mut count_row: Map<&str, sea_orm::Value> = Map::new();
        count_row.insert("num_items", sea_orm::Value::BigInt(Some(2)));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row]])
            .append_query_results([vec![mock_row("flour", "g", 200), mock_row("flour", "g", 100)]])
            .into_connection();

        let service = ShoppingListService::new(MembershipRepository::new(Arc::new(db)));
        let text = service.export("u1").await.unwrap();

        assert!(text.starts_with("Shopping list:\n"));
        assert!(text.contains("flour (g) — 300"));
    }
}
