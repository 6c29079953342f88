//! Shopping list built from every recipe in a user's cart.
//!
//! Ingredients are grouped by `(name, measurement_unit)`, never by name
//! alone: "sugar g" and "sugar tbsp" stay separate lines. Amounts are summed
//! as integers and the lines come out ordered by name, then unit.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

use crate::{
    error::{Error, QueryError},
    schema::Id,
};

use sqlx::{Pool, Postgres};

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShoppingList {
    items: Vec<ShoppingListItem>,
}

impl ShoppingList {
    pub fn from_parts<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = ShoppingListItem>,
    {
        let mut groups: BTreeMap<(String, String), i64> = BTreeMap::new();
        for part in parts {
            *groups
                .entry((part.name, part.measurement_unit))
                .or_insert(0) += part.total_amount;
        }

        let items = groups
            .into_iter()
            .map(|((name, measurement_unit), total_amount)| ShoppingListItem {
                name,
                measurement_unit,
                total_amount,
            })
            .collect();

        Self { items }
    }

    pub fn items(&self) -> &[ShoppingListItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One `"<name> <unit> - <total>\n"` line per group; empty for an empty cart.
impl fmt::Display for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{} {} - {}", item.name, item.measurement_unit, item.total_amount)?;
        }
        Ok(())
    }
}

pub async fn build_shopping_list(user_id: Id, pool: &Pool<Postgres>) -> Result<ShoppingList, Error> {
    let rows: Vec<ShoppingListItem> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit,
            SUM(ri.amount)::BIGINT AS total_amount
        FROM shopping_cart c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
        GROUP BY i.name, i.measurement_unit
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(ShoppingList::from_parts(rows))
}
