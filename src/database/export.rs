use std::fmt::{self, Display};

use serde::Serialize;

use super::schema::ShoppingListItem;

/*
Shopping list export

<name> (<unit>) — <total amount>
Flour (g) — 450
Salt (g) — 8
*/

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShoppingList {
    pub items: Vec<ShoppingListItem>,
}

impl ShoppingList {
    pub fn new(items: Vec<ShoppingListItem>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn lines(&self) -> Vec<String> {
        self.items.iter().map(|item| item.to_string()).collect()
    }
}

impl Display for ShoppingListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) — {}",
            self.name, self.measurement_unit, self.total_amount
        )
    }
}

impl Display for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}

impl Into<String> for ShoppingList {
    fn into(self) -> String {
        self.to_string()
    }
}
