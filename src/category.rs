//! Category labels seen on a user's transactions.
//!
//! A transaction stores its category as plain text. This table remembers every
//! label the user has used, per transaction type, so that forms can suggest
//! them and the transactions page can filter on them.

use rusqlite::{Connection, Row};

use crate::{Error, auth::UserID, transaction::TransactionType};

/// A category label used by one user for one type of transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub user_id: UserID,
    pub name: String,
    pub type_: TransactionType,
}

/// Create the category table.
///
/// # Errors
///
/// Returns an error if the SQL query failed.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            UNIQUE(user_id, name, type),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        type_: row.get(3)?,
    })
}

/// Remember `name` as a category of `type_` for `user_id`.
///
/// Saving a label that is already known does nothing. Leading and trailing
/// whitespace is ignored and blank names are not saved.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the SQL query failed.
pub fn ensure_category(
    user_id: UserID,
    name: &str,
    type_: TransactionType,
    connection: &Connection,
) -> Result<(), Error> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(());
    }

    connection.execute(
        "INSERT OR IGNORE INTO category (user_id, name, type) VALUES (?1, ?2, ?3)",
        (user_id.as_i64(), name, type_),
    )?;

    Ok(())
}

/// Get every category of `user_id`, sorted by name then type.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the SQL query failed.
pub fn get_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, type FROM category
            WHERE user_id = :user_id
            ORDER BY name COLLATE NOCASE ASC, type ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// The distinct category names of `user_id`, ignoring the transaction type.
pub fn get_category_names(user_id: UserID, connection: &Connection) -> Result<Vec<String>, Error> {
    let mut names: Vec<String> = get_categories(user_id, connection)?
        .into_iter()
        .map(|category| category.name)
        .collect();
    names.dedup();

    Ok(names)
}

#[cfg(test)]
mod category_tests {
    use rusqlite::Connection;

    use crate::{
        auth::{PasswordHash, UserID, create_user},
        db::initialize,
        transaction::TransactionType,
    };

    use super::{ensure_category, get_categories, get_category_names};

    fn get_connection_with_users() -> (Connection, UserID, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let first = create_user("a@b.c", PasswordHash::new_unchecked("x"), &conn).unwrap();
        let second = create_user("d@e.f", PasswordHash::new_unchecked("y"), &conn).unwrap();

        (conn, first.id, second.id)
    }

    #[test]
    fn ensure_category_is_idempotent() {
        let (conn, user_id, _) = get_connection_with_users();

        ensure_category(user_id, "Groceries", TransactionType::Expense, &conn).unwrap();
        ensure_category(user_id, " Groceries ", TransactionType::Expense, &conn).unwrap();

        let categories = get_categories(user_id, &conn).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Groceries");
        assert_eq!(categories[0].type_, TransactionType::Expense);
    }

    #[test]
    fn same_name_can_exist_for_each_type() {
        let (conn, user_id, _) = get_connection_with_users();

        ensure_category(user_id, "Gifts", TransactionType::Expense, &conn).unwrap();
        ensure_category(user_id, "Gifts", TransactionType::Income, &conn).unwrap();

        assert_eq!(get_categories(user_id, &conn).unwrap().len(), 2);
        assert_eq!(get_category_names(user_id, &conn).unwrap(), ["Gifts"]);
    }

    #[test]
    fn blank_names_are_ignored() {
        let (conn, user_id, _) = get_connection_with_users();

        ensure_category(user_id, "   ", TransactionType::Expense, &conn).unwrap();

        assert!(get_categories(user_id, &conn).unwrap().is_empty());
    }

    #[test]
    fn categories_are_scoped_to_user() {
        let (conn, first, second) = get_connection_with_users();

        ensure_category(first, "Rent", TransactionType::Expense, &conn).unwrap();
        ensure_category(second, "Salary", TransactionType::Income, &conn).unwrap();

        assert_eq!(get_category_names(first, &conn).unwrap(), ["Rent"]);
        assert_eq!(get_category_names(second, &conn).unwrap(), ["Salary"]);
    }

    #[test]
    fn names_are_sorted_case_insensitively() {
        let (conn, user_id, _) = get_connection_with_users();

        for name in ["rent", "Bills", "coffee"] {
            ensure_category(user_id, name, TransactionType::Expense, &conn).unwrap();
        }

        assert_eq!(
            get_category_names(user_id, &conn).unwrap(),
            ["Bills", "coffee", "rent"]
        );
    }
}
