//! The write path for transactions.
//!
//! Each operation here persists the transaction row and the matching
//! account balance change inside a single SQLite transaction with
//! immediate behaviour: the write lock taken at BEGIN serialises
//! concurrent writers, and any failure rolls the whole operation back.
//! Edits first reverse the previously persisted effect on the old account,
//! then persist the new field values, then apply the new effect to the new
//! account (which may be a different account, or none at all).

use rusqlite::{Connection, TransactionBehavior, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    account::{Currency, apply_balance_delta, get_account},
    category::get_category,
    database_id::{AccountId, CategoryId, TransactionId},
    money::validate_amount,
    transaction::core::{
        TRANSACTION_COLUMNS, Transaction, TransactionType, get_transaction, map_transaction_row,
        sanitize_description,
    },
    user::UserId,
};

/// The fields a client supplies to create a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    /// The account the money moved through, if any.
    pub account_id: Option<AccountId>,
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
    /// Whether money came in or went out.
    pub transaction_type: TransactionType,
    /// The amount of money, a positive magnitude.
    pub amount: Decimal,
    /// The currency of the amount. When absent and an account is linked,
    /// the account's currency is inherited, once, now.
    pub currency: Option<Currency>,
    /// A text description of what the transaction was for.
    #[serde(default)]
    pub description: String,
    /// The calendar date the money moved.
    pub date: Date,
}

/// A field in a partial update: keep the stored value, clear it, or
/// replace it.
///
/// In JSON, an absent field means [Patch::Keep] and an explicit `null`
/// means [Patch::Clear]. This distinction is what lets an update unlink a
/// transaction from its account.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Patch<T> {
    /// Leave the stored value unchanged.
    #[default]
    Keep,
    /// Clear the stored value.
    Clear,
    /// Replace the stored value.
    Set(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Set(value),
            None => Patch::Clear,
        })
    }
}

/// The partial field set a client supplies to update a transaction.
///
/// Absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionChanges {
    /// Link the transaction to a different account, or unlink it with an
    /// explicit null.
    #[serde(default)]
    pub account_id: Patch<AccountId>,
    /// Move the transaction to a different category.
    pub category_id: Option<CategoryId>,
    /// Change the direction of the transaction.
    pub transaction_type: Option<TransactionType>,
    /// Change the amount, a positive magnitude.
    pub amount: Option<Decimal>,
    /// Change the recorded currency. Never re-derived from the account.
    pub currency: Option<Currency>,
    /// Change the description.
    pub description: Option<String>,
    /// Change the calendar date.
    pub date: Option<Date>,
}

/// Create a transaction and apply its effect to the linked account's
/// balance, both within a single SQLite transaction.
///
/// # Errors
/// Returns a:
/// - [Error::InvalidAmount] if the amount is not positive with at most two
///   decimal places,
/// - [Error::InvalidCategory] if the category does not exist or is not
///   owned by this user,
/// - [Error::InvalidAccount] if an account is given but does not exist or
///   is not owned by this user,
/// - [Error::Conflict] if the database stayed locked past the busy timeout,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    connection: &mut Connection,
    user_id: UserId,
    new_transaction: NewTransaction,
) -> Result<Transaction, Error> {
    let amount = validate_amount(new_transaction.amount)?;

    let db_transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    get_category(&db_transaction, user_id, new_transaction.category_id).map_err(|error| {
        match error {
            Error::NotFound => Error::InvalidCategory(Some(new_transaction.category_id)),
            error => error,
        }
    })?;

    let currency = match new_transaction.account_id {
        Some(account_id) => {
            let account =
                get_account(&db_transaction, user_id, account_id).map_err(|error| match error {
                    Error::NotFound => Error::InvalidAccount(Some(account_id)),
                    error => error,
                })?;

            // Inherit the account's currency exactly once, at creation.
            new_transaction.currency.or(Some(account.currency))
        }
        None => new_transaction.currency,
    };

    let description = sanitize_description(&new_transaction.description);

    let transaction = db_transaction
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                 (user_id, account_id, category_id, transaction_type, amount, currency, description, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                user_id.as_i64(),
                new_transaction.account_id,
                new_transaction.category_id,
                new_transaction.transaction_type.as_str(),
                amount.to_string(),
                currency.map(|currency| currency.as_str()),
                description,
                new_transaction.date,
                OffsetDateTime::now_utc(),
            ],
            map_transaction_row,
        )
        .map_err(Error::from)?;

    if let Some(account_id) = transaction.account_id {
        apply_balance_delta(
            &db_transaction,
            account_id,
            transaction.transaction_type.effect(amount),
        )?;
    }

    db_transaction.commit()?;

    Ok(transaction)
}

/// Update a transaction, keeping the balance invariant intact across the
/// edit.
///
/// The previously persisted effect is reversed on the old account, the new
/// field values are persisted, and the new effect is applied to the new
/// account. When the account reference changes the reversal and the
/// application target two different accounts. All of it happens inside one
/// SQLite transaction; a failure at any step leaves every row untouched.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by this user,
/// - [Error::InvalidAmount], [Error::InvalidCategory], or
///   [Error::InvalidAccount] as for [create_transaction],
/// - [Error::Conflict] if the database stayed locked past the busy timeout,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    connection: &mut Connection,
    user_id: UserId,
    id: TransactionId,
    changes: TransactionChanges,
) -> Result<Transaction, Error> {
    let amount = changes.amount.map(validate_amount).transpose()?;

    let db_transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let old = get_transaction(&db_transaction, user_id, id)?;

    let new_account_id = match changes.account_id {
        Patch::Keep => old.account_id,
        Patch::Clear => None,
        Patch::Set(account_id) => Some(account_id),
    };
    if let Some(account_id) = new_account_id {
        if Some(account_id) != old.account_id {
            get_account(&db_transaction, user_id, account_id).map_err(|error| match error {
                Error::NotFound => Error::InvalidAccount(Some(account_id)),
                error => error,
            })?;
        }
    }

    let new_category_id = changes.category_id.unwrap_or(old.category_id);
    if new_category_id != old.category_id {
        get_category(&db_transaction, user_id, new_category_id).map_err(|error| match error {
            Error::NotFound => Error::InvalidCategory(Some(new_category_id)),
            error => error,
        })?;
    }

    let new_type = changes.transaction_type.unwrap_or(old.transaction_type);
    let new_amount = amount.unwrap_or(old.amount);
    let new_currency = changes.currency.or(old.currency);
    let new_description = match &changes.description {
        Some(description) => sanitize_description(description),
        None => old.description.clone(),
    };
    let new_date = changes.date.unwrap_or(old.date);

    // Reverse the effect that was applied when the old state was persisted.
    if let Some(old_account_id) = old.account_id {
        apply_balance_delta(
            &db_transaction,
            old_account_id,
            -old.transaction_type.effect(old.amount),
        )?;
    }

    db_transaction.execute(
        "UPDATE \"transaction\"
         SET account_id = ?1, category_id = ?2, transaction_type = ?3, amount = ?4,
             currency = ?5, description = ?6, date = ?7
         WHERE id = ?8",
        params![
            new_account_id,
            new_category_id,
            new_type.as_str(),
            new_amount.to_string(),
            new_currency.map(|currency| currency.as_str()),
            new_description,
            new_date,
            id,
        ],
    )?;

    // Apply the new effect, possibly to a different account.
    if let Some(account_id) = new_account_id {
        apply_balance_delta(&db_transaction, account_id, new_type.effect(new_amount))?;
    }

    let updated = get_transaction(&db_transaction, user_id, id)?;

    db_transaction.commit()?;

    Ok(updated)
}

/// Delete a transaction, reversing its effect on the linked account's
/// balance in the same SQLite transaction that removes the row.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by this user,
/// - [Error::Conflict] if the database stayed locked past the busy timeout,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    connection: &mut Connection,
    user_id: UserId,
    id: TransactionId,
) -> Result<(), Error> {
    let db_transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let old = get_transaction(&db_transaction, user_id, id)?;

    if let Some(account_id) = old.account_id {
        apply_balance_delta(
            &db_transaction,
            account_id,
            -old.transaction_type.effect(old.amount),
        )?;
    }

    db_transaction.execute("DELETE FROM \"transaction\" WHERE id = ?1", params![id])?;

    db_transaction.commit()?;

    Ok(())
}


#[cfg(test)]
mod service_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        Error,
        account::{Account, AccountType, Currency, NewAccount, create_account, get_account},
        category::{CategoryKind, NewCategory, create_category, delete_category},
        database_id::CategoryId,
        db::initialize,
        transaction::{
            NewTransaction, Patch, TransactionChanges, TransactionType, create_transaction,
            delete_transaction, get_transaction, update_transaction,
        },
        user::UserId,
    };

    struct Fixture {
        conn: Connection,
        user_id: UserId,
        category_id: CategoryId,
        account_x: Account,
        account_y: Account,
    }

    fn get_fixture() -> Fixture {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn.execute(
            "INSERT INTO user (email, password, created_at) VALUES ('test@test.com', 'hash', '2024-01-01T00:00:00Z')",
            (),
        )
        .unwrap();
        let user_id = UserId::new(conn.last_insert_rowid());

        let category = create_category(
            &conn,
            user_id,
            NewCategory {
                name: "General".to_string(),
                kind: CategoryKind::Expense,
            },
        )
        .unwrap();

        let account_x = create_account(
            &conn,
            user_id,
            NewAccount {
                name: "X".to_string(),
                account_type: AccountType::Bank,
                currency: Currency::USD,
            },
        )
        .unwrap();
        let account_y = create_account(
            &conn,
            user_id,
            NewAccount {
                name: "Y".to_string(),
                account_type: AccountType::Cash,
                currency: Currency::KES,
            },
        )
        .unwrap();

        Fixture {
            conn,
            user_id,
            category_id: category.id,
            account_x,
            account_y,
        }
    }

    fn new_transaction(fixture: &Fixture, transaction_type: TransactionType, amount: &str) -> NewTransaction {
        NewTransaction {
            account_id: Some(fixture.account_x.id),
            category_id: fixture.category_id,
            transaction_type,
            amount: amount.parse().unwrap(),
            currency: None,
            description: String::new(),
            date: date!(2024 - 03 - 15),
        }
    }

    fn balance_of(fixture: &Fixture, account_id: i64) -> Decimal {
        get_account(&fixture.conn, fixture.user_id, account_id)
            .unwrap()
            .balance
    }

    /// The stored balance must equal the sum of effects of the linked
    /// transactions at every quiescent point.
    fn assert_balance_matches_transactions(fixture: &Fixture, account_id: i64) {
        let mut statement = fixture
            .conn
            .prepare(
                "SELECT transaction_type, amount FROM \"transaction\" WHERE account_id = ?1",
            )
            .unwrap();
        let total: Decimal = statement
            .query_map([account_id], |row| {
                let transaction_type: String = row.get(0)?;
                let amount: String = row.get(1)?;
                Ok((transaction_type, amount))
            })
            .unwrap()
            .map(|row| {
                let (transaction_type, amount) = row.unwrap();
                let amount: Decimal = amount.parse().unwrap();
                match transaction_type.as_str() {
                    "income" => amount,
                    _ => -amount,
                }
            })
            .sum();

        assert_eq!(
            balance_of(fixture, account_id),
            total,
            "stored balance diverged from the transaction log"
        );
    }

    #[test]
    fn create_income_adds_to_balance() {
        let mut fixture = get_fixture();

        let hoisted_tx = new_transaction(&fixture, TransactionType::Income, "100.00");
        let transaction = create_transaction(&mut fixture.conn, fixture.user_id, hoisted_tx)
        .unwrap();

        assert_eq!(transaction.amount.to_string(), "100.00");
        assert_eq!(
            balance_of(&fixture, fixture.account_x.id),
            "100.00".parse().unwrap()
        );
        assert_balance_matches_transactions(&fixture, fixture.account_x.id);
    }

    #[test]
    fn create_expense_subtracts_from_balance() {
        let mut fixture = get_fixture();

        let hoisted_tx = new_transaction(&fixture, TransactionType::Expense, "40.50");
        create_transaction(&mut fixture.conn, fixture.user_id, hoisted_tx)
        .unwrap();

        assert_eq!(
            balance_of(&fixture, fixture.account_x.id),
            "-40.50".parse().unwrap()
        );
    }

    #[test]
    fn create_without_account_touches_no_balance() {
        let mut fixture = get_fixture();
        let mut unlinked = new_transaction(&fixture, TransactionType::Income, "99.00");
        unlinked.account_id = None;

        let transaction =
            create_transaction(&mut fixture.conn, fixture.user_id, unlinked).unwrap();

        assert_eq!(transaction.account_id, None);
        assert_eq!(transaction.currency, None);
        assert_eq!(balance_of(&fixture, fixture.account_x.id), Decimal::ZERO);
        assert_eq!(balance_of(&fixture, fixture.account_y.id), Decimal::ZERO);
    }

    #[test]
    fn create_inherits_account_currency_once() {
        let mut fixture = get_fixture();

        let hoisted_tx = new_transaction(&fixture, TransactionType::Income, "10.00");
        let transaction = create_transaction(&mut fixture.conn, fixture.user_id, hoisted_tx)
        .unwrap();

        assert_eq!(transaction.currency, Some(Currency::USD));
    }

    #[test]
    fn explicit_currency_wins_over_inheritance() {
        let mut fixture = get_fixture();
        let mut with_currency = new_transaction(&fixture, TransactionType::Income, "10.00");
        with_currency.currency = Some(Currency::EUR);

        let transaction =
            create_transaction(&mut fixture.conn, fixture.user_id, with_currency).unwrap();

        assert_eq!(transaction.currency, Some(Currency::EUR));
    }

    #[test]
    fn create_rejects_non_positive_amount() {
        let mut fixture = get_fixture();
        let mut zero_amount = new_transaction(&fixture, TransactionType::Income, "100.00");
        zero_amount.amount = Decimal::ZERO;

        let result = create_transaction(&mut fixture.conn, fixture.user_id, zero_amount);

        assert_eq!(result, Err(Error::InvalidAmount(Decimal::ZERO)));
    }

    #[test]
    fn create_rejects_unknown_category() {
        let mut fixture = get_fixture();
        let mut bad_category = new_transaction(&fixture, TransactionType::Income, "10.00");
        bad_category.category_id = 999;

        let result = create_transaction(&mut fixture.conn, fixture.user_id, bad_category);

        assert_eq!(result, Err(Error::InvalidCategory(Some(999))));
    }

    #[test]
    fn create_rejects_unknown_account() {
        let mut fixture = get_fixture();
        let mut bad_account = new_transaction(&fixture, TransactionType::Income, "10.00");
        bad_account.account_id = Some(999);

        let result = create_transaction(&mut fixture.conn, fixture.user_id, bad_account);

        assert_eq!(result, Err(Error::InvalidAccount(Some(999))));
    }

    #[test]
    fn create_strips_markup_from_description() {
        let mut fixture = get_fixture();
        let mut with_markup = new_transaction(&fixture, TransactionType::Income, "10.00");
        with_markup.description = "<b>Pay</b> day".to_string();

        let transaction =
            create_transaction(&mut fixture.conn, fixture.user_id, with_markup).unwrap();

        assert_eq!(transaction.description, "Pay day");
    }

    #[test]
    fn update_reverses_then_applies() {
        let mut fixture = get_fixture();
        let hoisted_tx = new_transaction(&fixture, TransactionType::Income, "100.00");
        let transaction = create_transaction(&mut fixture.conn, fixture.user_id, hoisted_tx)
        .unwrap();
        assert_eq!(
            balance_of(&fixture, fixture.account_x.id),
            "100.00".parse().unwrap()
        );

        // Flip the direction: the old +100 is reversed and -100 applied.
        update_transaction(
            &mut fixture.conn,
            fixture.user_id,
            transaction.id,
            TransactionChanges {
                transaction_type: Some(TransactionType::Expense),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(
            balance_of(&fixture, fixture.account_x.id),
            "-100.00".parse().unwrap()
        );
        assert_balance_matches_transactions(&fixture, fixture.account_x.id);
    }

    #[test]
    fn update_moves_effect_between_accounts() {
        let mut fixture = get_fixture();
        let hoisted_tx = new_transaction(&fixture, TransactionType::Expense, "100.00");
        let transaction = create_transaction(&mut fixture.conn, fixture.user_id, hoisted_tx)
        .unwrap();

        let updated = update_transaction(
            &mut fixture.conn,
            fixture.user_id,
            transaction.id,
            TransactionChanges {
                account_id: Patch::Set(fixture.account_y.id),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.account_id, Some(fixture.account_y.id));
        assert_eq!(balance_of(&fixture, fixture.account_x.id), Decimal::ZERO);
        assert_eq!(
            balance_of(&fixture, fixture.account_y.id),
            "-100.00".parse().unwrap()
        );
        assert_balance_matches_transactions(&fixture, fixture.account_x.id);
        assert_balance_matches_transactions(&fixture, fixture.account_y.id);
    }

    #[test]
    fn update_does_not_rederive_currency_on_move() {
        let mut fixture = get_fixture();
        let hoisted_tx = new_transaction(&fixture, TransactionType::Expense, "100.00");
        let transaction = create_transaction(&mut fixture.conn, fixture.user_id, hoisted_tx)
        .unwrap();
        assert_eq!(transaction.currency, Some(Currency::USD));

        // Move to the KES account; the currency was inherited at creation
        // and must stay USD.
        let updated = update_transaction(
            &mut fixture.conn,
            fixture.user_id,
            transaction.id,
            TransactionChanges {
                account_id: Patch::Set(fixture.account_y.id),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.currency, Some(Currency::USD));
    }

    #[test]
    fn update_unlinks_with_explicit_null() {
        let mut fixture = get_fixture();
        let hoisted_tx = new_transaction(&fixture, TransactionType::Income, "75.00");
        let transaction = create_transaction(&mut fixture.conn, fixture.user_id, hoisted_tx)
        .unwrap();

        let updated = update_transaction(
            &mut fixture.conn,
            fixture.user_id,
            transaction.id,
            TransactionChanges {
                account_id: Patch::Clear,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.account_id, None);
        assert_eq!(balance_of(&fixture, fixture.account_x.id), Decimal::ZERO);
    }

    #[test]
    fn update_links_a_previously_unlinked_transaction() {
        let mut fixture = get_fixture();
        let mut unlinked = new_transaction(&fixture, TransactionType::Income, "75.00");
        unlinked.account_id = None;
        let transaction =
            create_transaction(&mut fixture.conn, fixture.user_id, unlinked).unwrap();

        update_transaction(
            &mut fixture.conn,
            fixture.user_id,
            transaction.id,
            TransactionChanges {
                account_id: Patch::Set(fixture.account_x.id),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(
            balance_of(&fixture, fixture.account_x.id),
            "75.00".parse().unwrap()
        );
    }

    #[test]
    fn update_with_invalid_account_changes_nothing() {
        let mut fixture = get_fixture();
        let hoisted_tx = new_transaction(&fixture, TransactionType::Income, "100.00");
        let transaction = create_transaction(&mut fixture.conn, fixture.user_id, hoisted_tx)
        .unwrap();

        let result = update_transaction(
            &mut fixture.conn,
            fixture.user_id,
            transaction.id,
            TransactionChanges {
                account_id: Patch::Set(999),
                amount: Some("55.00".parse().unwrap()),
                ..Default::default()
            },
        );

        assert_eq!(result, Err(Error::InvalidAccount(Some(999))));
        let stored = get_transaction(&fixture.conn, fixture.user_id, transaction.id).unwrap();
        assert_eq!(stored, transaction);
        assert_eq!(
            balance_of(&fixture, fixture.account_x.id),
            "100.00".parse().unwrap()
        );
    }

    #[test]
    fn update_missing_transaction_fails() {
        let mut fixture = get_fixture();

        let result = update_transaction(
            &mut fixture.conn,
            fixture.user_id,
            42,
            TransactionChanges::default(),
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_reverses_effect() {
        let mut fixture = get_fixture();
        let hoisted_tx = new_transaction(&fixture, TransactionType::Expense, "100.00");
        create_transaction(&mut fixture.conn, fixture.user_id, hoisted_tx)
        .unwrap();
        let hoisted_tx = new_transaction(&fixture, TransactionType::Expense, "50.00");
        let second = create_transaction(&mut fixture.conn, fixture.user_id, hoisted_tx)
        .unwrap();
        assert_eq!(
            balance_of(&fixture, fixture.account_x.id),
            "-150.00".parse().unwrap()
        );

        delete_transaction(&mut fixture.conn, fixture.user_id, second.id).unwrap();

        assert_eq!(
            balance_of(&fixture, fixture.account_x.id),
            "-100.00".parse().unwrap()
        );
        assert_balance_matches_transactions(&fixture, fixture.account_x.id);
    }

    #[test]
    fn delete_missing_transaction_fails() {
        let mut fixture = get_fixture();

        let result = delete_transaction(&mut fixture.conn, fixture.user_id, 42);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn other_users_cannot_touch_the_transaction() {
        let mut fixture = get_fixture();
        let hoisted_tx = new_transaction(&fixture, TransactionType::Income, "10.00");
        let transaction = create_transaction(&mut fixture.conn, fixture.user_id, hoisted_tx)
        .unwrap();
        let stranger = UserId::new(fixture.user_id.as_i64() + 1);

        let update_result = update_transaction(
            &mut fixture.conn,
            stranger,
            transaction.id,
            TransactionChanges::default(),
        );
        let delete_result = delete_transaction(&mut fixture.conn, stranger, transaction.id);

        assert_eq!(update_result, Err(Error::NotFound));
        assert_eq!(delete_result, Err(Error::NotFound));
    }

    #[test]
    fn deleting_a_category_reverses_its_transactions() {
        let mut fixture = get_fixture();
        let doomed = create_category(
            &fixture.conn,
            fixture.user_id,
            NewCategory {
                name: "Doomed".to_string(),
                kind: CategoryKind::Expense,
            },
        )
        .unwrap();
        let mut in_doomed = new_transaction(&fixture, TransactionType::Expense, "30.00");
        in_doomed.category_id = doomed.id;
        create_transaction(&mut fixture.conn, fixture.user_id, in_doomed).unwrap();
        let hoisted_tx = new_transaction(&fixture, TransactionType::Income, "100.00");
        create_transaction(&mut fixture.conn, fixture.user_id, hoisted_tx)
        .unwrap();
        assert_eq!(
            balance_of(&fixture, fixture.account_x.id),
            "70.00".parse().unwrap()
        );

        delete_category(&mut fixture.conn, fixture.user_id, doomed.id).unwrap();

        assert_eq!(
            balance_of(&fixture, fixture.account_x.id),
            "100.00".parse().unwrap()
        );
        assert_balance_matches_transactions(&fixture, fixture.account_x.id);
    }

    #[test]
    fn concurrent_creates_do_not_lose_updates() {
        let fixture = get_fixture();
        let user_id = fixture.user_id;
        let account_id = fixture.account_x.id;
        let category_id = fixture.category_id;
        let shared = Arc::new(Mutex::new(fixture.conn));

        const THREADS: usize = 8;
        const CREATES_PER_THREAD: usize = 5;

        std::thread::scope(|scope| {
            for _ in 0..THREADS {
                let shared = Arc::clone(&shared);
                scope.spawn(move || {
                    for _ in 0..CREATES_PER_THREAD {
                        let mut connection = shared.lock().unwrap();
                        create_transaction(
                            &mut connection,
                            user_id,
                            NewTransaction {
                                account_id: Some(account_id),
                                category_id,
                                transaction_type: TransactionType::Income,
                                amount: Decimal::ONE,
                                currency: None,
                                description: String::new(),
                                date: date!(2024 - 03 - 15),
                            },
                        )
                        .unwrap();
                    }
                });
            }
        });

        let connection = shared.lock().unwrap();
        let account = get_account(&connection, user_id, account_id).unwrap();
        assert_eq!(account.balance, Decimal::from(THREADS * CREATES_PER_THREAD));
    }
}
