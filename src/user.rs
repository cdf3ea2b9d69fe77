//! Code for creating the user table, registering users and checking their credentials.

use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name the user logs in with. Unique across all users.
    pub username: String,
    /// The user's email address.
    pub email: String,
    /// The user's phone number.
    pub phone: String,
    /// The user's salted password hash.
    pub password_hash: PasswordHash,
}

/// The details needed to register a new user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The name the user will log in with.
    pub username: String,
    /// The user's email address.
    pub email: String,
    /// The user's phone number.
    pub phone: String,
    /// The user's salted password hash.
    pub password_hash: PasswordHash,
}

/// The ID and name of a user, e.g. for listing transfer recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name the user logs in with.
    pub username: String,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                phone TEXT NOT NULL,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Insert a new user into the database and return their ID.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateUsername] if another user already has the same username,
/// - or [Error::StorageUnavailable] if an SQL related error occurred.
pub fn register_user(new_user: NewUser, connection: &Connection) -> Result<UserID, Error> {
    connection.execute(
        "INSERT INTO user (username, email, phone, password) VALUES (?1, ?2, ?3, ?4)",
        (
            &new_user.username,
            &new_user.email,
            &new_user.phone,
            new_user.password_hash.as_ref(),
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());
    tracing::info!("Registered user {id} \"{}\"", new_user.username);

    Ok(id)
}

/// A cost 12 bcrypt hash that unknown usernames are checked against, so that
/// rejecting them takes as long as rejecting a wrong password.
const UNKNOWN_USER_PASSWORD_HASH: &str =
    "$2b$12$Gwf0uvxH3L7JLfo0CC/NCOoijK2vQ/wbgP.LeNup8vj6gg31IiFkm";

/// Check `password` against the stored password hash of the user named `username`.
///
/// This holds `connection` for the password check. Callers sharing a
/// connection should use [get_user_by_username] and [verify_credentials]
/// so the connection is free while bcrypt runs.
///
/// # Errors
///
/// Returns a:
/// - [Error::InvalidCredentials] if no user has the username or the password does not match,
/// - [Error::HashingError] if the stored hash could not be checked,
/// - or [Error::StorageUnavailable] if an SQL related error occurred.
pub fn authenticate(
    username: &str,
    password: &str,
    connection: &Connection,
) -> Result<UserID, Error> {
    let user = get_user_by_username(username, connection)?;

    verify_credentials(user.as_ref(), password)
}

/// Get the user named `username`, or `None` if nobody has that name.
///
/// # Errors
///
/// Returns a [Error::StorageUnavailable] if an SQL related error occurred.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<Option<User>, Error> {
    connection
        .prepare(
            "SELECT id, username, email, phone, password FROM user WHERE username = :username",
        )?
        .query_row(&[(":username", &username)], map_user_row)
        .optional()
        .map_err(Error::from)
}

/// Check `password` against the hash of `user`, as fetched by [get_user_by_username].
///
/// A missing user still goes through a full bcrypt check before being rejected.
///
/// # Errors
///
/// Returns a:
/// - [Error::InvalidCredentials] if `user` is `None` or the password does not match,
/// - or [Error::HashingError] if the stored hash could not be checked.
pub fn verify_credentials(user: Option<&User>, password: &str) -> Result<UserID, Error> {
    match user {
        Some(user) if user.password_hash.verify(password)? => Ok(user.id),
        Some(_) => Err(Error::InvalidCredentials),
        None => {
            PasswordHash::new_unchecked(UNKNOWN_USER_PASSWORD_HASH).verify(password)?;
            Err(Error::InvalidCredentials)
        }
    }
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, email, phone, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(Error::from)
}

/// Get every user except `user_id`, ordered by username.
///
/// # Errors
///
/// Returns a [Error::StorageUnavailable] if an SQL related error occurred.
pub fn get_other_users(user_id: UserID, connection: &Connection) -> Result<Vec<UserSummary>, Error> {
    connection
        .prepare("SELECT id, username FROM user WHERE id != :id ORDER BY username, id")?
        .query_map(&[(":id", &user_id.as_i64())], |row| {
            Ok(UserSummary {
                id: UserID::new(row.get(0)?),
                username: row.get(1)?,
            })
        })?
        .map(|maybe_user| maybe_user.map_err(Error::from))
        .collect()
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::StorageUnavailable] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(Error::from)
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(4)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}


#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error, PasswordHash,
        db::initialize,
        user::{
            NewUser, UNKNOWN_USER_PASSWORD_HASH, UserID, authenticate, count_users,
            get_other_users, get_user_by_id, get_user_by_username, register_user,
            test_utils::insert_test_user, verify_credentials,
        },
    };

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        initialize(&conn).expect("Could not initialize database");

        conn
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_owned(),
            email: "alice@example.com".to_owned(),
            phone: "021 123 4567".to_owned(),
            password_hash: PasswordHash::new("hunter2", 4).unwrap(),
        }
    }

    #[test]
    fn register_user_succeeds() {
        let db_connection = get_db_connection();
        let user = new_user("alice");

        let id = register_user(user.clone(), &db_connection).unwrap();

        let retrieved_user = get_user_by_id(id, &db_connection).unwrap();
        assert!(id.as_i64() > 0);
        assert_eq!(retrieved_user.username, user.username);
        assert_eq!(retrieved_user.email, user.email);
        assert_eq!(retrieved_user.phone, user.phone);
        assert_eq!(retrieved_user.password_hash, user.password_hash);
    }

    #[test]
    fn register_duplicate_username_fails_and_adds_one_user() {
        let db_connection = get_db_connection();
        register_user(new_user("alice"), &db_connection).unwrap();

        let result = register_user(new_user("alice"), &db_connection);

        assert_eq!(result, Err(Error::DuplicateUsername));
        assert_eq!(count_users(&db_connection).unwrap(), 1);
    }

    #[test]
    fn usernames_are_case_sensitive() {
        let db_connection = get_db_connection();
        register_user(new_user("alice"), &db_connection).unwrap();

        let result = register_user(new_user("Alice"), &db_connection);

        assert!(result.is_ok(), "want Ok, got {result:?}");
        assert_eq!(count_users(&db_connection).unwrap(), 2);
    }

    #[test]
    fn authenticate_succeeds_with_matching_password() {
        let db_connection = get_db_connection();
        let id = insert_test_user("alice", &db_connection);

        let result = authenticate("alice", "hunter2", &db_connection);

        assert_eq!(result, Ok(id));
    }

    #[test]
    fn authenticate_fails_with_wrong_password() {
        let db_connection = get_db_connection();
        insert_test_user("alice", &db_connection);

        let result = authenticate("alice", "hunter3", &db_connection);

        assert_eq!(result, Err(Error::InvalidCredentials));
    }

    #[test]
    fn authenticate_fails_with_unknown_username() {
        let db_connection = get_db_connection();
        insert_test_user("alice", &db_connection);

        let result = authenticate("bob", "hunter2", &db_connection);

        assert_eq!(result, Err(Error::InvalidCredentials));
    }

    #[test]
    fn unknown_user_is_checked_against_a_real_hash() {
        // The password of the stand-in hash must not let anyone in.
        let result = verify_credentials(None, "okon");

        assert_eq!(result, Err(Error::InvalidCredentials));
        assert!(PasswordHash::new_unchecked(UNKNOWN_USER_PASSWORD_HASH)
            .verify("okon")
            .unwrap());
    }

    #[test]
    fn get_user_by_username_returns_none_for_unknown_name() {
        let db_connection = get_db_connection();
        let id = insert_test_user("alice", &db_connection);

        let alice = get_user_by_username("alice", &db_connection).unwrap();
        let bob = get_user_by_username("bob", &db_connection).unwrap();

        assert_eq!(alice.map(|user| user.id), Some(id));
        assert_eq!(bob, None);
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        let id = UserID::new(42);

        assert_eq!(get_user_by_id(id, &db_connection), Err(Error::NotFound));
    }

    #[test]
    fn get_other_users_excludes_given_user() {
        let db_connection = get_db_connection();
        let carol = insert_test_user("carol", &db_connection);
        let alice = insert_test_user("alice", &db_connection);
        let bob = insert_test_user("bob", &db_connection);

        let others = get_other_users(alice, &db_connection).unwrap();

        let got: Vec<_> = others.iter().map(|user| user.id).collect();
        assert_eq!(got, vec![bob, carol]);
    }

    #[test]
    fn returns_correct_count() {
        let db_connection = get_db_connection();

        let count = count_users(&db_connection).expect("Could not get user count");
        assert_eq!(0, count, "Want zero users before insertion, got {count}");

        insert_test_user("alice", &db_connection);

        let count = count_users(&db_connection).expect("Could not get user count");
        assert_eq!(1, count, "Want one user after insertion, got {count}");
    }
}
