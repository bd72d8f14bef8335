use diesel::connection::SimpleConnection;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::BigInt;
use diesel::sqlite::SqliteConnection;

use crate::error::AppError;
use crate::images::PLACEHOLDER_IMAGE;
use crate::models::{NewUser, User};
use crate::schema::users;

pub type Pool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type PooledConnection = r2d2::PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute("PRAGMA busy_timeout = 5000;")
            .map_err(r2d2::Error::QueryError)
    }
}

pub fn build_pool(database_url: &str, size: u32) -> Result<Pool, AppError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Ok(r2d2::Pool::builder()
        .max_size(size)
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)?)
}

pub fn init_schema(conn: &mut SqliteConnection) -> Result<(), AppError> {
    conn.batch_execute(&format!(
        "CREATE TABLE IF NOT EXISTS users (
            username VARCHAR(20) PRIMARY KEY NOT NULL,
            password BLOB NOT NULL,
            profile_image TEXT NOT NULL DEFAULT '{}'
        );",
        PLACEHOLDER_IMAGE
    ))?;
    Ok(())
}

// users has a text primary key, so insertion order is only visible through rowid
fn insertion_order() -> diesel::expression::SqlLiteral<BigInt> {
    sql::<BigInt>("rowid")
}

pub fn get_user(conn: &mut SqliteConnection, username: &str) -> Result<Option<User>, AppError> {
    Ok(users::table
        .find(username)
        .select(User::as_select())
        .first(conn)
        .optional()?)
}

/// Usernames in insertion order.
pub fn list_users(
    conn: &mut SqliteConnection,
    offset: i64,
    limit: i64,
) -> Result<Vec<String>, AppError> {
    Ok(users::table
        .select(users::username)
        .order(insertion_order())
        .offset(offset)
        .limit(limit)
        .load(conn)?)
}

/// Same page as [`list_users`], with the full rows.
pub fn list_profiles(
    conn: &mut SqliteConnection,
    offset: i64,
    limit: i64,
) -> Result<Vec<User>, AppError> {
    Ok(users::table
        .select(User::as_select())
        .order(insertion_order())
        .offset(offset)
        .limit(limit)
        .load(conn)?)
}

pub fn get_password_hash(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<Vec<u8>>, AppError> {
    Ok(users::table
        .find(username)
        .select(users::password)
        .first(conn)
        .optional()?)
}

pub fn get_profile_image_url(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<String>, AppError> {
    Ok(users::table
        .find(username)
        .select(users::profile_image)
        .first(conn)
        .optional()?)
}

/// Returns false when no such user exists.
pub fn set_profile_image_url<U>(
    conn: &mut SqliteConnection,
    user: U,
    url: &str,
) -> Result<bool, AppError>
where
    U: AsRef<str>,
{
    let updated = diesel::update(users::table.find(user.as_ref()))
        .set(users::profile_image.eq(url))
        .execute(conn)?;
    Ok(updated > 0)
}

/// Insert a new user. The primary key is the only uniqueness guard: of two
/// racing inserts for one username, the loser gets `Conflict`.
pub fn create_user(
    conn: &mut SqliteConnection,
    username: &str,
    hashed_password: &[u8],
) -> Result<User, AppError> {
    let new_user = NewUser {
        username,
        hashed_password,
    };

    conn.transaction::<_, DieselError, _>(|conn| {
        diesel::insert_into(users::table)
            .values(&new_user)
            .execute(conn)?;
        users::table
            .find(username)
            .select(User::as_select())
            .first(conn)
    })
    .map_err(|e| match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            AppError::Conflict(format!("username {} is already registered", username))
        }
        e => AppError::Database(e),
    })
}
