#![allow(missing_docs)]

use axum_extra::extract::cookie::Cookie;
use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    AppState,
    auth::COOKIE_TOKEN,
    db::acquire_lock,
    endpoints,
    pagination::PaginationConfig,
    routing::build_router,
    transaction::{Category, Status, Transaction, create_transaction},
};

pub(crate) const TEST_EMAIL: &str = "test@test.com";
pub(crate) const TEST_NAME: &str = "Test User";
pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";

/// An app state backed by an in-memory database, with the cheapest bcrypt cost.
pub(crate) fn get_test_state() -> AppState {
    let conn = Connection::open_in_memory().expect("Could not open database in memory.");
    let mut state = AppState::new(conn, "42", "Etc/UTC", PaginationConfig::default())
        .expect("Could not create app state.");
    state.password_hash_cost = 4;

    state
}

pub(crate) fn get_test_server(state: AppState) -> TestServer {
    TestServer::new(build_router(state))
}

/// Register the test user and log in, returning the auth cookie.
pub(crate) async fn log_in(server: &TestServer) -> Cookie<'static> {
    server
        .post(endpoints::REGISTER)
        .json(&json!({
            "email": TEST_EMAIL,
            "password": TEST_PASSWORD,
            "name": TEST_NAME,
        }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server
        .post(endpoints::LOG_IN)
        .json(&json!({
            "email": TEST_EMAIL,
            "password": TEST_PASSWORD,
        }))
        .await;

    response.assert_status_ok();
    response.cookie(COOKIE_TOKEN)
}

pub(crate) fn insert_transactions(state: &AppState, transactions: &[Transaction]) {
    let connection = acquire_lock(&state.db_connection).unwrap();

    for transaction in transactions {
        create_transaction(transaction, &connection).expect("Could not insert transaction.");
    }
}

pub(crate) fn transaction(
    id: &str,
    date: OffsetDateTime,
    amount: f64,
    category: Category,
    status: Status,
    user_id: &str,
) -> Transaction {
    Transaction {
        id: id.to_owned(),
        date,
        amount,
        category,
        status,
        user_id: user_id.to_owned(),
        user_profile: None,
    }
}
