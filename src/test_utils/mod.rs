#![allow(missing_docs)]

pub(crate) mod http;
pub(crate) mod state;

pub(crate) use http::{assert_json_message, get_test_server};
pub(crate) use state::{TEST_FRONTEND_URL, create_test_user, get_test_app_state};
