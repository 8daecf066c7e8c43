pub(crate) const ACCESS_TOKEN_KEY: &str = "token";
pub(crate) const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub(crate) const USER_KEY: &str = "user";

pub(crate) const AUTH_HEADER: &str = "Authorization";
pub(crate) const BEARER_PREFIX: &str = "Bearer ";

pub(crate) const REFRESH_ENDPOINT: &str = "/auth/token/refresh/";
pub(crate) const LOGIN_ROUTE: &str = "/login";

pub(crate) const NO_RESPONSE_MESSAGE: &str =
    "No response from server. Please check your connection.";
pub(crate) const GENERIC_ERROR_MESSAGE: &str = "An error occurred";
