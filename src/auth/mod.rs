use crate::state::AppState;
use axum::Router;
use lazy_static::lazy_static;
use regex::Regex;

mod dto;
pub mod handlers;
pub mod password;
pub(crate) mod reset;
pub(crate) mod session;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[\w\.-]+@[\w\.-]+\.\w+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::session_routes())
}

#[cfg(test)]
mod tests {
    use super::is_valid_email;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("priya.nair@example.com"));
        assert!(is_valid_email("a_b-c@sub.domain.io"));
        assert!(!is_valid_email("missing-at.example.com"));
        assert!(!is_valid_email("no-tld@example"));
        assert!(!is_valid_email("spaces in@example.com"));
    }
}
