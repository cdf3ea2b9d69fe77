//! The page shown when a request fails for reasons the user cannot fix.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::Markup;

use crate::{endpoints, html::error_view};

/// An internal server error page with a message for the user.
pub struct InternalServerError<'a> {
    /// What went wrong, in terms the user understands.
    pub description: &'a str,
    /// What the user can do about it.
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Your ledger has not been changed. Try again later or check the server logs.",
        }
    }
}

impl InternalServerError<'_> {
    fn view(&self) -> Markup {
        error_view("Internal Server Error", "500", self.description, self.fix)
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.view()).into_response()
    }
}

pub async fn get_internal_server_error_page() -> Response {
    InternalServerError::default().into_response()
}

/// Send an HTMX client to the internal server error page.
///
/// For requests made by HTMX only. Handlers serving full pages should return
/// [InternalServerError] directly.
pub fn get_internal_server_error_redirect() -> Response {
    (
        HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use scraper::Selector;

    use crate::{
        endpoints,
        internal_server_error::{
            InternalServerError, get_internal_server_error_page,
            get_internal_server_error_redirect,
        },
        test_utils::{assert_hx_redirect, assert_valid_html, parse_html_document},
    };

    #[tokio::test]
    async fn page_shows_description_and_fix() {
        let response = InternalServerError {
            description: "The ledger is locked.",
            fix: "Wait a moment.",
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let text = html
            .select(&Selector::parse("section").unwrap())
            .next()
            .expect("No section found")
            .text()
            .collect::<String>();
        assert!(text.contains("500"));
        assert!(text.contains("The ledger is locked."));
        assert!(text.contains("Wait a moment."));
    }

    #[tokio::test]
    async fn error_page_route_is_500() {
        let response = get_internal_server_error_page().await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn redirect_points_htmx_at_error_page() {
        let response = get_internal_server_error_redirect();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_hx_redirect(&response, endpoints::INTERNAL_ERROR_VIEW);
    }
}
