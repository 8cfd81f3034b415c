//! Inbound SMS webhook. Subscribers text `START`/`UNSTOP` or `STOP` to
//! manage their own subscription.

use actix_web::{HttpResponse, get, post, web};
use connwatch::{Channel, Directory};
use serde::Deserialize;
use tracing::{error, info};

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{SmsCommand, ValidationError, parse_sms_command};

/// Delivery report fields as sent by the SMS provider
#[derive(Debug, Deserialize)]
pub struct SmsReport {
    #[serde(rename = "From")]
    from: Option<String>,
    #[serde(rename = "Body")]
    body: Option<String>,
}

#[get("/callback/sms")]
pub async fn sms_query_route(
    report: web::Query<SmsReport>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    handle_report(report.into_inner(), &state).await
}

#[post("/callback/sms")]
pub async fn sms_form_route(
    report: web::Form<SmsReport>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    handle_report(report.into_inner(), &state).await
}

async fn handle_report(report: SmsReport, state: &AppState) -> Result<HttpResponse, ApiError> {
    let present = |field: Option<String>| field.filter(|value| !value.trim().is_empty());
    let (Some(from), Some(body)) = (present(report.from), present(report.body)) else {
        return Err(ValidationError::InvalidSmsReport.into());
    };

    let result = match parse_sms_command(&body) {
        Some(SmsCommand::Start) => state.directory.subscribe(Channel::Sms, &from).await,
        Some(SmsCommand::Stop) => state.directory.unsubscribe(Channel::Sms, &from).await,
        None => {
            info!(%from, "ignoring sms without a keyword");
            return Ok(HttpResponse::Ok().finish());
        }
    };

    // the provider only needs an acknowledgement
    match result {
        Ok(()) => info!(%from, "updated subscription from sms"),
        Err(err) => error!(%from, error = %err, "failed to update subscription from sms"),
    }

    Ok(HttpResponse::Ok().finish())
}

macros_utils::routes! {
    route sms_query_route,
    route sms_form_route,
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test};

    use super::*;
    use crate::routes::testing::test_state;

    #[actix_web::test]
    async fn test_sms_keywords() {
        let (state, directory, _dir) = test_state().await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/callback/sms")
            .set_form([("From", "+15551234567"), ("Body", " Start ")]);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(directory.list_active(Channel::Sms).await.unwrap().len(), 1);

        let req = test::TestRequest::get().uri("/callback/sms?From=%2B15551234567&Body=hello");
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(directory.list_active(Channel::Sms).await.unwrap().len(), 1);

        let req = test::TestRequest::get().uri("/callback/sms?From=%2B15551234567&Body=STOP");
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(directory.list_active(Channel::Sms).await.unwrap().is_empty());

        let req = test::TestRequest::post()
            .uri("/callback/sms")
            .set_form([("From", "+15551234567"), ("Body", "unstop")]);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(directory.list_active(Channel::Sms).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_sms_report_requires_fields() {
        let (state, directory, _dir) = test_state().await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::get().uri("/callback/sms?Body=start");
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(test::read_body(resp).await, "invalid sms delivery report");

        let req = test::TestRequest::post().uri("/callback/sms").set_form([("From", "+15551234567")]);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // empty values count as missing
        let req = test::TestRequest::get().uri("/callback/sms?From=&Body=start");
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/callback/sms?From=%2B1555&Body=");
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/callback/sms")
            .set_form([("From", " "), ("Body", "start")]);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        assert!(directory.list_active(Channel::Sms).await.unwrap().is_empty());
    }
}
