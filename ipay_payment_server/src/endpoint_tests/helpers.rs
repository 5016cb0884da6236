use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use serde::Serialize;

pub async fn get_request(path: &str, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, String) {
    let req = TestRequest::get().uri(path).to_request();
    let service = test::init_service(App::new().configure(configure)).await;
    let res = test::call_service(&service, req).await;
    let (_, res) = res.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

pub async fn post_form<T: Serialize>(
    path: &str,
    form: &T,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    let req = TestRequest::post().uri(path).set_form(form).to_request();
    let service = test::init_service(App::new().configure(configure)).await;
    let res = test::call_service(&service, req).await;
    let (_, res) = res.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

pub async fn post_json<T: Serialize>(
    path: &str,
    body: &T,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    let req = TestRequest::post().uri(path).set_json(body).to_request();
    let service = test::init_service(App::new().configure(configure)).await;
    let res = test::call_service(&service, req).await;
    let (_, res) = res.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}
