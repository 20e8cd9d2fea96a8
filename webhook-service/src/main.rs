mod directory;
mod error;
mod flow;
mod handlers;
mod ledger;
mod respond;
mod routes;
#[cfg(test)]
mod tests;

use axum::{body::Body, extract::Request, response::Response, Router};
use http_body_util::BodyExt;
use lambda_http::{
    run, service_fn, Body as LambdaBody, Error, Request as LambdaRequest,
    Response as LambdaResponse,
};
use log::{debug, info};
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use tokio::sync::Mutex;
use tower::ServiceExt;

// Router instance shared across warm Lambda invocations
static ROUTER: OnceCell<Mutex<Option<Router>>> = OnceCell::new();

// The Lambda handler function
async fn function_handler(event: LambdaRequest) -> Result<LambdaResponse<LambdaBody>, Error> {
    info!(
        "Received Lambda request: method={:?}, path={:?}",
        event.method(),
        event.uri().path()
    );

    let mutex = ROUTER.get_or_init(|| Mutex::new(None));
    let mut router_slot = mutex.lock().await;
    if router_slot.is_none() {
        info!("Initializing the webhook router");
        *router_slot = Some(routes::create_router()?);
    }
    let app = router_slot.as_ref().unwrap().clone();
    drop(router_slot);

    let (parts, body) = event.into_parts();
    let body = match body {
        LambdaBody::Empty => Body::empty(),
        LambdaBody::Text(text) => {
            debug!("Request body: {}", text);
            Body::from(text.into_bytes())
        }
        LambdaBody::Binary(data) => Body::from(data),
    };

    let response = match app.oneshot(Request::from_parts(parts, body)).await {
        Ok(response) => response,
        Err(infallible) => match infallible {},
    };

    let lambda_response = response_to_lambda(response).await?;
    info!(
        "Returning Lambda response: status={}",
        lambda_response.status()
    );
    Ok(lambda_response)
}

// Convert the Axum response to a format suitable for Lambda
async fn response_to_lambda(response: Response) -> Result<LambdaResponse<LambdaBody>, Error> {
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await?.to_bytes();

    let builder = parts
        .headers
        .iter()
        .fold(
            LambdaResponse::builder().status(parts.status),
            |builder, (name, value)| builder.header(name, value),
        );

    let lambda_response = if bytes.is_empty() {
        builder.body(LambdaBody::Empty)?
    } else {
        match String::from_utf8(bytes.to_vec()) {
            Ok(text) => builder.body(LambdaBody::Text(text))?,
            Err(_) => builder.body(LambdaBody::Binary(bytes.to_vec()))?,
        }
    };

    Ok(lambda_response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize env_logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Ok(function_name) = std::env::var("AWS_LAMBDA_FUNCTION_NAME") {
        info!(
            "Starting webhook handler in AWS Lambda environment: {}",
            function_name
        );
        run(service_fn(function_handler)).await?;
    } else {
        let addr = SocketAddr::from(([127, 0, 0, 1], 3001));
        info!("Starting webhook handler locally on {}", addr);

        let app = routes::create_router()?;
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}
