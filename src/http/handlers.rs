//! Route handlers.
//!
//! Handlers only run for admitted requests; the pipeline has already
//! stamped the context and checked credentials and quota.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::{Extension, Json};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};

use crate::generator::{available_formats, valid_area_codes, PhoneFormat, PhoneNumber};
use crate::http::response::{
    timestamp, AreaCodesData, Envelope, FormatsData, HealthBody, RateLimitMetadata,
};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::pipeline::error::FieldError;
use crate::pipeline::{ApiError, PhoneParams, RequestContext, BULK_RULES, PHONE_RULES};

type QueryParams = Result<Query<HashMap<String, String>>, QueryRejection>;

fn params(query: QueryParams) -> Result<HashMap<String, String>, ApiError> {
    query.map(|Query(params)| params).map_err(|rejection| {
        ApiError::ValidationFailed(vec![FieldError::query(
            "query",
            rejection.body_text(),
            None,
        )])
    })
}

pub async fn health(Extension(ctx): Extension<RequestContext>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "healthy",
        timestamp: timestamp(Utc::now()),
        request_id: ctx.id,
    })
}

/// `GET /api/phone`
pub async fn phone(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    query: QueryParams,
) -> Result<Json<Envelope<PhoneNumber>>, ApiError> {
    let PhoneParams { format, .. } = PhoneParams::from_query(&params(query)?, PHONE_RULES)?;

    let number = state.generator.generate(format);
    metrics::record_generated(format, 1);

    let metadata = RateLimitMetadata::from_status(ctx.rate_limit);
    Ok(Json(Envelope::new(&ctx, number).with_metadata(metadata)))
}

/// `GET /api/phone/bulk`
pub async fn bulk(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    query: QueryParams,
) -> Result<Json<Envelope<Vec<PhoneNumber>>>, ApiError> {
    let PhoneParams { format, count } = PhoneParams::from_query(&params(query)?, BULK_RULES)?;

    let numbers = state.generator.generate_multiple(count, format)?;
    metrics::record_generated(format, numbers.len());
    tracing::debug!(request_id = %ctx.id, count = numbers.len(), format = %format, "Generated batch");

    let metadata = RateLimitMetadata::from_status(ctx.rate_limit).with_count(numbers.len());
    Ok(Json(Envelope::new(&ctx, numbers).with_metadata(metadata)))
}

/// `GET /api/formats`
pub async fn formats(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Json<Envelope<FormatsData>> {
    let examples: BTreeMap<_, _> = PhoneFormat::ALL
        .iter()
        .map(|format| (format.as_str(), state.generator.generate(*format).formatted()))
        .collect();

    Json(Envelope::new(
        &ctx,
        FormatsData {
            formats: available_formats(),
            examples,
        },
    ))
}

/// `GET /api/area-codes`
pub async fn area_codes(Extension(ctx): Extension<RequestContext>) -> Json<Envelope<AreaCodesData>> {
    let codes = valid_area_codes();
    Json(Envelope::new(
        &ctx,
        AreaCodesData {
            area_codes: codes,
            count: codes.len(),
        },
    ))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
