//! Endpoint resource builder
//!
//! The only place that knows how a Pipedrive request is authenticated and
//! addressed. Everything else asks for an entity by name.

use crate::http::HttpClient;
use crate::pagination::{paginated_get, PageStream, StartLimitPaginator};
use crate::types::{ApiKey, StringMap};

/// Query parameter carrying the credential
pub const API_TOKEN_PARAM: &str = "api_token";

/// Stream every record of `entity` using the default page size
///
/// See [`endpoint_with_paginator`].
pub fn endpoint(
    client: &HttpClient,
    entity: &str,
    api_key: &ApiKey,
    extra_params: Option<&StringMap>,
) -> PageStream {
    endpoint_with_paginator(
        client,
        entity,
        api_key,
        extra_params,
        StartLimitPaginator::default(),
    )
}

/// Stream every record of `{base}/{entity}`
///
/// `extra_params` are entity filters such as `user_id=0`. They cannot
/// replace the token, and `start`/`limit` are always owned by the paginator.
/// No request is made until the returned stream is polled.
pub fn endpoint_with_paginator(
    client: &HttpClient,
    entity: &str,
    api_key: &ApiKey,
    extra_params: Option<&StringMap>,
    paginator: StartLimitPaginator,
) -> PageStream {
    let mut headers = StringMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());

    let mut params = StringMap::new();
    if let Some(extra) = extra_params {
        params.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    params.insert(API_TOKEN_PARAM.to_string(), api_key.expose().to_string());

    let url = client.build_url(entity);
    paginated_get(client.clone(), url, headers, params, paginator)
}
