#![cfg_attr(doc, doc = include_str!("../README.md"))]

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod error;
#[cfg(feature = "realtime")]
pub mod realtime;
#[cfg(feature = "realtime")]
pub mod refresh;
#[cfg(feature = "api")]
pub(crate) mod serde_helpers;
pub mod types;
#[cfg(feature = "ws")]
pub mod ws;

#[cfg(feature = "api")]
use reqwest::{Request, StatusCode};
use serde::Serialize;
#[cfg(feature = "api")]
use serde::de::DeserializeOwned;

pub use crate::config::Config;
use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Query-string encoding for request types.
///
/// Blanket-implemented for every [`Serialize`] type through [`serde_html_form`],
/// so sequences become repeated keys (`league=euro&league=copa`) and `None`
/// fields are left out.
pub trait ToQueryParams: Serialize {
    /// `?key=value&...`, or an empty string when nothing is set.
    fn query_params(&self) -> String {
        match serde_html_form::to_string(self) {
            Ok(params) if !params.is_empty() => format!("?{params}"),
            Ok(_) => String::new(),
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::error!(error = %e, "Query parameters could not be encoded, sending none");
                #[cfg(not(feature = "tracing"))]
                let _: &serde_html_form::ser::Error = &e;
                String::new()
            }
        }
    }
}

impl<T: Serialize> ToQueryParams for T {}

/// Run `request` and decode a JSON body.
///
/// Non-2xx answers become [`Status`](error::Status) errors carrying the response
/// body. A JSON `null` body is reported as `404`, which is how the API answers
/// lookups of unknown ids.
#[cfg(feature = "api")]
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        level = "debug",
        skip(client, request),
        fields(
            method = %request.method(),
            path = request.url().path(),
            status_code
        )
    )
)]
async fn execute<Response: DeserializeOwned>(
    client: &reqwest::Client,
    request: Request,
) -> Result<Response> {
    let method = request.method().clone();
    let path = request.url().path().to_owned();

    let response = client.execute(request).await?;
    let status_code = response.status();

    #[cfg(feature = "tracing")]
    tracing::Span::current().record("status_code", status_code.as_u16());

    if !status_code.is_success() {
        let body = response.text().await.unwrap_or_default();

        #[cfg(feature = "tracing")]
        tracing::warn!(%status_code, %method, %path, %body, "API call failed");

        return Err(Error::status(status_code, method, path, body));
    }

    let body = response.json::<serde_json::Value>().await?;
    let decoded: Option<Response> = serde_helpers::deserialize_with_warnings(body)?;

    decoded.ok_or_else(|| {
        #[cfg(feature = "tracing")]
        tracing::warn!(%method, %path, "API returned an empty body");
        Error::status(StatusCode::NOT_FOUND, method, path, "resource not found")
    })
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::ToQueryParams as _;

    #[derive(Serialize)]
    struct Paging {
        limit: Option<u32>,
        league: Vec<&'static str>,
    }

    #[test]
    fn query_params_repeat_sequence_keys() {
        let paging = Paging {
            limit: Some(20),
            league: vec!["euro", "copa"],
        };
        assert_eq!(paging.query_params(), "?limit=20&league=euro&league=copa");
    }

    #[test]
    fn empty_query_params_yield_empty_string() {
        assert_eq!(().query_params(), "");
    }
}
