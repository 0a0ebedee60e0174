//! API request helpers

use axum::extract::FromRequest;
use axum::extract::FromRequestParts;
use axum::extract::Json;
use axum::extract::Path;
use axum::extract::Request;
use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::PathRejection;
use axum::http::request::Parts;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::storage::Page;

use super::Error;

/// Largest accepted page size
const MAX_PAGE_SIZE: u32 = 100;

/// Pagination query parameters, 1-based, camelCase on the wire
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Optional case-insensitive title keyword
    pub keyword: Option<String>,
}

pub fn default_page() -> u32 {
    1
}

pub fn default_page_size() -> u32 {
    10
}

impl PageQuery {
    /// The page request for storage, with the size clamped
    pub fn to_page(&self) -> Page {
        Page {
            number: self.page.max(1),
            size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

fn parse_json<J>(json: Result<Json<J>, JsonRejection>) -> Result<J, Error> {
    match json {
        Ok(Json(json)) => Ok(json),
        Err(err) => match err {
            JsonRejection::JsonDataError(err) => {
                Err(Error::bad_request("Data error").with_description(err))
            }
            JsonRejection::JsonSyntaxError(err) => {
                Err(Error::bad_request("JSON syntax error").with_description(err))
            }
            JsonRejection::MissingJsonContentType(_err) => Err(Error::bad_request(
                "Missing `application/json` content type",
            )),
            JsonRejection::BytesRejection(err) => {
                Err(Error::bad_request("Invalid characters in JSON").with_description(err))
            }
            err => Err(Error::bad_request("Unknown JSON error").with_description(err)),
        },
    }
}

/// Wrapper for the JSON extractor
pub struct Form<F>(pub F);

impl<B, F> FromRequest<B> for Form<F>
where
    B: Send + Sync,
    F: DeserializeOwned + Send,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &B) -> Result<Self, Self::Rejection> {
        let json = Json::<F>::from_request(req, state).await;

        parse_json(json).map(Form)
    }
}

fn parse_path<P>(path: Result<Path<P>, PathRejection>) -> Result<P, Error> {
    match path {
        Ok(Path(path)) => Ok(path),
        Err(err) => match err {
            PathRejection::FailedToDeserializePathParams(err) => {
                Err(Error::bad_request("Invalid path parameter").with_description(err))
            }
            PathRejection::MissingPathParams(err) => {
                Err(Error::bad_request("Missing path parameter").with_description(err))
            }
            err => Err(Error::bad_request("Unknown path error").with_description(err)),
        },
    }
}

pub struct PathParameters<P>(pub P);

impl<B, P> FromRequestParts<B> for PathParameters<P>
where
    B: Send + Sync,
    P: DeserializeOwned + Send,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &B) -> Result<Self, Self::Rejection> {
        let path = Path::<P>::from_request_parts(parts, state).await;

        parse_path(path).map(PathParameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_clamps_size() {
        let query = PageQuery {
            page: 0,
            page_size: 1000,
            keyword: None,
        };

        let page = query.to_page();

        assert_eq!(1, page.number);
        assert_eq!(MAX_PAGE_SIZE, page.size);
        assert_eq!(0, page.offset());
    }

    #[test]
    fn test_page_offset() {
        let page = Page { number: 3, size: 10 };

        assert_eq!(20, page.offset());
    }
}
