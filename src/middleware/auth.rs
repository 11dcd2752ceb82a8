use log::*;

use std::future::{ready, Ready};

use futures::future::LocalBoxFuture;

use actix_web::{
  body::EitherBody,
  http::header::{
    HeaderMap, AUTHORIZATION
  },
  web, Error, HttpMessage,
  ResponseError,
  HttpRequest, FromRequest
};
use actix_web::dev::{
  forward_ready,
  Service, Transform,
  ServiceRequest, ServiceResponse,
  Payload,
};

use crate::error::Result;
use crate::auth::jwt::*;

const TOKEN_PREFIX: &str = "Bearer ";
const TOKEN_HEADER: &str = "x-auth-token";

pub const NO_TOKEN: &str = "No token supplied, authorization denied";
pub const INVALID_TOKEN: &str = "Token is not valid";

fn invalid_token() -> crate::error::Error {
  crate::error::Error::unauthorized(INVALID_TOKEN)
}

/// Raw token from `Authorization: Bearer ..` or, failing that, `x-auth-token`.
pub fn token_from_headers(headers: &HeaderMap) -> Result<Option<String>> {
  // other schemes (e.g. proxy `Basic` auth) are left for the custom header.
  let bearer = headers.get(AUTHORIZATION)
    .and_then(|value| value.to_str().ok())
    .and_then(|value| value.strip_prefix(TOKEN_PREFIX));
  if let Some(token) = bearer {
    return Ok(Some(token.trim().to_string()));
  }
  match headers.get(TOKEN_HEADER) {
    Some(token) => {
      let token = token.to_str().map_err(|_| invalid_token())?;
      Ok(Some(token.trim().to_string()))
    },
    // No token provided.  Caller decides if this is an error.
    None => Ok(None),
  }
}

pub fn decode_jwt_claims(headers: &HeaderMap, keys: &JwtKeys) -> Result<Option<AuthData>> {
  let token = match token_from_headers(headers)? {
    Some(token) if !token.is_empty() => token,
    _ => return Ok(None),
  };

  let auth_data = token.decode_jwt(keys).map_err(|err| {
    debug!("Rejected token: {:?}", err);
    invalid_token()
  })?;

  Ok(Some(auth_data))
}

impl FromRequest for AuthData {
  type Error = crate::error::Error;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
    ready(match req.extensions().get::<AuthData>() {
      Some(auth) => Ok(auth.clone()),
      None => Err(crate::error::Error::unauthorized(NO_TOKEN)),
    })
  }
}

/// Route guard that requires a valid token.
pub struct Auth;

impl Auth {
  pub fn required() -> Self {
    Auth
  }
}

impl<S, B> Transform<S, ServiceRequest> for Auth
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type InitError = ();
  type Transform = AuthMiddleware<S>;
  type Future = Ready<Result<Self::Transform, Self::InitError>>;

  fn new_transform(&self, service: S) -> Self::Future {
    ready(Ok(AuthMiddleware {
      service
    }))
  }
}

pub struct AuthMiddleware<S> {
  service: S,
}

fn reject<B: 'static>(req: ServiceRequest, err: crate::error::Error)
  -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>>
{
  let res = req.into_response(err.error_response()).map_into_right_body();
  Box::pin(ready(Ok(res)))
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  forward_ready!(service);

  fn call(&self, req: ServiceRequest) -> Self::Future {
    let keys = match req.app_data::<web::Data<JwtKeys>>() {
      Some(keys) => keys.clone(),
      None => {
        error!("Auth: JwtKeys not registered.");
        return reject(req, crate::error::Error::InternalServerError);
      },
    };

    match decode_jwt_claims(req.headers(), &keys) {
      Ok(Some(auth_data)) => {
        debug!("Has authorization token: {:?}", auth_data);
        req.extensions_mut().insert(auth_data);
      },
      Ok(None) => {
        debug!("No authorization token");
        return reject(req, crate::error::Error::unauthorized(NO_TOKEN));
      },
      Err(err) => {
        return reject(req, err);
      },
    }

    let fut = self.service.call(req);
    Box::pin(async move {
      fut.await.map(ServiceResponse::map_into_left_body)
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use actix_web::http::header::{HeaderName, HeaderValue};
  use uuid::Uuid;

  fn headers(name: &'static str, value: &str) -> HeaderMap {
    header_list(&[(name, value)])
  }

  fn header_list(list: &[(&'static str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in list {
      map.insert(HeaderName::from_static(*name), HeaderValue::from_str(value).unwrap());
    }
    map
  }

  #[test]
  fn reads_bearer_and_custom_header() {
    let keys = JwtKeys::new("secret", 3600);
    let id = Uuid::new_v4();
    let token = keys.generate(id).unwrap();

    let auth = decode_jwt_claims(&headers("authorization", &format!("Bearer {}", token)), &keys).unwrap();
    assert_eq!(auth, Some(AuthData { user_id: id }));

    let auth = decode_jwt_claims(&headers("x-auth-token", token.as_str()), &keys).unwrap();
    assert_eq!(auth, Some(AuthData { user_id: id }));
  }

  #[test]
  fn missing_token_is_not_an_error() {
    let keys = JwtKeys::new("secret", 3600);
    assert_eq!(decode_jwt_claims(&HeaderMap::new(), &keys).unwrap(), None);
  }

  #[test]
  fn rejects_bad_tokens() {
    let keys = JwtKeys::new("secret", 3600);
    let other = JwtKeys::new("other", 3600).generate(Uuid::new_v4()).unwrap();

    assert!(decode_jwt_claims(&headers("x-auth-token", &other), &keys).is_err());
    assert!(decode_jwt_claims(&headers("x-auth-token", "garbage"), &keys).is_err());
    assert!(decode_jwt_claims(&headers("authorization", "Bearer abc"), &keys).is_err());
  }

  #[test]
  fn other_auth_schemes_fall_back_to_custom_header() {
    let keys = JwtKeys::new("secret", 3600);
    let id = Uuid::new_v4();
    let token = keys.generate(id).unwrap();

    let map = header_list(&[
      ("authorization", "Basic dXNlcjpwYXNz"),
      ("x-auth-token", token.as_str()),
    ]);
    assert_eq!(decode_jwt_claims(&map, &keys).unwrap(), Some(AuthData { user_id: id }));

    // no custom header either: treated as no token at all.
    assert_eq!(decode_jwt_claims(&headers("authorization", "Token abc"), &keys).unwrap(), None);
  }

  #[test]
  fn bearer_wins_over_custom_header() {
    let keys = JwtKeys::new("secret", 3600);
    let token = keys.generate(Uuid::new_v4()).unwrap();

    let map = header_list(&[
      ("authorization", "Bearer garbage"),
      ("x-auth-token", token.as_str()),
    ]);
    assert!(decode_jwt_claims(&map, &keys).is_err());
  }
}
