use std::str::FromStr;

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use model_actor::{Actor, Role};
use uuid::Uuid;

/// Builds the acting user from the identity headers set by the gateway in
/// front of this service and stores it as a request extension. Requests
/// without a valid identity are rejected before any handler runs.
pub async fn require_actor(mut request: Request, next: Next) -> Response {
    let actor = match actor_from_headers(request.headers()) {
        Ok(actor) => actor,
        Err(reason) => {
            tracing::debug!(%reason, "rejecting request without a valid identity");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };
    request.extensions_mut().insert(actor);
    next.run(request).await
}

fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let id = header("x-user-id")
        .ok_or("missing x-user-id")?
        .parse::<Uuid>()
        .map_err(|_| "x-user-id is not a uuid".to_string())?;
    let role = header("x-user-role")
        .ok_or("missing x-user-role")
        .and_then(|r| Role::from_str(&r).map_err(|_| "unknown x-user-role"))?;
    let region_id = match header("x-user-region") {
        Some(raw) => Some(
            raw.parse::<Uuid>()
                .map_err(|_| "x-user-region is not a uuid".to_string())?,
        ),
        None => None,
    };

    Ok(Actor {
        id,
        role,
        national_id: header("x-user-national-id"),
        display_name: header("x-user-name").unwrap_or_default(),
        region_id,
        company: header("x-user-company"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_str(name).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn builds_an_actor_from_the_identity_headers() {
        let id = Uuid::new_v4();
        let map = headers(&[
            ("x-user-id", &id.to_string()),
            ("x-user-role", "beneficiary"),
            ("x-user-national-id", "12345678-5"),
            ("x-user-name", "Carla Rojas"),
        ]);

        let actor = actor_from_headers(&map).unwrap();
        assert_eq!(actor.id, id);
        assert_eq!(actor.role, Role::Beneficiary);
        assert_eq!(actor.national_id.as_deref(), Some("12345678-5"));
        assert_eq!(actor.display_name, "Carla Rojas");
        assert!(actor.region_id.is_none());
    }

    #[test]
    fn rejects_a_missing_or_unknown_role() {
        let id = Uuid::new_v4().to_string();
        assert!(actor_from_headers(&headers(&[("x-user-id", &id)])).is_err());
        assert!(
            actor_from_headers(&headers(&[("x-user-id", &id), ("x-user-role", "wizard")]))
                .is_err()
        );
    }
}
