use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use lectern::rag::CourseAnalytics;

async fn handler(State(state): State<AppState>) -> Result<Json<CourseAnalytics>, ApiError> {
    Ok(Json(state.rag.course_analytics().await?))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/courses", get(handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::testing;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use lectern::providers::mock::MockProvider;
    use tower::ServiceExt;

    fn courses_request() -> Request<Body> {
        Request::builder()
            .uri("/api/courses")
            .method("GET")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_course_stats() {
        let app = routes(testing::state(&MockProvider::default(), false));

        let response = app.oneshot(courses_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let analytics: CourseAnalytics = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(analytics.total_courses, 1);
        assert_eq!(analytics.course_titles, vec!["Building with the Claude API"]);
    }

    #[tokio::test]
    async fn test_search_outage_is_500() {
        let app = routes(testing::state(&MockProvider::default(), true));

        let response = app.oneshot(courses_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
