#[cfg(test)]
mod tests {
    use crate::drive::DriveError;
    use crate::error::AppError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::io;

    async fn body_json(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let error = AppError::BadRequest("Invalid input".to_string());
        assert_eq!(format!("{}", error), "Bad request: Invalid input");

        let error = AppError::NotFound("Resource not found".to_string());
        assert_eq!(format!("{}", error), "Not found: Resource not found");

        let error = AppError::RateLimited { retry_after_seconds: 60 };
        assert_eq!(format!("{}", error), "Rate limited. Retry after 60 seconds");

        let error = AppError::QuotaExceeded { requested: 500, used: 600, limit: 1000 };
        assert_eq!(format!("{}", error), "Storage limit exceeded: 500 bytes requested, 600 of 1000 bytes used");
    }

    #[test]
    fn test_app_error_into_response() {
        let cases = [
            (AppError::BadRequest("Test error".to_string()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("Not found".to_string()), StatusCode::NOT_FOUND),
            (AppError::Conflict("Conflict".to_string()), StatusCode::CONFLICT),
            (AppError::ServiceUnavailable("Service down".to_string()), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::Unauthorized("No access".to_string()), StatusCode::UNAUTHORIZED),
            (AppError::RateLimited { retry_after_seconds: 30 }, StatusCode::TOO_MANY_REQUESTS),
            (AppError::PayloadTooLarge { limit: 1024 }, StatusCode::PAYLOAD_TOO_LARGE),
            (AppError::QuotaExceeded { requested: 1, used: 1, limit: 1 }, StatusCode::BAD_REQUEST),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_quota_exceeded_body() {
        let (status, body) = body_json(AppError::QuotaExceeded { requested: 500, used: 600, limit: 1000 }).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert_eq!(body["error"]["code"], "QUOTA_EXCEEDED");
        assert_eq!(body["error"]["message"], "Storage limit exceeded");
        assert_eq!(body["error"]["details"]["requested"], 500);
        assert_eq!(body["error"]["details"]["used"], 600);
        assert_eq!(body["error"]["details"]["limit"], 1000);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let (status, body) = body_json(AppError::Internal(anyhow::anyhow!("secret detail"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert!(!body.to_string().contains("secret detail"));
        assert!(body["error"]["details"]["error_id"].is_string());
    }

    #[test]
    fn test_from_drive_error() {
        match AppError::from(DriveError::NotFound("Folder")) {
            AppError::NotFound(msg) => assert_eq!(msg, "Folder not found"),
            other => panic!("Expected NotFound, got {:?}", other),
        }

        match AppError::from(DriveError::QuotaExceeded { requested: 5, used: 6, limit: 10 }) {
            AppError::QuotaExceeded { requested, used, limit } => assert_eq!((requested, used, limit), (5, 6, 10)),
            other => panic!("Expected QuotaExceeded, got {:?}", other),
        }

        let invalid = DriveError::InvalidInput { field: "name".to_string(), message: "name is required".to_string() };
        match AppError::from(invalid) {
            AppError::ValidationError { field, message } => {
                assert_eq!(field, "name");
                assert_eq!(message, "name is required");
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }

        assert!(matches!(AppError::from(DriveError::InvalidOwner), AppError::Unauthorized(_)));
        assert!(matches!(
            AppError::from(DriveError::Content(io::Error::new(io::ErrorKind::Other, "disk gone"))),
            AppError::IoError(_)
        ));
        assert!(matches!(AppError::from(DriveError::Database(sqlx::Error::PoolTimedOut)), AppError::ServiceUnavailable(_)));
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();

        match app_error {
            AppError::IoError(msg) => assert!(msg.contains("File not found")),
            _ => panic!("Expected IoError variant"),
        }
    }

    #[test]
    fn test_validation_error_creation() {
        let error = AppError::ValidationError {
            field: "email".to_string(),
            message: "Invalid email format".to_string(),
        };

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
