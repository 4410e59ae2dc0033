use serde::Serialize;

/// JSON envelope used by every endpoint under `/api` and by the LTI
/// handshake replies:
///
/// ```json
/// {
///   "success": true,
///   "data": { "submission_id": "sub_1718000000000_7_rl-1" },
///   "message": "Submission stored"
/// }
/// ```
///
/// Errors carry `success: false`, the default value of `T` as `data`, and a
/// human-readable `message`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// An error reply; `T` must implement `Default` since errors carry no payload.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }
}
