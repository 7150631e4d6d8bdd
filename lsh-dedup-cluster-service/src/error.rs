use crate::response::Status;
use lsh_dedup::DedupError;
use std::error;
use std::fmt;

#[derive(Debug, Clone)]
pub struct ServiceError {
    pub msg: String,
    pub status: Status,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.msg, u16::from(self.status))
    }
}

impl error::Error for ServiceError {}

impl ServiceError {
    pub fn bad_request<T: fmt::Display>(msg: T) -> ServiceError {
        ServiceError {
            msg: msg.to_string(),
            status: Status::BadRequest,
        }
    }

    pub fn internal_server_error<T: fmt::Display>(msg: T) -> ServiceError {
        ServiceError {
            msg: msg.to_string(),
            status: Status::InternalServerError,
        }
    }
}

/// Every core failure stems from the request or its data file.
impl From<DedupError> for ServiceError {
    fn from(err: DedupError) -> Self {
        ServiceError::bad_request(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_are_bad_requests() {
        let err: ServiceError = DedupError::Configuration("num_bands must be positive".into()).into();
        assert_eq!(err.status, Status::BadRequest);
        assert_eq!(err.msg, "configuration error: num_bands must be positive");
        assert_eq!(
            err.to_string(),
            "configuration error: num_bands must be positive (400)"
        );
    }
}
