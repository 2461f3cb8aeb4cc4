// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! JSON envelope `{ success, message?, data? }` and error-to-status mapping.

use crate::core::error::StakingError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Response body shared by every API route.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    /// Operation outcome.
    pub success: bool,
    /// Human-readable status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// `200` with data.
pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        message: None,
        data: Some(data),
    })
}

/// `status` with a message and data.
pub fn with_message<T: Serialize>(
    status: StatusCode,
    message: &str,
    data: T,
) -> (StatusCode, Json<Envelope<T>>) {
    (
        status,
        Json(Envelope {
            success: true,
            message: Some(message.to_string()),
            data: Some(data),
        }),
    )
}

/// API-level failures.
#[derive(Debug)]
pub enum ApiError {
    /// Domain rejection.
    Staking(StakingError),
    /// Missing or malformed caller identity.
    Unauthenticated,
    /// Admin token missing, wrong, or admin routes disabled.
    Forbidden,
    /// Body could not be decoded.
    BadRequest(String),
}

impl From<StakingError> for ApiError {
    fn from(e: StakingError) -> Self {
        ApiError::Staking(e)
    }
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Staking(e) => match e {
                StakingError::NotFound(_) | StakingError::PoolUnavailable => StatusCode::NOT_FOUND,
                StakingError::Validation(_)
                | StakingError::BelowMinimum { .. }
                | StakingError::CapacityExceeded { .. }
                | StakingError::LockPeriodActive { .. }
                | StakingError::InvalidTransaction(_)
                | StakingError::NoRewardsAvailable => StatusCode::BAD_REQUEST,
                StakingError::DuplicateTransaction | StakingError::Conflict => StatusCode::CONFLICT,
                StakingError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Unauthenticated => "authentication required".to_string(),
            ApiError::Forbidden => "admin access required".to_string(),
            ApiError::BadRequest(m) => m.clone(),
            ApiError::Staking(e) => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Envelope::<()> {
            success: false,
            message: Some(self.message()),
            data: None,
        };
        (self.status(), Json(body)).into_response()
    }
}
