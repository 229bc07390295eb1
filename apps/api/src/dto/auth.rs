use serde::Deserialize;
use ts_rs::TS;

/// Incoming payload requesting a one-time login code.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/otp-request-request.ts"
)]
pub struct OtpRequestRequest {
    pub phone: String,
}

/// Incoming payload verifying a one-time login code.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/otp-verify-request.ts"
)]
pub struct OtpVerifyRequest {
    pub phone: String,
    pub code: String,
}
