//! Issuance flow constants.

/// Path of the callback endpoint invoked by the issuance service.
pub const CALLBACK_PATH: &str = "/api/issuer/issuance-request-callback";

/// Header carrying the shared callback secret.
pub const CALLBACK_API_KEY_HEADER: &str = "api-key";

/// Status message written when an issuance request is initiated.
pub const MESSAGE_PENDING: &str = "Waiting for QR code to be scanned";

/// Status message written when the wallet has fetched the request.
pub const MESSAGE_REQUEST_RETRIEVED: &str =
    "QR Code is scanned. Waiting for issuance to complete...";

/// Status message written when the credential was issued.
pub const MESSAGE_ISSUANCE_SUCCESSFUL: &str = "Credential successfully issued";

/// Fallback message for an `issuance_error` callback without details.
pub const MESSAGE_ISSUANCE_FAILED: &str = "Credential issuance failed";

/// Default Verified ID issuance endpoint.
pub const DEFAULT_ISSUANCE_ENDPOINT: &str =
    "https://verifiedid.did.msidentity.com/v1.0/verifiableCredentials/createIssuanceRequest";

/// Default authority host for the client-credential grant.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Default scope of the Verified ID request service.
pub const DEFAULT_VERIFIED_ID_SCOPE: &str = "3db474b9-6a0c-4840-96ac-1fceb342124f/.default";

/// Largest PIN length whose range fits in a `u64`.
pub const MAX_PIN_LENGTH: u8 = 19;
