pub mod masking;
pub mod phone;
pub mod signature;

pub use masking::{mask_email, mask_phone, mask_transaction_id};
pub use phone::{normalize_phone, PhoneNumberError};
pub use signature::{
    sign_fields,
    verify_signature,
    SignatureError,
    CALLBACK_SIGNATURE_FIELDS,
    TRANSACTION_SIGNATURE_FIELDS,
};
