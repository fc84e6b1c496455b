pub mod filing_service;
pub mod otp_extractor;
pub mod otp_service;

pub use filing_service::{FilingAutomator, PortalCredentials};
pub use otp_extractor::{OtpExtractor, OtpMatcher};
pub use otp_service::{AcquireSettings, OtpAcquirer};
