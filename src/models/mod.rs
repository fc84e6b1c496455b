pub mod filing;
pub mod otp;

pub use filing::{ClientData, FilingOutcome, FilingResult, ServiceType};
pub use otp::{MailMessage, OtpSource, OtpToken};
