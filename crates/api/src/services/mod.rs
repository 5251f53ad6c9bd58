//! External service integrations.

pub mod email;

pub use email::{invitation_message, MailError, MailMessage, MailService, Mailer};
