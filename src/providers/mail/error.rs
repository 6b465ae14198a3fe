//! Maps SMTP transport errors onto delivery failure kinds.

use crate::core::error::DeliveryError;
use lettre::transport::smtp::Error as SmtpError;

/// Interprets a lettre SMTP error for a send to `recipient`.
pub(crate) fn classify_smtp_error(error: &SmtpError, recipient: &str) -> DeliveryError {
    classify_message(
        &error.to_string(),
        error.is_permanent(),
        error.is_transient(),
        error.is_timeout(),
        recipient,
    )
}

fn classify_message(
    message: &str,
    permanent: bool,
    transient: bool,
    timed_out: bool,
    recipient: &str,
) -> DeliveryError {
    let err_string = message.to_lowercase();

    if err_string.contains("535")
        || err_string.contains("534")
        || err_string.contains("authentication")
        || err_string.contains("username and password not accepted")
    {
        tracing::error!(target: "smtp_task", "SMTP authentication rejected while sending to {}: {}", recipient, message);
        return DeliveryError::Authentication(message.to_string());
    }

    if timed_out
        || err_string.contains("timed out")
        || err_string.contains("connection refused")
        || err_string.contains("network is unreachable")
        || err_string.contains("connection reset")
    {
        tracing::error!(target: "smtp_task", "SMTP connection failed while sending to {}: {}", recipient, message);
        return DeliveryError::Connection(message.to_string());
    }

    if transient
        || err_string.contains("temporary")
        || err_string.contains("greylisted")
        || err_string.contains("try again later")
    {
        tracing::warn!(target: "smtp_task", "SMTP transient error for {}: {}", recipient, message);
        return DeliveryError::Transient(message.to_string());
    }

    if permanent
        || err_string.contains("550")
        || err_string.contains("553")
        || err_string.contains("rejected")
        || err_string.contains("denied")
    {
        tracing::warn!(target: "smtp_task", "SMTP permanent rejection for {}: {}", recipient, message);
        return DeliveryError::Rejected(message.to_string());
    }

    if err_string.contains("tls") {
        tracing::warn!(target: "smtp_task", "SMTP TLS error while sending to {}: {}", recipient, message);
        return DeliveryError::Connection(format!("TLS error: {}", message));
    }

    tracing::error!(target: "smtp_task", "Unhandled SMTP error for {}: {}", recipient, message);
    DeliveryError::Transient(format!("Unhandled SMTP error: {}", message))
}
