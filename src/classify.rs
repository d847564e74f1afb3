//! Classification of dispatch failures
//!
//! The fetch state machine only needs to know three things about a failed
//! dispatch: was it the redirect policy, was it one of the recognized
//! transient TLS failures, or something else. Transports only expose error
//! text for TLS failures, so the recognized substrings live here and
//! nowhere else.

use crate::error::TransportError;
use crate::redirect::REDIRECT_CANCELLED;

/// A recognized transient TLS failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsSignature {
    /// The server certificate was refused
    CertificateError,
    /// The peer did not speak TLS (oversized or corrupt record)
    OversizedRecord,
}

impl TlsSignature {
    /// Every recognized signature, in matching order
    pub const ALL: [TlsSignature; 2] = [
        TlsSignature::CertificateError,
        TlsSignature::OversizedRecord,
    ];

    /// Substrings identifying this signature in an error message
    pub fn markers(self) -> &'static [&'static str] {
        match self {
            TlsSignature::CertificateError => &[
                "SSL_CERTIFICATE_ERROR",
                "certificate verify failed",
                "invalid peer certificate",
            ],
            TlsSignature::OversizedRecord => &[
                "tls: oversized record received with length",
                "wrong version number",
                "received corrupt message",
            ],
        }
    }

    /// Find the first signature whose marker occurs in `message`
    pub fn detect(message: &str) -> Option<TlsSignature> {
        Self::ALL
            .into_iter()
            .find(|signature| signature.markers().iter().any(|m| message.contains(m)))
    }
}

/// What a dispatch failure means for the fetch state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The redirect inspection callback refused a hop
    RedirectRejected,
    /// A recognized TLS failure; eligible for the HTTP fallback
    TlsTransient(TlsSignature),
    /// Anything else; terminal
    Other,
}

/// Trait for errors that can be classified for the fallback decision
pub trait Classify {
    /// Returns the failure kind of this error
    fn failure_kind(&self) -> FailureKind;
}

impl Classify for TransportError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            TransportError::Redirect(_) => FailureKind::RedirectRejected,
            // Transports that cannot hand back the structured rejection still
            // carry its marker in the message
            TransportError::Dispatch(msg) if msg.contains(REDIRECT_CANCELLED) => {
                FailureKind::RedirectRejected
            }
            TransportError::Dispatch(msg) => TlsSignature::detect(msg)
                .map(FailureKind::TlsTransient)
                .unwrap_or(FailureKind::Other),
            TransportError::Build(_) => FailureKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::RedirectRejected;

    fn dispatch(msg: &str) -> TransportError {
        TransportError::Dispatch(msg.to_string())
    }

    #[test]
    fn structured_redirect_rejection() {
        let err = TransportError::Redirect(RedirectRejected::new(vec!["/a".into()]));
        assert_eq!(err.failure_kind(), FailureKind::RedirectRejected);
    }

    #[test]
    fn redirect_marker_in_text() {
        let err = dispatch(
            "error following redirect for url (https://x/b): redirect cancelled \n/a\n/b\n",
        );
        assert_eq!(err.failure_kind(), FailureKind::RedirectRejected);
    }

    #[test]
    fn certificate_errors() {
        for msg in [
            "urlfetch: SSL_CERTIFICATE_ERROR",
            "error trying to connect: certificate verify failed",
            "invalid peer certificate: UnknownIssuer",
        ] {
            assert_eq!(
                dispatch(msg).failure_kind(),
                FailureKind::TlsTransient(TlsSignature::CertificateError),
                "{msg}"
            );
        }
    }

    #[test]
    fn oversized_record_errors() {
        for msg in [
            "Get https://example.com/: tls: oversized record received with length 20527",
            "error:0A00010B:SSL routines:ssl3_get_record:wrong version number",
            "received corrupt message of type InvalidContentType",
        ] {
            assert_eq!(
                dispatch(msg).failure_kind(),
                FailureKind::TlsTransient(TlsSignature::OversizedRecord),
                "{msg}"
            );
        }
    }

    #[test]
    fn unrelated_errors_are_other() {
        assert_eq!(dispatch("connection refused").failure_kind(), FailureKind::Other);
        assert_eq!(
            dispatch("operation timed out").failure_kind(),
            FailureKind::Other
        );
        assert_eq!(
            TransportError::Build("SSL_CERTIFICATE_ERROR".into()).failure_kind(),
            FailureKind::Other
        );
    }

    #[test]
    fn detect_prefers_first_signature() {
        let msg = "SSL_CERTIFICATE_ERROR after wrong version number";
        assert_eq!(TlsSignature::detect(msg), Some(TlsSignature::CertificateError));
    }
}
