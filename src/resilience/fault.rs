//! Captured handler panics.
//!
//! A panic is caught where it happens, turned into a [`Fault`] so it can be
//! moved between tasks and logged, and then deliberately re-raised with
//! [`Fault::resume`] at the boundary that owns final handling.

use std::any::Any;
use std::fmt;
use std::panic;

use thiserror::Error;

/// A panic payload plus a printable rendering of it.
#[derive(Error)]
#[error("request handler panicked: {message}")]
pub struct Fault {
    message: String,
    kind: &'static str,
    payload: Box<dyn Any + Send>,
}

impl Fault {
    /// Wrap the payload returned by `catch_unwind`.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let (message, kind) = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            ((*msg).to_string(), "&str")
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            (msg.clone(), "String")
        } else {
            ("unknown panic".to_string(), "unknown")
        };
        Self {
            message,
            kind,
            payload,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Payload type name, for logs.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn into_payload(self) -> Box<dyn Any + Send> {
        self.payload
    }

    /// Continue unwinding with the original payload on the current task.
    pub fn resume(self) -> ! {
        panic::resume_unwind(self.payload)
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("message", &self.message)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_str_payload() {
        let payload = panic::catch_unwind(|| panic!("boom")).unwrap_err();
        let fault = Fault::from_panic(payload);
        assert_eq!(fault.message(), "boom");
        assert_eq!(fault.kind(), "&str");
    }

    #[test]
    fn test_formatted_payload() {
        let id = 7;
        let payload = panic::catch_unwind(|| panic!("bad id {id}")).unwrap_err();
        let fault = Fault::from_panic(payload);
        assert_eq!(fault.message(), "bad id 7");
        assert_eq!(fault.kind(), "String");
        assert!(fault.to_string().contains("bad id 7"));
    }

    #[test]
    fn test_opaque_payload() {
        let fault = Fault::from_panic(Box::new(42u32));
        assert_eq!(fault.message(), "unknown panic");
        assert_eq!(*fault.into_payload().downcast::<u32>().unwrap(), 42);
    }

    #[test]
    fn test_resume_keeps_payload() {
        let fault = Fault::from_panic(Box::new("again"));
        let payload = panic::catch_unwind(panic::AssertUnwindSafe(|| fault.resume())).unwrap_err();
        assert_eq!(*payload.downcast_ref::<&str>().unwrap(), "again");
    }
}
