//! Outcome models for test procedures
//!
//! Defines the error forms a setup hook, test body or teardown hook can
//! raise, and the conversion of panic payloads into those forms.

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Result of running one test procedure
pub type Outcome = Result<(), Raised>;

/// Error signal raised by a test procedure
#[derive(Debug)]
pub enum Raised {
    /// Assertion failure raised by test code
    Assertion(String),
    /// Error value carrying its own message
    Exception(Box<dyn Error + Send + Sync>),
    /// Error value reachable only through a shared reference
    SharedException(Arc<dyn Error + Send + Sync>),
    /// String-typed error value
    Message(String),
    /// String-typed error held by reference
    SharedMessage(Arc<str>),
    /// Low-level static text
    Text(&'static str),
}

impl Raised {
    pub fn assertion(message: impl Into<String>) -> Self {
        Raised::Assertion(message.into())
    }

    pub fn exception(error: impl Error + Send + Sync + 'static) -> Self {
        Raised::Exception(Box::new(error))
    }

    pub fn message(message: impl Into<String>) -> Self {
        Raised::Message(message.into())
    }

    /// Whether this is an assertion failure rather than an uncaught error
    pub fn is_assertion(&self) -> bool {
        matches!(self, Raised::Assertion(_))
    }

    /// Convert a payload caught from an unwinding panic.
    ///
    /// Panics raised by `assert!`, `assert_eq!` and `assert_ne!` become
    /// assertion failures; any other panic is an uncaught error.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let payload = match payload.downcast::<Raised>() {
            Ok(raised) => return *raised,
            Err(payload) => payload,
        };
        let payload = match payload.downcast::<String>() {
            Ok(message) if is_std_assertion(&message) => return Raised::Assertion(*message),
            Ok(message) => return Raised::Message(*message),
            Err(payload) => payload,
        };
        match payload.downcast::<&'static str>() {
            Ok(text) if is_std_assertion(*text) => Raised::Assertion(text.to_string()),
            Ok(text) => Raised::Text(*text),
            Err(_) => Raised::Text("unknown panic payload"),
        }
    }
}

/// Message prefixes of the standard assertion macros
const STD_ASSERTION_PREFIXES: [&str; 2] = ["assertion failed", "assertion `left"];

fn is_std_assertion(message: &str) -> bool {
    STD_ASSERTION_PREFIXES
        .iter()
        .any(|prefix| message.starts_with(prefix))
}

impl fmt::Display for Raised {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Raised::Assertion(message) | Raised::Message(message) => f.write_str(message),
            Raised::Exception(error) => write!(f, "{error}"),
            Raised::SharedException(error) => write!(f, "{error}"),
            Raised::SharedMessage(message) => f.write_str(message),
            Raised::Text(text) => f.write_str(text),
        }
    }
}

/// Values a test procedure may return
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Outcome {
        Ok(())
    }
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Outcome {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_display_keeps_original_text() {
        let forms = [
            Raised::assertion("expected 1"),
            Raised::exception(io::Error::new(io::ErrorKind::Other, "disk gone")),
            Raised::SharedException(Arc::new(io::Error::new(io::ErrorKind::Other, "shared"))),
            Raised::message("owned text"),
            Raised::SharedMessage(Arc::from("borrowed text")),
            Raised::Text("static text"),
        ];
        let rendered: Vec<String> = forms.iter().map(|r| r.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["expected 1", "disk gone", "shared", "owned text", "borrowed text", "static text"]
        );
    }

    #[test]
    fn test_from_panic_payloads() {
        let raised = Raised::from_panic(Box::new(String::from("formatted panic")));
        assert!(matches!(raised, Raised::Message(ref m) if m == "formatted panic"));

        let raised = Raised::from_panic(Box::new("static panic"));
        assert!(matches!(raised, Raised::Text("static panic")));

        let raised = Raised::from_panic(Box::new(Raised::assertion("nested")));
        assert!(raised.is_assertion());

        let raised = Raised::from_panic(Box::new(42_u32));
        assert!(matches!(raised, Raised::Text("unknown panic payload")));
    }

    #[test]
    fn test_std_assertion_panics_are_assertions() {
        let payloads: Vec<Box<dyn Any + Send>> = vec![
            std::panic::catch_unwind(|| assert_eq!(1 + 1, 3)).unwrap_err(),
            std::panic::catch_unwind(|| assert_ne!(2, 2)).unwrap_err(),
            std::panic::catch_unwind(|| {
                let pending = vec![1];
                assert!(pending.is_empty())
            })
            .unwrap_err(),
        ];
        for payload in payloads {
            let raised = Raised::from_panic(payload);
            assert!(raised.is_assertion(), "{raised}");
            assert!(raised.to_string().starts_with("assertion"));
        }

        let raised = Raised::from_panic(Box::new("assertion failed: ready"));
        assert!(matches!(raised, Raised::Assertion(ref m) if m == "assertion failed: ready"));
    }
}
