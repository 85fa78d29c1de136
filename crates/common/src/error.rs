use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("failed to parse {format} document: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    #[must_use]
    pub fn parse(format: &'static str, source: impl std::fmt::Display) -> Self {
        Self::Parse {
            format,
            message: source.to_string(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// ── Context helpers ─────────────────────────────────────────────────────────

/// Error types that can be built from a plain message string.
///
/// Implement it for a crate's error type and invoke [`impl_context!`] in the
/// module that defines that type to get `.context()` / `.with_context()` on
/// `Result` and `Option`.
pub trait FromMessage: Sized {
    fn from_message(message: String) -> Self;
}

/// Expand to a crate-local `Context` trait implemented for `Result<T, E>`
/// (with `E: Display`) and `Option<T>`.
///
/// The invoking module must have `Error: FromMessage` and a
/// `Result<T>` alias in scope.
///
/// ```ignore
/// // crates/config/src/error.rs
/// ctxswitch_common::impl_context!();
/// ```
#[macro_export]
macro_rules! impl_context {
    () => {
        pub trait Context<T> {
            fn context(self, context: impl Into<String>) -> Result<T>;
            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C;
        }

        impl<T, E: std::fmt::Display> Context<T> for std::result::Result<T, E> {
            fn context(self, context: impl Into<String>) -> Result<T> {
                let prefix = context.into();
                self.map_err(|err| {
                    <Error as $crate::FromMessage>::from_message(format!("{prefix}: {err}"))
                })
            }

            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C,
            {
                self.map_err(|err| {
                    let prefix = f().into();
                    <Error as $crate::FromMessage>::from_message(format!("{prefix}: {err}"))
                })
            }
        }

        impl<T> Context<T> for Option<T> {
            fn context(self, context: impl Into<String>) -> Result<T> {
                self.ok_or_else(|| <Error as $crate::FromMessage>::from_message(context.into()))
            }

            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C,
            {
                self.ok_or_else(|| <Error as $crate::FromMessage>::from_message(f().into()))
            }
        }
    };
}
