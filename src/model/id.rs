use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Defines a string identifier newtype that refuses empty input when parsed.
///
/// # Example
///
/// ```ignore
/// define_id!(VideoId, "video");
///
/// let id: VideoId = "intro-to-rust".parse()?;
/// ```
macro_rules! define_id {
    ($name:ident, $kind:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseId;

            fn from_str(input: &str) -> Result<Self, Self::Err> {
                let trimmed = input.trim();
                if trimmed.is_empty() {
                    return Err(ParseId {
                        kind: $kind,
                        text: input.to_string(),
                    });
                }

                Ok(Self(trimmed.to_string()))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        #[cfg(test)]
        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id!(UserId, "user");
define_id!(VideoId, "video");
define_id!(CourseId, "course");

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(display("invalid {kind} id: `{text}`"))]
pub struct ParseId {
    pub kind: &'static str,
    pub text: String,
}
