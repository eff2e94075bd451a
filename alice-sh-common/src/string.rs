use core::{
    fmt::{self, Display},
    ops::Deref,
};

use compact_str::{CompactString, ToCompactString};
use serde::{Deserialize, Serialize};

use crate::string_id;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShString(CompactString);

impl ShString {
    pub fn new(compact_string: CompactString) -> Self {
        Self(compact_string)
    }

    pub const fn const_new(s: &'static str) -> Self {
        Self(CompactString::const_new(s))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for ShString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl<T: AsRef<str>> From<T> for ShString {
    fn from(value: T) -> Self {
        ShString(CompactString::from(value.as_ref()))
    }
}

impl<T: AsRef<str> + ?Sized> PartialEq<T> for ShString {
    fn eq(&self, other: &T) -> bool {
        self.0.as_str() == other.as_ref()
    }
}

impl Display for ShString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

pub trait ToShString: ToCompactString {
    fn to_sh_string(&self) -> ShString {
        ShString(self.to_compact_string())
    }
}

impl<T: ToCompactString> ToShString for T {}

string_id! {
    /// Identifier of a device as announced to the remote platform
    pub struct DeviceId;
}

string_id! {
    /// Identifier of a handler node; owns the cache keys of the descriptors it registers
    pub struct NodeId;
}

string_id! {
    pub struct ServiceId;
}
