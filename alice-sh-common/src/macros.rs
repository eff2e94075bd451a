/// Declares a transparent string newtype backed by [`ShString`](crate::ShString).
#[macro_export]
macro_rules! string_id {
    (
        $( #[ $meta:meta ] )*
        pub struct $ident:ident;
    ) => {
        $( #[ $meta ] )*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash,
            $crate::_serde::Serialize, $crate::_serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $ident(pub $crate::ShString);

        impl $ident {
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl<T: AsRef<str>> From<T> for $ident {
            fn from(value: T) -> Self {
                $ident($crate::ShString::from(value))
            }
        }

        impl ::core::ops::Deref for $ident {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                self.as_str()
            }
        }

        impl ::core::fmt::Display for $ident {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}
