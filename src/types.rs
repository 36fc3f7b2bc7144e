//! Value traits shared by the containers
//!
//! [`Element`] is what a [`Stack`](crate::stack::Stack) needs from its items:
//! a byte image for the integrity digest and a type name for dumps.
//! [`Payload`] adds what a [`Tree`](crate::tree::Tree) needs: a one-line
//! text form for the bracketed grammar.

use std::fmt;

/// Value that can be stored in a stack
pub trait Element: Clone + fmt::Debug + PartialEq {
    /// Type name printed in dumps
    const TYPE_NAME: &'static str;

    /// Append a stable byte image of `self` (fed to the digest)
    fn write_bytes(&self, out: &mut Vec<u8>);
}

/// Value that can be stored in a tree node
pub trait Payload: Element + fmt::Display {
    /// Whether the payload owns separate heap storage (text payloads)
    const HEAP_BACKED: bool = false;

    /// Parse one payload line (already trimmed)
    fn parse_payload(text: &str) -> Result<Self, String>;
}

macro_rules! numeric_element {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Element for $ty {
                const TYPE_NAME: &'static str = $name;

                fn write_bytes(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }

            impl Payload for $ty {
                fn parse_payload(text: &str) -> Result<Self, String> {
                    text.parse::<$ty>()
                        .map_err(|e| format!("'{}' is not a valid {}: {}", text, $name, e))
                }
            }
        )*
    };
}

numeric_element! {
    i32 => "i32",
    i64 => "i64",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
    f32 => "f32",
    f64 => "f64",
}

impl Element for char {
    const TYPE_NAME: &'static str = "char";

    fn write_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(*self as u32).to_le_bytes());
    }
}

impl Payload for char {
    fn parse_payload(text: &str) -> Result<Self, String> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(format!("'{}' is not a single character", text)),
        }
    }
}

impl Element for String {
    const TYPE_NAME: &'static str = "String";

    fn write_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.len() as u64).to_le_bytes());
        out.extend_from_slice(self.as_bytes());
    }
}

impl Payload for String {
    const HEAP_BACKED: bool = true;

    fn parse_payload(text: &str) -> Result<Self, String> {
        Ok(text.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_parse() {
        assert_eq!(i32::parse_payload("-17"), Ok(-17));
        assert_eq!(f64::parse_payload("2.5"), Ok(2.5));
        assert!(u32::parse_payload("-1").is_err());
        assert!(i32::parse_payload("abc").is_err());
    }

    #[test]
    fn test_char_parse() {
        assert_eq!(char::parse_payload("x"), Ok('x'));
        assert!(char::parse_payload("xy").is_err());
        assert!(char::parse_payload("").is_err());
    }

    #[test]
    fn test_text_is_heap_backed() {
        assert!(<String as Payload>::HEAP_BACKED);
        assert!(!<i32 as Payload>::HEAP_BACKED);
    }

    #[test]
    fn test_byte_images_differ() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        String::from("ab").write_bytes(&mut a);
        String::from("a").write_bytes(&mut b);
        assert_ne!(a, b);

        let mut c = Vec::new();
        7i32.write_bytes(&mut c);
        assert_eq!(c, vec![7, 0, 0, 0]);
    }
}
