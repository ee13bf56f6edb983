/*******************************************************************************
*   (c) 2020 ZondaX GmbH
*
*  Licensed under the Apache License, Version 2.0 (the "License");
*  you may not use this file except in compliance with the License.
*  You may obtain a copy of the License at
*
*      http://www.apache.org/licenses/LICENSE-2.0
*
*  Unless required by applicable law or agreed to in writing, software
*  distributed under the License is distributed on an "AS IS" BASIS,
*  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
*  See the License for the specific language governing permissions and
*  limitations under the License.
********************************************************************************/
//! BIP32 derivation paths
//!
//! <https://github.com/bitcoin/bips/blob/master/bip-0032.mediawiki>

use std::fmt;
use std::str::FromStr;

use byteorder::{BigEndian, ByteOrder};

use crate::error::PathError;
use crate::params::BIP32_HARDENED;

/// BIP32 Path, e.g. `44'/111'/0'/0/0`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPath {
    elements: Vec<u32>,
}

impl KeyPath {
    /// Path elements, hardened ones carry the `0x8000_0000` bit
    pub fn elements(&self) -> &[u32] {
        &self.elements
    }

    /// Number of levels
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True if the path has no levels
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Device encoding: one count byte followed by each element as big-endian u32
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut m = vec![0u8; 1 + self.elements.len() * 4];
        // Depth is bounded at parse time
        m[0] = self.elements.len() as u8;

        for (chunk, element) in m[1..].chunks_exact_mut(4).zip(&self.elements) {
            BigEndian::write_u32(chunk, *element);
        }

        m
    }
}

fn parse_element(level: &str) -> Result<u32, PathError> {
    let hardened = level.len() > 1 && level.ends_with('\'');
    let digits = if hardened {
        &level[..level.len() - 1]
    } else {
        level
    };

    let invalid = || PathError::Element(level.to_owned());

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let index: u32 = digits.parse().map_err(|_| invalid())?;

    if !hardened {
        return Ok(index);
    }
    if index >= BIP32_HARDENED {
        return Err(invalid());
    }

    Ok(index | BIP32_HARDENED)
}

impl FromStr for KeyPath {
    type Err = PathError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let elements = path
            .split('/')
            .map(parse_element)
            .collect::<Result<Vec<_>, _>>()?;

        if elements.len() > u8::MAX as usize {
            return Err(PathError::Depth(elements.len()));
        }

        Ok(KeyPath { elements })
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            if element & BIP32_HARDENED != 0 {
                write!(f, "{}'", element & !BIP32_HARDENED)?;
            } else {
                write!(f, "{}", element)?;
            }
        }
        Ok(())
    }
}

impl From<KeyPath> for Vec<u32> {
    fn from(path: KeyPath) -> Self {
        path.elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ark_path() {
        let path: KeyPath = "44'/111'/0'/0/0".parse().unwrap();
        assert_eq!(
            path.elements(),
            &[0x8000_002C, 0x8000_006F, 0x8000_0000, 0, 0]
        );
    }

    #[test]
    fn serialize_ark_path() {
        let path: KeyPath = "44'/111'/0'/0/0".parse().unwrap();
        let serialized_path = path.to_bytes();
        assert_eq!(serialized_path.len(), 21);
        assert_eq!(
            hex::encode(&serialized_path),
            "058000002c8000006f800000000000000000000000"
        );
    }

    #[test]
    fn serialized_length_follows_depth() {
        for s in &["0", "1/2", "44'/1'", "44'/111'/0'/0/0", "1/2/3/4/5/6/7/8/9/10"] {
            let path: KeyPath = s.parse().unwrap();
            let bytes = path.to_bytes();
            assert_eq!(bytes[0] as usize, path.len());
            assert_eq!(bytes.len(), 1 + 4 * path.len());
            assert_eq!(bytes, path.to_bytes());
        }
    }

    #[test]
    fn empty_path() {
        assert_eq!("".parse::<KeyPath>(), Err(PathError::Empty));
    }

    #[test]
    fn non_numeric_element() {
        assert_eq!(
            "44'/x/0".parse::<KeyPath>(),
            Err(PathError::Element("x".to_owned()))
        );
        assert!(matches!(
            "m/44'/0".parse::<KeyPath>(),
            Err(PathError::Element(_))
        ));
        assert!(matches!(
            "44'//0".parse::<KeyPath>(),
            Err(PathError::Element(_))
        ));
        assert!(matches!(
            "44''/0".parse::<KeyPath>(),
            Err(PathError::Element(_))
        ));
        assert!(matches!(
            "-1/0".parse::<KeyPath>(),
            Err(PathError::Element(_))
        ));
    }

    #[test]
    fn lone_apostrophe_is_not_hardening() {
        assert_eq!(
            "44'/'".parse::<KeyPath>(),
            Err(PathError::Element("'".to_owned()))
        );
    }

    #[test]
    fn element_range() {
        let path: KeyPath = "4294967295".parse().unwrap();
        assert_eq!(path.elements(), &[u32::MAX]);
        assert!("4294967296".parse::<KeyPath>().is_err());

        let path: KeyPath = "2147483647'".parse().unwrap();
        assert_eq!(path.elements(), &[u32::MAX]);
        assert!("2147483648'".parse::<KeyPath>().is_err());
    }

    #[test]
    fn depth_limit() {
        let deep = vec!["0"; 255].join("/");
        assert_eq!(deep.parse::<KeyPath>().unwrap().to_bytes()[0], 255);

        let too_deep = vec!["0"; 256].join("/");
        assert_eq!(too_deep.parse::<KeyPath>(), Err(PathError::Depth(256)));
    }

    #[test]
    fn display() {
        let path: KeyPath = "44'/111'/0'/0/1".parse().unwrap();
        assert_eq!(path.to_string(), "44'/111'/0'/0/1");
        assert_eq!(path.to_string().parse::<KeyPath>().unwrap(), path);
    }
}
