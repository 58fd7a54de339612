//! Read-only method descriptors

use std::fmt;

use alloy_primitives::{Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::constants::{CELL_SIZE, SELECTOR_SIZE};
use crate::error::PortError;
use crate::slot::keccak256;
use crate::{Error, Result};

/// A view method with a fixed argument list and a single `uint256` return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    /// Canonical signature, e.g. `l2BlockNumber()`
    pub signature: String,
    pub selector: [u8; SELECTOR_SIZE],
    /// ABI-encoded arguments appended after the selector
    #[serde(default)]
    pub args: Bytes,
}

impl MethodDescriptor {
    /// Build a descriptor from a canonical signature such as `l2BlockNumber()`
    pub fn from_signature(signature: &str) -> Result<Self> {
        let signature = signature.trim();
        let open = signature.find('(');
        let valid = match open {
            Some(idx) => idx > 0 && signature.ends_with(')') && !signature.contains(' '),
            None => false,
        };
        if !valid {
            return Err(Error::Configuration(format!(
                "invalid method signature: {signature:?}"
            )));
        }

        let hash = keccak256(signature.as_bytes());
        let mut selector = [0u8; SELECTOR_SIZE];
        selector.copy_from_slice(&hash[..SELECTOR_SIZE]);

        Ok(Self {
            signature: signature.to_string(),
            selector,
            args: Bytes::new(),
        })
    }

    /// Attach pre-encoded arguments
    pub fn with_args(mut self, args: impl Into<Bytes>) -> Self {
        self.args = args.into();
        self
    }

    /// Selector followed by the encoded arguments
    pub fn calldata(&self) -> Bytes {
        let mut data = Vec::with_capacity(SELECTOR_SIZE + self.args.len());
        data.extend_from_slice(&self.selector);
        data.extend_from_slice(&self.args);
        data.into()
    }

    /// Decode the single `uint256` return word
    ///
    /// Short return data (e.g. calling an EOA) is an error, never a zero.
    pub fn decode_uint(&self, output: &[u8]) -> std::result::Result<U256, PortError> {
        if output.len() < CELL_SIZE {
            return Err(PortError::MalformedResponse(format!(
                "{} returned {} bytes, expected at least {}",
                self.signature,
                output.len(),
                CELL_SIZE
            )));
        }
        Ok(U256::from_be_slice(&output[..CELL_SIZE]))
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [0x{}]", self.signature, hex::encode(self.selector))
    }
}
