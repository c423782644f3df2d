// Hub Chain Connector
// Copyright (C) 2019 The Hub Chain Connector contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License version 3 as
// published by the Free Software Foundation.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Compiled contract artifacts and constructor argument encoding.
//!
//! Contract code is opaque. The only things read from an artifact are the code and whether the
//! contract has a constructor with which parameter kinds.
use parity_scale_codec::{Compact, Encode};
use serde::{Deserialize, Serialize};

use crate::Error;
use hub_core::Address;

/// Kind of a constructor parameter.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Uint,
    Address,
    Bytes,
    Bool,
    Sequence(Box<ParamKind>),
}

/// A constructor argument.
///
/// Arguments are encoded one after the other without tags. Every variant is encoded as the SCALE
/// encoding of its value. A sequence is the compact encoded length followed by the elements.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConstructorArg {
    Uint(u128),
    Address(Address),
    Bytes(Vec<u8>),
    Bool(bool),
    Sequence(Vec<ConstructorArg>),
}

impl ConstructorArg {
    /// Whether the argument can be passed for a parameter of `kind`.
    fn matches(&self, kind: &ParamKind) -> bool {
        match (self, kind) {
            (ConstructorArg::Uint(_), ParamKind::Uint) => true,
            (ConstructorArg::Address(_), ParamKind::Address) => true,
            (ConstructorArg::Bytes(_), ParamKind::Bytes) => true,
            (ConstructorArg::Bool(_), ParamKind::Bool) => true,
            (ConstructorArg::Sequence(elements), ParamKind::Sequence(element_kind)) => elements
                .iter()
                .all(|element| element.matches(element_kind)),
            _ => false,
        }
    }

    fn encode_to(&self, dest: &mut Vec<u8>) {
        match self {
            ConstructorArg::Uint(value) => value.encode_to(dest),
            ConstructorArg::Address(address) => address.encode_to(dest),
            ConstructorArg::Bytes(bytes) => bytes.encode_to(dest),
            ConstructorArg::Bool(value) => value.encode_to(dest),
            ConstructorArg::Sequence(elements) => {
                Compact(elements.len() as u32).encode_to(dest);
                for element in elements {
                    element.encode_to(dest);
                }
            }
        }
    }
}

/// Interface description of a compiled contract.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct ContractInterface {
    pub name: String,
    /// Parameter kinds of the constructor. `None` if the contract has no constructor.
    #[serde(default)]
    pub constructor: Option<Vec<ParamKind>>,
    #[serde(default)]
    pub functions: Vec<String>,
}

impl ContractInterface {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json)
            .map_err(|err| Error::Configuration(format!("Invalid contract interface: {}", err)))
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Encode `args` for the constructor.
    ///
    /// Fails with [Error::Configuration] if arguments are given for a contract without constructor
    /// or if the arguments do not match the constructor parameters.
    pub fn encode_constructor_args(&self, args: &[ConstructorArg]) -> Result<Vec<u8>, Error> {
        let params = match &self.constructor {
            Some(params) => params,
            None if args.is_empty() => return Ok(Vec::new()),
            None => {
                return Err(Error::Configuration(format!(
                    "No constructor with params found for contract {}",
                    self.name
                )))
            }
        };

        if params.len() != args.len() {
            return Err(Error::Configuration(format!(
                "Constructor of contract {} expects {} arguments, got {}",
                self.name,
                params.len(),
                args.len()
            )));
        }

        let mut encoded = Vec::new();
        for (index, (arg, kind)) in args.iter().zip(params).enumerate() {
            if !arg.matches(kind) {
                return Err(Error::Configuration(format!(
                    "Constructor argument {} of contract {} must be {:?}, got {:?}",
                    index, self.name, kind, arg
                )));
            }
            arg.encode_to(&mut encoded);
        }
        Ok(encoded)
    }
}

/// Compiled contract: code and interface.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContractArtifact {
    pub code: Vec<u8>,
    pub interface: ContractInterface,
}

#[derive(Deserialize)]
struct ArtifactFile {
    code: String,
    interface: ContractInterface,
}

impl ContractArtifact {
    /// Parse an artifact of the form `{"code": "0x…", "interface": {…}}`.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let file: ArtifactFile = serde_json::from_str(json)
            .map_err(|err| Error::Configuration(format!("Invalid contract artifact: {}", err)))?;
        let code = hex::decode(file.code.trim_start_matches("0x"))
            .map_err(|err| Error::Configuration(format!("Invalid contract code: {}", err)))?;
        Ok(ContractArtifact {
            code,
            interface: file.interface,
        })
    }

    /// The payload of the creation transaction: code followed by the encoded arguments.
    pub fn creation_payload(&self, args: &[ConstructorArg]) -> Result<Vec<u8>, Error> {
        let mut payload = self.code.clone();
        payload.extend(self.interface.encode_constructor_args(args)?);
        Ok(payload)
    }
}

/// Handle to a deployed contract.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Contract {
    address: Address,
    interface: ContractInterface,
}

impl Contract {
    pub fn new(address: Address, interface: ContractInterface) -> Self {
        Contract { address, interface }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn interface(&self) -> &ContractInterface {
        &self.interface
    }
}
